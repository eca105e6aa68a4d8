//! Card operations

use std::collections::{BTreeSet, HashSet};

use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::BoardEvent;
use shared::models::{
    BoardId, Card, CardCreate, CardDeleted, CardId, CardPlacement, ColumnId, ReorderAck,
};
use shared::ordering::{append_order, changed_assignments, renumber};
use shared::util::{now_millis, snowflake_id};

use super::ReconciliationService;
use crate::db::{WriteBatch, WriteOp};
use crate::utils::validation::validate_card_text;

impl ReconciliationService {
    /// Cards of a board sorted by order
    pub fn list_cards(&self, board_id: BoardId) -> AppResult<Vec<Card>> {
        self.require_board(board_id)?;
        Ok(self.store.cards_for_board(board_id)?)
    }

    pub fn get_card(&self, card_id: CardId) -> AppResult<Card> {
        self.store
            .get_card(card_id)?
            .ok_or_else(|| AppError::card_not_found(card_id))
    }

    /// Append a card to the end of its column
    pub fn create_card(&self, payload: &CardCreate) -> AppResult<Card> {
        let text = validate_card_text(&payload.text)?;
        let board = self.require_board(payload.board_id)?;
        if !board.has_column(payload.column_id) {
            return Err(AppError::column_not_found(payload.column_id));
        }

        let siblings = self.store.cards_for_column(board.id, payload.column_id)?;
        let now = now_millis();
        let card = Card {
            id: snowflake_id(),
            text: text.to_string(),
            order: append_order(siblings.len()),
            column_id: payload.column_id,
            board_id: board.id,
            created_at: now,
            updated_at: now,
        };

        self.store
            .apply(WriteBatch::new().with(WriteOp::PutCard(card.clone())))?;
        let card = self.get_card(card.id)?;

        tracing::info!(
            board_id = card.board_id,
            card_id = card.id,
            order = card.order,
            "Card created"
        );
        self.publish(BoardEvent::CardCreated(card.clone()));
        Ok(card)
    }

    pub fn rename_card(&self, card_id: CardId, text: &str) -> AppResult<Card> {
        let text = validate_card_text(text)?;
        let mut card = self.get_card(card_id)?;
        card.text = text.to_string();
        card.updated_at = now_millis();

        self.store
            .apply(WriteBatch::new().with(WriteOp::PutCard(card)))?;
        let card = self.get_card(card_id)?;

        tracing::info!(board_id = card.board_id, card_id, "Card renamed");
        self.publish(BoardEvent::CardUpdated(card.clone()));
        Ok(card)
    }

    /// Delete a card and close the gap in its column
    ///
    /// Broadcasts the deletion marker, then `card:reorder` with the survivors
    /// whose order moved (nothing when the last card was deleted).
    pub fn delete_card(&self, card_id: CardId) -> AppResult<CardDeleted> {
        let card = self.get_card(card_id)?;
        let mut survivors = self.store.cards_for_column(card.board_id, card.column_id)?;
        survivors.retain(|c| c.id != card_id);
        let shifted = changed_assignments(&survivors);

        let now = now_millis();
        let mut batch = WriteBatch::new().with(WriteOp::DeleteCard(card_id));
        batch.extend(shifted.iter().map(|a| {
            WriteOp::PlaceCard(
                CardPlacement {
                    id: a.id,
                    order: a.order,
                    column_id: card.column_id,
                    board_id: card.board_id,
                },
                now,
            )
        }));
        self.store.apply(batch)?;

        // 先读回再广播，读失败时不发出任何事件
        let ids: Vec<CardId> = shifted.iter().map(|a| a.id).collect();
        let renumbered = self.store.get_cards(&ids)?;

        let marker = CardDeleted {
            card_id,
            board_id: card.board_id,
        };
        tracing::info!(
            board_id = card.board_id,
            card_id,
            renumbered = renumbered.len(),
            "Card deleted"
        );
        self.publish(BoardEvent::CardDeleted(marker));
        if !renumbered.is_empty() {
            self.publish(BoardEvent::CardsReordered {
                board_id: card.board_id,
                cards: renumbered,
            });
        }
        Ok(marker)
    }

    /// Apply a reorder/move batch
    ///
    /// All tuples must share one existing board, name existing cards of that
    /// board, and point at columns of that board. Tuples matching the stored
    /// state are skipped; if nothing is left the call writes and broadcasts
    /// nothing.
    ///
    /// Otherwise every column the batch touches is rebuilt from the stored
    /// cards with the tuples laid over them, sorted by `(order, submitted
    /// first, id)` and renumbered `0..n-1`. A batch carrying whole column
    /// sequences therefore lands exactly as sent; a partial batch racing an
    /// earlier write still leaves the columns dense. Every card whose position
    /// changed goes into one atomic write, is re-read, and is broadcast.
    pub fn reorder_cards(&self, placements: &[CardPlacement]) -> AppResult<ReorderAck> {
        let Some(first) = placements.first() else {
            return Ok(ReorderAck::new(0));
        };
        let board_id = first.board_id;

        let mut submitted = HashSet::with_capacity(placements.len());
        for p in placements {
            if p.board_id != board_id {
                return Err(AppError::new(ErrorCode::BoardMismatch)
                    .with_detail("boardId", board_id)
                    .with_detail("other", p.board_id));
            }
            if !submitted.insert(p.id) {
                return Err(AppError::new(ErrorCode::DuplicateEntity).with_detail("cardId", p.id));
            }
            if p.order < 0 {
                return Err(AppError::validation("order must not be negative")
                    .with_detail("cardId", p.id));
            }
        }

        let board = self.require_board(board_id)?;
        if let Some(p) = placements.iter().find(|p| !board.has_column(p.column_id)) {
            return Err(AppError::column_not_found(p.column_id));
        }

        let ids: Vec<CardId> = placements.iter().map(|p| p.id).collect();
        let stored = self.store.get_cards(&ids)?;

        let mut effective = Vec::with_capacity(placements.len());
        let mut touched = BTreeSet::new();
        for p in placements {
            let card = stored
                .iter()
                .find(|c| c.id == p.id)
                .ok_or_else(|| AppError::card_not_found(p.id))?;
            if card.board_id != board_id {
                return Err(AppError::new(ErrorCode::BoardMismatch).with_detail("cardId", p.id));
            }
            if !card.is_placed_at(p) {
                effective.push(*p);
                touched.insert(card.column_id);
                touched.insert(p.column_id);
            }
        }

        if effective.is_empty() {
            tracing::debug!(board_id, "Reorder batch unchanged, skipping write");
            return Ok(ReorderAck::new(0));
        }

        let before = self.store.cards_for_board(board_id)?;
        let writes = settle_columns(&before, &effective, &submitted, &touched);
        if writes.is_empty() {
            tracing::debug!(board_id, "Reorder batch settles to stored order, skipping write");
            return Ok(ReorderAck::new(0));
        }
        if writes.len() != effective.len() {
            tracing::debug!(
                board_id,
                requested = effective.len(),
                written = writes.len(),
                "Reorder batch densified"
            );
        }

        let now = now_millis();
        let batch: WriteBatch = writes.iter().map(|p| WriteOp::PlaceCard(*p, now)).collect();
        self.store.apply(batch)?;

        let affected: Vec<CardId> = writes.iter().map(|p| p.id).collect();
        let cards = self.store.get_cards(&affected)?;

        tracing::info!(board_id, updated = cards.len(), "Cards reordered");
        self.publish(BoardEvent::CardsReordered { board_id, cards });
        Ok(ReorderAck::new(writes.len()))
    }
}

/// Lay `effective` over `before`, renumber each touched column, and return the
/// placements that differ from what is stored
fn settle_columns(
    before: &[Card],
    effective: &[CardPlacement],
    submitted: &HashSet<CardId>,
    touched: &BTreeSet<ColumnId>,
) -> Vec<CardPlacement> {
    let mut after: Vec<Card> = before.to_vec();
    for card in &mut after {
        if let Some(p) = effective.iter().find(|p| p.id == card.id) {
            card.place(p);
        }
    }

    let mut writes = Vec::new();
    for &column_id in touched {
        let mut sequence: Vec<Card> = after
            .iter()
            .filter(|c| c.column_id == column_id)
            .cloned()
            .collect();
        // 同序号时本次提交的卡片排前
        sequence.sort_by_key(|c| (c.order, !submitted.contains(&c.id), c.id));

        for assignment in renumber(&sequence) {
            let Some(card) = before.iter().find(|c| c.id == assignment.id) else {
                continue;
            };
            let placement = CardPlacement {
                order: assignment.order,
                column_id,
                ..card.placement()
            };
            if !card.is_placed_at(&placement) {
                writes.push(placement);
            }
        }
    }
    writes
}
