//! Client-side shadow copy of one board

use std::collections::HashMap;

use shared::message::BoardEvent;
use shared::models::{Board, BoardId, Card, CardId, Column, ColumnId};
use shared::ordering::{ReorderPlan, sort_by_order};

use super::EntityState;

#[derive(Debug, Clone)]
pub struct BoardView {
    /// Board header; its `columns` field is not used, see [`BoardView::snapshot`]
    header: EntityState<Board>,
    columns: HashMap<ColumnId, EntityState<Column>>,
    cards: HashMap<CardId, EntityState<Card>>,
    deleted: bool,
}

impl BoardView {
    /// Initial fetch, everything reconciled
    pub fn load(board: Board, cards: Vec<Card>) -> Self {
        let columns = board
            .columns
            .iter()
            .map(|c| (c.id, EntityState::Reconciled(c.clone())))
            .collect();
        let cards = cards
            .into_iter()
            .filter(|c| c.board_id == board.id)
            .map(|c| (c.id, EntityState::Reconciled(c)))
            .collect();
        Self {
            header: EntityState::Reconciled(board),
            columns,
            cards,
            deleted: false,
        }
    }

    pub fn board_id(&self) -> BoardId {
        self.header.value().id
    }

    pub fn title(&self) -> &str {
        &self.header.value().title
    }

    /// The board was deleted on the server
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Columns sorted by order
    pub fn columns(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = self.columns.values().map(|s| s.value().clone()).collect();
        sort_by_order(&mut columns);
        columns
    }

    /// Cards of one column sorted by order
    pub fn cards_in(&self, column_id: ColumnId) -> Vec<Card> {
        let mut cards: Vec<Card> = self
            .cards
            .values()
            .map(|s| s.value())
            .filter(|c| c.column_id == column_id)
            .cloned()
            .collect();
        sort_by_order(&mut cards);
        cards
    }

    /// All cards, column by column in column order
    pub fn cards(&self) -> Vec<Card> {
        self.columns()
            .iter()
            .flat_map(|column| self.cards_in(column.id))
            .collect()
    }

    pub fn card_state(&self, card_id: CardId) -> Option<&EntityState<Card>> {
        self.cards.get(&card_id)
    }

    /// Entities still waiting for a canonical update
    pub fn pending_count(&self) -> usize {
        usize::from(self.header.is_local())
            + self.columns.values().filter(|s| s.is_local()).count()
            + self.cards.values().filter(|s| s.is_local()).count()
    }

    /// Board with its current column sequence, the input the planner expects
    pub fn snapshot(&self) -> Board {
        Board {
            columns: self.columns(),
            ..self.header.value().clone()
        }
    }

    /// Apply a plan optimistically; `false` if the plan is for another board
    pub fn apply_plan(&mut self, plan: &ReorderPlan) -> bool {
        match plan {
            ReorderPlan::Noop => true,
            ReorderPlan::Columns(plan) => {
                if plan.board_id != self.board_id() {
                    return false;
                }
                for change in &plan.changed {
                    if let Some(state) = self.columns.get_mut(&change.id) {
                        let mut column = state.value().clone();
                        column.order = change.order;
                        state.set_local(column);
                    }
                }
                true
            }
            ReorderPlan::Cards(plan) => {
                if plan.board_id != self.board_id() {
                    return false;
                }
                for placement in &plan.placements {
                    if let Some(state) = self.cards.get_mut(&placement.id) {
                        let mut card = state.value().clone();
                        card.place(placement);
                        state.set_local(card);
                    }
                }
                true
            }
        }
    }

    /// Apply a canonical update by replacing entities by id
    ///
    /// Returns `false` for events about other boards. Applying the same event
    /// twice leaves the view unchanged.
    pub fn apply_event(&mut self, event: &BoardEvent) -> bool {
        if event.board_id() != self.board_id() {
            return false;
        }
        match event {
            BoardEvent::BoardCreated(board) | BoardEvent::BoardUpdated(board) => {
                self.header.reconcile(board.clone());
                self.replace_columns(&board.columns);
            }
            BoardEvent::BoardDeleted(_) => {
                self.deleted = true;
                self.columns.clear();
                self.cards.clear();
            }
            BoardEvent::ColumnsReordered { columns, .. } => {
                self.replace_columns(columns);
            }
            BoardEvent::CardCreated(card) | BoardEvent::CardUpdated(card) => {
                self.reconcile_card(card);
            }
            BoardEvent::CardsReordered { cards, .. } => {
                for card in cards {
                    self.reconcile_card(card);
                }
            }
            BoardEvent::CardDeleted(marker) => {
                self.cards.remove(&marker.card_id);
            }
        }
        true
    }

    fn reconcile_card(&mut self, card: &Card) {
        self.cards
            .entry(card.id)
            .and_modify(|state| state.reconcile(card.clone()))
            .or_insert_with(|| EntityState::Reconciled(card.clone()));
    }

    /// Board-level payloads carry the whole column set
    fn replace_columns(&mut self, columns: &[Column]) {
        self.columns = columns
            .iter()
            .map(|c| (c.id, EntityState::Reconciled(c.clone())))
            .collect();
        // cards of a deleted column went with it
        let columns = &self.columns;
        self.cards
            .retain(|_, state| columns.contains_key(&state.value().column_id));
    }
}
