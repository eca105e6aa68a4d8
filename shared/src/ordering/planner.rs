//! Reorder Planner
//!
//! Pure functions turning a drag-and-drop gesture into the minimal set of
//! order changes. The same plan is applied optimistically on the client and
//! sent to the server as the reorder payload.
//!
//! The client snapshot is authoritative for where the moved entity currently
//! sits: `source.index` is informational and only used for the no-op check.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::index::{OrderAssignment, changed_assignments, renumber_in_place, sort_by_order};
use crate::error::AppError;
use crate::models::{Board, BoardId, Card, CardPlacement, Column, ColumnPlacement};

/// Position inside a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    /// Board id for column moves, column id for card moves
    pub container_id: i64,
    pub index: usize,
}

impl Slot {
    pub fn new(container_id: i64, index: usize) -> Self {
        Self {
            container_id,
            index,
        }
    }
}

/// A drag-and-drop move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub entity_id: i64,
    pub source: Slot,
    pub destination: Slot,
}

impl MoveRequest {
    pub fn new(entity_id: i64, source: Slot, destination: Slot) -> Self {
        Self {
            entity_id,
            source,
            destination,
        }
    }

    /// Dropped back where it was picked up
    pub fn is_noop(&self) -> bool {
        self.source == self.destination
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Board,
    Column,
    Card,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Board => write!(f, "board"),
            Self::Column => write!(f, "column"),
            Self::Card => write!(f, "card"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
}

impl From<PlanError> for AppError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::NotFound {
                kind: EntityKind::Board,
                id,
            } => AppError::board_not_found(id),
            PlanError::NotFound {
                kind: EntityKind::Column,
                id,
            } => AppError::column_not_found(id),
            PlanError::NotFound {
                kind: EntityKind::Card,
                id,
            } => AppError::card_not_found(id),
        }
    }
}

/// Result of planning a column move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMovePlan {
    pub board_id: BoardId,
    /// The board's full column sequence after the move, renumbered
    pub sequence: Vec<Column>,
    /// Columns whose order changed
    pub changed: Vec<OrderAssignment>,
}

impl ColumnMovePlan {
    /// Payload for the reorder-columns request (the full ordered list)
    pub fn placements(&self) -> Vec<ColumnPlacement> {
        self.sequence
            .iter()
            .map(|c| ColumnPlacement {
                id: c.id,
                order: c.order,
            })
            .collect()
    }
}

/// Result of planning a card move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardMovePlan {
    pub board_id: BoardId,
    /// Only cards whose order or column changed
    pub placements: Vec<CardPlacement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderPlan {
    Noop,
    Columns(ColumnMovePlan),
    Cards(CardMovePlan),
}

impl ReorderPlan {
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

/// Plan moving a column within its board
pub fn plan_column_move(board: &Board, req: &MoveRequest) -> Result<ReorderPlan, PlanError> {
    for container in [req.source.container_id, req.destination.container_id] {
        if container != board.id {
            return Err(PlanError::NotFound {
                kind: EntityKind::Board,
                id: container,
            });
        }
    }

    let mut sequence = board.sorted_columns();
    let pos = sequence
        .iter()
        .position(|c| c.id == req.entity_id)
        .ok_or(PlanError::NotFound {
            kind: EntityKind::Column,
            id: req.entity_id,
        })?;

    if req.is_noop() {
        return Ok(ReorderPlan::Noop);
    }

    let moved = sequence.remove(pos);
    let at = req.destination.index.min(sequence.len());
    sequence.insert(at, moved);

    let changed = changed_assignments(&sequence);
    if changed.is_empty() {
        return Ok(ReorderPlan::Noop);
    }
    renumber_in_place(&mut sequence);

    Ok(ReorderPlan::Columns(ColumnMovePlan {
        board_id: board.id,
        sequence,
        changed,
    }))
}

/// Plan moving a card within its column or into another column of the same board
///
/// `cards` is the client's snapshot of the board's cards; cards of other
/// boards are ignored.
pub fn plan_card_move(
    board: &Board,
    cards: &[Card],
    req: &MoveRequest,
) -> Result<ReorderPlan, PlanError> {
    let moved = cards
        .iter()
        .find(|c| c.id == req.entity_id && c.board_id == board.id)
        .ok_or(PlanError::NotFound {
            kind: EntityKind::Card,
            id: req.entity_id,
        })?;

    let dest_column = req.destination.container_id;
    if !board.has_column(dest_column) {
        return Err(PlanError::NotFound {
            kind: EntityKind::Column,
            id: dest_column,
        });
    }

    if req.is_noop() {
        return Ok(ReorderPlan::Noop);
    }

    let source_column = moved.column_id;
    let column_cards = |column_id: i64| {
        let mut list: Vec<Card> = cards
            .iter()
            .filter(|c| c.board_id == board.id && c.column_id == column_id)
            .cloned()
            .collect();
        sort_by_order(&mut list);
        list
    };

    let mut source = column_cards(source_column);
    source.retain(|c| c.id != moved.id);

    let mut placements = Vec::new();
    let mut moving = moved.clone();
    moving.column_id = dest_column;

    if dest_column == source_column {
        let at = req.destination.index.min(source.len());
        source.insert(at, moving);
        collect_changes(cards, &source, &mut placements);
    } else {
        let mut destination = column_cards(dest_column);
        let at = req.destination.index.min(destination.len());
        destination.insert(at, moving);
        collect_changes(cards, &source, &mut placements);
        collect_changes(cards, &destination, &mut placements);
    }

    if placements.is_empty() {
        return Ok(ReorderPlan::Noop);
    }

    Ok(ReorderPlan::Cards(CardMovePlan {
        board_id: board.id,
        placements,
    }))
}

/// Renumber `list` by position and keep the cards whose stored order or column differs
fn collect_changes(snapshot: &[Card], list: &[Card], out: &mut Vec<CardPlacement>) {
    for (pos, card) in list.iter().enumerate() {
        let order = pos as i64;
        let unchanged = snapshot
            .iter()
            .find(|c| c.id == card.id)
            .is_some_and(|before| before.order == order && before.column_id == card.column_id);
        if !unchanged {
            out.push(CardPlacement {
                id: card.id,
                order,
                column_id: card.column_id,
                board_id: card.board_id,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::is_dense;
    use std::collections::HashMap;

    const BOARD: i64 = 1;
    const A: i64 = 10;
    const B: i64 = 20;

    fn board(columns: &[(i64, i64)]) -> Board {
        Board {
            id: BOARD,
            title: "board".into(),
            columns: columns
                .iter()
                .map(|(id, order)| Column {
                    id: *id,
                    title: format!("col {id}"),
                    order: *order,
                })
                .collect(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn card(id: i64, column_id: i64, order: i64) -> Card {
        Card {
            id,
            text: format!("card {id}"),
            order,
            column_id,
            board_id: BOARD,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Apply placements to a snapshot the way a client would
    fn apply(cards: &[Card], placements: &[CardPlacement]) -> Vec<Card> {
        let by_id: HashMap<i64, &CardPlacement> = placements.iter().map(|p| (p.id, p)).collect();
        cards
            .iter()
            .cloned()
            .map(|mut c| {
                if let Some(p) = by_id.get(&c.id) {
                    c.place(p);
                }
                c
            })
            .collect()
    }

    fn column_ids(cards: &[Card], column_id: i64) -> Vec<i64> {
        let mut list: Vec<Card> = cards
            .iter()
            .filter(|c| c.column_id == column_id)
            .cloned()
            .collect();
        sort_by_order(&mut list);
        list.iter().map(|c| c.id).collect()
    }

    fn assert_dense(cards: &[Card], column_id: i64) {
        assert!(is_dense(
            cards
                .iter()
                .filter(|c| c.column_id == column_id)
                .map(|c| c.order)
        ));
    }

    #[test]
    fn test_cross_column_move_to_empty_column() {
        let b = board(&[(A, 0), (B, 1)]);
        let cards = vec![card(1, A, 0), card(2, A, 1)];
        let req = MoveRequest::new(2, Slot::new(A, 1), Slot::new(B, 0));

        let ReorderPlan::Cards(plan) = plan_card_move(&b, &cards, &req).unwrap() else {
            panic!("expected card plan");
        };
        // c1 keeps order 0 in A so it is left out
        assert_eq!(
            plan.placements,
            vec![CardPlacement {
                id: 2,
                order: 0,
                column_id: B,
                board_id: BOARD
            }]
        );

        let after = apply(&cards, &plan.placements);
        assert_eq!(column_ids(&after, A), vec![1]);
        assert_eq!(column_ids(&after, B), vec![2]);
    }

    #[test]
    fn test_cross_column_move_counts() {
        let b = board(&[(A, 0), (B, 1)]);
        let cards = vec![
            card(1, A, 0),
            card(2, A, 1),
            card(3, A, 2),
            card(4, B, 0),
            card(5, B, 1),
        ];
        // n = 3 in A, m = 2 in B; every k in 0..=m
        for k in 0..=2 {
            let req = MoveRequest::new(1, Slot::new(A, 0), Slot::new(B, k));
            let ReorderPlan::Cards(plan) = plan_card_move(&b, &cards, &req).unwrap() else {
                panic!("expected card plan");
            };
            let after = apply(&cards, &plan.placements);
            assert_eq!(column_ids(&after, A).len(), 2);
            assert_eq!(column_ids(&after, B).len(), 3);
            assert_dense(&after, A);
            assert_dense(&after, B);
            let moved = after.iter().find(|c| c.id == 1).unwrap();
            assert_eq!((moved.column_id, moved.order), (B, k as i64));
        }
    }

    #[test]
    fn test_same_column_move_only_touches_shifted_cards() {
        let b = board(&[(A, 0)]);
        let cards = vec![card(1, A, 0), card(2, A, 1), card(3, A, 2), card(4, A, 3)];
        let req = MoveRequest::new(1, Slot::new(A, 0), Slot::new(A, 2));

        let ReorderPlan::Cards(plan) = plan_card_move(&b, &cards, &req).unwrap() else {
            panic!("expected card plan");
        };
        let ids: Vec<_> = plan.placements.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        let after = apply(&cards, &plan.placements);
        assert_eq!(column_ids(&after, A), vec![2, 3, 1, 4]);
        assert_dense(&after, A);
    }

    #[test]
    fn test_noop_move_plans_nothing() {
        let b = board(&[(A, 0), (B, 1)]);
        let cards = vec![card(1, A, 0), card(2, A, 1)];

        let req = MoveRequest::new(2, Slot::new(A, 1), Slot::new(A, 1));
        assert_eq!(plan_card_move(&b, &cards, &req).unwrap(), ReorderPlan::Noop);

        let req = MoveRequest::new(B, Slot::new(BOARD, 1), Slot::new(BOARD, 1));
        assert_eq!(plan_column_move(&b, &req).unwrap(), ReorderPlan::Noop);
    }

    #[test]
    fn test_index_past_end_clamps_to_append() {
        let b = board(&[(A, 0), (B, 1)]);
        let cards = vec![card(1, A, 0), card(2, A, 1), card(3, B, 0)];

        let req = MoveRequest::new(1, Slot::new(A, 0), Slot::new(B, 99));
        let ReorderPlan::Cards(plan) = plan_card_move(&b, &cards, &req).unwrap() else {
            panic!("expected card plan");
        };
        let after = apply(&cards, &plan.placements);
        assert_eq!(column_ids(&after, B), vec![3, 1]);

        // last card dragged past the end of its own column: nothing changes
        let req = MoveRequest::new(2, Slot::new(A, 1), Slot::new(A, 50));
        assert_eq!(plan_card_move(&b, &cards, &req).unwrap(), ReorderPlan::Noop);
    }

    #[test]
    fn test_unknown_entities_are_not_found() {
        let b = board(&[(A, 0)]);
        let cards = vec![card(1, A, 0)];

        let req = MoveRequest::new(99, Slot::new(A, 0), Slot::new(A, 1));
        assert_eq!(
            plan_card_move(&b, &cards, &req),
            Err(PlanError::NotFound {
                kind: EntityKind::Card,
                id: 99
            })
        );

        let req = MoveRequest::new(1, Slot::new(A, 0), Slot::new(77, 0));
        assert_eq!(
            plan_card_move(&b, &cards, &req),
            Err(PlanError::NotFound {
                kind: EntityKind::Column,
                id: 77
            })
        );

        let req = MoveRequest::new(55, Slot::new(BOARD, 0), Slot::new(BOARD, 1));
        assert_eq!(
            plan_column_move(&b, &req),
            Err(PlanError::NotFound {
                kind: EntityKind::Column,
                id: 55
            })
        );

        let err: AppError = PlanError::NotFound {
            kind: EntityKind::Card,
            id: 99,
        }
        .into();
        assert_eq!(err.code, crate::error::ErrorCode::CardNotFound);
    }

    #[test]
    fn test_column_move_renumbers_whole_sequence() {
        let b = board(&[(A, 0), (B, 1), (30, 2)]);
        let req = MoveRequest::new(30, Slot::new(BOARD, 2), Slot::new(BOARD, 0));

        let ReorderPlan::Columns(plan) = plan_column_move(&b, &req).unwrap() else {
            panic!("expected column plan");
        };
        let ids: Vec<_> = plan.sequence.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![30, A, B]);
        assert!(is_dense(plan.sequence.iter().map(|c| c.order)));
        assert_eq!(plan.changed.len(), 3);
        assert_eq!(plan.placements()[0], ColumnPlacement { id: 30, order: 0 });
    }

    #[test]
    fn test_column_move_wrong_board() {
        let b = board(&[(A, 0)]);
        let req = MoveRequest::new(A, Slot::new(2, 0), Slot::new(2, 1));
        assert_eq!(
            plan_column_move(&b, &req),
            Err(PlanError::NotFound {
                kind: EntityKind::Board,
                id: 2
            })
        );
    }
}
