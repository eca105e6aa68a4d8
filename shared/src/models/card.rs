//! Card Model

use serde::{Deserialize, Serialize};

use super::{BoardId, CardId, ColumnId};

/// Card entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub text: String,
    /// Dense, zero-based, unique within `column_id`
    pub order: i64,
    pub column_id: ColumnId,
    pub board_id: BoardId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Card {
    /// Current position as a reorder tuple
    pub fn placement(&self) -> CardPlacement {
        CardPlacement {
            id: self.id,
            order: self.order,
            column_id: self.column_id,
            board_id: self.board_id,
        }
    }

    /// Whether the card already sits where `p` would put it
    pub fn is_placed_at(&self, p: &CardPlacement) -> bool {
        self.order == p.order && self.column_id == p.column_id
    }

    /// Overwrite position fields from a placement
    pub fn place(&mut self, p: &CardPlacement) {
        self.order = p.order;
        self.column_id = p.column_id;
    }
}

/// One reorder tuple: `(id, order, columnId)` scoped by `boardId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPlacement {
    pub id: CardId,
    pub order: i64,
    pub column_id: ColumnId,
    pub board_id: BoardId,
}

/// Create card payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCreate {
    pub text: String,
    pub column_id: ColumnId,
    pub board_id: BoardId,
}

/// Rename card payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardUpdate {
    pub text: String,
}

/// Bulk reorder/move payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardReorder {
    pub cards: Vec<CardPlacement>,
}

/// Acknowledgment returned to the caller of a bulk reorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderAck {
    pub message: String,
    /// Number of cards actually written (unchanged tuples are skipped)
    pub updated: usize,
}

impl ReorderAck {
    pub fn new(updated: usize) -> Self {
        Self {
            message: "Cards reordered successfully".to_string(),
            updated,
        }
    }
}

/// Deletion marker for a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDeleted {
    pub card_id: CardId,
    pub board_id: BoardId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement() {
        let mut card = Card {
            id: 5,
            text: "write docs".into(),
            order: 2,
            column_id: 10,
            board_id: 1,
            created_at: 0,
            updated_at: 0,
        };
        let p = card.placement();
        assert!(card.is_placed_at(&p));

        let moved = CardPlacement { column_id: 11, order: 0, ..p };
        assert!(!card.is_placed_at(&moved));
        card.place(&moved);
        assert_eq!((card.column_id, card.order), (11, 0));
    }

    #[test]
    fn test_reorder_payload_wire_format() {
        let json = r#"{"cards":[{"id":1,"order":0,"columnId":2,"boardId":3}]}"#;
        let payload: CardReorder = serde_json::from_str(json).unwrap();
        assert_eq!(
            payload.cards[0],
            CardPlacement { id: 1, order: 0, column_id: 2, board_id: 3 }
        );
    }
}
