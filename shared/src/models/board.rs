//! Board Model

use serde::{Deserialize, Serialize};

use super::{BoardId, ColumnId};

/// Board entity
///
/// `columns` 是有序序列；每列同时携带显式 `order`，部分更新后按它排序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Board {
    pub fn column(&self, column_id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn has_column(&self, column_id: ColumnId) -> bool {
        self.column(column_id).is_some()
    }

    /// Columns sorted by `(order, id)`
    pub fn sorted_columns(&self) -> Vec<Column> {
        let mut columns = self.columns.clone();
        crate::ordering::sort_by_order(&mut columns);
        columns
    }
}

/// Column entity, embedded in [`Board::columns`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub order: i64,
}

/// Create board payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardCreate {
    pub title: String,
}

/// Rename board payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardUpdate {
    pub title: String,
}

/// Add column payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnCreate {
    pub title: String,
}

/// Rename column payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnUpdate {
    pub title: String,
}

/// One entry of a column reorder request
///
/// Clients usually send whole column objects back; fields other than
/// `id` and `order` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnPlacement {
    pub id: ColumnId,
    pub order: i64,
}

/// Reorder columns payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReorder {
    pub columns: Vec<ColumnPlacement>,
}

/// Deletion marker for a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDeleted {
    pub board_id: BoardId,
}
