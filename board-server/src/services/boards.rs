//! Board and column operations

use std::collections::HashSet;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::BoardEvent;
use shared::models::{
    Board, BoardDeleted, BoardId, Column, ColumnId, ColumnPlacement,
};
use shared::ordering::{append_order, renumber_in_place, sort_by_order};
use shared::util::{now_millis, snowflake_id};

use super::ReconciliationService;
use crate::db::{WriteBatch, WriteOp};
use crate::utils::validation::validate_title;

impl ReconciliationService {
    /// All boards, newest first
    pub fn list_boards(&self) -> AppResult<Vec<Board>> {
        Ok(self.store.list_boards()?)
    }

    pub fn get_board(&self, board_id: BoardId) -> AppResult<Board> {
        self.require_board(board_id)
    }

    pub fn create_board(&self, title: &str) -> AppResult<Board> {
        let title = validate_title(title)?;
        let now = now_millis();
        let board = Board {
            id: snowflake_id(),
            title: title.to_string(),
            columns: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.store
            .apply(WriteBatch::new().with(WriteOp::PutBoard(board.clone())))?;
        let board = self.require_board(board.id)?;

        tracing::info!(board_id = board.id, "Board created");
        self.publish(BoardEvent::BoardCreated(board.clone()));
        Ok(board)
    }

    pub fn rename_board(&self, board_id: BoardId, title: &str) -> AppResult<Board> {
        let title = validate_title(title)?;
        let mut board = self.require_board(board_id)?;
        board.title = title.to_string();
        board.updated_at = now_millis();

        self.store
            .apply(WriteBatch::new().with(WriteOp::PutBoard(board)))?;
        let board = self.require_board(board_id)?;

        tracing::info!(board_id, "Board renamed");
        self.publish(BoardEvent::BoardUpdated(board.clone()));
        Ok(board)
    }

    /// Delete a board with all its columns and cards
    pub fn delete_board(&self, board_id: BoardId) -> AppResult<BoardDeleted> {
        self.require_board(board_id)?;
        self.store
            .apply(WriteBatch::new().with(WriteOp::DeleteBoard(board_id)))?;

        tracing::info!(board_id, "Board deleted");
        let marker = BoardDeleted { board_id };
        self.publish(BoardEvent::BoardDeleted(marker));
        Ok(marker)
    }

    /// Append a column; returns the new column
    pub fn add_column(&self, board_id: BoardId, title: &str) -> AppResult<Column> {
        let title = validate_title(title)?;
        let mut board = self.require_board(board_id)?;
        sort_by_order(&mut board.columns);

        let column = Column {
            id: snowflake_id(),
            title: title.to_string(),
            order: append_order(board.columns.len()),
        };
        let column_id = column.id;
        board.columns.push(column);
        board.updated_at = now_millis();

        self.store
            .apply(WriteBatch::new().with(WriteOp::PutBoard(board)))?;
        let board = self.require_board(board_id)?;
        let column = board
            .column(column_id)
            .cloned()
            .ok_or_else(|| AppError::column_not_found(column_id))?;

        tracing::info!(board_id, column_id, "Column added");
        self.publish(BoardEvent::BoardUpdated(board));
        Ok(column)
    }

    pub fn rename_column(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
        title: &str,
    ) -> AppResult<Board> {
        let title = validate_title(title)?;
        let mut board = self.require_board(board_id)?;
        let column = board
            .columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| AppError::column_not_found(column_id))?;
        column.title = title.to_string();
        board.updated_at = now_millis();

        self.store
            .apply(WriteBatch::new().with(WriteOp::PutBoard(board)))?;
        let board = self.require_board(board_id)?;

        tracing::info!(board_id, column_id, "Column renamed");
        self.publish(BoardEvent::BoardUpdated(board.clone()));
        Ok(board)
    }

    /// Delete a column and its cards, renumbering the remaining columns
    pub fn delete_column(&self, board_id: BoardId, column_id: ColumnId) -> AppResult<Board> {
        let mut board = self.require_board(board_id)?;
        if !board.has_column(column_id) {
            return Err(AppError::column_not_found(column_id));
        }

        board.columns.retain(|c| c.id != column_id);
        sort_by_order(&mut board.columns);
        renumber_in_place(&mut board.columns);
        board.updated_at = now_millis();

        let cards = self.store.cards_for_column(board_id, column_id)?;
        let removed = cards.len();
        let mut batch: WriteBatch = cards.iter().map(|c| WriteOp::DeleteCard(c.id)).collect();
        batch.push(WriteOp::PutBoard(board));
        self.store.apply(batch)?;
        let board = self.require_board(board_id)?;

        tracing::info!(board_id, column_id, cards_removed = removed, "Column deleted");
        self.publish(BoardEvent::BoardUpdated(board.clone()));
        Ok(board)
    }

    /// Reorder a board's columns
    ///
    /// `placements` must name every column of the board exactly once. They are
    /// sorted by submitted `order` (ties keep submission position) and then
    /// renumbered densely. An unchanged sequence writes and broadcasts nothing.
    pub fn reorder_columns(
        &self,
        board_id: BoardId,
        placements: &[ColumnPlacement],
    ) -> AppResult<Vec<Column>> {
        let mut board = self.require_board(board_id)?;

        let mut seen = HashSet::with_capacity(placements.len());
        for p in placements {
            if !seen.insert(p.id) {
                return Err(AppError::new(ErrorCode::DuplicateEntity).with_detail("columnId", p.id));
            }
            if !board.has_column(p.id) {
                return Err(AppError::column_not_found(p.id));
            }
        }
        if placements.len() != board.columns.len() {
            return Err(AppError::new(ErrorCode::ColumnSetMismatch)
                .with_detail("expected", board.columns.len())
                .with_detail("received", placements.len()));
        }

        let mut ranked: Vec<(usize, &ColumnPlacement)> = placements.iter().enumerate().collect();
        ranked.sort_by_key(|(pos, p)| (p.order, *pos));

        let mut sequence: Vec<Column> = ranked
            .iter()
            .filter_map(|(_, p)| board.column(p.id).cloned())
            .collect();
        renumber_in_place(&mut sequence);

        if sequence == board.columns {
            tracing::debug!(board_id, "Column order unchanged, skipping write");
            return Ok(sequence);
        }

        board.columns = sequence;
        board.updated_at = now_millis();
        self.store
            .apply(WriteBatch::new().with(WriteOp::PutBoard(board)))?;

        let board = self.require_board(board_id)?;
        let columns = board.sorted_columns();

        tracing::info!(board_id, columns = columns.len(), "Columns reordered");
        self.publish(BoardEvent::ColumnsReordered {
            board_id,
            columns: columns.clone(),
        });
        Ok(columns)
    }
}
