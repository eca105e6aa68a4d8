//! redb-based board store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `boards` | `board_id` | `Board` (JSON) | Boards with their embedded column sequence |
//! | `cards` | `card_id` | `Card` (JSON) | Cards |
//! | `board_cards` | `(board_id, card_id)` | `()` | Per-board card index, range-scanned |
//!
//! # Atomicity
//!
//! Every [`WriteBatch`] runs in a single write transaction. Any failure,
//! including a placement for a card that no longer exists, drops the
//! transaction uncommitted so none of the batch lands.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::error::AppError;
use shared::models::{Board, BoardId, Card, CardId, CardPlacement, ColumnId};
use shared::ordering::sort_by_order;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// key = board_id, value = JSON-serialized Board
const BOARDS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("boards");

/// key = card_id, value = JSON-serialized Card
const CARDS_TABLE: TableDefinition<i64, &[u8]> = TableDefinition::new("cards");

/// key = (board_id, card_id), value = empty (index)
const BOARD_CARDS_TABLE: TableDefinition<(i64, i64), ()> = TableDefinition::new("board_cards");

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    #[error("Card {card_id} does not belong to board {board_id}")]
    BoardMismatch { card_id: CardId, board_id: BoardId },
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CardNotFound(id) => AppError::card_not_found(id),
            StorageError::BoardMismatch { card_id, board_id } => AppError::with_message(
                shared::error::ErrorCode::BoardMismatch,
                format!("Card {card_id} does not belong to board {board_id}"),
            ),
            other => AppError::database(other.to_string()),
        }
    }
}

/// One mutation inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert or replace a board (columns included)
    PutBoard(Board),
    /// Remove a board and every card on it
    DeleteBoard(BoardId),
    /// Insert or replace a card
    PutCard(Card),
    /// Move an existing card: `(order, columnId)` plus its new `updatedAt`
    PlaceCard(CardPlacement, i64),
    /// Remove a card; missing cards are ignored
    DeleteCard(CardId),
}

/// Ops applied atomically, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn with(mut self, op: WriteOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl FromIterator<WriteOp> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = WriteOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl Extend<WriteOp> for WriteBatch {
    fn extend<I: IntoIterator<Item = WriteOp>>(&mut self, iter: I) {
        self.ops.extend(iter);
    }
}

/// 看板存储边界
///
/// 同步接口：写事务提交时会 fsync，HTTP 层通过 `spawn_blocking` 调用，不在 async 任务里直接执行。
pub trait BoardStore: Send + Sync {
    fn get_board(&self, id: BoardId) -> StorageResult<Option<Board>>;

    /// All boards, newest first
    fn list_boards(&self) -> StorageResult<Vec<Board>>;

    fn get_card(&self, id: CardId) -> StorageResult<Option<Card>>;

    /// Cards for the given ids, in the order asked; missing ids are skipped
    fn get_cards(&self, ids: &[CardId]) -> StorageResult<Vec<Card>>;

    /// Cards of a board sorted by `(order, id)`
    fn cards_for_board(&self, board_id: BoardId) -> StorageResult<Vec<Card>>;

    /// Cards of one column sorted by `(order, id)`
    fn cards_for_column(&self, board_id: BoardId, column_id: ColumnId) -> StorageResult<Vec<Card>> {
        let mut cards = self.cards_for_board(board_id)?;
        cards.retain(|c| c.column_id == column_id);
        Ok(cards)
    }

    /// Apply every op in one atomic write
    fn apply(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Cheap liveness probe
    fn ping(&self) -> StorageResult<()>;
}

/// Board store backed by redb
#[derive(Clone)]
pub struct RedbBoardStore {
    db: Arc<Database>,
}

impl RedbBoardStore {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable once `commit()` returns (copy-on-write with an
    /// atomic root swap), so a crash never leaves a half-applied batch.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, throwaway instances)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(BOARDS_TABLE)?;
            let _ = write_txn.open_table(CARDS_TABLE)?;
            let _ = write_txn.open_table(BOARD_CARDS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn apply_op(txn: &WriteTransaction, op: WriteOp) -> StorageResult<()> {
        let mut boards = txn.open_table(BOARDS_TABLE)?;
        let mut cards = txn.open_table(CARDS_TABLE)?;
        let mut index = txn.open_table(BOARD_CARDS_TABLE)?;

        match op {
            WriteOp::PutBoard(board) => {
                let value = serde_json::to_vec(&board)?;
                boards.insert(board.id, value.as_slice())?;
            }
            WriteOp::DeleteBoard(board_id) => {
                let mut card_ids = Vec::new();
                for result in index.range((board_id, i64::MIN)..=(board_id, i64::MAX))? {
                    let (key, _) = result?;
                    card_ids.push(key.value().1);
                }
                for card_id in card_ids {
                    cards.remove(card_id)?;
                    index.remove((board_id, card_id))?;
                }
                boards.remove(board_id)?;
            }
            WriteOp::PutCard(card) => {
                let previous_board = match cards.get(card.id)? {
                    Some(value) => Some(serde_json::from_slice::<Card>(value.value())?.board_id),
                    None => None,
                };
                if let Some(previous) = previous_board
                    && previous != card.board_id
                {
                    index.remove((previous, card.id))?;
                }
                let value = serde_json::to_vec(&card)?;
                cards.insert(card.id, value.as_slice())?;
                index.insert((card.board_id, card.id), ())?;
            }
            WriteOp::PlaceCard(placement, updated_at) => {
                let mut card: Card = match cards.get(placement.id)? {
                    Some(value) => serde_json::from_slice(value.value())?,
                    None => return Err(StorageError::CardNotFound(placement.id)),
                };
                if card.board_id != placement.board_id {
                    return Err(StorageError::BoardMismatch {
                        card_id: card.id,
                        board_id: placement.board_id,
                    });
                }
                card.place(&placement);
                card.updated_at = updated_at;
                let value = serde_json::to_vec(&card)?;
                cards.insert(card.id, value.as_slice())?;
            }
            WriteOp::DeleteCard(card_id) => {
                let board_id = match cards.remove(card_id)? {
                    Some(value) => Some(serde_json::from_slice::<Card>(value.value())?.board_id),
                    None => None,
                };
                if let Some(board_id) = board_id {
                    index.remove((board_id, card_id))?;
                }
            }
        }
        Ok(())
    }
}

impl BoardStore for RedbBoardStore {
    fn get_board(&self, id: BoardId) -> StorageResult<Option<Board>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BOARDS_TABLE)?;

        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_boards(&self) -> StorageResult<Vec<Board>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BOARDS_TABLE)?;

        let mut boards = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let board: Board = serde_json::from_slice(value.value())?;
            boards.push(board);
        }

        boards.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(boards)
    }

    fn get_card(&self, id: CardId) -> StorageResult<Option<Card>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARDS_TABLE)?;

        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn get_cards(&self, ids: &[CardId]) -> StorageResult<Vec<Card>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARDS_TABLE)?;

        let mut cards = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(value) = table.get(*id)? {
                cards.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(cards)
    }

    fn cards_for_board(&self, board_id: BoardId) -> StorageResult<Vec<Card>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(BOARD_CARDS_TABLE)?;
        let table = read_txn.open_table(CARDS_TABLE)?;

        let mut cards = Vec::new();
        for result in index.range((board_id, i64::MIN)..=(board_id, i64::MAX))? {
            let (key, _) = result?;
            if let Some(value) = table.get(key.value().1)? {
                cards.push(serde_json::from_slice::<Card>(value.value())?);
            }
        }

        sort_by_order(&mut cards);
        Ok(cards)
    }

    fn apply(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        tracing::debug!(ops = batch.len(), "Applying write batch");
        let write_txn = self.db.begin_write()?;
        for op in batch.ops {
            // 出错时 write_txn 未提交即被丢弃，整批回滚
            Self::apply_op(&write_txn, op)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn ping(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(BOARDS_TABLE)?;
        Ok(())
    }
}
