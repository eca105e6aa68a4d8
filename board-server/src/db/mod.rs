//! 存储层
//!
//! [`BoardStore`] 是协调服务与具体存储之间的边界；生产实现是基于 redb 的
//! [`RedbBoardStore`]。

pub mod storage;

pub use storage::{BoardStore, RedbBoardStore, StorageError, StorageResult, WriteBatch, WriteOp};
