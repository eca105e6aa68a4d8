//! Reconciliation Service
//!
//! 服务端权威写入：校验 → 存在性检查 → 单个原子写批次 → 回读规范状态 → 广播 → 返回。
//!
//! - 校验和 NotFound 错误都在写入之前返回，失败从不广播
//! - 请求之间不加锁：同一列的并发重排按最后写入者生效，回读保证广播内容自洽
//! - 服务不持有任何跨请求的看板内存状态，存储是唯一共享可变资源

mod boards;
mod cards;

use std::sync::Arc;

use crate::db::BoardStore;
use crate::message::Broadcaster;
use shared::error::{AppError, AppResult};
use shared::message::BoardEvent;
use shared::models::{Board, BoardId};

#[derive(Clone)]
pub struct ReconciliationService {
    store: Arc<dyn BoardStore>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl ReconciliationService {
    pub fn new(store: Arc<dyn BoardStore>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { store, broadcaster }
    }

    pub fn store(&self) -> &Arc<dyn BoardStore> {
        &self.store
    }

    fn publish(&self, event: BoardEvent) {
        let topic = event.topic();
        let delivered = self.broadcaster.publish(event);
        tracing::debug!(topic = %topic, delivered, "Reconciled change broadcast");
    }

    fn require_board(&self, board_id: BoardId) -> AppResult<Board> {
        self.store
            .get_board(board_id)?
            .ok_or_else(|| AppError::board_not_found(board_id))
    }
}
