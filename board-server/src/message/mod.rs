//! 看板作用域广播
//!
//! ```text
//! ReconciliationService
//!       │ BoardEvent (canonical state)
//!       ▼
//! BroadcastRouter
//!   ├── global: Sender<Envelope>        board:create / board:delete
//!   └── boards: board_id → Sender<Envelope>
//!         │
//!         ▼
//!   Subscriber (one per WS connection, join/leave per board)
//! ```
//!
//! 发起请求的客户端同样会收到自己触发的消息；每条消息都是完整规范状态，
//! 客户端按 id 替换即可。

pub mod router;
pub mod subscriber;

pub use router::BroadcastRouter;
pub use subscriber::Subscriber;

use shared::message::BoardEvent;

/// 广播能力，构造时注入到协调服务中
pub trait Broadcaster: Send + Sync {
    /// Publish a reconciled change; returns how many receivers got it
    fn publish(&self, event: BoardEvent) -> usize;
}
