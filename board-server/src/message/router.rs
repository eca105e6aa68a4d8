//! BroadcastRouter: global channel + one channel per watched board

use dashmap::DashMap;
use shared::message::{BoardEvent, Envelope};
use shared::models::BoardId;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::Broadcaster;

/// Broadcast channel 容量默认值
pub const DEFAULT_CAPACITY: usize = 256;

/// 按看板分发的广播路由
///
/// 每个看板的通道在第一次订阅时创建，最后一个接收者离开后在下一次发布时回收。
/// 没有订阅者的看板事件直接丢弃。
#[derive(Clone)]
pub struct BroadcastRouter {
    global: broadcast::Sender<Arc<Envelope>>,
    boards: Arc<DashMap<BoardId, broadcast::Sender<Arc<Envelope>>>>,
    capacity: usize,
}

impl Default for BroadcastRouter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastRouter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (global, _) = broadcast::channel(capacity);
        Self {
            global,
            boards: Arc::new(DashMap::new()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Receiver for global topics (board create/delete)
    pub fn subscribe_global(&self) -> broadcast::Receiver<Arc<Envelope>> {
        self.global.subscribe()
    }

    /// Receiver for one board's topics
    pub fn subscribe_board(&self, board_id: BoardId) -> broadcast::Receiver<Arc<Envelope>> {
        self.boards
            .entry(board_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of live receivers on a board's channel
    pub fn board_receivers(&self, board_id: BoardId) -> usize {
        self.boards
            .get(&board_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Number of board channels currently allocated
    pub fn board_channel_count(&self) -> usize {
        self.boards.len()
    }

    /// Drop board channels nobody listens to, returns how many were removed
    pub fn prune_idle(&self) -> usize {
        let before = self.boards.len();
        self.boards.retain(|_, tx| tx.receiver_count() > 0);
        before.saturating_sub(self.boards.len())
    }

    fn send_board(&self, board_id: BoardId, envelope: Arc<Envelope>) -> usize {
        let Some(tx) = self.boards.get(&board_id).map(|tx| tx.clone()) else {
            return 0;
        };
        match tx.send(envelope) {
            Ok(n) => n,
            Err(_) => {
                // 无订阅者时 send 返回 Err，顺便回收通道
                self.boards
                    .remove_if(&board_id, |_, tx| tx.receiver_count() == 0);
                0
            }
        }
    }
}

impl Broadcaster for BroadcastRouter {
    fn publish(&self, event: BoardEvent) -> usize {
        let envelope = Arc::new(Envelope::new(event));
        let topic = envelope.topic;

        let delivered = match topic.board_id() {
            Some(board_id) => self.send_board(board_id, envelope),
            None => {
                let board_id = envelope.event.board_id();
                let deleted = matches!(envelope.event, BoardEvent::BoardDeleted(_));
                let n = self.global.send(envelope).unwrap_or(0);
                if deleted {
                    // 关闭该看板的通道，订阅者的转发任务随之结束
                    self.boards.remove(&board_id);
                }
                n
            }
        };

        tracing::debug!(topic = %topic, delivered, "Broadcast published");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::Topic;
    use shared::models::{Board, BoardDeleted, CardDeleted};

    fn board(id: BoardId) -> Board {
        Board {
            id,
            title: "b".into(),
            columns: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn board_events_reach_only_that_board() {
        let router = BroadcastRouter::new(16);
        let mut rx1 = router.subscribe_board(1);
        let mut rx2 = router.subscribe_board(2);

        let delivered = router.publish(BoardEvent::BoardUpdated(board(1)));
        assert_eq!(delivered, 1);

        let got = rx1.recv().await.unwrap();
        assert_eq!(got.topic, Topic::BoardUpdate(1));
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn global_events_reach_global_subscribers() {
        let router = BroadcastRouter::new(16);
        let mut global = router.subscribe_global();
        let mut board_rx = router.subscribe_board(1);

        router.publish(BoardEvent::BoardCreated(board(5)));
        let got = global.recv().await.unwrap();
        assert_eq!(got.topic, Topic::BoardCreate);
        assert!(board_rx.try_recv().is_err());
    }

    #[test]
    fn unwatched_board_events_are_dropped() {
        let router = BroadcastRouter::new(16);
        let delivered = router.publish(BoardEvent::CardDeleted(CardDeleted {
            card_id: 1,
            board_id: 3,
        }));
        assert_eq!(delivered, 0);
        assert_eq!(router.board_channel_count(), 0);
    }

    #[test]
    fn idle_channels_are_pruned() {
        let router = BroadcastRouter::new(16);
        let rx = router.subscribe_board(1);
        assert_eq!(router.board_receivers(1), 1);
        drop(rx);

        // publish to an idle channel reclaims it
        assert_eq!(router.publish(BoardEvent::BoardUpdated(board(1))), 0);
        assert_eq!(router.board_channel_count(), 0);

        let _rx = router.subscribe_board(2);
        let rx3 = router.subscribe_board(3);
        drop(rx3);
        assert_eq!(router.prune_idle(), 1);
        assert_eq!(router.board_channel_count(), 1);
    }

    #[tokio::test]
    async fn board_delete_closes_board_channel() {
        let router = BroadcastRouter::new(16);
        let mut board_rx = router.subscribe_board(1);

        router.publish(BoardEvent::BoardDeleted(BoardDeleted { board_id: 1 }));
        assert_eq!(router.board_channel_count(), 0);
        assert!(matches!(
            board_rx.recv().await,
            Err(broadcast::error::RecvError::Closed)
        ));
    }
}
