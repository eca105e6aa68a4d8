//! Per-connection subscriber
//!
//! 每个实时连接持有一个 [`Subscriber`]：全局主题始终接收，看板主题按
//! `join`/`leave` 增减。每个已加入的看板对应一个转发任务，把该看板的
//! broadcast receiver 汇入连接自己的 mpsc 队列。

use shared::message::Envelope;
use shared::models::BoardId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use super::BroadcastRouter;

pub struct Subscriber {
    router: BroadcastRouter,
    tx: mpsc::Sender<Arc<Envelope>>,
    rx: mpsc::Receiver<Arc<Envelope>>,
    global: JoinHandle<()>,
    boards: HashMap<BoardId, JoinHandle<()>>,
}

impl Subscriber {
    /// Subscribe to global topics; must be called inside a tokio runtime
    pub fn new(router: BroadcastRouter) -> Self {
        let (tx, rx) = mpsc::channel(router.capacity());
        let global = spawn_forwarder(router.subscribe_global(), tx.clone(), None);
        Self {
            router,
            tx,
            rx,
            global,
            boards: HashMap::new(),
        }
    }

    /// Start receiving a board's topics; `false` if already joined
    ///
    /// The board receiver is registered before this returns, so every event
    /// published afterwards is delivered.
    pub fn join(&mut self, board_id: BoardId) -> bool {
        if let Some(handle) = self.boards.get(&board_id)
            && !handle.is_finished()
        {
            return false;
        }
        let rx = self.router.subscribe_board(board_id);
        let handle = spawn_forwarder(rx, self.tx.clone(), Some(board_id));
        if let Some(stale) = self.boards.insert(board_id, handle) {
            stale.abort();
        }
        tracing::debug!(board_id, "Subscriber joined board");
        true
    }

    /// Stop receiving a board's topics; `false` if not joined
    pub fn leave(&mut self, board_id: BoardId) -> bool {
        match self.boards.remove(&board_id) {
            Some(handle) => {
                handle.abort();
                tracing::debug!(board_id, "Subscriber left board");
                true
            }
            None => false,
        }
    }

    pub fn is_joined(&self, board_id: BoardId) -> bool {
        self.boards
            .get(&board_id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Joined boards, ascending
    pub fn joined(&self) -> Vec<BoardId> {
        let mut ids: Vec<_> = self.boards.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Next envelope for this connection
    pub async fn recv(&mut self) -> Option<Arc<Envelope>> {
        self.rx.recv().await
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.global.abort();
        for (_, handle) in self.boards.drain() {
            handle.abort();
        }
    }
}

fn spawn_forwarder(
    mut rx: broadcast::Receiver<Arc<Envelope>>,
    tx: mpsc::Sender<Arc<Envelope>>,
    board_id: Option<BoardId>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    if tx.send(envelope).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // 消息携带完整状态，跳过即可，下一条会覆盖
                    tracing::warn!(?board_id, lagged = n, "Subscriber lagged, skipping messages");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
