//! Live subscription over the server's `/ws` endpoint

use std::collections::VecDeque;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use shared::message::{Envelope, ServerFrame, SubscriptionCommand};
use shared::models::BoardId;

use crate::optimistic::SharedView;
use crate::{ClientConfig, ClientError, ClientResult};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long `subscribe`/`unsubscribe` wait for the server's ack
const ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// One live connection
///
/// ```ignore
/// let mut live = LiveSubscription::connect(&config).await?;
/// live.subscribe(board_id).await?;
/// while let Some(envelope) = live.next_event().await {
///     view.write().apply_event(&envelope.event);
/// }
/// ```
pub struct LiveSubscription {
    sink: SplitSink<Socket, Message>,
    frames: mpsc::UnboundedReceiver<ServerFrame>,
    /// Events received while waiting for an ack
    pending: VecDeque<Envelope>,
    reader: JoinHandle<()>,
}

impl LiveSubscription {
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let url = config.ws_url();
        let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        tracing::debug!(url = %url, "Live connection established");

        let (sink, mut stream) = socket.split();
        let (tx, frames) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(frame) => {
                            if tx.send(frame).is_err() {
                                break;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "Ignoring malformed live frame"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(error = %e, "Live connection error");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            sink,
            frames,
            pending: VecDeque::new(),
            reader,
        })
    }

    /// Join a board's topics; returns once the server confirmed
    pub async fn subscribe(&mut self, board_id: BoardId) -> ClientResult<()> {
        self.send(&SubscriptionCommand::Subscribe { board_id }).await?;
        self.await_ack(ServerFrame::Subscribed { board_id }).await
    }

    pub async fn unsubscribe(&mut self, board_id: BoardId) -> ClientResult<()> {
        self.send(&SubscriptionCommand::Unsubscribe { board_id })
            .await?;
        self.await_ack(ServerFrame::Unsubscribed { board_id }).await
    }

    /// Next broadcast envelope; `None` once the connection is gone
    pub async fn next_event(&mut self) -> Option<Envelope> {
        if let Some(envelope) = self.pending.pop_front() {
            return Some(envelope);
        }
        loop {
            match self.frames.recv().await? {
                ServerFrame::Event(envelope) => return Some(envelope),
                ServerFrame::Error { message } => {
                    tracing::warn!(%message, "Server rejected live command");
                }
                _ => {}
            }
        }
    }

    /// Apply every received event to `view` until the connection closes
    ///
    /// Returns how many events touched the view.
    pub async fn forward_into(mut self, view: SharedView) -> usize {
        let mut applied = 0;
        while let Some(envelope) = self.next_event().await {
            if view.write().apply_event(&envelope.event) {
                applied += 1;
            }
        }
        applied
    }

    pub async fn close(mut self) -> ClientResult<()> {
        self.sink.send(Message::Close(None)).await?;
        Ok(())
    }

    async fn send(&mut self, command: &SubscriptionCommand) -> ClientResult<()> {
        let json = serde_json::to_string(command)?;
        self.sink.send(Message::text(json)).await?;
        Ok(())
    }

    async fn await_ack(&mut self, expected: ServerFrame) -> ClientResult<()> {
        let wait = async {
            loop {
                match self.frames.recv().await {
                    Some(frame) if frame == expected => return Ok(()),
                    Some(ServerFrame::Event(envelope)) => self.pending.push_back(envelope),
                    Some(ServerFrame::Error { message }) => {
                        return Err(ClientError::InvalidResponse(message));
                    }
                    Some(_) => {}
                    None => return Err(ClientError::Disconnected),
                }
            }
        };
        tokio::time::timeout(ACK_TIMEOUT, wait)
            .await
            .map_err(|_| ClientError::InvalidResponse("Timed out waiting for ack".into()))?
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
