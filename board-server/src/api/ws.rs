//! Live subscription endpoint
//!
//! GET /ws
//!
//! 协议:
//! - Client → Server: [`SubscriptionCommand`] (`subscribe` / `unsubscribe`)
//! - Server → Client: [`ServerFrame`] (`event` / `subscribed` / `unsubscribed` / `error`)
//!
//! 全局主题 (`board:create`, `board:delete`) 连接后自动接收；看板主题需要先订阅。
//! 断开连接即释放全部订阅。

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use shared::message::{ServerFrame, SubscriptionCommand};
use tokio::time::Duration;

use crate::core::ServerState;
use crate::message::Subscriber;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws", get(handle_ws))
}

pub async fn handle_ws(State(state): State<ServerState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_session(socket, state))
}

async fn ws_session(socket: WebSocket, state: ServerState) {
    let (mut sink, mut stream) = socket.split();
    let mut subscriber = Subscriber::new(state.router.clone());

    tracing::info!("Live connection opened");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            envelope = subscriber.recv() => {
                let Some(envelope) = envelope else { break };
                let frame = ServerFrame::Event((*envelope).clone());
                if send_frame(&mut sink, &frame).await.is_err() {
                    break;
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let frame = handle_command(&mut subscriber, &text);
                        if send_frame(&mut sink, &frame).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "Live connection error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::info!(joined = ?subscriber.joined(), "Live connection closed");
}

fn handle_command(subscriber: &mut Subscriber, text: &str) -> ServerFrame {
    match serde_json::from_str::<SubscriptionCommand>(text) {
        Ok(SubscriptionCommand::Subscribe { board_id }) => {
            subscriber.join(board_id);
            ServerFrame::Subscribed { board_id }
        }
        Ok(SubscriptionCommand::Unsubscribe { board_id }) => {
            subscriber.leave(board_id);
            ServerFrame::Unsubscribed { board_id }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Malformed subscription command");
            ServerFrame::Error {
                message: format!("Invalid command: {e}"),
            }
        }
    }
}

async fn send_frame<S>(sink: &mut S, frame: &ServerFrame) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize live frame");
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
