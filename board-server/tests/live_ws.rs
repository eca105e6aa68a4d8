//! WebSocket subscription round trip on a loopback port

use std::sync::Arc;
use std::time::Duration;

use board_server::{Config, RedbBoardStore, Server, ServerState};
use futures::{SinkExt, StreamExt};
use shared::message::{BoardEvent, ServerFrame, Topic};
use shared::models::CardCreate;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

type Socket =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_frame(socket: &mut Socket) -> ServerFrame {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send(socket: &mut Socket, json: serde_json::Value) {
    socket.send(Message::text(json.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_subscribe_receive_unsubscribe() {
    let config = Config::with_overrides("./target/test-data", 0);
    let store = RedbBoardStore::open_in_memory().unwrap();
    let state = ServerState::new(config.clone(), Arc::new(store));
    let service = state.service.clone();

    let board = service.create_board("Live").unwrap();
    let column = service.add_column(board.id, "Todo").unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = Server::with_state(config, state);
    let handle = tokio::spawn(async move {
        server
            .serve(listener, async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();

    send(&mut socket, serde_json::json!({"type": "subscribe", "boardId": board.id})).await;
    assert_eq!(
        next_frame(&mut socket).await,
        ServerFrame::Subscribed { board_id: board.id }
    );

    let card = service
        .create_card(&CardCreate {
            text: "hello".into(),
            column_id: column.id,
            board_id: board.id,
        })
        .unwrap();

    let ServerFrame::Event(envelope) = next_frame(&mut socket).await else {
        panic!("expected event frame");
    };
    assert_eq!(envelope.topic, Topic::CardCreate(board.id));
    assert_eq!(envelope.event, BoardEvent::CardCreated(card));

    send(&mut socket, serde_json::json!({"type": "nonsense"})).await;
    assert!(matches!(next_frame(&mut socket).await, ServerFrame::Error { .. }));

    send(&mut socket, serde_json::json!({"type": "unsubscribe", "boardId": board.id})).await;
    assert_eq!(
        next_frame(&mut socket).await,
        ServerFrame::Unsubscribed { board_id: board.id }
    );

    // board events stop, global events keep flowing
    service.rename_board(board.id, "Renamed").unwrap();
    let other = service.create_board("Other").unwrap();
    let ServerFrame::Event(envelope) = next_frame(&mut socket).await else {
        panic!("expected event frame");
    };
    assert_eq!(envelope.topic, Topic::BoardCreate);
    assert_eq!(envelope.event.board_id(), other.id);

    socket.close(None).await.unwrap();
    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
