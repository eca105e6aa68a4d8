//! Two clients against an in-process server on a loopback port

use std::sync::Arc;
use std::time::Duration;

use board_client::{
    BoardEvent, ClientConfig, DispatchOutcome, HttpClient, LiveSubscription, MoveRequest,
    OptimisticMutator, Slot, Topic,
};
use board_server::{Config, RedbBoardStore, Server, ServerState};
use parking_lot::RwLock;
use shared::error::ErrorCode;
use shared::models::{Board, Card, CardCreate, Column};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct Running {
    client: ClientConfig,
    stop: oneshot::Sender<()>,
    handle: tokio::task::JoinHandle<Result<(), board_server::core::ServerError>>,
}

async fn start_server() -> Running {
    let config = Config::with_overrides("./target/test-data", 0);
    let store = RedbBoardStore::open_in_memory().unwrap();
    let state = ServerState::new(config.clone(), Arc::new(store));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stop_rx) = oneshot::channel::<()>();
    let server = Server::with_state(config, state);
    let handle = tokio::spawn(async move {
        server
            .serve(listener, async move {
                let _ = stop_rx.await;
            })
            .await
    });

    Running {
        client: ClientConfig::new(format!("http://{addr}")).with_timeout(5),
        stop,
        handle,
    }
}

async fn seed(http: &HttpClient) -> (Board, Column, Column, Vec<Card>) {
    let board = http.create_board("Sprint").await.unwrap();
    let todo = http.add_column(board.id, "Todo").await.unwrap();
    let done = http.add_column(board.id, "Done").await.unwrap();
    let mut cards = Vec::new();
    for text in ["c1", "c2"] {
        let card = http
            .create_card(&CardCreate {
                text: text.into(),
                column_id: todo.id,
                board_id: board.id,
            })
            .await
            .unwrap();
        cards.push(card);
    }
    (board, todo, done, cards)
}

async fn next_board_event(live: &mut LiveSubscription) -> BoardEvent {
    tokio::time::timeout(Duration::from_secs(5), live.next_event())
        .await
        .expect("timed out waiting for broadcast")
        .expect("live connection closed")
        .event
}

#[tokio::test]
async fn test_optimistic_move_reconciles_both_clients() {
    let server = start_server().await;
    let http = server.client.build_http_client().unwrap();
    let (board, todo, done, cards) = seed(&http).await;
    let (c1, c2) = (&cards[0], &cards[1]);

    // client A moves, client B only watches
    let view_a = Arc::new(RwLock::new(http.fetch_view(board.id).await.unwrap()));
    let view_b = Arc::new(RwLock::new(http.fetch_view(board.id).await.unwrap()));

    let mut live_a = LiveSubscription::connect(&server.client).await.unwrap();
    live_a.subscribe(board.id).await.unwrap();
    let mut live_b = LiveSubscription::connect(&server.client).await.unwrap();
    live_b.subscribe(board.id).await.unwrap();

    let (mutator, _failures) = OptimisticMutator::new(view_a.clone(), Arc::new(http.clone()));
    let handle = mutator
        .move_card(MoveRequest::new(c2.id, Slot::new(todo.id, 1), Slot::new(done.id, 0)))
        .unwrap();

    // A sees the move immediately
    assert_eq!(view_a.read().cards_in(done.id)[0].id, c2.id);
    assert!(view_a.read().pending_count() > 0);

    let DispatchOutcome::Cards(ack) = handle.wait().await.unwrap() else {
        panic!("expected card ack");
    };
    assert_eq!(ack.updated, 1);

    let event = next_board_event(&mut live_a).await;
    assert!(view_a.write().apply_event(&event));
    let event = next_board_event(&mut live_b).await;
    assert!(view_b.write().apply_event(&event));

    for view in [&view_a, &view_b] {
        let view = view.read();
        assert_eq!(view.pending_count(), 0);
        assert_eq!(
            view.cards_in(todo.id).iter().map(|c| (c.id, c.order)).collect::<Vec<_>>(),
            vec![(c1.id, 0)]
        );
        assert_eq!(
            view.cards_in(done.id).iter().map(|c| (c.id, c.order)).collect::<Vec<_>>(),
            vec![(c2.id, 0)]
        );
    }

    // views agree with a fresh fetch
    let fresh = http.fetch_view(board.id).await.unwrap();
    assert_eq!(fresh.cards(), view_b.read().cards());

    live_a.close().await.unwrap();
    live_b.close().await.unwrap();
    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_column_move_and_forwarding() {
    let server = start_server().await;
    let http = server.client.build_http_client().unwrap();
    let (board, todo, done, _cards) = seed(&http).await;

    let view = Arc::new(RwLock::new(http.fetch_view(board.id).await.unwrap()));
    let mut live = LiveSubscription::connect(&server.client).await.unwrap();
    live.subscribe(board.id).await.unwrap();
    let forwarder = tokio::spawn(live.forward_into(view.clone()));

    let (mutator, _failures) = OptimisticMutator::new(view.clone(), Arc::new(http.clone()));
    let handle = mutator.move_column(done.id, 1, 0).unwrap();
    let DispatchOutcome::Columns(columns) = handle.wait().await.unwrap() else {
        panic!("expected column outcome");
    };
    assert_eq!(
        columns.iter().map(|c| (c.id, c.order)).collect::<Vec<_>>(),
        vec![(done.id, 0), (todo.id, 1)]
    );

    // wait for the broadcast to reconcile the view
    tokio::time::timeout(Duration::from_secs(5), async {
        while view.read().pending_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("view never reconciled");
    assert_eq!(view.read().columns(), columns);

    // deleting the board reaches the forwarder through the global topic
    http.delete_board(board.id).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !view.read().is_deleted() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("deletion never arrived");

    server.stop.send(()).unwrap();
    forwarder.abort();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_server_errors_surface_as_codes() {
    let server = start_server().await;
    let http = server.client.build_http_client().unwrap();

    let err = http.get_board(12345).await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::BoardNotFound));
    assert!(err.is_not_found());

    let err = http.create_board("   ").await.unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ValidationFailed));

    let board = http.create_board("b").await.unwrap();
    let mut live = LiveSubscription::connect(&server.client).await.unwrap();
    live.subscribe(board.id).await.unwrap();
    http.rename_board(board.id, "renamed").await.unwrap();
    let envelope = tokio::time::timeout(Duration::from_secs(5), live.next_event())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(envelope.topic, Topic::BoardUpdate(board.id));

    drop(live);
    server.stop.send(()).unwrap();
    server.handle.await.unwrap().unwrap();
}
