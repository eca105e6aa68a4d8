//! Optimistic mutator: plan, apply locally, dispatch in the background

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use shared::models::{BoardId, CardPlacement, Column, ColumnId, ColumnPlacement, ReorderAck};
use shared::ordering::{
    MoveRequest, ReorderPlan, Slot, plan_card_move, plan_column_move, renumber,
};

use super::BoardView;
use crate::{ClientError, ClientResult};

/// View shared between the mutator and the live subscription
pub type SharedView = Arc<RwLock<BoardView>>;

/// Sends reorder payloads to the server
#[async_trait]
pub trait ReorderDispatch: Send + Sync + 'static {
    async fn reorder_columns(
        &self,
        board_id: BoardId,
        columns: Vec<ColumnPlacement>,
    ) -> ClientResult<Vec<Column>>;

    async fn reorder_cards(&self, cards: Vec<CardPlacement>) -> ClientResult<ReorderAck>;
}

/// Server answer to a dispatched plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Nothing was sent
    Noop,
    Columns(Vec<Column>),
    Cards(ReorderAck),
}

/// Reported on the error channel when a dispatch fails
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    pub board_id: BoardId,
    pub request: MoveRequest,
    pub message: String,
}

/// Handle to an in-flight dispatch
#[derive(Debug)]
pub struct DispatchHandle {
    task: Option<JoinHandle<ClientResult<DispatchOutcome>>>,
}

impl DispatchHandle {
    fn noop() -> Self {
        Self { task: None }
    }

    /// The move planned to nothing and was not sent
    pub fn is_noop(&self) -> bool {
        self.task.is_none()
    }

    /// Wait for the server response
    pub async fn wait(self) -> ClientResult<DispatchOutcome> {
        match self.task {
            None => Ok(DispatchOutcome::Noop),
            Some(task) => task
                .await
                .map_err(|e| ClientError::Dispatch(e.to_string()))?,
        }
    }
}

pub struct OptimisticMutator<D: ReorderDispatch> {
    view: SharedView,
    dispatcher: Arc<D>,
    failures: mpsc::UnboundedSender<DispatchFailure>,
}

impl<D: ReorderDispatch> OptimisticMutator<D> {
    /// Returns the mutator and the receiving end of its failure channel
    pub fn new(view: SharedView, dispatcher: Arc<D>) -> (Self, mpsc::UnboundedReceiver<DispatchFailure>) {
        let (failures, rx) = mpsc::unbounded_channel();
        (
            Self {
                view,
                dispatcher,
                failures,
            },
            rx,
        )
    }

    pub fn view(&self) -> &SharedView {
        &self.view
    }

    /// Move a column within its board
    ///
    /// The view is updated before this returns; must be called inside a tokio runtime.
    pub fn move_column(
        &self,
        column_id: i64,
        source_index: usize,
        destination_index: usize,
    ) -> ClientResult<DispatchHandle> {
        let board_id = self.view.read().board_id();
        let request = MoveRequest::new(
            column_id,
            Slot::new(board_id, source_index),
            Slot::new(board_id, destination_index),
        );

        let payload = {
            let mut view = self.view.write();
            let plan = plan_column_move(&view.snapshot(), &request)?;
            view.apply_plan(&plan);
            match plan {
                ReorderPlan::Columns(p) => Some(Payload::Columns(p.board_id, p.placements())),
                _ => None,
            }
        };
        Ok(self.dispatch(request, payload))
    }

    /// Move a card within its column or into another column
    ///
    /// The view is updated before this returns; must be called inside a tokio runtime.
    /// The request carries the full renumbered sequence of every column the
    /// move touched, so a later move from the same snapshot overwrites an
    /// earlier one entirely.
    pub fn move_card(&self, request: MoveRequest) -> ClientResult<DispatchHandle> {
        let payload = {
            let mut view = self.view.write();
            let plan = plan_card_move(&view.snapshot(), &view.cards(), &request)?;
            let source_column = view
                .card_state(request.entity_id)
                .map(|s| s.value().column_id);
            view.apply_plan(&plan);

            match (plan, source_column) {
                (ReorderPlan::Cards(p), Some(source_column)) => {
                    let mut columns = vec![source_column];
                    if request.destination.container_id != source_column {
                        columns.push(request.destination.container_id);
                    }
                    let placements = columns
                        .into_iter()
                        .flat_map(|column_id| column_sequence(&view, p.board_id, column_id))
                        .collect();
                    Some(Payload::Cards(p.board_id, placements))
                }
                _ => None,
            }
        };
        Ok(self.dispatch(request, payload))
    }

    fn dispatch(&self, request: MoveRequest, payload: Option<Payload>) -> DispatchHandle {
        let Some(payload) = payload else {
            return DispatchHandle::noop();
        };
        let board_id = match &payload {
            Payload::Columns(board_id, _) | Payload::Cards(board_id, _) => *board_id,
        };

        let dispatcher = self.dispatcher.clone();
        let failures = self.failures.clone();
        let task = tokio::spawn(async move {
            let result = match payload {
                Payload::Columns(board_id, columns) => dispatcher
                    .reorder_columns(board_id, columns)
                    .await
                    .map(DispatchOutcome::Columns),
                Payload::Cards(_, cards) => dispatcher
                    .reorder_cards(cards)
                    .await
                    .map(DispatchOutcome::Cards),
            };

            if let Err(e) = &result {
                // 不回滚本地状态，等待广播覆盖
                tracing::warn!(board_id, entity_id = request.entity_id, error = %e, "Reorder dispatch failed");
                let _ = failures.send(DispatchFailure {
                    board_id,
                    request,
                    message: e.to_string(),
                });
            }
            result
        });

        DispatchHandle { task: Some(task) }
    }
}

/// Request body for one dispatch
enum Payload {
    Columns(BoardId, Vec<ColumnPlacement>),
    Cards(BoardId, Vec<CardPlacement>),
}

/// The column's cards as the view now orders them, renumbered `0..n-1`
fn column_sequence(view: &BoardView, board_id: BoardId, column_id: ColumnId) -> Vec<CardPlacement> {
    renumber(&view.cards_in(column_id))
        .into_iter()
        .map(|a| CardPlacement {
            id: a.id,
            order: a.order,
            column_id,
            board_id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use shared::error::{AppError, ErrorCode};
    use shared::models::{Board, Card};

    #[derive(Default)]
    struct FakeDispatch {
        fail: bool,
        columns: Mutex<Vec<Vec<ColumnPlacement>>>,
        cards: Mutex<Vec<Vec<CardPlacement>>>,
    }

    #[async_trait]
    impl ReorderDispatch for FakeDispatch {
        async fn reorder_columns(
            &self,
            _board_id: BoardId,
            columns: Vec<ColumnPlacement>,
        ) -> ClientResult<Vec<Column>> {
            self.columns.lock().push(columns.clone());
            if self.fail {
                return Err(ClientError::Api(AppError::new(ErrorCode::DatabaseError)));
            }
            Ok(columns
                .into_iter()
                .map(|p| Column {
                    id: p.id,
                    title: String::new(),
                    order: p.order,
                })
                .collect())
        }

        async fn reorder_cards(&self, cards: Vec<CardPlacement>) -> ClientResult<ReorderAck> {
            let n = cards.len();
            self.cards.lock().push(cards);
            if self.fail {
                return Err(ClientError::Api(AppError::card_not_found(1)));
            }
            Ok(ReorderAck::new(n))
        }
    }

    fn shared_view() -> SharedView {
        let column = |id, order| Column {
            id,
            title: String::new(),
            order,
        };
        let card = |id, column_id, order| Card {
            id,
            text: String::new(),
            order,
            column_id,
            board_id: 1,
            created_at: 0,
            updated_at: 0,
        };
        let board = Board {
            id: 1,
            title: "b".into(),
            columns: vec![column(10, 0), column(20, 1)],
            created_at: 0,
            updated_at: 0,
        };
        Arc::new(RwLock::new(BoardView::load(
            board,
            vec![card(100, 10, 0), card(101, 10, 1)],
        )))
    }

    #[tokio::test]
    async fn test_move_card_applies_then_dispatches() {
        let dispatcher = Arc::new(FakeDispatch::default());
        let (mutator, mut failures) = OptimisticMutator::new(shared_view(), dispatcher.clone());

        let handle = mutator
            .move_card(MoveRequest::new(101, Slot::new(10, 1), Slot::new(20, 0)))
            .unwrap();
        // applied before the dispatch completes
        {
            let view = mutator.view().read();
            assert_eq!(view.cards_in(20)[0].id, 101);
            assert!(view.card_state(101).unwrap().is_local());
        }

        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Cards(ReorderAck::new(2)));
        let sent = dispatcher.cards.lock().clone();
        assert_eq!(sent.len(), 1);
        // both touched columns go out whole: source first, then destination
        let placed: Vec<_> = sent[0].iter().map(|p| (p.id, p.column_id, p.order)).collect();
        assert_eq!(placed, vec![(100, 10, 0), (101, 20, 0)]);
        assert!(failures.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_move_card_sends_whole_column() {
        let dispatcher = Arc::new(FakeDispatch::default());
        let view = shared_view();
        {
            let mut v = view.write();
            let board = v.snapshot();
            let mut cards = v.cards();
            cards.push(Card {
                id: 102,
                text: String::new(),
                order: 2,
                column_id: 10,
                board_id: 1,
                created_at: 0,
                updated_at: 0,
            });
            *v = BoardView::load(board, cards);
        }
        let (mutator, _failures) = OptimisticMutator::new(view, dispatcher.clone());

        // planner only changes 101 and 102, the request still carries 100
        mutator
            .move_card(MoveRequest::new(102, Slot::new(10, 2), Slot::new(10, 1)))
            .unwrap()
            .wait()
            .await
            .unwrap();
        let sent = dispatcher.cards.lock().clone();
        let placed: Vec<_> = sent[0].iter().map(|p| (p.id, p.order)).collect();
        assert_eq!(placed, vec![(100, 0), (102, 1), (101, 2)]);
        assert!(sent[0].iter().all(|p| p.column_id == 10 && p.board_id == 1));
    }

    #[tokio::test]
    async fn test_noop_is_not_dispatched() {
        let dispatcher = Arc::new(FakeDispatch::default());
        let (mutator, _failures) = OptimisticMutator::new(shared_view(), dispatcher.clone());

        let handle = mutator
            .move_card(MoveRequest::new(100, Slot::new(10, 0), Slot::new(10, 0)))
            .unwrap();
        assert!(handle.is_noop());
        assert_eq!(handle.wait().await.unwrap(), DispatchOutcome::Noop);

        // clamped append of the last card
        let handle = mutator
            .move_card(MoveRequest::new(101, Slot::new(10, 1), Slot::new(10, 9)))
            .unwrap();
        assert!(handle.is_noop());
        assert!(dispatcher.cards.lock().is_empty());
        assert_eq!(mutator.view().read().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_reported_without_rollback() {
        let dispatcher = Arc::new(FakeDispatch {
            fail: true,
            ..Default::default()
        });
        let (mutator, mut failures) = OptimisticMutator::new(shared_view(), dispatcher);

        let handle = mutator.move_column(20, 1, 0).unwrap();
        assert!(handle.wait().await.is_err());

        let failure = failures.recv().await.unwrap();
        assert_eq!(failure.board_id, 1);
        assert_eq!(failure.request.entity_id, 20);

        // optimistic state stays until a canonical update arrives
        let view = mutator.view().read();
        assert_eq!(view.columns()[0].id, 20);
        assert_eq!(view.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_entity_is_rejected_locally() {
        let dispatcher = Arc::new(FakeDispatch::default());
        let (mutator, _failures) = OptimisticMutator::new(shared_view(), dispatcher.clone());

        let err = mutator
            .move_card(MoveRequest::new(999, Slot::new(10, 0), Slot::new(20, 0)))
            .unwrap_err();
        assert!(err.is_not_found());
        let err = mutator.move_column(999, 0, 1).unwrap_err();
        assert!(err.is_not_found());
        assert!(dispatcher.cards.lock().is_empty());
    }
}
