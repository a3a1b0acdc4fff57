// File: tests/reconciler_rollback.rs
// Server rejections must leave the board exactly as it was before the drop.
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tablo::client::{GatewayError, MoveGateway};
use tablo::model::{Board, Card, Column};
use tablo::reconciler::{MoveGesture, MoveOutcome, Reconciler};
use tablo::store::BoardStore;
use tokio::sync::Mutex;

/// Answers each move with the next scripted verdict; accepts once the
/// script runs out. A shared call counter doubles as the assertion that
/// the server was actually consulted.
struct ScriptedGateway {
    verdicts: StdMutex<VecDeque<Result<(), GatewayError>>>,
    calls: StdMutex<usize>,
}

impl ScriptedGateway {
    fn new(verdicts: Vec<Result<(), GatewayError>>) -> Self {
        Self {
            verdicts: StdMutex::new(verdicts.into()),
            calls: StdMutex::new(0),
        }
    }

    fn rejecting(status: u16) -> Self {
        Self::new(vec![Err(GatewayError::Http {
            status,
            message: "rejected".to_string(),
        })])
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl MoveGateway for ScriptedGateway {
    async fn move_card(
        &self,
        _card_id: &str,
        _source_column_id: &str,
        _dest_column_id: &str,
        _new_index: usize,
    ) -> Result<(), GatewayError> {
        *self.calls.lock().unwrap() += 1;
        self.verdicts.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

fn make_board() -> Board {
    let mut board = Board::new("b1", "Sprint 12");
    let mut todo = Column::new("col-a", "To Do", 0);
    todo.cards = vec![
        Card::new("card-1", "Draft notes", "col-a"),
        Card::new("card-2", "Refactor auth", "col-a"),
        Card::new("card-3", "Update docs", "col-a"),
    ];
    let mut doing = Column::new("col-b", "Doing", 1);
    doing.cards = vec![Card::new("card-4", "Deploy staging", "col-b")];
    board.columns = vec![todo, doing];
    board
}

fn make_session(
    gateway: Arc<ScriptedGateway>,
) -> (Arc<Mutex<BoardStore>>, Reconciler) {
    let store = Arc::new(Mutex::new(
        BoardStore::new(make_board()).expect("fixture board is consistent"),
    ));
    let reconciler = Reconciler::new(store.clone(), gateway);
    (store, reconciler)
}

fn gesture(card: &str, source: &str, dest: &str, from: usize, to: usize) -> MoveGesture {
    MoveGesture {
        card_id: card.to_string(),
        source_column_id: source.to_string(),
        dest_column_id: dest.to_string(),
        from_index: from,
        to_index: to,
    }
}

async fn column_ids(store: &Arc<Mutex<BoardStore>>, column_id: &str) -> Vec<String> {
    let store = store.lock().await;
    store
        .snapshot()
        .column(column_id)
        .expect("column exists")
        .cards
        .iter()
        .map(|c| c.id.clone())
        .collect()
}

#[tokio::test]
async fn within_column_rejection_restores_the_order() {
    let gateway = Arc::new(ScriptedGateway::rejecting(500));
    let (store, reconciler) = make_session(gateway.clone());

    let outcome = reconciler
        .handle_drop(gesture("card-1", "col-a", "col-a", 0, 2))
        .await
        .expect("a rollback is a settled outcome, not an error");

    match outcome {
        MoveOutcome::RolledBack(GatewayError::Http { status, .. }) => {
            assert_eq!(status, 500)
        }
        other => panic!("expected a rollback, got {:?}", other),
    }
    assert_eq!(gateway.calls(), 1);
    assert_eq!(
        column_ids(&store, "col-a").await,
        vec!["card-1", "card-2", "card-3"]
    );
}

#[tokio::test]
async fn across_columns_rejection_restores_both_columns() {
    let gateway = Arc::new(ScriptedGateway::rejecting(409));
    let (store, reconciler) = make_session(gateway.clone());

    let outcome = reconciler
        .handle_drop(gesture("card-1", "col-a", "col-b", 0, 0))
        .await
        .expect("a rollback is a settled outcome, not an error");

    assert!(matches!(outcome, MoveOutcome::RolledBack(_)));
    assert_eq!(
        column_ids(&store, "col-a").await,
        vec!["card-1", "card-2", "card-3"]
    );
    assert_eq!(column_ids(&store, "col-b").await, vec!["card-4"]);

    // The undo also restores the card's own column pointer.
    let store = store.lock().await;
    let card = store.card_at("col-a", 0).expect("card is back at slot 0");
    assert_eq!(card.column_id, "col-a");
    assert!(store.snapshot().check_consistency().is_ok());
}

#[tokio::test]
async fn clamped_drop_rolls_back_from_the_settled_slot() {
    let gateway = Arc::new(ScriptedGateway::rejecting(500));
    let (store, reconciler) = make_session(gateway.clone());

    // Slot 9 settles at 1 in col-b; the undo has to pull the card out
    // of slot 1, not out of the imaginary slot 9.
    let outcome = reconciler
        .handle_drop(gesture("card-2", "col-a", "col-b", 1, 9))
        .await
        .expect("a rollback is a settled outcome, not an error");

    assert!(matches!(outcome, MoveOutcome::RolledBack(_)));
    assert_eq!(
        column_ids(&store, "col-a").await,
        vec!["card-1", "card-2", "card-3"]
    );
    assert_eq!(column_ids(&store, "col-b").await, vec!["card-4"]);
}

#[tokio::test]
async fn rejection_into_an_empty_column_restores_it_to_empty() {
    let mut board = Board::new("b1", "Sprint 12");
    let mut todo = Column::new("col-a", "To Do", 0);
    todo.cards = vec![
        Card::new("c1", "First", "col-a"),
        Card::new("c2", "Second", "col-a"),
    ];
    board.columns = vec![todo, Column::new("col-b", "Doing", 1)];
    let gateway = Arc::new(ScriptedGateway::rejecting(500));
    let store = Arc::new(Mutex::new(
        BoardStore::new(board).expect("fixture board is consistent"),
    ));
    let reconciler = Reconciler::new(store.clone(), gateway);

    let outcome = reconciler
        .handle_drop(gesture("c1", "col-a", "col-b", 0, 0))
        .await
        .expect("a rollback is a settled outcome, not an error");

    assert!(matches!(outcome, MoveOutcome::RolledBack(_)));
    assert_eq!(column_ids(&store, "col-a").await, vec!["c1", "c2"]);
    assert!(column_ids(&store, "col-b").await.is_empty());
}

#[tokio::test]
async fn offline_rejection_also_rolls_back() {
    let gateway = Arc::new(ScriptedGateway::new(vec![Err(GatewayError::Offline)]));
    let (store, reconciler) = make_session(gateway.clone());

    let outcome = reconciler
        .handle_drop(gesture("card-3", "col-a", "col-a", 2, 0))
        .await
        .expect("a rollback is a settled outcome, not an error");

    assert!(matches!(
        outcome,
        MoveOutcome::RolledBack(GatewayError::Offline)
    ));
    assert_eq!(
        column_ids(&store, "col-a").await,
        vec!["card-1", "card-2", "card-3"]
    );
}

#[tokio::test]
async fn a_drop_after_a_rollback_succeeds_against_the_restored_state() {
    let gateway = Arc::new(ScriptedGateway::new(vec![
        Err(GatewayError::Http {
            status: 500,
            message: "hiccup".to_string(),
        }),
        Ok(()),
    ]));
    let (store, reconciler) = make_session(gateway.clone());

    let first = reconciler
        .handle_drop(gesture("card-1", "col-a", "col-b", 0, 0))
        .await
        .expect("first gesture settles");
    assert!(matches!(first, MoveOutcome::RolledBack(_)));

    // Same coordinates are valid again because the rollback restored
    // the pick-up position.
    let second = reconciler
        .handle_drop(gesture("card-1", "col-a", "col-b", 0, 0))
        .await
        .expect("second gesture settles");
    assert!(matches!(second, MoveOutcome::Committed));

    assert_eq!(gateway.calls(), 2);
    assert_eq!(column_ids(&store, "col-a").await, vec!["card-2", "card-3"]);
    assert_eq!(column_ids(&store, "col-b").await, vec!["card-1", "card-4"]);
}
