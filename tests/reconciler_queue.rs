// File: tests/reconciler_queue.rs
// Overlapping drops must run strictly one at a time, in arrival order,
// each validated against the state its predecessor left behind.
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tablo::client::{GatewayError, MoveGateway};
use tablo::model::{Board, Card, Column};
use tablo::reconciler::{GestureError, MoveGesture, MoveOutcome, Reconciler};
use tablo::store::BoardStore;
use tokio::sync::{Mutex, Notify, Semaphore};

/// A gateway the test can hold open. Each call announces itself on
/// `entered`, then blocks until the test feeds `release` a permit, so
/// the test controls exactly when the "server" answers.
struct GatedGateway {
    entered: Notify,
    release: Semaphore,
    calls: StdMutex<Vec<(String, usize)>>,
}

impl GatedGateway {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Semaphore::new(0),
            calls: StdMutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MoveGateway for GatedGateway {
    async fn move_card(
        &self,
        card_id: &str,
        _source_column_id: &str,
        _dest_column_id: &str,
        new_index: usize,
    ) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((card_id.to_string(), new_index));
        self.entered.notify_one();
        self.release.acquire().await.unwrap().forget();
        Ok(())
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
    board.columns = vec![todo];
    board
}

fn gesture(card: &str, from: usize, to: usize) -> MoveGesture {
    MoveGesture {
        card_id: card.to_string(),
        source_column_id: "col-a".to_string(),
        dest_column_id: "col-a".to_string(),
        from_index: from,
        to_index: to,
    }
}

async fn column_ids(store: &Arc<Mutex<BoardStore>>) -> Vec<String> {
    let store = store.lock().await;
    store
        .snapshot()
        .column("col-a")
        .expect("column exists")
        .cards
        .iter()
        .map(|c| c.id.clone())
        .collect()
}

async fn wait_for_in_flight(reconciler: &Reconciler, count: usize) {
    while reconciler.moves_in_flight() < count {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

#[tokio::test]
async fn overlapping_drops_settle_in_arrival_order() {
    let gateway = Arc::new(GatedGateway::new());
    let store = Arc::new(Mutex::new(
        BoardStore::new(make_board()).expect("fixture board is consistent"),
    ));
    let reconciler = Arc::new(Reconciler::new(store.clone(), gateway.clone()));

    // First drop: card-1 one slot down. Valid against the start state.
    let r1 = reconciler.clone();
    let t1 = tokio::spawn(async move { r1.handle_drop(gesture("card-1", 0, 1)).await });

    // Let it reach the server, then freeze it there.
    gateway.entered.notified().await;
    assert_eq!(reconciler.moves_in_flight(), 1);
    // The optimistic mutation is already visible mid-flight.
    assert_eq!(column_ids(&store).await, vec!["card-2", "card-1", "card-3"]);

    // Second drop: card-1 from slot 1 to slot 2. These coordinates are
    // only right if the first drop has settled first.
    let r2 = reconciler.clone();
    let t2 = tokio::spawn(async move { r2.handle_drop(gesture("card-1", 1, 2)).await });
    wait_for_in_flight(&reconciler, 2).await;

    // Both accepted, still only one server call: the second is queued.
    assert_eq!(gateway.calls().len(), 1);

    // Release them one at a time.
    gateway.release.add_permits(1);
    gateway.entered.notified().await;
    assert_eq!(column_ids(&store).await, vec!["card-2", "card-3", "card-1"]);
    gateway.release.add_permits(1);

    let first = t1.await.unwrap().expect("first gesture settles");
    let second = t2.await.unwrap().expect("second gesture settles");
    assert!(matches!(first, MoveOutcome::Committed));
    assert!(matches!(second, MoveOutcome::Committed));

    assert_eq!(
        gateway.calls(),
        vec![("card-1".to_string(), 1), ("card-1".to_string(), 2)]
    );
    assert_eq!(column_ids(&store).await, vec!["card-2", "card-3", "card-1"]);
    assert_eq!(reconciler.moves_in_flight(), 0);
}

#[tokio::test]
async fn a_queued_drop_with_outdated_coordinates_is_rejected() {
    let gateway = Arc::new(GatedGateway::new());
    let store = Arc::new(Mutex::new(
        BoardStore::new(make_board()).expect("fixture board is consistent"),
    ));
    let reconciler = Arc::new(Reconciler::new(store.clone(), gateway.clone()));

    // First drop sends card-1 to the end of the column.
    let r1 = reconciler.clone();
    let t1 = tokio::spawn(async move { r1.handle_drop(gesture("card-1", 0, 2)).await });
    gateway.entered.notified().await;

    // Second drop still believes card-1 sits at slot 0. Once the first
    // one settles that slot holds card-2, so this must be refused.
    let r2 = reconciler.clone();
    let t2 = tokio::spawn(async move { r2.handle_drop(gesture("card-1", 0, 1)).await });
    wait_for_in_flight(&reconciler, 2).await;

    gateway.release.add_permits(1);

    let first = t1.await.unwrap().expect("first gesture settles");
    assert!(matches!(first, MoveOutcome::Committed));
    let second = t2.await.unwrap();
    assert!(matches!(second, Err(GestureError::Stale)));

    // The stale drop never reached the server and never touched the board.
    assert_eq!(gateway.calls().len(), 1);
    assert_eq!(column_ids(&store).await, vec!["card-2", "card-3", "card-1"]);
    assert_eq!(reconciler.moves_in_flight(), 0);
}
