// File: src/reconciler.rs
//! Settles drag-and-drop gestures against the board store and the server.
//! The store is mutated before the server answers so the UI repaints at
//! once; a rejected move is undone with the exact inverse mutation, which
//! restores the pre-drop arrangement because gestures are serialized and
//! nothing else moves cards in between.
use crate::client::{GatewayError, MoveGateway};
use crate::store::{BoardStore, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;

/// One finished drag, described against the snapshot the UI rendered:
/// where the card was picked up and where it was let go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveGesture {
    pub card_id: String,
    pub source_column_id: String,
    pub dest_column_id: String,
    pub from_index: usize,
    pub to_index: usize,
}

impl MoveGesture {
    pub fn is_within_column(&self) -> bool {
        self.source_column_id == self.dest_column_id
    }
}

/// What the gateway is actually asked to do. `new_index` is the position
/// in the destination column after the store applied the move, so it can
/// differ from the gesture's `to_index` when the store clamped it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub card_id: String,
    pub source_column_id: String,
    pub dest_column_id: String,
    pub new_index: usize,
}

/// How a gesture ended once the server had its say.
#[derive(Debug)]
pub enum MoveOutcome {
    /// The server accepted; the optimistic mutation stands as-is.
    Committed,
    /// The server refused; the store was put back the way it was.
    RolledBack(GatewayError),
    /// Source and destination are the same slot, nothing to do.
    Noop,
}

#[derive(Debug, Error)]
pub enum GestureError {
    /// The card is no longer where the gesture says it was picked up.
    /// The UI rendered an older snapshot; reject rather than guess.
    #[error("the board changed while the card was being dragged")]
    Stale,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-board session that turns gestures into confirmed moves.
///
/// Owned by whatever holds the board open (the TUI keeps one per open
/// board); dropped when the user navigates away. Only this type moves
/// cards on the shared store.
pub struct Reconciler {
    store: Arc<Mutex<BoardStore>>,
    gateway: Arc<dyn MoveGateway>,
    // Tokio's mutex is fair: gestures that arrive while a move is still
    // waiting on the server run strictly in arrival order.
    turn: Mutex<()>,
    in_flight: AtomicUsize,
}

impl Reconciler {
    pub fn new(store: Arc<Mutex<BoardStore>>, gateway: Arc<dyn MoveGateway>) -> Self {
        Self {
            store,
            gateway,
            turn: Mutex::new(()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Gestures accepted but not yet settled (queued or waiting on the
    /// server). The TUI shows a syncing marker while this is non-zero.
    pub fn moves_in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Settle one drop.
    ///
    /// 1. Re-check the gesture against the store; a card that is no longer
    ///    at its pick-up position fails with [`GestureError::Stale`] and
    ///    nothing is touched.
    /// 2. Apply the move on the store (within or across columns) so the UI
    ///    sees the new arrangement immediately.
    /// 3. Ask the server to perform the same move, carrying the index the
    ///    store actually inserted at.
    /// 4. On success the store already matches the server: done.
    /// 5. On failure move the card back where it came from and hand the
    ///    server error to the caller for display.
    ///
    /// Concurrent calls queue; each one is validated against the state the
    /// previous one left behind, never against a mid-flight state.
    pub async fn handle_drop(&self, gesture: MoveGesture) -> Result<MoveOutcome, GestureError> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _turn = self.turn.lock().await;
        let result = self.settle(&gesture).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn settle(&self, gesture: &MoveGesture) -> Result<MoveOutcome, GestureError> {
        if gesture.is_within_column() && gesture.from_index == gesture.to_index {
            return Ok(MoveOutcome::Noop);
        }

        // 1+2. Validate and mutate under one lock acquisition; observers
        // never see the card half-moved.
        let request = {
            let mut store = self.store.lock().await;
            match store.card_at(&gesture.source_column_id, gesture.from_index) {
                Some(card) if card.id == gesture.card_id => {}
                _ => return Err(GestureError::Stale),
            }
            let new_index = if gesture.is_within_column() {
                store.move_within_column(
                    &gesture.source_column_id,
                    gesture.from_index,
                    gesture.to_index,
                )?
            } else {
                store.move_across_columns(
                    &gesture.source_column_id,
                    &gesture.dest_column_id,
                    gesture.from_index,
                    gesture.to_index,
                )?
            };
            MoveRequest {
                card_id: gesture.card_id.clone(),
                source_column_id: gesture.source_column_id.clone(),
                dest_column_id: gesture.dest_column_id.clone(),
                new_index,
            }
        };

        // 3. Lock released; the server call is the only await point.
        let verdict = self
            .gateway
            .move_card(
                &request.card_id,
                &request.source_column_id,
                &request.dest_column_id,
                request.new_index,
            )
            .await;

        match verdict {
            // 4. Commit by inaction.
            Ok(()) => Ok(MoveOutcome::Committed),
            // 5. Exact inverse of the optimistic step.
            Err(err) => {
                log::debug!(
                    "move of card {} rejected by server, rolling back: {err}",
                    request.card_id
                );
                let mut store = self.store.lock().await;
                let undone = if gesture.is_within_column() {
                    store
                        .move_within_column(
                            &gesture.source_column_id,
                            request.new_index,
                            gesture.from_index,
                        )
                        .map(|_| ())
                } else {
                    store
                        .move_across_columns(
                            &gesture.dest_column_id,
                            &gesture.source_column_id,
                            request.new_index,
                            gesture.from_index,
                        )
                        .map(|_| ())
                };
                if let Err(e) = undone {
                    // Cannot happen while this reconciler is the only card
                    // mover; log it rather than poison the session.
                    log::warn!("rollback of card {} did not apply: {e}", request.card_id);
                }
                Ok(MoveOutcome::RolledBack(err))
            }
        }
    }
}
