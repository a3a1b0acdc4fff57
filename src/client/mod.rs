// File: ./src/client/mod.rs
pub mod cert;
pub mod core;
pub mod middleware;

pub use crate::client::core::BoardClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("not connected (no server configured)")]
    Offline,
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },
    #[error("invalid server response: {0}")]
    Decode(String),
}

/// The one remote operation the drag reconciler depends on. Kept as a
/// trait so the reconciler can be driven by a scripted gateway in tests;
/// [`BoardClient`] is the REST implementation.
#[async_trait]
pub trait MoveGateway: Send + Sync {
    /// Asks the backend to relocate a card. `new_index` is the position
    /// in the destination column as it reads after the card's removal
    /// from the source, exactly as the local store computed it.
    async fn move_card(
        &self,
        card_id: &str,
        source_column_id: &str,
        dest_column_id: &str,
        new_index: usize,
    ) -> Result<(), GatewayError>;
}
