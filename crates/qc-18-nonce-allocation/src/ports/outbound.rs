//! Outbound Ports (Driven Ports / SPI)
//!
//! Read-only collaborators consulted once per address during gap
//! reconciliation. The allocator awaits them inline on its single task, so a
//! slow implementation stalls every address, not just the one being loaded.

use crate::domain::entities::{Address, BlockReference, Nonce};
use crate::domain::errors::StateReadError;
use async_trait::async_trait;

/// Confirmed ledger state.
#[async_trait]
pub trait LedgerStateReader: Send + Sync {
    /// Next nonce the ledger would accept for `address` at `block`.
    async fn nonce_at(
        &self,
        address: Address,
        block: BlockReference,
    ) -> Result<Nonce, StateReadError>;
}

/// Nonces claimed by transactions submitted but not yet confirmed.
#[async_trait]
pub trait InFlightStateReader: Send + Sync {
    /// Every claimed nonce for `address` strictly greater than `floor`.
    ///
    /// `floor = None` means no lower bound. Order of the result is not
    /// significant.
    async fn nonces_after(
        &self,
        address: Address,
        floor: Option<Nonce>,
    ) -> Result<Vec<Nonce>, StateReadError>;
}
