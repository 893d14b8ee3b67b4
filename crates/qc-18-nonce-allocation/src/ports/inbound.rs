//! Inbound Ports (Driving Ports / API)

use crate::domain::entities::{Address, Nonce};
use crate::domain::errors::AllocatorResult;
use async_trait::async_trait;

/// Nonce allocation API exposed to transaction submitters.
#[async_trait]
pub trait NonceAllocatorApi: Send + Sync {
    /// Allocate the smallest free nonce for `address`.
    ///
    /// The first call for an address reconciles ledger and in-flight state.
    /// Collaborator failures are returned and leave no trace, so the call can
    /// simply be retried.
    async fn assign(&self, address: Address) -> AllocatorResult<Nonce>;

    /// Hand a previously assigned nonce back for reuse.
    ///
    /// Completes once the notice is queued, not once it is applied.
    async fn returns(&self, address: Address, nonce: Nonce) -> AllocatorResult<()>;
}
