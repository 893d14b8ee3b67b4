//! Process-wide allocator.
//!
//! For callers that cannot thread a [`NonceAllocator`] through their own
//! wiring. [`init`] constructs the allocator once; every later call returns
//! that same instance and ignores its arguments. The free functions forward
//! to it.

use crate::application::{NonceAllocator, StatsSnapshot};
use crate::config::AllocatorConfig;
use crate::domain::entities::{Address, Nonce};
use crate::domain::errors::AllocatorResult;
use crate::ports::outbound::{InFlightStateReader, LedgerStateReader};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

static ALLOCATOR: OnceCell<NonceAllocator> = OnceCell::new();

/// Construct the process-wide allocator, or return the existing one.
///
/// Only the first successful call builds anything. A failed first call
/// (invalid config) leaves the wrapper uninitialized.
pub fn init(
    ledger: Arc<dyn LedgerStateReader>,
    in_flight: Arc<dyn InFlightStateReader>,
    config: AllocatorConfig,
) -> AllocatorResult<&'static NonceAllocator> {
    ALLOCATOR.get_or_try_init(|| {
        let allocator = NonceAllocator::with_config(ledger, in_flight, config)?;
        info!("Process-wide nonce allocator initialized");
        Ok(allocator)
    })
}

/// The process-wide allocator.
///
/// # Panics
///
/// If [`init`] has not succeeded yet.
pub fn instance() -> &'static NonceAllocator {
    match ALLOCATOR.get() {
        Some(allocator) => allocator,
        None => panic!("global nonce allocator used before init"),
    }
}

pub fn is_initialized() -> bool {
    ALLOCATOR.get().is_some()
}

pub fn start(shutdown: watch::Receiver<bool>) {
    instance().start(shutdown);
}

pub async fn wait() {
    instance().wait().await;
}

pub async fn returns(address: Address, nonce: Nonce) -> AllocatorResult<()> {
    instance().returns(address, nonce).await
}

pub async fn assign(address: Address) -> AllocatorResult<Nonce> {
    instance().assign(address).await
}

pub fn stats() -> StatsSnapshot {
    instance().stats()
}
