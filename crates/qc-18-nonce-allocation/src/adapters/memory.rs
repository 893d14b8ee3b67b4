//! In-memory implementations of the state reader ports.
//!
//! Used by tests and by embedders that track ledger and in-flight state in
//! process. Both adapters count calls and can be switched into a failing
//! mode to exercise reconciliation error paths.

use crate::domain::entities::{Address, BlockReference, Nonce};
use crate::domain::errors::StateReadError;
use crate::ports::outbound::{InFlightStateReader, LedgerStateReader};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory ledger: next acceptable nonce per address, 0 when unknown.
#[derive(Default)]
pub struct InMemoryLedgerState {
    nonces: RwLock<HashMap<Address, Nonce>>,
    failure: RwLock<Option<StateReadError>>,
    calls: AtomicUsize,
}

impl InMemoryLedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the next nonce the ledger accepts for `address`.
    pub fn set_nonce(&self, address: Address, nonce: Nonce) {
        self.nonces.write().insert(address, nonce);
    }

    /// Make every subsequent read fail with `error` until cleared with `None`.
    pub fn set_failure(&self, error: Option<StateReadError>) {
        *self.failure.write() = error;
    }

    /// Number of `nonce_at` calls served so far, failures included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerStateReader for InMemoryLedgerState {
    async fn nonce_at(
        &self,
        address: Address,
        _block: BlockReference,
    ) -> Result<Nonce, StateReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.read().clone() {
            return Err(error);
        }
        Ok(self.nonces.read().get(&address).copied().unwrap_or(0))
    }
}

/// In-memory store of nonces claimed by in-flight transactions.
///
/// Claims are kept in insertion order so readers see unsorted input.
#[derive(Default)]
pub struct InMemoryInFlightState {
    claimed: RwLock<HashMap<Address, Vec<Nonce>>>,
    failure: RwLock<Option<StateReadError>>,
    calls: AtomicUsize,
}

impl InMemoryInFlightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `nonce` as claimed for `address`.
    pub fn claim(&self, address: Address, nonce: Nonce) {
        self.claimed.write().entry(address).or_default().push(nonce);
    }

    /// Drop every claim of `nonce` for `address`.
    pub fn release(&self, address: Address, nonce: Nonce) {
        if let Some(nonces) = self.claimed.write().get_mut(&address) {
            nonces.retain(|&claimed| claimed != nonce);
        }
    }

    /// Make every subsequent read fail with `error` until cleared with `None`.
    pub fn set_failure(&self, error: Option<StateReadError>) {
        *self.failure.write() = error;
    }

    /// Number of `nonces_after` calls served so far, failures included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InFlightStateReader for InMemoryInFlightState {
    async fn nonces_after(
        &self,
        address: Address,
        floor: Option<Nonce>,
    ) -> Result<Vec<Nonce>, StateReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.read().clone() {
            return Err(error);
        }
        let claimed = self.claimed.read();
        let Some(nonces) = claimed.get(&address) else {
            return Ok(Vec::new());
        };
        Ok(nonces
            .iter()
            .copied()
            .filter(|&nonce| floor.map_or(true, |floor| nonce > floor))
            .collect())
    }
}
