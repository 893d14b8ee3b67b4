//! Configuration for the Nonce Allocation subsystem

use crate::domain::errors::AllocatorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Allocator configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Depth of each request mailbox. Callers wait for space beyond this.
    pub mailbox_capacity: usize,
    /// Upper bound on gap nonces inserted by a single reconciliation.
    /// `None` inserts every gap between the ledger nonce and the highest claim.
    pub max_reconciliation_gap: Option<u64>,
    /// Evict pools untouched for this many seconds. `None` keeps them forever.
    ///
    /// Only safe when every assigned nonce is visible to the in-flight reader
    /// before the TTL elapses; otherwise a re-reconciled pool may hand it out
    /// again.
    pub idle_eviction_secs: Option<u64>,
    /// Period of the idle sweep (milliseconds)
    pub eviction_sweep_interval_ms: u64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1,
            max_reconciliation_gap: None,
            idle_eviction_secs: None,
            eviction_sweep_interval_ms: 30_000,
        }
    }
}

impl AllocatorConfig {
    /// Reject values the actor cannot run with.
    pub fn validate(&self) -> Result<(), AllocatorError> {
        if self.mailbox_capacity == 0 {
            return Err(AllocatorError::Config(
                "mailbox_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_reconciliation_gap == Some(0) {
            return Err(AllocatorError::Config(
                "max_reconciliation_gap must be at least 1 when set".to_string(),
            ));
        }
        if self.idle_eviction_secs == Some(0) {
            return Err(AllocatorError::Config(
                "idle_eviction_secs must be at least 1 when set".to_string(),
            ));
        }
        if self.eviction_sweep_interval_ms == 0 {
            return Err(AllocatorError::Config(
                "eviction_sweep_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_eviction_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.eviction_sweep_interval_ms)
    }
}
