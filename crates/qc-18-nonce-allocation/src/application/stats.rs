//! Allocator statistics.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters shared between the actor and the allocator handle.
#[derive(Debug, Default)]
pub struct AllocatorStats {
    /// Nonces taken from a pool
    pub assigned: AtomicU64,
    /// Nonces pushed back into a pool
    pub returned: AtomicU64,
    /// Returns discarded because the address had no pool
    pub rejected_returns: AtomicU64,
    /// Successful gap reconciliations
    pub reconciliations: AtomicU64,
    /// Failed gap reconciliations
    pub reconciliation_failures: AtomicU64,
    /// Idle pools evicted
    pub evicted: AtomicU64,
    /// Pools currently held by the actor
    pub pools: AtomicUsize,
}

impl AllocatorStats {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            assigned: self.assigned.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            rejected_returns: self.rejected_returns.load(Ordering::Relaxed),
            reconciliations: self.reconciliations.load(Ordering::Relaxed),
            reconciliation_failures: self.reconciliation_failures.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            pools: self.pools.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`AllocatorStats`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub assigned: u64,
    pub returned: u64,
    pub rejected_returns: u64,
    pub reconciliations: u64,
    pub reconciliation_failures: u64,
    pub evicted: u64,
    pub pools: usize,
}
