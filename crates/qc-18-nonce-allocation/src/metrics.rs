//! # Nonce Allocation Metrics
//!
//! Prometheus counters for the allocator actor.
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-nonce-allocation = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `nonce_assigned_total` - Counter of nonces handed out
//! - `nonce_returned_total` - Counter of nonces returned to a pool
//! - `nonce_returns_rejected_total` - Counter of returns for unknown addresses
//! - `nonce_reconciliations_total` - Counter of successful reconciliations
//! - `nonce_reconciliation_failures_total` - Counter of failed reconciliations
//! - `nonce_pools_evicted_total` - Counter of idle pools evicted
//! - `nonce_pools_active` - Gauge of pools currently held by the actor

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_gauge, IntCounter, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total nonces assigned
    pub static ref NONCES_ASSIGNED: IntCounter = register_int_counter!(
        "nonce_assigned_total",
        "Total number of nonces assigned"
    )
    .expect("Failed to create NONCES_ASSIGNED metric");

    /// Total nonces returned
    pub static ref NONCES_RETURNED: IntCounter = register_int_counter!(
        "nonce_returned_total",
        "Total number of nonces returned for reuse"
    )
    .expect("Failed to create NONCES_RETURNED metric");

    /// Returns rejected because the address had no pool
    pub static ref RETURNS_REJECTED: IntCounter = register_int_counter!(
        "nonce_returns_rejected_total",
        "Total number of returns for addresses without a pool"
    )
    .expect("Failed to create RETURNS_REJECTED metric");

    /// Successful reconciliations
    pub static ref RECONCILIATIONS: IntCounter = register_int_counter!(
        "nonce_reconciliations_total",
        "Total number of successful gap reconciliations"
    )
    .expect("Failed to create RECONCILIATIONS metric");

    /// Failed reconciliations
    pub static ref RECONCILIATION_FAILURES: IntCounter = register_int_counter!(
        "nonce_reconciliation_failures_total",
        "Total number of failed gap reconciliations"
    )
    .expect("Failed to create RECONCILIATION_FAILURES metric");

    /// Idle pools evicted
    pub static ref POOLS_EVICTED: IntCounter = register_int_counter!(
        "nonce_pools_evicted_total",
        "Total number of idle pools evicted"
    )
    .expect("Failed to create POOLS_EVICTED metric");

    /// Pools currently held
    pub static ref POOLS_ACTIVE: IntGauge = register_int_gauge!(
        "nonce_pools_active",
        "Number of per-address pools currently held"
    )
    .expect("Failed to create POOLS_ACTIVE metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_assigned() {
    NONCES_ASSIGNED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_returned() {
    NONCES_RETURNED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_return_rejected() {
    RETURNS_REJECTED.inc();
}

/// Record a reconciliation outcome
#[cfg(feature = "metrics")]
pub fn record_reconciliation(success: bool) {
    if success {
        RECONCILIATIONS.inc();
    } else {
        RECONCILIATION_FAILURES.inc();
    }
}

#[cfg(feature = "metrics")]
pub fn record_evicted(count: u64) {
    POOLS_EVICTED.inc_by(count);
}

/// Update active pools gauge
#[cfg(feature = "metrics")]
pub fn set_active_pools(count: usize) {
    POOLS_ACTIVE.set(count as i64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_assigned() {}

#[cfg(not(feature = "metrics"))]
pub fn record_returned() {}

#[cfg(not(feature = "metrics"))]
pub fn record_return_rejected() {}

#[cfg(not(feature = "metrics"))]
pub fn record_reconciliation(_success: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_evicted(_count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_active_pools(_count: usize) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_never_panics() {
        record_assigned();
        record_returned();
        record_return_rejected();
        record_reconciliation(true);
        record_reconciliation(false);
        record_evicted(3);
        set_active_pools(7);
    }
}
