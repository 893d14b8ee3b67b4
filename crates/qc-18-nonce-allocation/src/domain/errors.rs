//! Error types for the Nonce Allocation subsystem.
//!
//! Collaborator and reconciliation failures surface as `assign` errors and
//! leave no state behind. Only collaborator failures are worth retrying as-is.
//! Misuse of the allocator (double start, use before start)
//! is a programmer error and panics instead of producing a value here.

use thiserror::Error;

/// Failure reported by a ledger or in-flight state reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateReadError {
    /// The backing source could not be reached.
    #[error("State source unavailable: {0}")]
    Unavailable(String),

    /// The source answered but the query failed.
    #[error("State query failed: {0}")]
    QueryFailed(String),
}

/// Failure of the pure gap reconciliation algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Too many free values between the ledger nonce and the highest claim.
    #[error("Gap too large: {gaps} free nonces between {next} and {highest} (max {max_gap})")]
    GapTooLarge {
        next: u64,
        highest: u64,
        gaps: u64,
        max_gap: u64,
    },

    /// The highest claimed nonce leaves no room above it.
    #[error("Nonce overflow: no nonce available above {highest}")]
    NonceOverflow { highest: u64 },
}

/// All errors surfaced by the allocator.
#[derive(Debug, Error)]
pub enum AllocatorError {
    /// Ledger reader failed during reconciliation.
    #[error("Ledger state read failed: {0}")]
    LedgerRead(#[source] StateReadError),

    /// In-flight reader failed during reconciliation.
    #[error("In-flight state read failed: {0}")]
    InFlightRead(#[source] StateReadError),

    /// Collaborator data could not be merged into a pool.
    #[error("Gap reconciliation failed: {0}")]
    Reconciliation(#[from] ReconcileError),

    /// Every nonce up to `u64::MAX` has been handed out for this address.
    #[error("Nonce space exhausted for address {address}")]
    NonceOverflow { address: String },

    /// The actor has stopped; the request was not processed.
    #[error("Nonce allocator has shut down")]
    Shutdown,

    /// Configuration rejected at construction.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AllocatorError {
    /// Whether retrying the same call may succeed.
    ///
    /// Only reader failures qualify. Reconciliation failures come from the
    /// readers' data and repeat until that data changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerRead(_) | Self::InFlightRead(_))
    }
}

/// Result alias for allocator operations.
pub type AllocatorResult<T> = Result<T, AllocatorError>;
