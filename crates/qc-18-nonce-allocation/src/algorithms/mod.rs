//! Algorithms module for Nonce Allocation
//!
//! Contains the pure gap reconciliation routine used when an address is
//! first seen by the allocator.

pub mod gap_reconciliation;

pub use gap_reconciliation::reconcile_free_nonces;
