//! Ports layer for Nonce Allocation subsystem.
//!
//! - Inbound (Driving) ports: API used by transaction submitters
//! - Outbound (Driven) ports: ledger and in-flight state readers

pub mod inbound;
pub mod outbound;

pub use inbound::NonceAllocatorApi;
pub use outbound::{InFlightStateReader, LedgerStateReader};
