//! Adapters for the Nonce Allocation subsystem.

pub mod memory;

pub use memory::{InMemoryInFlightState, InMemoryLedgerState};
