//! # QC-18: Nonce Allocation Subsystem
//!
//! Hands out per-address transaction nonces to concurrent submitters without
//! duplicates and without leaving holes. Nonces released by failed
//! submissions are handed out again before fresh ones.
//!
//! ## Architecture
//!
//! ```text
//!   submitters ──assign──→ ┌──────────────┐        ┌────────────────────┐
//!              ──returns─→ │   mailboxes  │ ─────→ │   allocator actor  │
//!              ←─nonce──── │ (mpsc, cap 1)│        │  (one tokio task)  │
//!                          └──────────────┘        └─────────┬──────────┘
//!                                                            │ first assign
//!                                                            ▼ per address
//!                                         ┌──────────────────────────────────┐
//!                                         │         gap reconciliation       │
//!                                         │  LedgerStateReader (next nonce)  │
//!                                         │  InFlightStateReader (claimed)   │
//!                                         └──────────────────────────────────┘
//! ```
//!
//! - **Domain**: Address, Nonce, MinHeap, NoncePool, errors
//! - **Algorithms**: gap reconciliation
//! - **Ports**: Inbound (NonceAllocatorApi) and Outbound (LedgerStateReader, InFlightStateReader)
//! - **Application**: allocator actor and the NonceAllocator handle
//! - **Adapters**: in-memory state readers
//!
//! ## Guarantees
//!
//! - A nonce is never handed to two callers unless it was returned in between.
//! - The smallest free nonce is always assigned first.
//! - Each address is reconciled once, on its first assign. Failed
//!   reconciliations leave nothing behind and are retried by the next assign.
//! - Returns for an address that was never assigned are discarded.
//!
//! ## Usage
//!
//! ```ignore
//! use qc_18_nonce_allocation::NonceAllocator;
//!
//! let allocator = NonceAllocator::new(ledger, in_flight);
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! allocator.start(shutdown_rx);
//!
//! let nonce = allocator.assign(address).await?;
//! if submit(nonce).await.is_err() {
//!     allocator.returns(address, nonce).await?;
//! }
//!
//! shutdown_tx.send(true)?;
//! allocator.wait().await;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod global;
pub mod metrics;
pub mod ports;

pub use adapters::{InMemoryInFlightState, InMemoryLedgerState};
pub use algorithms::reconcile_free_nonces;
pub use application::{AllocatorStats, NonceAllocator, StatsSnapshot};
pub use config::AllocatorConfig;
pub use domain::entities::*;
pub use domain::errors::{AllocatorError, AllocatorResult, ReconcileError, StateReadError};
pub use domain::heap::MinHeap;
pub use domain::pool::NoncePool;
pub use ports::inbound::NonceAllocatorApi;
pub use ports::outbound::{InFlightStateReader, LedgerStateReader};
