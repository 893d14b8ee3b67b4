//! # Domain Layer - Nonce Allocation Subsystem
//!
//! Pure data structures with no knowledge of collaborators or the actor.
//!
//! - `entities`: Address, Nonce, BlockReference
//! - `heap`: generic MinHeap
//! - `pool`: NoncePool, the per-address set of free nonces
//! - `errors`: StateReadError, ReconcileError, AllocatorError

pub mod entities;
pub mod errors;
pub mod heap;
pub mod pool;

pub use entities::*;
pub use errors::*;
pub use heap::MinHeap;
pub use pool::NoncePool;
