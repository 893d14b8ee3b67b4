//! Application layer: the allocator actor and the handle callers hold.

pub(crate) mod actor;
pub mod service;
pub mod stats;

pub use service::NonceAllocator;
pub use stats::{AllocatorStats, StatsSnapshot};
