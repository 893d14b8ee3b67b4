//! Per-address pool of free nonces.
//!
//! The pool is never empty once built: taking the last value reinserts
//! `value + 1`, which keeps the sequence open-ended upward.

use super::entities::Nonce;
use super::heap::MinHeap;
use std::time::Duration;
use tokio::time::Instant;

/// Free nonces for one address, smallest first.
#[derive(Clone, Debug)]
pub struct NoncePool {
    free: MinHeap<Nonce>,
    last_touched: Instant,
}

impl NoncePool {
    /// Build a pool from reconciled free values.
    ///
    /// Returns `None` for an empty set, which would violate the pool invariant.
    pub fn from_free(free: impl IntoIterator<Item = Nonce>) -> Option<Self> {
        let free: MinHeap<Nonce> = free.into_iter().collect();
        if free.is_empty() {
            return None;
        }
        Some(Self {
            free,
            last_touched: Instant::now(),
        })
    }

    /// Take the smallest free nonce.
    ///
    /// Returns `None` when the pool holds nothing but `u64::MAX`; the pool is
    /// left unchanged. EIP-2681 caps account nonces below `u64::MAX`, so that
    /// value is never handed out even though it is representable.
    pub fn take(&mut self) -> Option<Nonce> {
        let nonce = self.free.pop()?;
        if self.free.is_empty() {
            let Some(next) = nonce.checked_add(1) else {
                self.free.push(nonce);
                return None;
            };
            self.free.push(next);
        }
        self.last_touched = Instant::now();
        Some(nonce)
    }

    /// Put a nonce back. No validation and no deduplication.
    pub fn release(&mut self, nonce: Nonce) {
        self.free.push(nonce);
        self.last_touched = Instant::now();
    }

    /// Smallest free nonce without taking it.
    pub fn peek(&self) -> Option<Nonce> {
        self.free.peek().copied()
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Whether the pool has gone untouched for at least `ttl` as of `now`.
    pub fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_touched) >= ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_free_set_is_rejected() {
        assert!(NoncePool::from_free(Vec::new()).is_none());
    }

    #[test]
    fn test_take_refills_when_last_value_taken() {
        let mut pool = NoncePool::from_free([3]).unwrap();
        assert_eq!(pool.take(), Some(3));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.peek(), Some(4));
        assert_eq!(pool.take(), Some(4));
        assert_eq!(pool.take(), Some(5));
    }

    #[test]
    fn test_take_drains_gaps_before_refilling() {
        let mut pool = NoncePool::from_free([10, 5, 8, 6]).unwrap();
        let taken: Vec<_> = (0..5).filter_map(|_| pool.take()).collect();
        assert_eq!(taken, vec![5, 6, 8, 10, 11]);
    }

    #[test]
    fn test_release_makes_value_reusable() {
        let mut pool = NoncePool::from_free([7]).unwrap();
        assert_eq!(pool.take(), Some(7));
        pool.release(7);
        assert_eq!(pool.take(), Some(7));
    }

    #[test]
    fn test_release_accepts_duplicates() {
        let mut pool = NoncePool::from_free([2]).unwrap();
        pool.release(1);
        pool.release(1);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.take(), Some(1));
        assert_eq!(pool.take(), Some(1));
    }

    #[test]
    fn test_exhausted_pool_stays_intact() {
        let mut pool = NoncePool::from_free([u64::MAX]).unwrap();
        assert_eq!(pool.take(), None);
        assert_eq!(pool.peek(), Some(u64::MAX));
        assert!(!pool.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_tracking() {
        let mut pool = NoncePool::from_free([0]).unwrap();
        let ttl = Duration::from_secs(10);
        assert!(!pool.is_idle(Instant::now(), ttl));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(pool.is_idle(Instant::now(), ttl));

        pool.take();
        assert!(!pool.is_idle(Instant::now(), ttl));
    }
}
