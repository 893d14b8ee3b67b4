//! Allocator Actor
//!
//! The single task that owns every per-address pool. All assignments,
//! returns, reconciliations and evictions run here one at a time, so pools
//! need no locking.
//!
//! ## Drain Policy
//!
//! Each loop iteration polls, in this fixed order:
//!
//! 1. shutdown signal
//! 2. return mailbox
//! 3. eviction timer (when enabled)
//! 4. assign mailbox
//!
//! Returns go first so a nonce handed back by a caller is reusable by that
//! caller's next assign. Returns cannot starve assigns: each one answers an
//! earlier assign. No ordering between concurrent callers is promised.
//!
//! ## Shutdown
//!
//! ```text
//! shutdown = true ──→ break outer loop ──→ close mailboxes
//!                                              │
//!                     queued assigns ←─ Err(Shutdown)
//!                     queued returns ←─ discarded
//!                                              │
//!                                        done = true (once)
//! ```

use crate::algorithms::reconcile_free_nonces;
use crate::application::stats::AllocatorStats;
use crate::config::AllocatorConfig;
use crate::domain::entities::{display_address, Address, BlockReference, Nonce};
use crate::domain::errors::{AllocatorError, AllocatorResult};
use crate::domain::pool::NoncePool;
use crate::metrics;
use crate::ports::outbound::{InFlightStateReader, LedgerStateReader};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Fire-and-forget notice that `nonce` is free again.
#[derive(Debug)]
pub(crate) struct ReturnRequest {
    pub address: Address,
    pub nonce: Nonce,
}

/// Request for the next free nonce, answered on `reply`.
#[derive(Debug)]
pub(crate) struct AssignRequest {
    pub address: Address,
    pub reply: oneshot::Sender<AllocatorResult<Nonce>>,
}

/// Caller-side ends of the actor's channels.
pub(crate) struct Mailbox {
    pub returns_tx: mpsc::Sender<ReturnRequest>,
    pub assigns_tx: mpsc::Sender<AssignRequest>,
    pub done_rx: watch::Receiver<bool>,
}

pub(crate) struct AllocatorActor {
    config: AllocatorConfig,
    ledger: Arc<dyn LedgerStateReader>,
    in_flight: Arc<dyn InFlightStateReader>,
    returns_rx: mpsc::Receiver<ReturnRequest>,
    assigns_rx: mpsc::Receiver<AssignRequest>,
    pools: HashMap<Address, NoncePool>,
    stats: Arc<AllocatorStats>,
    done_tx: watch::Sender<bool>,
}

impl AllocatorActor {
    /// Create the actor and the mailbox callers talk to it through.
    pub(crate) fn new(
        config: AllocatorConfig,
        ledger: Arc<dyn LedgerStateReader>,
        in_flight: Arc<dyn InFlightStateReader>,
        stats: Arc<AllocatorStats>,
    ) -> (Self, Mailbox) {
        let (returns_tx, returns_rx) = mpsc::channel(config.mailbox_capacity);
        let (assigns_tx, assigns_rx) = mpsc::channel(config.mailbox_capacity);
        let (done_tx, done_rx) = watch::channel(false);

        let actor = Self {
            config,
            ledger,
            in_flight,
            returns_rx,
            assigns_rx,
            pools: HashMap::new(),
            stats,
            done_tx,
        };
        let mailbox = Mailbox {
            returns_tx,
            assigns_tx,
            done_rx,
        };
        (actor, mailbox)
    }

    /// Process requests until `shutdown` becomes `true` or its sender is dropped.
    pub(crate) async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let idle_ttl = self.config.idle_ttl();
        let mut sweep = tokio::time::interval(self.config.sweep_interval());
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            mailbox_capacity = self.config.mailbox_capacity,
            idle_eviction_secs = ?self.config.idle_eviction_secs,
            "Nonce allocator started"
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        debug!("Shutdown sender dropped, stopping nonce allocator");
                        break;
                    }
                }
                Some(request) = self.returns_rx.recv() => self.handle_return(request),
                _ = sweep.tick(), if idle_ttl.is_some() => {
                    if let Some(ttl) = idle_ttl {
                        self.evict_idle(Instant::now(), ttl);
                    }
                }
                Some(request) = self.assigns_rx.recv() => self.handle_assign(request).await,
            }
        }

        self.drain_mailboxes();

        info!(pools = self.pools.len(), "Nonce allocator stopped");
        self.done_tx.send_replace(true);
    }

    fn handle_return(&mut self, request: ReturnRequest) {
        let ReturnRequest { address, nonce } = request;

        let Some(pool) = self.pools.get_mut(&address) else {
            // Reconciliation rediscovers the nonce as a gap if it is really free.
            AllocatorStats::incr(&self.stats.rejected_returns);
            metrics::record_return_rejected();
            warn!(
                address = %display_address(&address),
                nonce = nonce,
                "Return for address without a pool, discarding"
            );
            return;
        };

        pool.release(nonce);
        AllocatorStats::incr(&self.stats.returned);
        metrics::record_returned();
        debug!(
            address = %display_address(&address),
            nonce = nonce,
            "Nonce returned to pool"
        );
    }

    async fn handle_assign(&mut self, request: AssignRequest) {
        let AssignRequest { address, reply } = request;
        let result = self.assign(address).await;

        match reply.send(result) {
            Ok(()) => {}
            Err(Ok(nonce)) => {
                // Caller is gone; nobody will ever use this nonce. Best effort:
                // a caller cancelled after this send succeeds still loses it.
                if let Some(pool) = self.pools.get_mut(&address) {
                    pool.release(nonce);
                }
                debug!(
                    address = %display_address(&address),
                    nonce = nonce,
                    "Caller dropped before reply, nonce reclaimed"
                );
            }
            Err(Err(error)) => {
                debug!(
                    address = %display_address(&address),
                    error = %error,
                    "Caller dropped before error reply"
                );
            }
        }
    }

    async fn assign(&mut self, address: Address) -> AllocatorResult<Nonce> {
        if !self.pools.contains_key(&address) {
            let pool = match self.reconcile(address).await {
                Ok(pool) => pool,
                Err(error) => {
                    AllocatorStats::incr(&self.stats.reconciliation_failures);
                    metrics::record_reconciliation(false);
                    warn!(
                        address = %display_address(&address),
                        error = %error,
                        "Gap reconciliation failed"
                    );
                    return Err(error);
                }
            };
            AllocatorStats::incr(&self.stats.reconciliations);
            metrics::record_reconciliation(true);
            self.pools.insert(address, pool);
            self.update_pool_gauge();
        }

        let Some(pool) = self.pools.get_mut(&address) else {
            return Err(AllocatorError::Internal(
                "pool missing after reconciliation".to_string(),
            ));
        };

        let nonce = pool.take().ok_or_else(|| AllocatorError::NonceOverflow {
            address: display_address(&address),
        })?;

        AllocatorStats::incr(&self.stats.assigned);
        metrics::record_assigned();
        debug!(
            address = %display_address(&address),
            nonce = nonce,
            "Nonce assigned"
        );
        Ok(nonce)
    }

    /// Build the initial pool for an address from both state readers.
    ///
    /// Nothing is stored on failure, so the next assign starts over.
    async fn reconcile(&self, address: Address) -> AllocatorResult<NoncePool> {
        let next = self
            .ledger
            .nonce_at(address, BlockReference::Latest)
            .await
            .map_err(AllocatorError::LedgerRead)?;

        // Claims strictly above `next - 1`; no floor at all when `next` is 0.
        let claimed = self
            .in_flight
            .nonces_after(address, next.checked_sub(1))
            .await
            .map_err(AllocatorError::InFlightRead)?;
        let claimed_count = claimed.len();

        let free = reconcile_free_nonces(next, claimed, self.config.max_reconciliation_gap)?;

        info!(
            address = %display_address(&address),
            ledger_nonce = next,
            claimed = claimed_count,
            free = free.len(),
            "Reconciled nonce pool"
        );

        NoncePool::from_free(free).ok_or_else(|| {
            AllocatorError::Internal("reconciliation produced no free nonces".to_string())
        })
    }

    fn evict_idle(&mut self, now: Instant, ttl: Duration) {
        let before = self.pools.len();
        self.pools.retain(|_, pool| !pool.is_idle(now, ttl));
        let evicted = before - self.pools.len();
        if evicted == 0 {
            return;
        }

        self.stats
            .evicted
            .fetch_add(evicted as u64, Ordering::Relaxed);
        metrics::record_evicted(evicted as u64);
        self.update_pool_gauge();
        info!(
            evicted = evicted,
            remaining = self.pools.len(),
            "Evicted idle nonce pools"
        );
    }

    /// Refuse new requests and answer whatever is still queued.
    fn drain_mailboxes(&mut self) {
        self.returns_rx.close();
        self.assigns_rx.close();

        let mut rejected_assigns = 0usize;
        while let Ok(request) = self.assigns_rx.try_recv() {
            let _ = request.reply.send(Err(AllocatorError::Shutdown));
            rejected_assigns += 1;
        }

        let mut dropped_returns = 0usize;
        while self.returns_rx.try_recv().is_ok() {
            dropped_returns += 1;
        }

        if rejected_assigns > 0 || dropped_returns > 0 {
            debug!(
                rejected_assigns = rejected_assigns,
                dropped_returns = dropped_returns,
                "Drained mailboxes on shutdown"
            );
        }
    }

    fn update_pool_gauge(&self) {
        self.stats.pools.store(self.pools.len(), Ordering::Relaxed);
        metrics::set_active_pools(self.pools.len());
    }
}
