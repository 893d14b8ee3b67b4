//! Nonce Allocator Service
//!
//! Caller-facing handle over the allocator actor. The handle owns the
//! sending ends of the actor's mailboxes; the actor itself is parked inside
//! the handle until [`NonceAllocator::start`] spawns it.

use crate::application::actor::{AllocatorActor, AssignRequest, Mailbox, ReturnRequest};
use crate::application::stats::{AllocatorStats, StatsSnapshot};
use crate::config::AllocatorConfig;
use crate::domain::entities::{Address, Nonce};
use crate::domain::errors::{AllocatorError, AllocatorResult};
use crate::ports::inbound::NonceAllocatorApi;
use crate::ports::outbound::{InFlightStateReader, LedgerStateReader};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Gap-aware per-address nonce allocator.
///
/// Lifecycle:
/// 1. Construct with [`new`](Self::new) or [`with_config`](Self::with_config)
/// 2. [`start`](Self::start) once, inside a tokio runtime
/// 3. [`assign`](Self::assign) / [`returns`](Self::returns) from any task
/// 4. Flip the shutdown signal, then [`wait`](Self::wait)
///
/// Starting twice, or calling anything else before `start`, panics.
pub struct NonceAllocator {
    returns_tx: mpsc::Sender<ReturnRequest>,
    assigns_tx: mpsc::Sender<AssignRequest>,
    done_rx: watch::Receiver<bool>,
    actor: Mutex<Option<AllocatorActor>>,
    started: AtomicBool,
    stats: Arc<AllocatorStats>,
}

impl NonceAllocator {
    /// Create an allocator with the default configuration.
    pub fn new(
        ledger: Arc<dyn LedgerStateReader>,
        in_flight: Arc<dyn InFlightStateReader>,
    ) -> Self {
        Self::build(ledger, in_flight, AllocatorConfig::default())
    }

    /// Create an allocator with a custom configuration.
    pub fn with_config(
        ledger: Arc<dyn LedgerStateReader>,
        in_flight: Arc<dyn InFlightStateReader>,
        config: AllocatorConfig,
    ) -> AllocatorResult<Self> {
        config.validate()?;
        Ok(Self::build(ledger, in_flight, config))
    }

    fn build(
        ledger: Arc<dyn LedgerStateReader>,
        in_flight: Arc<dyn InFlightStateReader>,
        config: AllocatorConfig,
    ) -> Self {
        let stats = Arc::new(AllocatorStats::default());
        let (actor, mailbox) = AllocatorActor::new(config, ledger, in_flight, Arc::clone(&stats));
        let Mailbox {
            returns_tx,
            assigns_tx,
            done_rx,
        } = mailbox;

        Self {
            returns_tx,
            assigns_tx,
            done_rx,
            actor: Mutex::new(Some(actor)),
            started: AtomicBool::new(false),
            stats,
        }
    }

    /// Spawn the processing loop on the current tokio runtime.
    ///
    /// The loop stops once `shutdown` holds `true` or its sender is dropped.
    ///
    /// # Panics
    ///
    /// If called more than once, or outside a tokio runtime.
    pub fn start(&self, shutdown: watch::Receiver<bool>) {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            panic!("nonce allocator started more than once");
        }
        let Some(actor) = self.actor.lock().take() else {
            panic!("nonce allocator actor missing at start");
        };
        tokio::spawn(actor.run(shutdown));
    }

    /// Wait until the processing loop has observed shutdown and exited.
    ///
    /// # Panics
    ///
    /// If called before [`start`](Self::start).
    pub async fn wait(&self) {
        self.ensure_started();
        let mut done = self.done_rx.clone();
        // An error means the actor task died without signalling; it is gone either way.
        let _ = done.wait_for(|done| *done).await;
    }

    /// Queue `nonce` for reuse by `address`.
    ///
    /// Returns once queued; waits for mailbox space when the actor is busy.
    /// Returns for an address that has never been assigned a nonce are
    /// discarded by the actor.
    ///
    /// # Panics
    ///
    /// If called before [`start`](Self::start).
    pub async fn returns(&self, address: Address, nonce: Nonce) -> AllocatorResult<()> {
        self.ensure_started();
        self.returns_tx
            .send(ReturnRequest { address, nonce })
            .await
            .map_err(|_| AllocatorError::Shutdown)
    }

    /// Allocate the smallest free nonce for `address`.
    ///
    /// If this future is dropped before the reply arrives, the nonce is
    /// usually put back in the pool. That is best effort: a drop after the
    /// actor has sent the reply loses the nonce.
    ///
    /// # Panics
    ///
    /// If called before [`start`](Self::start).
    pub async fn assign(&self, address: Address) -> AllocatorResult<Nonce> {
        self.ensure_started();
        let (reply, response) = oneshot::channel();
        self.assigns_tx
            .send(AssignRequest { address, reply })
            .await
            .map_err(|_| AllocatorError::Shutdown)?;
        response.await.map_err(|_| AllocatorError::Shutdown)?
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Current counters. Remains readable after shutdown.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn ensure_started(&self) {
        if !self.is_started() {
            panic!("nonce allocator used before start");
        }
    }
}

#[async_trait]
impl NonceAllocatorApi for NonceAllocator {
    async fn assign(&self, address: Address) -> AllocatorResult<Nonce> {
        NonceAllocator::assign(self, address).await
    }

    async fn returns(&self, address: Address, nonce: Nonce) -> AllocatorResult<()> {
        NonceAllocator::returns(self, address, nonce).await
    }
}
