//! # Nonce Allocator Integration Tests
//!
//! Drive a started [`NonceAllocator`] through its public surface only, with
//! the in-memory state readers standing in for the ledger and the in-flight
//! store.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use qc_18_nonce_allocation::{
    Address, AllocatorConfig, AllocatorError, BlockReference, InMemoryInFlightState,
    InMemoryLedgerState, LedgerStateReader, Nonce, NonceAllocator, StateReadError,
};
use tokio::sync::{watch, Notify};
use tracing_subscriber::EnvFilter;

const ALICE: Address = [0x0a; 20];
const BOB: Address = [0x0b; 20];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    allocator: Arc<NonceAllocator>,
    ledger: Arc<InMemoryLedgerState>,
    in_flight: Arc<InMemoryInFlightState>,
    shutdown_tx: watch::Sender<bool>,
}

impl Harness {
    fn started(config: AllocatorConfig) -> Self {
        init_tracing();
        let ledger = Arc::new(InMemoryLedgerState::new());
        let in_flight = Arc::new(InMemoryInFlightState::new());
        let allocator =
            NonceAllocator::with_config(ledger.clone(), in_flight.clone(), config).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        allocator.start(shutdown_rx);

        Self {
            allocator: Arc::new(allocator),
            ledger,
            in_flight,
            shutdown_tx,
        }
    }

    async fn assign_concurrently(&self, address: Address, count: usize) -> Vec<Nonce> {
        let handles: Vec<_> = (0..count)
            .map(|_| {
                let allocator = Arc::clone(&self.allocator);
                tokio::spawn(async move { allocator.assign(address).await })
            })
            .collect();

        let mut nonces = Vec::with_capacity(count);
        for handle in handles {
            nonces.push(handle.await.unwrap().unwrap());
        }
        nonces
    }

    async fn shutdown(&self) {
        self.shutdown_tx.send(true).unwrap();
        self.allocator.wait().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_assigns_are_unique_and_contiguous() {
    let h = Harness::started(AllocatorConfig::default());
    h.ledger.set_nonce(ALICE, 17);

    let nonces = h.assign_concurrently(ALICE, 200).await;

    let unique: BTreeSet<Nonce> = nonces.iter().copied().collect();
    assert_eq!(unique.len(), 200, "duplicate nonce handed out");
    assert_eq!(unique, (17..217).collect::<BTreeSet<_>>());
    h.shutdown().await;
}

#[tokio::test]
async fn test_returned_nonce_is_assigned_again() {
    let h = Harness::started(AllocatorConfig::default());
    h.ledger.set_nonce(ALICE, 8);

    let first = h.allocator.assign(ALICE).await.unwrap();
    assert_eq!(first, 8);
    h.allocator.returns(ALICE, first).await.unwrap();
    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 8);
    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 9);
    h.shutdown().await;
}

#[tokio::test]
async fn test_in_flight_gaps_are_filled_first() {
    let h = Harness::started(AllocatorConfig::default());
    h.ledger.set_nonce(ALICE, 5);
    h.in_flight.claim(ALICE, 9);
    h.in_flight.claim(ALICE, 7);

    let mut order = Vec::new();
    for _ in 0..4 {
        order.push(h.allocator.assign(ALICE).await.unwrap());
    }

    assert_eq!(order, vec![5, 6, 8, 10]);
    h.shutdown().await;
}

#[tokio::test]
async fn test_reconciliation_runs_once_per_address() {
    let h = Harness::started(AllocatorConfig::default());
    h.ledger.set_nonce(ALICE, 2);

    for _ in 0..25 {
        h.allocator.assign(ALICE).await.unwrap();
    }
    // Later changes in the readers are not consulted while the pool lives.
    h.ledger.set_nonce(ALICE, 1_000);
    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 27);

    assert_eq!(h.ledger.call_count(), 1);
    assert_eq!(h.in_flight.call_count(), 1);
    assert_eq!(h.allocator.stats().reconciliations, 1);
    h.shutdown().await;
}

#[tokio::test]
async fn test_no_in_flight_claims_starts_at_ledger_nonce() {
    let h = Harness::started(AllocatorConfig::default());
    h.ledger.set_nonce(ALICE, 3);

    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 3);
    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 4);
    h.shutdown().await;
}

#[tokio::test]
async fn test_claims_at_or_below_ledger_nonce_are_ignored() {
    let h = Harness::started(AllocatorConfig::default());
    h.ledger.set_nonce(ALICE, 4);
    // Already confirmed on the ledger, still listed by the in-flight store.
    h.in_flight.claim(ALICE, 3);
    h.in_flight.claim(ALICE, 6);

    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 4);
    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 5);
    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 7);
    h.shutdown().await;
}

#[tokio::test]
async fn test_wide_in_flight_gap_is_filled_under_default_config() {
    let h = Harness::started(AllocatorConfig::default());
    h.in_flight.claim(ALICE, 10_002);

    for expected in 0..3 {
        assert_eq!(h.allocator.assign(ALICE).await.unwrap(), expected);
    }
    let stats = h.allocator.stats();
    assert_eq!(stats.reconciliations, 1);
    assert_eq!(stats.reconciliation_failures, 0);
    h.shutdown().await;
}

#[tokio::test]
async fn test_gap_limit_failure_is_not_retryable() {
    let h = Harness::started(AllocatorConfig {
        max_reconciliation_gap: Some(100),
        ..Default::default()
    });
    h.in_flight.claim(ALICE, 500);

    let err = h.allocator.assign(ALICE).await.unwrap_err();
    assert!(matches!(err, AllocatorError::Reconciliation(_)));
    assert!(!err.is_retryable());
    h.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_addresses_are_allocated_independently() {
    let h = Harness::started(AllocatorConfig::default());
    h.in_flight.claim(ALICE, 2);
    h.ledger.set_nonce(BOB, 100);

    let (alice, bob) = tokio::join!(
        h.assign_concurrently(ALICE, 50),
        h.assign_concurrently(BOB, 50)
    );

    let alice: BTreeSet<Nonce> = alice.into_iter().collect();
    let bob: BTreeSet<Nonce> = bob.into_iter().collect();
    let expected_alice: BTreeSet<Nonce> = [0, 1].into_iter().chain(3..51).collect();
    assert_eq!(alice, expected_alice);
    assert_eq!(bob, (100..150).collect::<BTreeSet<_>>());
    assert_eq!(h.allocator.stats().reconciliations, 2);
    h.shutdown().await;
}

#[tokio::test]
async fn test_failed_reconciliation_is_retried_by_next_assign() {
    let h = Harness::started(AllocatorConfig::default());
    h.ledger.set_nonce(ALICE, 11);
    h.ledger
        .set_failure(Some(StateReadError::Unavailable("node syncing".into())));

    let err = h.allocator.assign(ALICE).await.unwrap_err();
    assert!(matches!(err, AllocatorError::LedgerRead(_)));
    assert!(err.is_retryable());

    h.ledger.set_failure(None);
    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 11);

    let stats = h.allocator.stats();
    assert_eq!(stats.reconciliation_failures, 1);
    assert_eq!(stats.reconciliations, 1);
    h.shutdown().await;
}

#[tokio::test]
async fn test_return_for_unknown_address_is_discarded() {
    let h = Harness::started(AllocatorConfig::default());
    h.ledger.set_nonce(BOB, 6);

    h.allocator.returns(BOB, 2).await.unwrap();
    assert_eq!(h.allocator.assign(BOB).await.unwrap(), 6);
    assert_eq!(h.allocator.stats().rejected_returns, 1);
    h.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_idle_pool_is_rebuilt_from_readers() {
    let h = Harness::started(AllocatorConfig {
        idle_eviction_secs: Some(10),
        eviction_sweep_interval_ms: 1_000,
        ..Default::default()
    });
    h.ledger.set_nonce(ALICE, 1);

    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 1);
    // The submission becomes visible to the in-flight store.
    h.in_flight.claim(ALICE, 1);

    tokio::time::sleep(Duration::from_secs(15)).await;

    assert_eq!(h.allocator.assign(ALICE).await.unwrap(), 2);
    assert_eq!(h.ledger.call_count(), 2);
    let stats = h.allocator.stats();
    assert_eq!(stats.evicted, 1);
    assert_eq!(stats.pools, 1);
    h.shutdown().await;
}

/// Ledger reader that parks inside `nonce_at` until released.
#[derive(Default)]
struct GatedLedger {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl LedgerStateReader for GatedLedger {
    async fn nonce_at(
        &self,
        _address: Address,
        _block: BlockReference,
    ) -> Result<Nonce, StateReadError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(0)
    }
}

#[tokio::test]
async fn test_shutdown_answers_every_waiting_caller() {
    init_tracing();
    let ledger = Arc::new(GatedLedger::default());
    let allocator = Arc::new(NonceAllocator::new(
        ledger.clone(),
        Arc::new(InMemoryInFlightState::new()),
    ));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    allocator.start(shutdown_rx);

    let in_progress = {
        let allocator = Arc::clone(&allocator);
        tokio::spawn(async move { allocator.assign(ALICE).await })
    };
    ledger.entered.notified().await;

    let waiting: Vec<_> = (0..3)
        .map(|_| {
            let allocator = Arc::clone(&allocator);
            tokio::spawn(async move { allocator.assign(BOB).await })
        })
        .collect();
    tokio::task::yield_now().await;

    shutdown_tx.send(true).unwrap();
    ledger.release.notify_one();

    assert_eq!(in_progress.await.unwrap().unwrap(), 0);
    for handle in waiting {
        assert!(matches!(
            handle.await.unwrap(),
            Err(AllocatorError::Shutdown)
        ));
    }
    allocator.wait().await;
    assert!(matches!(
        allocator.returns(ALICE, 0).await,
        Err(AllocatorError::Shutdown)
    ));
}
