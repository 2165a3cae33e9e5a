//! The shared, in-memory view of a single chain: fees, block cadence,
//! liveness flags, and the queues that move transactions from subscribers
//! to the workers that publish them.
//!
//! Every subscriber is the single writer of the fields it owns; everything
//! here is either an atomic (so readers never observe a torn write) or a
//! channel with a side counter for the queue-size fields the HTTP surface
//! reports. No field is guarded by a mutex: the single-writer-per-field
//! policy means none is needed.

use chainwatch_core::{ChainName, NodeFamily};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use chainwatch_core::types::QueuedTransaction;

/// A multi-producer, single-consumer queue with an eagerly-maintained
/// length so the HTTP status surface can report queue depth without
/// draining it.
#[derive(Clone)]
pub struct Queue<T> {
    sender: mpsc::UnboundedSender<T>,
    len: Arc<AtomicUsize>,
}

impl<T> Queue<T> {
    /// Enqueue an item. Never blocks; the queue is conceptually unbounded.
    pub fn push(&self, item: T) {
        self.len.fetch_add(1, Ordering::Relaxed);
        // The only way `send` fails is if every receiver was dropped, which
        // only happens during shutdown; there's nothing useful to do with
        // the error at that point.
        let _ = self.sender.send(item);
    }

    /// Current queue depth.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}

/// The consumer half of a [`Queue`]. Not `Clone`: a queue has exactly one consumer.
pub struct QueueReceiver<T> {
    receiver: mpsc::UnboundedReceiver<T>,
    len: Arc<AtomicUsize>,
}

impl<T> QueueReceiver<T> {
    /// Wait for the next item. Returns `None` once every [`Queue`] handle has been dropped.
    pub async fn recv(&mut self) -> Option<T> {
        let item = self.receiver.recv().await;
        if item.is_some() {
            self.len.fetch_sub(1, Ordering::Relaxed);
        }
        item
    }
}

fn queue<T>() -> (Queue<T>, QueueReceiver<T>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let len = Arc::new(AtomicUsize::new(0));
    (
        Queue {
            sender,
            len: len.clone(),
        },
        QueueReceiver { receiver, len },
    )
}

/// The set of transaction hashes a downstream collaborator has flagged as
/// known-failed. This service only ever reads it; nothing here populates it.
#[derive(Clone, Default)]
pub struct FailedTransactions(Arc<RwLock<HashSet<String>>>);

impl FailedTransactions {
    /// Whether `hash` has been marked failed.
    pub fn contains(&self, hash: &str) -> bool {
        self.0.read().expect("failed_transactions lock poisoned").contains(hash)
    }

    /// Number of hashes currently marked failed.
    pub fn len(&self) -> usize {
        self.0.read().expect("failed_transactions lock poisoned").len()
    }
}

/// The JSON shape published to the `app_state` bus key and returned from
/// `GET /app/` (minus the three queue/set sizes the HTTP route appends).
#[derive(Debug, Serialize)]
pub struct AppStateSnapshot {
    pub average_blocktime: f64,
    pub base_fee_last: u64,
    pub base_fee_next: u64,
    pub chain_id: u64,
    pub chain_name: &'static str,
    pub first_block: u64,
    pub first_event: u64,
    pub newest_block: u64,
    pub newest_block_timestamp: u64,
    pub live: bool,
    pub node: &'static str,
    pub watching_blocks: bool,
    pub watching_events: bool,
}

/// The shared, process-wide view of a single chain.
pub struct ChainState {
    chain_name: ChainName,
    node: NodeFamily,
    chain_id: AtomicU64,
    average_blocktime_bits: AtomicU64,
    base_fee_last: AtomicU64,
    base_fee_next: AtomicU64,
    first_block: AtomicU64,
    first_event: AtomicU64,
    newest_block: AtomicU64,
    newest_block_timestamp: AtomicU64,
    live: AtomicBool,
    watching_blocks: AtomicBool,
    watching_events: AtomicBool,
    pending: Queue<QueuedTransaction>,
    finalized: Queue<QueuedTransaction>,
    failed_transactions: FailedTransactions,
}

/// The consumer halves of `ChainState`'s two queues, handed to the workers
/// that drain them. Kept separate from `ChainState` itself since a queue
/// has exactly one consumer and `ChainState` is shared everywhere.
pub struct QueueReceivers {
    pub pending: QueueReceiver<QueuedTransaction>,
    pub finalized: QueueReceiver<QueuedTransaction>,
}

impl ChainState {
    /// Seed a fresh `ChainState` for `chain_name`/`node`, with `chain_id` as
    /// discovered at bootstrap. `average_blocktime` starts at 12.0 seconds,
    /// per the initial seed used before any block has actually been timed.
    pub fn new(chain_name: ChainName, node: NodeFamily, chain_id: u64) -> (Arc<Self>, QueueReceivers) {
        let (pending, pending_rx) = queue();
        let (finalized, finalized_rx) = queue();

        let state = Arc::new(Self {
            chain_name,
            node,
            chain_id: AtomicU64::new(chain_id),
            average_blocktime_bits: AtomicU64::new(12.0_f64.to_bits()),
            base_fee_last: AtomicU64::new(0),
            base_fee_next: AtomicU64::new(0),
            first_block: AtomicU64::new(0),
            first_event: AtomicU64::new(0),
            newest_block: AtomicU64::new(0),
            newest_block_timestamp: AtomicU64::new(0),
            live: AtomicBool::new(false),
            watching_blocks: AtomicBool::new(false),
            watching_events: AtomicBool::new(false),
            pending,
            finalized,
            failed_transactions: FailedTransactions::default(),
        });

        (
            state,
            QueueReceivers {
                pending: pending_rx,
                finalized: finalized_rx,
            },
        )
    }

    pub fn chain_name(&self) -> ChainName {
        self.chain_name
    }

    pub fn node(&self) -> NodeFamily {
        self.node
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id.load(Ordering::Relaxed)
    }

    pub fn average_blocktime(&self) -> f64 {
        f64::from_bits(self.average_blocktime_bits.load(Ordering::Relaxed))
    }

    pub fn set_average_blocktime(&self, value: f64) {
        self.average_blocktime_bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn base_fees(&self) -> (u64, u64) {
        (
            self.base_fee_last.load(Ordering::Relaxed),
            self.base_fee_next.load(Ordering::Relaxed),
        )
    }

    pub fn set_base_fees(&self, last: u64, next: u64) {
        self.base_fee_last.store(last, Ordering::Relaxed);
        self.base_fee_next.store(next, Ordering::Relaxed);
    }

    pub fn first_block(&self) -> u64 {
        self.first_block.load(Ordering::Relaxed)
    }

    pub fn reset_first_block(&self) {
        self.first_block.store(0, Ordering::Relaxed);
    }

    /// Set `first_block` if this is the first header since the last (re)subscribe.
    pub fn observe_first_block(&self, number: u64) {
        let _ = self
            .first_block
            .compare_exchange(0, number, Ordering::Relaxed, Ordering::Relaxed);
    }

    pub fn first_event(&self) -> u64 {
        self.first_event.load(Ordering::Relaxed)
    }

    pub fn reset_first_event(&self) {
        self.first_event.store(0, Ordering::Relaxed);
    }

    /// Set `first_event` if this is the first event since the last (re)subscribe.
    pub fn observe_first_event(&self, block_number: u64) {
        let _ = self
            .first_event
            .compare_exchange(0, block_number, Ordering::Relaxed, Ordering::Relaxed);
    }

    pub fn newest_block(&self) -> u64 {
        self.newest_block.load(Ordering::Relaxed)
    }

    pub fn newest_block_timestamp(&self) -> u64 {
        self.newest_block_timestamp.load(Ordering::Relaxed)
    }

    /// Record a newly observed header. Never winds `newest_block` backward,
    /// so a reconnect replaying an already-seen block is harmless.
    pub fn observe_block(&self, number: u64, timestamp: u64) {
        self.newest_block.fetch_max(number, Ordering::Relaxed);
        self.newest_block_timestamp.fetch_max(timestamp, Ordering::Relaxed);
    }

    pub fn live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }

    pub fn set_live(&self, value: bool) {
        self.live.store(value, Ordering::Relaxed);
    }

    pub fn watching_blocks(&self) -> bool {
        self.watching_blocks.load(Ordering::Relaxed)
    }

    pub fn set_watching_blocks(&self, value: bool) {
        self.watching_blocks.store(value, Ordering::Relaxed);
    }

    pub fn watching_events(&self) -> bool {
        self.watching_events.load(Ordering::Relaxed)
    }

    pub fn set_watching_events(&self, value: bool) {
        self.watching_events.store(value, Ordering::Relaxed);
    }

    pub fn pending(&self) -> &Queue<QueuedTransaction> {
        &self.pending
    }

    pub fn finalized(&self) -> &Queue<QueuedTransaction> {
        &self.finalized
    }

    pub fn failed_transactions(&self) -> &FailedTransactions {
        &self.failed_transactions
    }

    /// The fields published under the `app_state` bus key.
    pub fn snapshot(&self) -> AppStateSnapshot {
        let (base_fee_last, base_fee_next) = self.base_fees();
        AppStateSnapshot {
            average_blocktime: self.average_blocktime(),
            base_fee_last,
            base_fee_next,
            chain_id: self.chain_id(),
            chain_name: self.chain_name.as_str(),
            first_block: self.first_block(),
            first_event: self.first_event(),
            newest_block: self.newest_block(),
            newest_block_timestamp: self.newest_block_timestamp(),
            live: self.live(),
            node: node_as_str(self.node),
            watching_blocks: self.watching_blocks(),
            watching_events: self.watching_events(),
        }
    }
}

fn node_as_str(node: NodeFamily) -> &'static str {
    match node {
        NodeFamily::Node => "node",
        NodeFamily::Alchemy => "alchemy",
        NodeFamily::Infura => "infura",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_block_never_decreases() {
        let (state, _rx) = ChainState::new(ChainName::Ethereum, NodeFamily::Alchemy, 1);
        state.observe_block(10, 100);
        state.observe_block(5, 50);
        assert_eq!(state.newest_block(), 10);
        assert_eq!(state.newest_block_timestamp(), 100);
    }

    #[test]
    fn first_block_is_set_exactly_once_per_connection() {
        let (state, _rx) = ChainState::new(ChainName::Ethereum, NodeFamily::Alchemy, 1);
        state.observe_first_block(16);
        state.observe_first_block(17);
        assert_eq!(state.first_block(), 16);

        state.reset_first_block();
        state.observe_first_block(42);
        assert_eq!(state.first_block(), 42);
    }

    #[test]
    fn queue_length_tracks_push_and_recv() {
        let (state, mut rx) = ChainState::new(ChainName::Ethereum, NodeFamily::Alchemy, 1);
        assert_eq!(state.pending().len(), 0);
        state
            .pending()
            .push(QueuedTransaction::from_raw(serde_json::json!({"hash": "0x1"})));
        assert_eq!(state.pending().len(), 1);

        tokio_test_block_on(async {
            rx.pending.recv().await;
        });
        assert_eq!(state.pending().len(), 0);
    }

    // A tiny local executor so this test doesn't need a tokio dev-dependency
    // feature beyond what the crate already needs at runtime.
    fn tokio_test_block_on<F: std::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("building a current-thread runtime")
            .block_on(fut)
    }
}
