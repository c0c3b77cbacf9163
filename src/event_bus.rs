use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::tx::{RemovedTransaction, TxSummary};

/// Everything the host knows about one connected block, delivered to the
/// engine exactly once per block and in height order.
#[derive(Debug, Clone, Default)]
pub struct BlockConnectedEvent {
    /// Mempool transactions the block confirmed.
    pub txs_removed_for_block: Vec<RemovedTransaction>,
    /// What the host's own block template expected the block to contain.
    pub expected_block_txs: Vec<TxSummary>,
    /// What the block actually contained.
    pub block_txs: Vec<TxSummary>,
    pub height: u32,
}

/// Receives block-connected events.
///
/// Handlers run on the host's single ingest thread and must return
/// promptly; anything that also serves queries serializes its own state.
pub trait BlockObserver: Send + Sync {
    fn on_block_connected(&self, event: &BlockConnectedEvent);
}

/// Fans block events out to subscribed observers.
///
/// The bus is owned by the host and passed to whoever needs to subscribe.
/// Subscriptions hold the observer alive, so a subscriber registered late
/// in startup cannot be dropped out from under a delivery. Deliveries are
/// serialized: a second `block_connected` blocks until the first has
/// reached every observer, preserving per-observer event order even if
/// the host misbehaves and calls from two threads.
#[derive(Default)]
pub struct EventBus {
    observers: RwLock<Vec<Arc<dyn BlockObserver>>>,
    dispatch: Mutex<()>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn BlockObserver>) {
        self.observers.write().push(observer);
    }

    /// Removes a subscription by identity. Unknown observers are ignored.
    pub fn unsubscribe(&self, observer: &Arc<dyn BlockObserver>) {
        self.observers.write().retain(|existing| !Arc::ptr_eq(existing, observer));
    }

    pub fn block_connected(&self, event: &BlockConnectedEvent) {
        let _serialized = self.dispatch.lock();
        let observers = self.observers.read().clone();
        debug!(
            height = event.height,
            removed = event.txs_removed_for_block.len(),
            observers = observers.len(),
            "dispatching block-connected event"
        );
        for observer in observers {
            observer.on_block_connected(event);
        }
    }
}
