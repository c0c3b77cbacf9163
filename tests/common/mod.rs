//! Shared builders and an in-memory host node for exercising the engine
//! end to end.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use fee_forecaster::{
    linearize, BlockConnectedEvent, ChainView, MempoolEntry, MempoolView, NextBlockTemplate,
    RemovedTransaction, TemplateProvider, TxSummary, Txid,
};

/// A transaction record with no dependencies.
pub fn mempool_tx(id: u64, fee: i64, vsize: i32, arrival_time: i64) -> RemovedTransaction {
    RemovedTransaction { txid: Txid::from_low_u64_be(id), fee, vsize, arrival_time, parents: vec![] }
}

/// A transaction record spending the given parents.
pub fn child_tx(
    id: u64,
    fee: i64,
    vsize: i32,
    arrival_time: i64,
    parents: &[u64],
) -> RemovedTransaction {
    RemovedTransaction {
        txid: Txid::from_low_u64_be(id),
        fee,
        vsize,
        arrival_time,
        parents: parents.iter().map(|&p| Txid::from_low_u64_be(p)).collect(),
    }
}

/// A block event whose template prediction and actual contents both match
/// the removed transactions, i.e. a block the local mempool saw coming.
pub fn block_event(height: u32, txs: Vec<RemovedTransaction>) -> BlockConnectedEvent {
    let summaries: Vec<TxSummary> = txs
        .iter()
        .map(|tx| TxSummary { txid: tx.txid, vsize: tx.vsize.max(0) as u64 })
        .collect();
    BlockConnectedEvent {
        txs_removed_for_block: txs,
        expected_block_txs: summaries.clone(),
        block_txs: summaries,
        height,
    }
}

/// An in-memory stand-in for the host node: a chain tip, a mempool, and a
/// template provider that linearizes that mempool with the engine's own
/// linearizer.
pub struct MockNode {
    state: Mutex<MockState>,
    template_calls: AtomicUsize,
}

struct MockState {
    height: u32,
    load_tried: bool,
    txs: Vec<RemovedTransaction>,
}

impl MockNode {
    pub fn new(height: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState { height, load_tried: true, txs: Vec::new() }),
            template_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_height(&self, height: u32) {
        self.state.lock().height = height;
    }

    pub fn set_load_tried(&self, load_tried: bool) {
        self.state.lock().load_tried = load_tried;
    }

    pub fn add_tx(&self, tx: RemovedTransaction) {
        self.state.lock().txs.push(tx);
    }

    /// How many times a template was actually built; lets tests observe
    /// cache hits.
    pub fn template_calls(&self) -> usize {
        self.template_calls.load(Ordering::SeqCst)
    }
}

impl ChainView for MockNode {
    fn active_tip_height(&self) -> u32 {
        self.state.lock().height
    }
}

impl MempoolView for MockNode {
    fn load_tried(&self) -> bool {
        self.state.lock().load_tried
    }

    fn entry(&self, txid: &Txid) -> Option<MempoolEntry> {
        self.state
            .lock()
            .txs
            .iter()
            .find(|tx| tx.txid == *txid)
            .map(|tx| MempoolEntry { arrival_time: tx.arrival_time })
    }
}

impl TemplateProvider for MockNode {
    fn next_block_template(&self) -> NextBlockTemplate {
        self.template_calls.fetch_add(1, Ordering::SeqCst);
        let txs = self.state.lock().txs.clone();
        let linearization = linearize(&txs);

        // Representative of each package: its first (smallest) txid.
        let mut reps: Vec<Option<Txid>> = vec![None; linearization.chunks.len()];
        for (txid, &chunk_index) in &linearization.inclusion_order {
            if reps[chunk_index].map_or(true, |current| *txid < current) {
                reps[chunk_index] = Some(*txid);
            }
        }
        NextBlockTemplate {
            package_feerates: linearization.size_per_feerate(),
            package_reps: reps.into_iter().map(|rep| rep.expect("every chunk has members")).collect(),
        }
    }
}
