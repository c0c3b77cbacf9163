//! Block linearization: ordering a set of interdependent transactions the
//! way a rational miner would include them, as a sequence of
//! ancestor-closed packages ("chunks") of non-increasing feerate.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::fee_frac::FeeFrac;
use crate::fee_rate::FeeRate;
use crate::tx::{RemovedTransaction, Txid};

/// The result of linearizing a transaction set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Linearization {
    /// Aggregate fee/size of each chunk, in inclusion order. Feerates are
    /// non-increasing across the sequence.
    pub chunks: Vec<FeeFrac>,
    /// Chunk index each input transaction landed in.
    pub inclusion_order: HashMap<Txid, usize>,
}

impl Linearization {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Per-chunk feerate and virtual size, in inclusion order; the shape
    /// the percentile calculator consumes.
    pub fn size_per_feerate(&self) -> Vec<(FeeRate, u64)> {
        self.chunks
            .iter()
            .map(|chunk| (FeeRate::from(*chunk), chunk.size.max(0) as u64))
            .collect()
    }
}

/// Linearizes `txs` by package-feerate greedy selection.
///
/// Each round picks, over every unselected transaction, the package "that
/// transaction plus all of its unselected in-set ancestors" with the
/// highest aggregate feerate (ties going to the smaller aggregate size,
/// then to the smaller sponsoring txid), emits it as the next chunk, and
/// repeats until the set is exhausted. The union of any prefix of chunks
/// is ancestor-closed, and the whole procedure is deterministic.
///
/// Parents that do not resolve inside `txs` are treated as already
/// confirmed and ignored.
pub fn linearize(txs: &[RemovedTransaction]) -> Linearization {
    let index: BTreeMap<Txid, &RemovedTransaction> =
        txs.iter().map(|tx| (tx.txid, tx)).collect();

    // Ancestor sets (each containing the transaction itself), shrunk as
    // chunks are carved off.
    let mut pending: BTreeMap<Txid, BTreeSet<Txid>> = index
        .keys()
        .map(|&txid| (txid, ancestor_closure(txid, &index)))
        .collect();

    let mut result = Linearization::default();
    while !pending.is_empty() {
        let mut best: Option<(FeeFrac, Txid)> = None;
        for (&txid, ancestors) in &pending {
            let mut aggregate = FeeFrac::EMPTY;
            for member in ancestors {
                aggregate += index[member].fee_frac();
            }
            // Strict comparison keeps the first (smallest-txid) sponsor on
            // exact fee/size ties; the FeeFrac order already prefers the
            // smaller aggregate size on feerate ties.
            if best.map_or(true, |(best_frac, _)| aggregate > best_frac) {
                best = Some((aggregate, txid));
            }
        }

        let (aggregate, sponsor) = best.expect("pending is non-empty");
        let members = pending.remove(&sponsor).expect("sponsor is pending");
        let chunk_index = result.chunks.len();
        result.chunks.push(aggregate);
        for member in &members {
            result.inclusion_order.insert(*member, chunk_index);
            pending.remove(member);
        }
        for ancestors in pending.values_mut() {
            for member in &members {
                ancestors.remove(member);
            }
        }
    }
    result
}

/// Ancestor and descendant sets for every transaction in `txs`, each set
/// containing the transaction itself. Ancestors are transitively closed
/// over in-set parents.
pub fn tx_ancestors_and_descendants(
    txs: &[RemovedTransaction],
) -> HashMap<Txid, (HashSet<Txid>, HashSet<Txid>)> {
    let index: BTreeMap<Txid, &RemovedTransaction> =
        txs.iter().map(|tx| (tx.txid, tx)).collect();

    let mut topology: HashMap<Txid, (HashSet<Txid>, HashSet<Txid>)> = index
        .keys()
        .map(|&txid| {
            let ancestors: HashSet<Txid> =
                ancestor_closure(txid, &index).into_iter().collect();
            (txid, (ancestors, HashSet::from([txid])))
        })
        .collect();

    // Invert: a is an ancestor of d exactly when d descends from a.
    let edges: Vec<(Txid, Txid)> = topology
        .iter()
        .flat_map(|(&descendant, (ancestors, _))| {
            ancestors.iter().map(move |&ancestor| (ancestor, descendant))
        })
        .collect();
    for (ancestor, descendant) in edges {
        if let Some((_, descendants)) = topology.get_mut(&ancestor) {
            descendants.insert(descendant);
        }
    }
    topology
}

/// In-set ancestors of `txid`, including itself.
fn ancestor_closure(txid: Txid, index: &BTreeMap<Txid, &RemovedTransaction>) -> BTreeSet<Txid> {
    let mut closure = BTreeSet::new();
    let mut stack = vec![txid];
    while let Some(current) = stack.pop() {
        if !closure.insert(current) {
            continue;
        }
        for parent in &index[&current].parents {
            if index.contains_key(parent) && !closure.contains(parent) {
                stack.push(*parent);
            }
        }
    }
    closure
}
