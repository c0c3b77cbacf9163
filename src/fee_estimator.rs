use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::event_bus::{BlockConnectedEvent, BlockObserver, EventBus};
use crate::forecast_result::ForecastResult;
use crate::forecaster::Forecaster;
use crate::percentiles::WITNESS_SCALE_FACTOR;
use crate::tx::Txid;

/// Blocks an expected transaction may miss before the host is advised to
/// stop counting on it.
pub const MAX_UNCONF_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, Default)]
struct BlockInfo {
    height: u32,
    roughly_synced: bool,
}

#[derive(Default)]
struct SyncState {
    /// The last three connected blocks, newest first.
    top_blocks: [BlockInfo; 3],
    /// Consecutive blocks each expected-but-unconfirmed transaction has
    /// missed.
    unconfirmed_counts: HashMap<Txid, u32>,
}

/// Dispatches fee estimate queries to registered forecasters and selects
/// among their results.
///
/// Owned by the host alongside the [`EventBus`] it subscribes to; the
/// estimator watches block events only to judge whether the local mempool
/// is roughly in sync with what miners are confirming.
pub struct FeeEstimator {
    forecasters: RwLock<Vec<Arc<dyn Forecaster>>>,
    sync_state: Mutex<SyncState>,
}

impl FeeEstimator {
    /// Creates the estimator and subscribes it to `event_bus`.
    pub fn new(event_bus: &EventBus) -> Arc<Self> {
        let estimator = Arc::new(Self {
            forecasters: RwLock::new(Vec::new()),
            sync_state: Mutex::new(SyncState::default()),
        });
        event_bus.subscribe(estimator.clone());
        estimator
    }

    /// Appends a forecaster. Registration happens at startup; queries
    /// racing registration see whatever prefix is registered so far.
    pub fn register_forecaster(&self, forecaster: Arc<dyn Forecaster>) {
        self.forecasters.write().push(forecaster);
    }

    /// Queries every registered forecaster and returns the best non-empty
    /// result (lowest low-priority fee rate) together with every error
    /// message collected along the way. `None` means every forecaster
    /// declined.
    pub fn get_fee_estimate_from_forecasters(
        &self,
        target: u32,
    ) -> (Option<ForecastResult>, Vec<String>) {
        let forecasters = self.forecasters.read().clone();

        let mut best: Option<ForecastResult> = None;
        let mut errors = Vec::new();
        for forecaster in &forecasters {
            let result = forecaster.estimate(target);
            if let Some(error) = result.error() {
                debug!(
                    forecaster = %result.forecaster,
                    height = result.block_height,
                    %error,
                    "forecaster declined"
                );
                errors.push(error.to_string());
                continue;
            }
            if best.as_ref().map_or(!result.is_empty(), |current| result.is_better_than(current)) {
                best = Some(result);
            }
        }

        if let Some(result) = &best {
            info!(
                forecaster = %result.forecaster,
                height = result.block_height,
                low_priority = result.low_priority().unwrap_or_default().sat_per_kvb(),
                high_priority = result.high_priority().unwrap_or_default().sat_per_kvb(),
                target,
                "selected fee estimate"
            );
        }
        (best, errors)
    }

    /// Logs every registered forecaster's current answer, for comparing
    /// strategies side by side.
    pub fn log_all_estimates(&self, target: u32) {
        let forecasters = self.forecasters.read().clone();
        for forecaster in &forecasters {
            let result = forecaster.estimate(target);
            if result.is_empty() {
                continue;
            }
            info!(
                forecaster = %result.forecaster,
                height = result.block_height,
                low_priority = result.low_priority().unwrap_or_default().sat_per_kvb(),
                high_priority = result.high_priority().unwrap_or_default().sat_per_kvb(),
                target,
                "forecaster estimate"
            );
        }
    }

    /// Largest target any registered forecaster will answer for, in that
    /// forecaster's native unit.
    pub fn max_forecasting_target(&self) -> u32 {
        self.forecasters.read().iter().map(|f| f.max_target()).max().unwrap_or(0)
    }

    /// Whether the local mempool has recently been a good predictor of
    /// mined blocks: the last three blocks arrived in height order, and
    /// each was mostly made of transactions we had in the mempool and
    /// mostly matched what our own template expected.
    pub fn is_roughly_synced(&self) -> bool {
        let state = self.sync_state.lock();
        let [newest, middle, oldest] = state.top_blocks;
        newest.height == middle.height + 1
            && middle.height == oldest.height + 1
            && newest.roughly_synced
            && middle.roughly_synced
            && oldest.roughly_synced
    }

    /// Transactions our templates kept expecting that miners kept
    /// skipping. The host can exclude these when building the templates
    /// used for forecasting.
    pub fn txs_to_exclude(&self) -> HashSet<Txid> {
        let state = self.sync_state.lock();
        state
            .unconfirmed_counts
            .iter()
            .filter(|(_, &count)| count >= MAX_UNCONF_COUNT)
            .map(|(&txid, _)| txid)
            .collect()
    }
}

impl BlockObserver for FeeEstimator {
    fn on_block_connected(&self, event: &BlockConnectedEvent) {
        let block_txids: HashSet<Txid> = event.block_txs.iter().map(|tx| tx.txid).collect();
        let block_weight: u64 =
            event.block_txs.iter().map(|tx| tx.vsize * WITNESS_SCALE_FACTOR).sum();
        let removed_weight: u64 = event
            .txs_removed_for_block
            .iter()
            .map(|tx| tx.vsize.max(0) as u64 * WITNESS_SCALE_FACTOR)
            .sum();
        let expected_present_weight: u64 = event
            .expected_block_txs
            .iter()
            .filter(|tx| block_txids.contains(&tx.txid))
            .map(|tx| tx.vsize * WITNESS_SCALE_FACTOR)
            .sum();

        let roughly_synced = block_weight > 0
            && removed_weight * 2 > block_weight
            && expected_present_weight * 2 > block_weight;
        let new_block = BlockInfo { height: event.height, roughly_synced };

        let mut state = self.sync_state.lock();
        let previous = state.top_blocks;
        state.top_blocks = if event.height == previous[0].height + 1 {
            [new_block, previous[0], previous[1]]
        } else {
            // Out-of-order or skipped height: the window no longer
            // describes a contiguous run, start over.
            [new_block, BlockInfo::default(), BlockInfo::default()]
        };

        for expected in &event.expected_block_txs {
            if !block_txids.contains(&expected.txid) {
                *state.unconfirmed_counts.entry(expected.txid).or_insert(0) += 1;
            }
        }
        for txid in &block_txids {
            state.unconfirmed_counts.remove(txid);
        }

        debug!(
            height = event.height,
            roughly_synced,
            block_weight,
            removed_weight,
            expected_present_weight,
            "updated sync window"
        );
    }
}
