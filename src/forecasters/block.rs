use std::collections::VecDeque;

use parking_lot::RwLock;
use tracing::debug;

use crate::config::ForecastingConfig;
use crate::error::{ForecastError, Result};
use crate::event_bus::{BlockConnectedEvent, BlockObserver};
use crate::fee_rate::FeeRate;
use crate::forecast_result::ForecastResult;
use crate::forecaster::{Forecaster, ForecasterKind};
use crate::linearizer::linearize;
use crate::percentiles::{calculate_block_percentiles, BlockPercentiles};

/// Depth of the sliding window of per-block percentiles.
pub const MAX_NUMBER_OF_BLOCKS: usize = 3;

/// Forecasts from a sliding window of recent blocks.
///
/// Each qualifying block contributes its linearization percentiles to a
/// bounded FIFO; estimates are the entrywise arithmetic mean over the
/// window and are only served once the window is full.
pub struct BlockForecaster {
    state: RwLock<State>,
    max_target: u32,
}

#[derive(Default)]
struct State {
    chain_tip_height: u32,
    window: VecDeque<BlockPercentiles>,
}

impl BlockForecaster {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            max_target: ForecastingConfig::default().block_window_max_target,
        }
    }

    pub fn with_config(config: &ForecastingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { state: RwLock::new(State::default()), max_target: config.block_window_max_target })
    }

    fn window_average(window: &VecDeque<BlockPercentiles>) -> BlockPercentiles {
        let count = window.len() as i64;
        let mut sums = [0i64; 4];
        for percentiles in window {
            sums[0] += percentiles.p5.sat_per_kvb();
            sums[1] += percentiles.p25.sat_per_kvb();
            sums[2] += percentiles.p50.sat_per_kvb();
            sums[3] += percentiles.p75.sat_per_kvb();
        }
        BlockPercentiles {
            p5: FeeRate::from_sat_per_kvb(sums[0] / count),
            p25: FeeRate::from_sat_per_kvb(sums[1] / count),
            p50: FeeRate::from_sat_per_kvb(sums[2] / count),
            p75: FeeRate::from_sat_per_kvb(sums[3] / count),
        }
    }
}

impl Default for BlockForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockObserver for BlockForecaster {
    fn on_block_connected(&self, event: &BlockConnectedEvent) {
        let stats = linearize(&event.txs_removed_for_block).size_per_feerate();
        let percentiles = calculate_block_percentiles(&stats);

        let mut state = self.state.write();
        state.chain_tip_height = event.height;
        if !percentiles.is_empty() {
            if state.window.len() == MAX_NUMBER_OF_BLOCKS {
                state.window.pop_front();
            }
            state.window.push_back(percentiles);
        }
    }
}

impl Forecaster for BlockForecaster {
    fn kind(&self) -> ForecasterKind {
        ForecasterKind::BlockWindow
    }

    fn estimate(&self, target: u32) -> ForecastResult {
        let kind = self.kind();
        let state = self.state.read();
        let height = state.chain_tip_height;

        if let Some(error) = super::target_error(kind, target, self.max_target) {
            return ForecastResult::failure(kind, height, error);
        }
        if state.window.len() < MAX_NUMBER_OF_BLOCKS {
            return ForecastResult::failure(
                kind,
                height,
                ForecastError::not_ready(format!(
                    "{kind}: insufficient block data to perform an estimate"
                )),
            );
        }

        let average = Self::window_average(&state.window);
        debug!(
            forecaster = %kind,
            height,
            p5 = average.p5.sat_per_kvb(),
            p25 = average.p25.sat_per_kvb(),
            p50 = average.p50.sat_per_kvb(),
            p75 = average.p75.sat_per_kvb(),
            "block-window percentiles"
        );

        ForecastResult::success(kind, height, average.p25, average.p50)
    }

    fn max_target(&self) -> u32 {
        self.max_target
    }
}
