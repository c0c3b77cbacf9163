use parking_lot::RwLock;
use tracing::debug;

use crate::error::ForecastError;
use crate::event_bus::{BlockConnectedEvent, BlockObserver};
use crate::forecast_result::ForecastResult;
use crate::forecaster::{Forecaster, ForecasterKind};
use crate::linearizer::linearize;
use crate::percentiles::{calculate_block_percentiles, BlockPercentiles};

/// The last block says little beyond the next block or two.
pub const LAST_BLOCK_FORECAST_MAX_TARGET: u32 = 2;

/// Forecasts from the most recently confirmed block.
///
/// Each block-connected event re-linearizes the block's transactions and
/// replaces the stored percentiles, provided the block carried enough
/// weight to produce a 75th percentile.
#[derive(Default)]
pub struct LastBlockForecaster {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    chain_tip_height: u32,
    percentiles: BlockPercentiles,
}

impl LastBlockForecaster {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockObserver for LastBlockForecaster {
    fn on_block_connected(&self, event: &BlockConnectedEvent) {
        let stats = linearize(&event.txs_removed_for_block).size_per_feerate();
        let percentiles = calculate_block_percentiles(&stats);

        let mut state = self.state.write();
        state.chain_tip_height = event.height;
        if !percentiles.is_empty() {
            state.percentiles = percentiles;
        }
    }
}

impl Forecaster for LastBlockForecaster {
    fn kind(&self) -> ForecasterKind {
        ForecasterKind::LastBlock
    }

    fn estimate(&self, target: u32) -> ForecastResult {
        let kind = self.kind();
        let (height, percentiles) = {
            let state = self.state.read();
            (state.chain_tip_height, state.percentiles)
        };

        if let Some(error) = super::target_error(kind, target, LAST_BLOCK_FORECAST_MAX_TARGET) {
            return ForecastResult::failure(kind, height, error);
        }
        if percentiles.is_empty() {
            return ForecastResult::failure(
                kind,
                height,
                ForecastError::insufficient_data(format!(
                    "{kind}: insufficient block data to perform an estimate"
                )),
            );
        }

        debug!(
            forecaster = %kind,
            height,
            p5 = percentiles.p5.sat_per_kvb(),
            p25 = percentiles.p25.sat_per_kvb(),
            p50 = percentiles.p50.sat_per_kvb(),
            p75 = percentiles.p75.sat_per_kvb(),
            "last-block percentiles"
        );

        ForecastResult::success(kind, height, percentiles.p25, percentiles.p50)
    }

    fn max_target(&self) -> u32 {
        LAST_BLOCK_FORECAST_MAX_TARGET
    }
}
