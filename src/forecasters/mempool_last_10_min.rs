use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::adapters::{ChainView, MempoolView, TemplateProvider};
use crate::config::ForecastingConfig;
use crate::error::{ForecastError, Result};
use crate::forecast_result::ForecastResult;
use crate::forecaster::{Forecaster, ForecasterKind};
use crate::percentiles::{
    calculate_block_percentiles, DEFAULT_BLOCK_MAX_WEIGHT, WITNESS_SCALE_FACTOR,
};

/// How recently a package's first transaction must have arrived for the
/// package to be weighted double.
pub const URGENCY_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Mempool-template forecaster biased toward fresh traffic.
///
/// Packages whose representative transaction arrived within the last ten
/// minutes count twice in the percentile walk: other nodes are likely
/// seeing the same transactions, so recent arrivals say more about the
/// next block than the mempool's long tail does. The walk stops before
/// the doubled weight would exceed a block.
pub struct MempoolLastTenMinutesForecaster {
    chain: Arc<dyn ChainView>,
    mempool: Arc<dyn MempoolView>,
    template: Arc<dyn TemplateProvider>,
    max_target: u32,
}

impl MempoolLastTenMinutesForecaster {
    pub fn new(
        chain: Arc<dyn ChainView>,
        mempool: Arc<dyn MempoolView>,
        template: Arc<dyn TemplateProvider>,
    ) -> Self {
        Self { chain, mempool, template, max_target: ForecastingConfig::default().mempool_max_target }
    }

    pub fn with_config(
        config: &ForecastingConfig,
        chain: Arc<dyn ChainView>,
        mempool: Arc<dyn MempoolView>,
        template: Arc<dyn TemplateProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { chain, mempool, template, max_target: config.mempool_max_target })
    }
}

impl Forecaster for MempoolLastTenMinutesForecaster {
    fn kind(&self) -> ForecasterKind {
        ForecasterKind::MempoolLastTenMinutes
    }

    fn estimate(&self, target: u32) -> ForecastResult {
        let kind = self.kind();
        let height = self.chain.active_tip_height();

        if let Some(error) = super::target_error(kind, target, self.max_target) {
            return ForecastResult::failure(kind, height, error);
        }
        if !self.mempool.load_tried() {
            return ForecastResult::failure(
                kind,
                height,
                ForecastError::not_ready(format!(
                    "{kind}: mempool not finished loading, can't get an accurate feerate forecast"
                )),
            );
        }

        let template = self.template.next_block_template();
        if template.is_empty() {
            return ForecastResult::failure(
                kind,
                height,
                ForecastError::no_data(format!(
                    "{kind}: no transactions available in the mempool"
                )),
            );
        }

        let cutoff = Utc::now().timestamp() - URGENCY_WINDOW.as_secs() as i64;
        let mut block_weight: u64 = 0;
        let mut weighted_stats = Vec::with_capacity(template.package_feerates.len());
        for (index, &(fee_rate, vsize)) in template.package_feerates.iter().enumerate() {
            let weight = vsize * WITNESS_SCALE_FACTOR;
            let urgent = template
                .package_reps
                .get(index)
                .and_then(|txid| self.mempool.entry(txid))
                .is_some_and(|entry| entry.arrival_time >= cutoff);

            let effective_weight = if urgent { 2 * weight } else { weight };
            if block_weight + effective_weight > DEFAULT_BLOCK_MAX_WEIGHT {
                break;
            }
            block_weight += effective_weight;
            weighted_stats.push((fee_rate, vsize));
            if urgent {
                weighted_stats.push((fee_rate, vsize));
            }
        }

        let percentiles = calculate_block_percentiles(&weighted_stats);
        if percentiles.is_empty() {
            return ForecastResult::failure(
                kind,
                height,
                ForecastError::insufficient_data(format!(
                    "{kind}: not enough transactions in the mempool to provide a feerate forecast"
                )),
            );
        }

        debug!(
            forecaster = %kind,
            height,
            packages = weighted_stats.len(),
            p5 = percentiles.p5.sat_per_kvb(),
            p25 = percentiles.p25.sat_per_kvb(),
            p50 = percentiles.p50.sat_per_kvb(),
            p75 = percentiles.p75.sat_per_kvb(),
            "urgency-weighted template percentiles"
        );

        ForecastResult::success(kind, height, percentiles.p25, percentiles.p50)
    }

    fn max_target(&self) -> u32 {
        self.max_target
    }
}
