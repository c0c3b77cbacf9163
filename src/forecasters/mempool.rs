use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::adapters::{ChainView, MempoolView, TemplateProvider};
use crate::cache::CachedEstimates;
use crate::config::ForecastingConfig;
use crate::error::{ForecastError, Result};
use crate::forecast_result::ForecastResult;
use crate::forecaster::{Forecaster, ForecasterKind};
use crate::percentiles::calculate_block_percentiles;

/// Forecasts from a next-block template of the current mempool.
///
/// The template is the best predictor of the very next blocks, so this
/// forecaster answers only short targets. Because building a template
/// happens under the host's locks, the computed percentiles are cached
/// under the tip height they were computed at and reused until the cache
/// goes stale.
pub struct MempoolForecaster {
    chain: Arc<dyn ChainView>,
    mempool: Arc<dyn MempoolView>,
    template: Arc<dyn TemplateProvider>,
    cache: CachedEstimates,
    max_target: u32,
}

impl MempoolForecaster {
    pub fn new(
        chain: Arc<dyn ChainView>,
        mempool: Arc<dyn MempoolView>,
        template: Arc<dyn TemplateProvider>,
    ) -> Self {
        let config = ForecastingConfig::default();
        Self {
            chain,
            mempool,
            template,
            cache: CachedEstimates::with_ttl(config.cache_ttl()),
            max_target: config.mempool_max_target,
        }
    }

    pub fn with_config(
        config: &ForecastingConfig,
        chain: Arc<dyn ChainView>,
        mempool: Arc<dyn MempoolView>,
        template: Arc<dyn TemplateProvider>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chain,
            mempool,
            template,
            cache: CachedEstimates::with_ttl(config.cache_ttl()),
            max_target: config.mempool_max_target,
        })
    }
}

impl Forecaster for MempoolForecaster {
    fn kind(&self) -> ForecasterKind {
        ForecasterKind::Mempool
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

        if let Some(cached) = self.cache.get(u64::from(height)) {
            return ForecastResult::success(kind, height, cached.p25, cached.p50);
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

        let percentiles = calculate_block_percentiles(&template.package_feerates);
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
            p5 = percentiles.p5.sat_per_kvb(),
            p25 = percentiles.p25.sat_per_kvb(),
            p50 = percentiles.p50.sat_per_kvb(),
            p75 = percentiles.p75.sat_per_kvb(),
            "next-block template percentiles"
        );

        self.cache.update(HashMap::from([(u64::from(height), percentiles)]));
        ForecastResult::success(kind, height, percentiles.p25, percentiles.p50)
    }

    fn max_target(&self) -> u32 {
        self.max_target
    }
}
