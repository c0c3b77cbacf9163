//! End-to-end behavior of the forecasters and the aggregator, driven
//! through the event bus and an in-memory host node.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;

use common::{block_event, mempool_tx, MockNode};
use fee_forecaster::{
    BlockForecaster, BlockPercentiles, CachedEstimates, EventBus, FeeEstimator, FeeRate,
    ForecastError, ForecastResult, Forecaster, ForecasterKind, LastBlockForecaster,
    MempoolForecaster, MempoolLastTenMinutesForecaster, NTimeForecaster,
};

/// Fee (in sats) that prices `vsize` at `rate` sat/kvB.
fn fee_for(rate: i64, vsize: i64) -> i64 {
    rate * vsize / 1000
}

#[test]
fn mempool_forecaster_validates_targets_and_readiness() {
    let node = MockNode::new(100);
    let forecaster =
        MempoolForecaster::new(node.clone(), node.clone(), node.clone());

    let zero = forecaster.estimate(0);
    assert!(matches!(zero.error(), Some(ForecastError::InvalidTarget(_))));

    let too_far = forecaster.estimate(4);
    assert!(matches!(too_far.error(), Some(ForecastError::InvalidTarget(_))));
    assert_eq!(forecaster.max_target(), 3);

    node.set_load_tried(false);
    let not_loaded = forecaster.estimate(1);
    assert!(matches!(not_loaded.error(), Some(ForecastError::NotReady(_))));

    node.set_load_tried(true);
    let no_txs = forecaster.estimate(1);
    assert!(matches!(no_txs.error(), Some(ForecastError::NoData(_))));
}

#[test]
fn mempool_forecaster_serves_template_percentiles_and_caches_them() {
    let node = MockNode::new(100);
    node.add_tx(mempool_tx(1, fee_for(100_000, 750_000), 750_000, 0));
    let forecaster =
        MempoolForecaster::new(node.clone(), node.clone(), node.clone());

    let result = forecaster.estimate(1);
    assert_eq!(result.forecaster, ForecasterKind::Mempool);
    assert_eq!(result.block_height, 100);
    assert_eq!(result.low_priority(), Some(FeeRate::from_sat_per_kvb(100_000)));
    assert_eq!(result.high_priority(), Some(FeeRate::from_sat_per_kvb(100_000)));

    // The second query is served from the cache without rebuilding the
    // template.
    let again = forecaster.estimate(1);
    assert_eq!(again, result);
    assert_eq!(node.template_calls(), 1);

    // A new tip misses the height-keyed cache and rebuilds.
    node.set_height(101);
    forecaster.estimate(1);
    assert_eq!(node.template_calls(), 2);
}

#[test]
fn urgent_transactions_count_twice() {
    let node = MockNode::new(100);
    // An old package and a fresh one; neither alone fills three quarters
    // of a block, so the plain forecaster has no 75th percentile.
    node.add_tx(mempool_tx(1, fee_for(50_000, 250_000), 250_000, 0));
    node.add_tx(mempool_tx(2, fee_for(20_000, 250_000), 250_000, Utc::now().timestamp()));

    let plain = MempoolForecaster::new(node.clone(), node.clone(), node.clone());
    assert!(matches!(
        plain.estimate(1).error(),
        Some(ForecastError::InsufficientData(_))
    ));

    // Doubling the fresh package pushes cumulative weight past the 3/4
    // threshold.
    let weighted =
        MempoolLastTenMinutesForecaster::new(node.clone(), node.clone(), node.clone());
    let result = weighted.estimate(1);
    assert_eq!(result.forecaster, ForecasterKind::MempoolLastTenMinutes);
    assert_eq!(result.low_priority(), Some(FeeRate::from_sat_per_kvb(50_000)));
    assert_eq!(result.high_priority(), Some(FeeRate::from_sat_per_kvb(20_000)));
}

#[test]
fn last_block_forecaster_tracks_the_latest_block() {
    let bus = EventBus::new();
    let forecaster = Arc::new(LastBlockForecaster::new());
    bus.subscribe(forecaster.clone());

    let warming = forecaster.estimate(1);
    assert!(matches!(warming.error(), Some(ForecastError::InsufficientData(_))));

    bus.block_connected(&block_event(
        101,
        vec![mempool_tx(1, fee_for(10_000, 1_000_000), 1_000_000, 0)],
    ));
    let result = forecaster.estimate(1);
    assert_eq!(result.block_height, 101);
    assert_eq!(result.low_priority(), Some(FeeRate::from_sat_per_kvb(10_000)));

    // Beyond the last block's reach.
    assert!(forecaster.estimate(3).error().is_some());

    // A newer block replaces the stored percentiles.
    bus.block_connected(&block_event(
        102,
        vec![mempool_tx(2, fee_for(40_000, 1_000_000), 1_000_000, 0)],
    ));
    let result = forecaster.estimate(1);
    assert_eq!(result.block_height, 102);
    assert_eq!(result.low_priority(), Some(FeeRate::from_sat_per_kvb(40_000)));
}

#[test]
fn block_forecaster_averages_a_full_window() {
    let bus = EventBus::new();
    let forecaster = Arc::new(BlockForecaster::new());
    bus.subscribe(forecaster.clone());

    for (height, rate) in [(101, 10_000), (102, 20_000)] {
        bus.block_connected(&block_event(
            height,
            vec![mempool_tx(height as u64, fee_for(rate, 1_000_000), 1_000_000, 0)],
        ));
        // Two blocks are not enough for a three-block window.
        assert!(matches!(
            forecaster.estimate(1).error(),
            Some(ForecastError::NotReady(_))
        ));
    }

    bus.block_connected(&block_event(
        103,
        vec![mempool_tx(103, fee_for(30_000, 1_000_000), 1_000_000, 0)],
    ));
    let result = forecaster.estimate(1);
    assert_eq!(result.low_priority(), Some(FeeRate::from_sat_per_kvb(20_000)));

    // A fourth block evicts the oldest and shifts the average.
    bus.block_connected(&block_event(
        104,
        vec![mempool_tx(104, fee_for(40_000, 1_000_000), 1_000_000, 0)],
    ));
    let result = forecaster.estimate(1);
    assert_eq!(result.low_priority(), Some(FeeRate::from_sat_per_kvb(30_000)));
}

/// Canned forecaster for exercising the aggregator's selection rule.
struct StaticForecaster {
    kind: ForecasterKind,
    max_target: u32,
    result: ForecastResult,
}

impl StaticForecaster {
    fn success(kind: ForecasterKind, max_target: u32, low: i64, high: i64) -> Self {
        Self {
            kind,
            max_target,
            result: ForecastResult::success(
                kind,
                100,
                FeeRate::from_sat_per_kvb(low),
                FeeRate::from_sat_per_kvb(high),
            ),
        }
    }

    fn failure(kind: ForecasterKind, max_target: u32, error: ForecastError) -> Self {
        Self { kind, max_target, result: ForecastResult::failure(kind, 100, error) }
    }
}

impl Forecaster for StaticForecaster {
    fn kind(&self) -> ForecasterKind {
        self.kind
    }

    fn estimate(&self, _target: u32) -> ForecastResult {
        self.result.clone()
    }

    fn max_target(&self) -> u32 {
        self.max_target
    }
}

#[test]
fn aggregator_selects_the_cheapest_non_empty_result() {
    let bus = EventBus::new();
    let estimator = FeeEstimator::new(&bus);

    estimator.register_forecaster(Arc::new(StaticForecaster::success(
        ForecasterKind::Mempool,
        3,
        5000,
        9000,
    )));
    estimator.register_forecaster(Arc::new(StaticForecaster::success(
        ForecasterKind::BlockWindow,
        3,
        3000,
        7000,
    )));
    estimator.register_forecaster(Arc::new(StaticForecaster::failure(
        ForecasterKind::LastBlock,
        2,
        ForecastError::insufficient_data("last-block: insufficient block data"),
    )));

    let (best, errors) = estimator.get_fee_estimate_from_forecasters(1);
    let best = best.expect("two forecasters produced estimates");
    assert_eq!(best.forecaster, ForecasterKind::BlockWindow);
    assert_eq!(best.low_priority(), Some(FeeRate::from_sat_per_kvb(3000)));
    assert_eq!(errors.len(), 1);
}

#[test]
fn aggregator_reports_every_failure() {
    let bus = EventBus::new();
    let estimator = FeeEstimator::new(&bus);
    estimator.register_forecaster(Arc::new(StaticForecaster::failure(
        ForecasterKind::Mempool,
        3,
        ForecastError::no_data("mempool: no transactions"),
    )));
    estimator.register_forecaster(Arc::new(StaticForecaster::failure(
        ForecasterKind::NTime,
        504,
        ForecastError::insufficient_data("ntime: not enough tracked data"),
    )));

    let (best, errors) = estimator.get_fee_estimate_from_forecasters(1);
    assert!(best.is_none());
    assert_eq!(errors.len(), 2);
}

#[test]
fn max_forecasting_target_spans_all_forecasters() {
    let bus = EventBus::new();
    let estimator = FeeEstimator::new(&bus);
    assert_eq!(estimator.max_forecasting_target(), 0);

    estimator.register_forecaster(Arc::new(StaticForecaster::success(
        ForecasterKind::Mempool,
        3,
        1,
        1,
    )));
    estimator.register_forecaster(Arc::new(StaticForecaster::success(
        ForecasterKind::NTime,
        504,
        1,
        1,
    )));
    estimator.register_forecaster(Arc::new(StaticForecaster::success(
        ForecasterKind::LastBlock,
        2,
        1,
        1,
    )));
    assert_eq!(estimator.max_forecasting_target(), 504);
}

#[test]
fn cache_serves_within_ttl_and_expires_after() {
    let cache = CachedEstimates::with_ttl(Duration::from_millis(60));
    assert_eq!(cache.get(1), None);

    let percentiles = BlockPercentiles {
        p5: FeeRate::from_sat_per_kvb(40_000),
        p25: FeeRate::from_sat_per_kvb(30_000),
        p50: FeeRate::from_sat_per_kvb(20_000),
        p75: FeeRate::from_sat_per_kvb(10_000),
    };
    cache.update(HashMap::from([(1, percentiles)]));
    assert_eq!(cache.get(1), Some(percentiles));

    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(cache.get(1), None);
}

#[test]
fn full_pipeline_produces_an_estimate_and_syncs() {
    let node = MockNode::new(100);
    let bus = EventBus::new();
    let estimator = FeeEstimator::new(&bus);

    let last_block = Arc::new(LastBlockForecaster::new());
    let block_window = Arc::new(BlockForecaster::new());
    let ntime = Arc::new(NTimeForecaster::new());
    bus.subscribe(last_block.clone());
    bus.subscribe(block_window.clone());
    bus.subscribe(ntime.clone());

    estimator.register_forecaster(Arc::new(MempoolForecaster::new(
        node.clone(),
        node.clone(),
        node.clone(),
    )));
    estimator.register_forecaster(Arc::new(MempoolLastTenMinutesForecaster::new(
        node.clone(),
        node.clone(),
        node.clone(),
    )));
    estimator.register_forecaster(last_block);
    estimator.register_forecaster(block_window);
    estimator.register_forecaster(ntime);

    // Three predicted blocks connect in height order.
    for (height, rate) in [(101, 30_000), (102, 20_000), (103, 25_000)] {
        bus.block_connected(&block_event(
            height,
            vec![mempool_tx(height as u64, fee_for(rate, 1_000_000), 1_000_000, 0)],
        ));
    }
    node.set_height(103);
    assert!(estimator.is_roughly_synced());

    // The mempool holds a block's worth of fresh transactions.
    node.add_tx(mempool_tx(1000, fee_for(15_000, 900_000), 900_000, Utc::now().timestamp()));

    let (best, errors) = estimator.get_fee_estimate_from_forecasters(1);
    let best = best.expect("block history forecasters are warm");
    assert!(best.low_priority().is_some());
    // The time-bucketed forecaster has no day-old baseline yet and must
    // have reported that.
    assert!(!errors.is_empty());
}
