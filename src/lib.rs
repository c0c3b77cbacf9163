//! Fee Forecaster - a multi-forecaster fee estimation engine
//!
//! This library estimates the fee rate a transaction should pay to
//! confirm within a stated target, from the embedding node's view of the
//! unconfirmed mempool and the recent history of confirmed blocks.
//! Several forecasting strategies run side by side; a query fans out to
//! all of them and the cheapest defensible answer wins, with every
//! decliner's reason reported back for diagnostics.
//!
//! # Features
//! - Exact fractional feerate arithmetic (no floating point in ordering
//!   decisions) with feerate-diagram comparison
//! - Miner-like block linearization of dependent transaction sets
//! - Five forecasting strategies spanning "what is in the mempool right
//!   now" to "what confirmed over the last three weeks"
//! - A TTL cache so bursty queries do not rebuild block templates under
//!   the host's locks
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use fee_forecaster::{
//!     BlockConnectedEvent, EventBus, FeeEstimator, LastBlockForecaster, RemovedTransaction,
//!     Txid,
//! };
//!
//! let event_bus = Arc::new(EventBus::new());
//! let fee_estimator = FeeEstimator::new(&event_bus);
//!
//! let last_block = Arc::new(LastBlockForecaster::new());
//! event_bus.subscribe(last_block.clone());
//! fee_estimator.register_forecaster(last_block);
//!
//! // The host delivers one event per connected block, in height order.
//! event_bus.block_connected(&BlockConnectedEvent {
//!     txs_removed_for_block: vec![RemovedTransaction {
//!         txid: Txid::from_low_u64_be(1),
//!         fee: 75_000_000,
//!         vsize: 750_000,
//!         arrival_time: 0,
//!         parents: vec![],
//!     }],
//!     height: 850_001,
//!     ..Default::default()
//! });
//!
//! // Callers ask for a confirmation target and get the best answer any
//! // forecaster produced, plus the other forecasters' reasons.
//! let (best, _errors) = fee_estimator.get_fee_estimate_from_forecasters(1);
//! assert!(best.is_some());
//! ```

pub mod error;

// Exact-arithmetic primitives
mod diagram;
mod fee_frac;
mod fee_rate;

// Data structures
mod config;
mod forecast_result;
mod percentiles;
mod tx;

// Engine
mod adapters;
mod cache;
mod event_bus;
mod fee_estimator;
mod forecaster;
mod forecasters;
mod linearizer;

// Public exports
pub use adapters::{ChainView, MempoolView, NextBlockTemplate, TemplateProvider};
pub use cache::{CachedEstimates, CACHE_LIFE};
pub use config::ForecastingConfig;
pub use diagram::{build_diagram_from_unsorted_chunks, compare_feerate_diagrams};
pub use error::{ForecastError, Result};
pub use event_bus::{BlockConnectedEvent, BlockObserver, EventBus};
pub use fee_estimator::{FeeEstimator, MAX_UNCONF_COUNT};
pub use fee_frac::FeeFrac;
pub use fee_rate::FeeRate;
pub use forecast_result::{ForecastOutcome, ForecastResult};
pub use forecaster::{Forecaster, ForecasterKind};
pub use forecasters::{
    BlockForecaster, LastBlockForecaster, MempoolForecaster, MempoolLastTenMinutesForecaster,
    NTimeForecaster, LAST_BLOCK_FORECAST_MAX_TARGET, MAX_HOURS, MAX_NUMBER_OF_BLOCKS,
    SECONDS_IN_HOUR, STATS_UPDATE_INTERVAL, URGENCY_WINDOW,
};
pub use linearizer::{linearize, tx_ancestors_and_descendants, Linearization};
pub use percentiles::{
    calculate_block_percentiles, BlockPercentiles, DEFAULT_BLOCK_MAX_WEIGHT, MAX_BLOCK_WEIGHT,
    WITNESS_SCALE_FACTOR,
};
pub use tx::{MempoolEntry, RemovedTransaction, TxSummary, Txid};
