use std::fmt;

use serde::{Deserialize, Serialize};

use crate::forecast_result::ForecastResult;

/// Identifies which forecasting strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForecasterKind {
    /// Percentiles of a next-block template built from the whole mempool.
    Mempool,
    /// Mempool template with transactions seen in the last ten minutes
    /// weighted double.
    MempoolLastTenMinutes,
    /// Percentiles of the most recently confirmed block.
    LastBlock,
    /// Entrywise average over a sliding window of recent blocks.
    BlockWindow,
    /// Confirmation-latency tracking bucketed by hours.
    NTime,
}

impl fmt::Display for ForecasterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ForecasterKind::Mempool => "mempool",
            ForecasterKind::MempoolLastTenMinutes => "mempool-last-10-min",
            ForecasterKind::LastBlock => "last-block",
            ForecasterKind::BlockWindow => "block-window",
            ForecasterKind::NTime => "ntime",
        })
    }
}

/// A fee rate forecaster.
///
/// Forecasters are constructed once at startup and live for the process.
/// `estimate` may be called from any thread; implementations that also
/// observe block events must serialize their own state, since ingest runs
/// on a dedicated thread separate from queries.
///
/// The target unit is the forecaster's native one: blocks for the mempool
/// and block-history strategies, hours for the time-bucketed one.
pub trait Forecaster: Send + Sync {
    fn kind(&self) -> ForecasterKind;

    /// Estimates the fee rate for confirmation within `target`.
    ///
    /// Never panics; every refusal is reported as a failed
    /// [`ForecastResult`].
    fn estimate(&self, target: u32) -> ForecastResult;

    /// The largest target this forecaster will answer for.
    fn max_target(&self) -> u32;
}
