//! The individual forecasting strategies.

mod block;
mod last_block;
mod mempool;
mod mempool_last_10_min;
mod ntime;

pub use block::{BlockForecaster, MAX_NUMBER_OF_BLOCKS};
pub use last_block::{LastBlockForecaster, LAST_BLOCK_FORECAST_MAX_TARGET};
pub use mempool::MempoolForecaster;
pub use mempool_last_10_min::{MempoolLastTenMinutesForecaster, URGENCY_WINDOW};
pub use ntime::{NTimeForecaster, MAX_HOURS, SECONDS_IN_HOUR, STATS_UPDATE_INTERVAL};

use crate::error::ForecastError;
use crate::forecaster::ForecasterKind;

/// Shared confirmation-target validation: targets must be positive and
/// within the forecaster's range.
pub(crate) fn target_error(
    kind: ForecasterKind,
    target: u32,
    max_target: u32,
) -> Option<ForecastError> {
    if target == 0 {
        Some(ForecastError::invalid_target(format!(
            "{kind}: confirmation target must be greater than zero"
        )))
    } else if target > max_target {
        Some(ForecastError::invalid_target(format!(
            "{kind}: confirmation target {target} is above the maximum limit of {max_target}"
        )))
    } else {
        None
    }
}
