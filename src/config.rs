use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Construction options for the standard set of forecasters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastingConfig {
    /// Largest confirmation target (blocks) the mempool-based forecasters
    /// answer for. Mempool conditions drift, so estimates further out
    /// than a few blocks are unreliable.
    pub mempool_max_target: u32,
    /// Largest confirmation target (blocks) the sliding-window block
    /// forecaster answers for.
    pub block_window_max_target: u32,
    /// How long mempool-based estimates stay cached before the template
    /// is rebuilt.
    pub cache_ttl_secs: u64,
}

impl Default for ForecastingConfig {
    fn default() -> Self {
        Self { mempool_max_target: 3, block_window_max_target: 3, cache_ttl_secs: 30 }
    }
}

impl ForecastingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.mempool_max_target == 0 {
            return Err(ForecastError::invalid_config(
                "mempool_max_target must be at least one block",
            ));
        }
        if self.block_window_max_target == 0 {
            return Err(ForecastError::invalid_config(
                "block_window_max_target must be at least one block",
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err(ForecastError::invalid_config("cache_ttl_secs must be non-zero"));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
