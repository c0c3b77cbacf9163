use crate::error::ForecastError;
use crate::fee_rate::FeeRate;
use crate::forecaster::ForecasterKind;

/// What a forecaster produced: a pair of estimates, or the reason there
/// is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastOutcome {
    Success {
        /// Fee rate expected to suffice for low-priority confirmation.
        low_priority: FeeRate,
        /// Fee rate expected to suffice for high-priority confirmation.
        high_priority: FeeRate,
    },
    Failure(ForecastError),
}

/// A forecaster's answer, carrying provenance for diagnostics.
///
/// A success with both rates zero carries no information and is treated
/// exactly like a failure by [`is_empty`](Self::is_empty) and by the
/// aggregator's selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastResult {
    pub forecaster: ForecasterKind,
    /// Chain tip height when the forecast was formed.
    pub block_height: u32,
    pub outcome: ForecastOutcome,
}

impl ForecastResult {
    pub fn success(
        forecaster: ForecasterKind,
        block_height: u32,
        low_priority: FeeRate,
        high_priority: FeeRate,
    ) -> Self {
        Self {
            forecaster,
            block_height,
            outcome: ForecastOutcome::Success { low_priority, high_priority },
        }
    }

    pub fn failure(forecaster: ForecasterKind, block_height: u32, error: ForecastError) -> Self {
        Self { forecaster, block_height, outcome: ForecastOutcome::Failure(error) }
    }

    /// True for failures and for zero-rate successes.
    pub fn is_empty(&self) -> bool {
        match &self.outcome {
            ForecastOutcome::Success { low_priority, high_priority } => {
                *low_priority == FeeRate::ZERO && *high_priority == FeeRate::ZERO
            }
            ForecastOutcome::Failure(_) => true,
        }
    }

    pub fn low_priority(&self) -> Option<FeeRate> {
        match &self.outcome {
            ForecastOutcome::Success { low_priority, .. } => Some(*low_priority),
            ForecastOutcome::Failure(_) => None,
        }
    }

    pub fn high_priority(&self) -> Option<FeeRate> {
        match &self.outcome {
            ForecastOutcome::Success { high_priority, .. } => Some(*high_priority),
            ForecastOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ForecastError> {
        match &self.outcome {
            ForecastOutcome::Failure(error) => Some(error),
            ForecastOutcome::Success { .. } => None,
        }
    }

    /// Selection order for the aggregator: any non-empty result beats an
    /// empty one, and among non-empty results the lower low-priority rate
    /// wins (empty results sort above everything, so "take the minimum"
    /// works in a single pass).
    pub fn is_better_than(&self, other: &ForecastResult) -> bool {
        if self.is_empty() {
            return false;
        }
        if other.is_empty() {
            return true;
        }
        self.low_priority() < other.low_priority()
    }
}
