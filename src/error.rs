use thiserror::Error;

/// Reasons a forecaster declines to produce an estimate, or construction
/// fails.
///
/// None of these are fatal: forecast errors travel inside
/// [`ForecastResult`](crate::ForecastResult) and the aggregator keeps
/// querying the remaining forecasters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForecastError {
    /// The confirmation target is zero or beyond the forecaster's range.
    #[error("invalid confirmation target: {0}")]
    InvalidTarget(String),

    /// The forecaster has not accumulated the state it needs yet.
    #[error("not ready: {0}")]
    NotReady(String),

    /// Data exists but is too thin to trust.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Nothing to estimate from at all.
    #[error("no data: {0}")]
    NoData(String),

    /// Invalid construction options.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Type alias for Results in this library.
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    pub fn invalid_target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
