//! Error taxonomy for data acquisition, cycles and configuration.

use std::time::Duration;
use thiserror::Error;

/// Failure to obtain a well-formed candle. Always transient from the
/// orchestrator's point of view.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("data source returned status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("no PE leg found for strike {0}")]
    StrikeNotFound(f64),
    #[error("rejected malformed candle: {0}")]
    InvalidCandle(String),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("data unavailable: {0}")]
    DataUnavailable(#[from] MarketDataError),
    #[error("unhandled cycle fault: {0}")]
    Fault(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
