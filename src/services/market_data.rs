//! Candle source interface consumed by the cycle orchestrator.

use async_trait::async_trait;

use crate::error::MarketDataError;
use crate::models::Candle;

#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Fetch exactly one new candle.
    ///
    /// Implementations must fail rather than return a partial or malformed
    /// candle, and should bound their own network time.
    async fn fetch_latest_candle(&self) -> Result<Candle, MarketDataError>;
}
