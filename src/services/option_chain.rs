//! Option-chain candle source: snapshots the at-the-money PUT leg.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::MarketDataError;
use crate::models::Candle;
use crate::services::market_data::CandleSource;

/// Minimum spacing between two upstream requests.
const MIN_FETCH_SPACING: Duration = Duration::from_secs(5);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Deserialize)]
pub struct OptionChain {
    pub records: OptionChainRecords,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChainRecords {
    pub underlying_value: f64,
    #[serde(default)]
    pub data: Vec<StrikeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikeRecord {
    pub strike_price: f64,
    #[serde(rename = "PE")]
    pub pe: Option<OptionLeg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionLeg {
    pub last_price: f64,
    pub open_price: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub total_traded_volume: Option<f64>,
    pub open_interest: Option<f64>,
}

/// Round the spot to the nearest listed strike.
pub fn atm_strike(spot: f64, strike_interval: f64) -> f64 {
    (spot / strike_interval).round() * strike_interval
}

/// Build the ATM PUT candle from a parsed chain.
pub fn put_candle_from_chain(
    chain: &OptionChain,
    strike_interval: f64,
) -> Result<Candle, MarketDataError> {
    let strike = atm_strike(chain.records.underlying_value, strike_interval);
    let leg = chain
        .records
        .data
        .iter()
        .find(|record| record.strike_price == strike && record.pe.is_some())
        .and_then(|record| record.pe.as_ref())
        .ok_or(MarketDataError::StrikeNotFound(strike))?;

    // Zero or missing day fields fall back to the last traded price.
    let or_last = |value: Option<f64>| value.filter(|v| *v != 0.0).unwrap_or(leg.last_price);

    let candle = Candle::new(
        or_last(leg.open_price),
        or_last(leg.day_high),
        or_last(leg.day_low),
        leg.last_price,
        leg.total_traded_volume.unwrap_or(0.0),
        Utc::now(),
    )
    .with_strike(format!("{}", strike))
    .with_open_interest(leg.open_interest.unwrap_or(0.0));

    if !candle.is_well_formed() {
        return Err(MarketDataError::InvalidCandle(format!(
            "strike {}: o={} h={} l={} c={} v={}",
            strike, candle.open, candle.high, candle.low, candle.close, candle.volume
        )));
    }

    Ok(candle)
}

pub struct OptionChainSource {
    client: reqwest::Client,
    url: String,
    strike_interval: f64,
    last_fetch: Mutex<Option<Instant>>,
}

impl OptionChainSource {
    pub fn new(
        url: impl Into<String>,
        strike_interval: f64,
        timeout: Duration,
    ) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self::with_client(url, strike_interval, client))
    }

    pub fn with_client(url: impl Into<String>, strike_interval: f64, client: reqwest::Client) -> Self {
        Self {
            client,
            url: url.into(),
            strike_interval,
            last_fetch: Mutex::new(None),
        }
    }

    async fn fetch_chain(&self) -> Result<OptionChain, MarketDataError> {
        let mut last_fetch = self.last_fetch.lock().await;
        if let Some(at) = *last_fetch {
            let since = at.elapsed();
            if since < MIN_FETCH_SPACING {
                sleep(MIN_FETCH_SPACING - since).await;
            }
        }
        *last_fetch = Some(Instant::now());
        drop(last_fetch);

        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %self.url, "Option chain request rejected");
            return Err(MarketDataError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| MarketDataError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CandleSource for OptionChainSource {
    async fn fetch_latest_candle(&self) -> Result<Candle, MarketDataError> {
        let chain = self.fetch_chain().await?;
        let candle = put_candle_from_chain(&chain, self.strike_interval)?;
        debug!(
            strike = %candle.strike,
            close = candle.close,
            volume = candle.volume,
            "ATM PUT {} - price {:.2}, volume {}",
            candle.strike,
            candle.close,
            candle.volume
        );
        Ok(candle)
    }
}
