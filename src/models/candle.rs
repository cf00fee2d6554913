//! Candle record and the bounded history buffer the orchestrator owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::HISTORY_CAPACITY;

/// One OHLCV observation of the tracked option leg.
///
/// Immutable once appended to a [`HistoryBuffer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub strike: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_interest: f64,
}

impl Candle {
    pub fn new(open: f64, high: f64, low: f64, close: f64, volume: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            strike: String::new(),
            open,
            high,
            low,
            close,
            volume,
            open_interest: 0.0,
        }
    }

    pub fn with_strike(mut self, strike: impl Into<String>) -> Self {
        self.strike = strike.into();
        self
    }

    pub fn with_open_interest(mut self, open_interest: f64) -> Self {
        self.open_interest = open_interest;
        self
    }

    /// All prices finite and positive, volume finite and non-negative.
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
    }
}

/// Chronologically ordered, append-only candle window.
///
/// Once `capacity` is exceeded the oldest candle is evicted first.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a candle, evicting from the front while over capacity.
    pub fn push(&mut self, candle: Candle) {
        self.candles.push_back(candle);
        while self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    /// The candle immediately before the latest one.
    pub fn previous(&self) -> Option<&Candle> {
        let len = self.candles.len();
        if len < 2 {
            return None;
        }
        self.candles.get(len - 2)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume).collect()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
