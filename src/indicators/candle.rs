//! Candle classification primitives shared by the arming and entry checks.

use crate::models::Candle;

pub fn is_bearish(open: f64, close: f64) -> bool {
    close < open
}

/// Body size as a percentage of the close.
pub fn body_size_percent(open: f64, close: f64) -> f64 {
    (close - open).abs() / close * 100.0
}

/// True when open, high, low and close are all strictly above `level`.
pub fn is_entirely_above(candle: &Candle, level: f64) -> bool {
    candle.open > level && candle.high > level && candle.low > level && candle.close > level
}
