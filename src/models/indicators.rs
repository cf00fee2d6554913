use serde::{Deserialize, Serialize};

/// Indicator values derived from the full history on every tick.
///
/// A field stays `None` until the history holds at least its period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_fast: Option<f64>,
    /// EMA-fast as of the previous candle, used by the arming check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_fast_prev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_slow: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_sma: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn is_complete(&self) -> bool {
        self.ema_fast.is_some()
            && self.ema_fast_prev.is_some()
            && self.ema_slow.is_some()
            && self.volume_sma.is_some()
    }
}
