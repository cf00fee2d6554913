use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters owned by the orchestrator and written only from `run_cycle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    pub run_count: u64,
    pub error_count: u64,
    pub alert_count: u64,
    pub last_run_time: Option<DateTime<Utc>>,
}

impl CycleStats {
    /// Errors as a percentage of runs, rounded to two decimals.
    pub fn error_rate(&self) -> f64 {
        if self.run_count == 0 {
            return 0.0;
        }
        let rate = self.error_count as f64 / self.run_count as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u64>,
    pub last_run_time: Option<DateTime<Utc>>,
    pub run_count: u64,
    pub error_count: u64,
    pub alert_count: u64,
    pub error_rate: f64,
    pub market_open: bool,
    pub notifier_ready: bool,
}

/// Strategy-side view: what the detector currently sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorStatus {
    pub data_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_fast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_slow: Option<f64>,
    pub has_signal_candle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_candle_low: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}
