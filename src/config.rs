//! Environment-driven configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Minimum spacing between two fired alerts.
pub const ALERT_COOLDOWN: Duration = Duration::from_secs(5 * 60);
/// Ticks a signal candle may stay armed before it is discarded.
pub const SIGNAL_STALENESS_CANDLES: u64 = 5;
/// Maximum candles retained in the history buffer.
pub const HISTORY_CAPACITY: usize = 250;
/// Longest accepted run or status interval (one day).
pub const MAX_INTERVAL_MINUTES: u64 = 24 * 60;
/// Delay before the first scheduled cycle after start.
pub const INITIAL_CYCLE_DELAY: Duration = Duration::from_secs(5);

/// Get the deployment environment (`sandbox` unless overridden).
pub fn get_environment() -> String {
    env::var("ENVIRONMENT")
        .ok()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "sandbox".to_string())
}

/// Tunables of the breakdown detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,
    pub volume_sma_period: usize,
    pub min_body_size_percent: f64,
}

impl DetectorConfig {
    /// Candles required before the detector evaluates anything.
    pub fn min_history(&self) -> usize {
        self.ema_slow_period.max(self.volume_sma_period) + 2
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            ema_fast_period: 5,
            ema_slow_period: 200,
            volume_sma_period: 20,
            min_body_size_percent: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub run_interval_minutes: u64,
    pub alert_target: String,
    pub data_source_url: String,
    /// Unset means alerts are printed instead of delivered.
    pub notifier_webhook_url: Option<String>,
    pub detector: DetectorConfig,
    pub strike_interval: f64,
    pub fetch_timeout: Duration,
    pub send_timeout: Duration,
    /// 0 disables periodic status reports.
    pub status_update_minutes: u64,
    pub status_port: u16,
    pub signal_log_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let run_interval_minutes: u64 = required(&get, "RUN_INTERVAL_MINUTES")?;
        if run_interval_minutes == 0 || run_interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(invalid("RUN_INTERVAL_MINUTES", run_interval_minutes));
        }

        let alert_target = get("ALERT_TARGET").ok_or(ConfigError::Missing("ALERT_TARGET"))?;
        let data_source_url =
            get("DATA_SOURCE_URL").ok_or(ConfigError::Missing("DATA_SOURCE_URL"))?;

        let defaults = DetectorConfig::default();
        let detector = DetectorConfig {
            ema_fast_period: optional(&get, "EMA_FAST_PERIOD", defaults.ema_fast_period)?,
            ema_slow_period: optional(&get, "EMA_SLOW_PERIOD", defaults.ema_slow_period)?,
            volume_sma_period: optional(&get, "VOLUME_SMA_PERIOD", defaults.volume_sma_period)?,
            min_body_size_percent: optional(
                &get,
                "MIN_BODY_SIZE_PERCENT",
                defaults.min_body_size_percent,
            )?,
        };
        for (name, period) in [
            ("EMA_FAST_PERIOD", detector.ema_fast_period),
            ("EMA_SLOW_PERIOD", detector.ema_slow_period),
            ("VOLUME_SMA_PERIOD", detector.volume_sma_period),
        ] {
            if period == 0 {
                return Err(invalid(name, period));
            }
        }
        // The history buffer must be able to hold a full warm-up window.
        if detector.min_history() > HISTORY_CAPACITY {
            let (name, period) = if detector.ema_slow_period >= detector.volume_sma_period {
                ("EMA_SLOW_PERIOD", detector.ema_slow_period)
            } else {
                ("VOLUME_SMA_PERIOD", detector.volume_sma_period)
            };
            return Err(invalid(name, period));
        }
        if !detector.min_body_size_percent.is_finite() || detector.min_body_size_percent < 0.0 {
            return Err(invalid("MIN_BODY_SIZE_PERCENT", detector.min_body_size_percent));
        }

        let strike_interval: f64 = optional(&get, "STRIKE_INTERVAL", 50.0)?;
        if !strike_interval.is_finite() || strike_interval <= 0.0 {
            return Err(invalid("STRIKE_INTERVAL", strike_interval));
        }

        let status_update_minutes: u64 = optional(&get, "STATUS_UPDATE_MINUTES", 30)?;
        if status_update_minutes > MAX_INTERVAL_MINUTES {
            return Err(invalid("STATUS_UPDATE_MINUTES", status_update_minutes));
        }

        Ok(Self {
            run_interval_minutes,
            alert_target,
            data_source_url,
            notifier_webhook_url: get("NOTIFIER_WEBHOOK_URL"),
            detector,
            strike_interval,
            fetch_timeout: Duration::from_secs(optional(&get, "FETCH_TIMEOUT_SECS", 10)?),
            send_timeout: Duration::from_secs(optional(&get, "SEND_TIMEOUT_SECS", 15)?),
            status_update_minutes,
            status_port: optional(&get, "STATUS_PORT", 3000)?,
            signal_log_path: get("SIGNAL_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs/signals.log")),
        })
    }
}

fn invalid(name: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn required<T, G>(get: &G, name: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(name).ok_or(ConfigError::Missing(name))?;
    raw.parse()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}

fn optional<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
