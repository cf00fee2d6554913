//! Detector outputs: fired alerts and the no-signal report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four entry predicates, evaluated against the current candle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConditions {
    pub breaks_signal_low: bool,
    pub bearish: bool,
    pub high_volume: bool,
    pub below_slow_trend: bool,
}

impl EntryConditions {
    pub fn all_met(&self) -> bool {
        self.breaks_signal_low && self.bearish && self.high_volume && self.below_slow_trend
    }
}

/// A confirmed breakdown. Only built when every entry predicate holds and
/// the cooldown has elapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub timestamp: DateTime<Utc>,
    pub strike: String,
    pub entry_price: f64,
    pub signal_candle_low: f64,
    pub volume: f64,
    pub volume_sma: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub conditions: EntryConditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoSignalReason {
    InsufficientHistory { have: usize, need: usize },
    IndicatorUnavailable,
    CooldownActive { remaining_secs: i64 },
    SignalExpired,
    NoEntry,
}

impl fmt::Display for NoSignalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientHistory { have, need } => {
                write!(f, "insufficient data ({} of {} candles)", have, need)
            }
            Self::IndicatorUnavailable => write!(f, "insufficient data (indicators unavailable)"),
            Self::CooldownActive { remaining_secs } => {
                write!(f, "cooldown active ({}s remaining)", remaining_secs)
            }
            Self::SignalExpired => write!(f, "signal expired"),
            Self::NoEntry => write!(f, "no entry conditions met"),
        }
    }
}

/// Report returned on every tick that does not fire an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoSignal {
    pub reason: NoSignalReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_fast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ema_slow: Option<f64>,
    pub has_signal_candle: bool,
}

impl NoSignal {
    pub fn new(reason: NoSignalReason) -> Self {
        Self {
            reason,
            current_price: None,
            ema_fast: None,
            ema_slow: None,
            has_signal_candle: false,
        }
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self.reason,
            NoSignalReason::InsufficientHistory { .. } | NoSignalReason::IndicatorUnavailable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Evaluation {
    Alert(AlertEvent),
    NoSignal(NoSignal),
}

impl Evaluation {
    pub fn alert(&self) -> Option<&AlertEvent> {
        match self {
            Self::Alert(alert) => Some(alert),
            Self::NoSignal(_) => None,
        }
    }

    pub fn no_signal(&self) -> Option<&NoSignal> {
        match self {
            Self::Alert(_) => None,
            Self::NoSignal(report) => Some(report),
        }
    }
}
