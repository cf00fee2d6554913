//! Breakdown detector: arms on a strong candle held entirely above EMA-fast
//! and fires when a later candle breaks its low in a confirmed downtrend.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::config::{DetectorConfig, ALERT_COOLDOWN, SIGNAL_STALENESS_CANDLES};
use crate::indicators::{body_size_percent, is_bearish, is_entirely_above, latest_ema};
use crate::models::{
    AlertEvent, Candle, DetectorStatus, EntryConditions, Evaluation, HistoryBuffer,
    IndicatorSnapshot, NoSignal, NoSignalReason,
};

/// At most one signal candle is held at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorState {
    Idle,
    Armed { signal_candle: Candle, arm_index: u64 },
}

pub struct BreakdownDetector {
    config: DetectorConfig,
    state: DetectorState,
    tick: u64,
    last_alert_at: Option<DateTime<Utc>>,
    cooldown: Duration,
    staleness_candles: u64,
}

impl BreakdownDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            state: DetectorState::Idle,
            tick: 0,
            last_alert_at: None,
            cooldown: Duration::seconds(ALERT_COOLDOWN.as_secs() as i64),
            staleness_candles: SIGNAL_STALENESS_CANDLES,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, DetectorState::Armed { .. })
    }

    pub fn signal_candle(&self) -> Option<&Candle> {
        match &self.state {
            DetectorState::Armed { signal_candle, .. } => Some(signal_candle),
            DetectorState::Idle => None,
        }
    }

    /// Number of evaluations performed so far.
    pub fn tick_index(&self) -> u64 {
        self.tick
    }

    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_at
    }

    /// Run one tick of the state machine against the latest candle.
    ///
    /// Order is fixed: sufficiency gate, arming (only while idle, on the
    /// previous candle), entry (only while armed, on the current candle,
    /// subject to the cooldown), then staleness expiry.
    pub fn evaluate(
        &mut self,
        history: &HistoryBuffer,
        snapshot: &IndicatorSnapshot,
        now: DateTime<Utc>,
    ) -> Evaluation {
        self.tick += 1;
        let tick = self.tick;

        let need = self.config.min_history();
        let (current, previous) = match (history.latest(), history.previous()) {
            (Some(current), Some(previous)) if history.len() >= need => (current, previous),
            _ => {
                debug!(
                    have = history.len(),
                    need = need,
                    "Insufficient data for analysis: have {} of {} candles",
                    history.len(),
                    need
                );
                return Evaluation::NoSignal(NoSignal::new(NoSignalReason::InsufficientHistory {
                    have: history.len(),
                    need,
                }));
            }
        };

        let (ema_fast, ema_fast_prev, ema_slow, volume_sma) = match (
            snapshot.ema_fast,
            snapshot.ema_fast_prev,
            snapshot.ema_slow,
            snapshot.volume_sma,
        ) {
            (Some(fast), Some(fast_prev), Some(slow), Some(vol)) => (fast, fast_prev, slow, vol),
            _ => {
                debug!(?snapshot, "Indicators not yet available");
                return Evaluation::NoSignal(NoSignal::new(NoSignalReason::IndicatorUnavailable));
            }
        };

        if self.state == DetectorState::Idle {
            let body = body_size_percent(previous.open, previous.close);
            if is_entirely_above(previous, ema_fast_prev) && body >= self.config.min_body_size_percent {
                info!(
                    tick = tick,
                    signal_low = previous.low,
                    ema_fast = ema_fast_prev,
                    body_pct = body,
                    "Signal candle armed: entirely above EMA-fast {:.2}, body {:.2}%, low {:.2}",
                    ema_fast_prev,
                    body,
                    previous.low
                );
                self.state = DetectorState::Armed {
                    signal_candle: previous.clone(),
                    arm_index: tick,
                };
            }
        }

        let report = |reason: NoSignalReason, armed: bool| {
            Evaluation::NoSignal(NoSignal {
                reason,
                current_price: Some(current.close),
                ema_fast: Some(ema_fast),
                ema_slow: Some(ema_slow),
                has_signal_candle: armed,
            })
        };

        if let Some(signal_low) = self.signal_candle().map(|c| c.low) {
            let conditions = EntryConditions {
                breaks_signal_low: current.low < signal_low,
                bearish: is_bearish(current.open, current.close),
                high_volume: volume_sma > 0.0 && current.volume > volume_sma,
                below_slow_trend: current.close < ema_slow,
            };
            debug!(
                tick = tick,
                breaks_low = conditions.breaks_signal_low,
                bearish = conditions.bearish,
                high_volume = conditions.high_volume,
                below_slow = conditions.below_slow_trend,
                "Entry conditions evaluated"
            );

            if conditions.all_met() {
                if let Some(last) = self.last_alert_at {
                    let elapsed = now - last;
                    if elapsed < self.cooldown {
                        let remaining = self.cooldown - elapsed;
                        let remaining_secs = (remaining.num_milliseconds() + 999) / 1000;
                        debug!(remaining_secs = remaining_secs, "Entry suppressed by alert cooldown");
                        return report(NoSignalReason::CooldownActive { remaining_secs }, true);
                    }
                }

                let alert = AlertEvent {
                    timestamp: now,
                    strike: current.strike.clone(),
                    entry_price: current.close,
                    signal_candle_low: signal_low,
                    volume: current.volume,
                    volume_sma,
                    ema_fast,
                    ema_slow,
                    conditions,
                };
                self.state = DetectorState::Idle;
                self.last_alert_at = Some(now);
                info!(
                    strike = %alert.strike,
                    entry_price = alert.entry_price,
                    signal_low = alert.signal_candle_low,
                    "Bearish entry signal at {:.2} on strike {}",
                    alert.entry_price,
                    alert.strike
                );
                return Evaluation::Alert(alert);
            }
        }

        if let DetectorState::Armed { arm_index, .. } = self.state {
            if tick - arm_index > self.staleness_candles {
                info!(tick = tick, arm_index = arm_index, "Signal candle expired, resetting");
                self.state = DetectorState::Idle;
                return report(NoSignalReason::SignalExpired, false);
            }
        }

        report(NoSignalReason::NoEntry, self.is_armed())
    }

    /// Read-only view of what the detector currently sees.
    pub fn status(&self, history: &HistoryBuffer) -> DetectorStatus {
        let closes = history.closes();
        DetectorStatus {
            data_points: history.len(),
            current_price: history.latest().map(|c| c.close),
            ema_fast: latest_ema(&closes, self.config.ema_fast_period),
            ema_slow: latest_ema(&closes, self.config.ema_slow_period),
            has_signal_candle: self.is_armed(),
            signal_candle_low: self.signal_candle().map(|c| c.low),
            last_update: history.latest().map(|c| c.timestamp),
        }
    }
}
