//! Cycle orchestrator: one gated fetch → indicators → detector → notify pass
//! per tick, with every failure contained at the cycle boundary.

use chrono::Duration as ChronoDuration;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::{Config, DetectorConfig};
use crate::core::messages::{
    format_alert_message, format_currency, format_error_message, format_status_message,
    format_test_message,
};
use crate::error::{CycleError, MarketDataError};
use crate::indicators::compute_snapshot;
use crate::logging::{NullSignalLog, SignalLog};
use crate::metrics::Metrics;
use crate::models::{
    AlertEvent, Candle, CycleStats, DetectorStatus, Evaluation, HistoryBuffer, NoSignal,
    SchedulerStatus,
};
use crate::services::{CandleSource, MarketCalendar, Notifier};
use crate::signals::BreakdownDetector;

/// What a single `run_cycle` invocation did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Another cycle holds the guard; this tick was skipped untouched.
    AlreadyRunning,
    MarketClosed,
    NotifierNotReady,
    DataUnavailable,
    NoSignal(NoSignal),
    AlertSent(AlertEvent),
    AlertUndelivered(AlertEvent),
    Faulted(String),
}

struct CycleState {
    history: HistoryBuffer,
    detector: BreakdownDetector,
}

pub struct CycleOrchestrator {
    /// Held for the whole of `run_cycle`; only ever `try_lock`ed.
    cycle_guard: Mutex<()>,
    state: Mutex<CycleState>,
    stats: RwLock<CycleStats>,
    source: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    calendar: Arc<dyn MarketCalendar>,
    signal_log: Arc<dyn SignalLog>,
    metrics: Option<Arc<Metrics>>,
    alert_target: String,
    fetch_timeout: Duration,
    send_timeout: Duration,
    scheduled: AtomicBool,
    interval_minutes: AtomicU64,
}

impl CycleOrchestrator {
    pub fn new(
        detector: DetectorConfig,
        alert_target: impl Into<String>,
        source: Arc<dyn CandleSource>,
        notifier: Arc<dyn Notifier>,
        calendar: Arc<dyn MarketCalendar>,
    ) -> Self {
        Self {
            cycle_guard: Mutex::new(()),
            state: Mutex::new(CycleState {
                history: HistoryBuffer::new(),
                detector: BreakdownDetector::new(detector),
            }),
            stats: RwLock::new(CycleStats::default()),
            source,
            notifier,
            calendar,
            signal_log: Arc::new(NullSignalLog),
            metrics: None,
            alert_target: alert_target.into(),
            fetch_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(15),
            scheduled: AtomicBool::new(false),
            interval_minutes: AtomicU64::new(0),
        }
    }

    pub fn from_config(
        config: &Config,
        source: Arc<dyn CandleSource>,
        notifier: Arc<dyn Notifier>,
        calendar: Arc<dyn MarketCalendar>,
    ) -> Self {
        Self::new(
            config.detector.clone(),
            config.alert_target.clone(),
            source,
            notifier,
            calendar,
        )
        .with_timeouts(config.fetch_timeout, config.send_timeout)
    }

    pub fn with_signal_log(mut self, signal_log: Arc<dyn SignalLog>) -> Self {
        self.signal_log = signal_log;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_timeouts(mut self, fetch_timeout: Duration, send_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self.send_timeout = send_timeout;
        self
    }

    pub fn alert_target(&self) -> &str {
        &self.alert_target
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn calendar(&self) -> &Arc<dyn MarketCalendar> {
        &self.calendar
    }

    pub(crate) fn set_schedule(&self, running: bool, interval_minutes: Option<u64>) {
        self.scheduled.store(running, Ordering::SeqCst);
        self.interval_minutes
            .store(interval_minutes.unwrap_or(0), Ordering::SeqCst);
    }

    /// Execute one cycle. Never panics and never returns an error: every
    /// failure is counted, logged and folded into the outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_cycle) = self.cycle_guard.try_lock() else {
            warn!("Previous cycle still running, skipping this tick");
            return CycleOutcome::AlreadyRunning;
        };
        let mut state = self.state.lock().await;

        let run = {
            let mut stats = self.stats.write().await;
            stats.run_count += 1;
            stats.last_run_time = Some(self.calendar.now());
            stats.run_count
        };
        if let Some(ref metrics) = self.metrics {
            metrics.cycles_total.inc();
        }
        info!(run = run, "Running cycle #{}", run);

        let result = AssertUnwindSafe(self.execute(&mut state))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(CycleError::Fault(panic_message(panic))));

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(CycleError::DataUnavailable(e)) => {
                self.count_error().await;
                error!(run = run, error = %e, "No data received, skipping cycle #{}", run);
                self.signal_log
                    .append(&format!("ERROR: Failed to fetch market data - {}", e));
                CycleOutcome::DataUnavailable
            }
            Err(CycleError::Fault(message)) => self.handle_fault(run, message).await,
        };

        if let Some(ref metrics) = self.metrics {
            metrics.history_length.set(state.history.len() as f64);
            metrics
                .signal_armed
                .set(if state.detector.is_armed() { 1.0 } else { 0.0 });
        }
        debug!(run = run, outcome = ?outcome, "Cycle #{} completed", run);
        outcome
    }

    async fn execute(&self, state: &mut CycleState) -> Result<CycleOutcome, CycleError> {
        let market_open = self.calendar.is_market_open();
        if let Some(ref metrics) = self.metrics {
            metrics.market_open.set(if market_open { 1.0 } else { 0.0 });
        }
        if !market_open {
            info!("Market is closed, skipping cycle");
            self.signal_log
                .append("INFO: Market closed - Skipping strategy execution");
            return Ok(CycleOutcome::MarketClosed);
        }

        if !self.notifier.is_ready() {
            warn!("Notifier not ready, skipping cycle");
            self.signal_log.append("WARNING: Notifier not ready");
            return Ok(CycleOutcome::NotifierNotReady);
        }

        let candle = match timeout(self.fetch_timeout, self.source.fetch_latest_candle()).await {
            Ok(result) => result?,
            Err(_) => return Err(MarketDataError::Timeout(self.fetch_timeout).into()),
        };
        if !candle.is_well_formed() {
            return Err(MarketDataError::InvalidCandle(format!("{:?}", candle)).into());
        }
        self.signal_log.append(&format!(
            "DATA: Strike {} - Price: {}, Volume: {}",
            candle.strike,
            format_currency(candle.close),
            candle.volume
        ));
        state.history.push(candle);

        let snapshot = compute_snapshot(&state.history, state.detector.config());
        let now = self.calendar.now();

        match state.detector.evaluate(&state.history, &snapshot, now) {
            Evaluation::Alert(alert) => {
                info!(
                    strike = %alert.strike,
                    entry_price = alert.entry_price,
                    "Signal detected, sending alert"
                );
                self.signal_log.append(&format!(
                    "ALERT: Bearish entry signal detected - {}",
                    serde_json::to_string(&alert).unwrap_or_default()
                ));

                if self.deliver(&format_alert_message(&alert)).await {
                    self.stats.write().await.alert_count += 1;
                    if let Some(ref metrics) = self.metrics {
                        metrics.alerts_sent_total.inc();
                    }
                    info!(strike = %alert.strike, "Alert sent successfully");
                    self.signal_log.append("INFO: Alert sent successfully");
                    Ok(CycleOutcome::AlertSent(alert))
                } else {
                    if let Some(ref metrics) = self.metrics {
                        metrics.alerts_failed_total.inc();
                    }
                    error!(strike = %alert.strike, "Failed to send alert");
                    self.signal_log.append("ERROR: Failed to send alert");
                    Ok(CycleOutcome::AlertUndelivered(alert))
                }
            }
            Evaluation::NoSignal(report) => {
                info!(
                    reason = %report.reason,
                    price = ?report.current_price,
                    armed = report.has_signal_candle,
                    "No signal - {}",
                    report.reason
                );
                Ok(CycleOutcome::NoSignal(report))
            }
        }
    }

    /// Send to the configured target, bounded by the send timeout.
    async fn deliver(&self, text: &str) -> bool {
        match timeout(self.send_timeout, self.notifier.send(&self.alert_target, text)).await {
            Ok(delivered) => delivered,
            Err(_) => {
                warn!(timeout = ?self.send_timeout, "Notifier send timed out");
                false
            }
        }
    }

    async fn count_error(&self) {
        self.stats.write().await.error_count += 1;
        if let Some(ref metrics) = self.metrics {
            metrics.cycle_errors_total.inc();
        }
    }

    async fn handle_fault(&self, run: u64, message: String) -> CycleOutcome {
        self.count_error().await;
        error!(run = run, error = %message, "Error in cycle #{}", run);
        self.signal_log
            .append(&format!("ERROR: Run cycle failed - {}", message));

        if self.notifier.is_ready() {
            let text = format_error_message(&format!("Cycle error: {}", message), self.calendar.now());
            if !self.deliver(&text).await {
                warn!("Error notification could not be delivered");
            }
        }
        CycleOutcome::Faulted(message)
    }

    /// Snapshot of the cycle counters plus market and notifier state.
    pub async fn get_status(&self) -> SchedulerStatus {
        let stats = *self.stats.read().await;
        let interval = self.interval_minutes.load(Ordering::SeqCst);
        SchedulerStatus {
            running: self.scheduled.load(Ordering::SeqCst),
            interval_minutes: (interval > 0).then_some(interval),
            last_run_time: stats.last_run_time,
            run_count: stats.run_count,
            error_count: stats.error_count,
            alert_count: stats.alert_count,
            error_rate: stats.error_rate(),
            market_open: self.calendar.is_market_open(),
            notifier_ready: self.notifier.is_ready(),
        }
    }

    pub async fn stats(&self) -> CycleStats {
        *self.stats.read().await
    }

    /// Waits for an in-flight cycle to finish before reading. Never causes a
    /// concurrent `run_cycle` to be skipped.
    pub async fn detector_status(&self) -> DetectorStatus {
        let state = self.state.lock().await;
        state.detector.status(&state.history)
    }

    pub async fn send_status_update(&self) -> bool {
        let scheduler = self.get_status().await;
        let detector = self.detector_status().await;
        let message = format_status_message(&scheduler, &detector, self.calendar.now());

        let sent = self.deliver(&message).await;
        if sent {
            info!("Status update sent");
            self.signal_log.append("INFO: Status update sent");
        } else {
            error!("Failed to send status update");
            self.signal_log.append("ERROR: Failed to send status update");
        }
        sent
    }

    /// Diagnostic pass over a built-in three-candle sample.
    ///
    /// Uses a throwaway history and detector so the live state is untouched.
    pub async fn run_test_cycle(&self) -> Evaluation {
        info!("Running manual test cycle");
        self.signal_log.append("INFO: Manual test cycle initiated");

        let config = self.state.lock().await.detector.config().clone();
        let mut history = HistoryBuffer::new();
        for candle in sample_candles(self.calendar.now()) {
            history.push(candle);
        }
        let mut detector = BreakdownDetector::new(config);
        let snapshot = compute_snapshot(&history, detector.config());
        let evaluation = detector.evaluate(&history, &snapshot, self.calendar.now());

        self.signal_log.append(&format!(
            "TEST: Manual test result - {}",
            serde_json::to_string(&evaluation).unwrap_or_default()
        ));
        if !self.deliver(&format_test_message(self.calendar.now())).await {
            warn!("Test message could not be delivered");
        }
        evaluation
    }
}

/// Three rising candles on one strike; far short of any slow-EMA period.
pub fn sample_candles(now: chrono::DateTime<chrono::Utc>) -> Vec<Candle> {
    [
        (5, 45.5, 47.2, 44.8, 46.1, 15_000.0, 250_000.0),
        (4, 46.1, 48.3, 45.5, 47.8, 18_000.0, 255_000.0),
        (3, 47.8, 49.1, 46.9, 48.5, 22_000.0, 260_000.0),
    ]
    .into_iter()
    .map(|(minutes_ago, open, high, low, close, volume, oi)| {
        Candle::new(open, high, low, close, volume, now - ChronoDuration::minutes(minutes_ago))
            .with_strike("22100")
            .with_open_interest(oi)
    })
    .collect()
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "cycle panicked".to_string()
    }
}
