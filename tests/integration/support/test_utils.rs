//! Scripted collaborators for driving the orchestrator in tests.

use async_trait::async_trait;
use breakdown_alert::config::DetectorConfig;
use breakdown_alert::core::CycleOrchestrator;
use breakdown_alert::error::MarketDataError;
use breakdown_alert::logging::SignalLog;
use breakdown_alert::metrics::Metrics;
use breakdown_alert::models::Candle;
use breakdown_alert::services::{CandleSource, MarketCalendar, Notifier};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn t0() -> DateTime<Utc> {
    // Tuesday 10:30 IST
    Utc.with_ymd_and_hms(2024, 3, 5, 5, 0, 0).unwrap()
}

pub fn doji(price: f64) -> Candle {
    Candle::new(price, price + 0.5, price - 0.5, price, 1000.0, t0()).with_strike("22100")
}

pub fn candle(open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle::new(open, high, low, close, volume, t0()).with_strike("22100")
}

/// 100 dojis at 200 then 110 at 50: enough history for the default periods.
pub fn default_baseline() -> Vec<Candle> {
    (0..210)
        .map(|i| doji(if i < 100 { 200.0 } else { 50.0 }))
        .collect()
}

pub enum Step {
    Candle(Candle),
    Fail,
    Panic,
    Hang,
    /// Signal `started`, then wait for `release` before yielding the candle.
    Gated(Candle),
}

#[derive(Default)]
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    fetches: AtomicUsize,
    pub started: Notify,
    pub release: Notify,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    pub fn push_candles(&self, candles: impl IntoIterator<Item = Candle>) {
        for candle in candles {
            self.push(Step::Candle(candle));
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandleSource for ScriptedSource {
    async fn fetch_latest_candle(&self) -> Result<Candle, MarketDataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Candle(candle)) => Ok(candle),
            Some(Step::Fail) | None => Err(MarketDataError::Status(503)),
            Some(Step::Panic) => panic!("scripted source exploded"),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Gated(candle)) => {
                self.started.notify_one();
                self.release.notified().await;
                Ok(candle)
            }
        }
    }
}

pub struct RecordingNotifier {
    ready: AtomicBool,
    deliver: AtomicBool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            ready: AtomicBool::new(true),
            deliver: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn set_deliver(&self, deliver: bool) {
        self.deliver.store(deliver, Ordering::SeqCst);
    }

    /// Every send attempt, delivered or not.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.sent().iter().filter(|(_, text)| text.contains(needle)).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn send(&self, target: &str, text: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((target.to_string(), text.to_string()));
        self.deliver.load(Ordering::SeqCst)
    }
}

pub struct ManualCalendar {
    open: AtomicBool,
    now: Mutex<DateTime<Utc>>,
}

impl ManualCalendar {
    pub fn new(open: bool) -> Arc<Self> {
        Arc::new(Self {
            open: AtomicBool::new(open),
            now: Mutex::new(t0()),
        })
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl MarketCalendar for ManualCalendar {
    fn is_market_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[derive(Default)]
pub struct MemorySignalLog {
    lines: Mutex<Vec<String>>,
}

impl MemorySignalLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl SignalLog for MemorySignalLog {
    fn append(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// Orchestrator wired to scripted collaborators.
pub struct Harness {
    pub orchestrator: Arc<CycleOrchestrator>,
    pub source: Arc<ScriptedSource>,
    pub notifier: Arc<RecordingNotifier>,
    pub calendar: Arc<ManualCalendar>,
    pub signal_log: Arc<MemorySignalLog>,
    pub metrics: Arc<Metrics>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    pub fn with_config(config: DetectorConfig) -> Self {
        let source = ScriptedSource::new();
        let notifier = RecordingNotifier::new();
        let calendar = ManualCalendar::new(true);
        let signal_log = Arc::new(MemorySignalLog::default());
        let metrics = Arc::new(Metrics::new().unwrap());

        let orchestrator = Arc::new(
            CycleOrchestrator::new(
                config,
                "919999999999",
                source.clone(),
                notifier.clone(),
                calendar.clone(),
            )
            .with_signal_log(signal_log.clone())
            .with_metrics(metrics.clone()),
        );

        Self {
            orchestrator,
            source,
            notifier,
            calendar,
            signal_log,
            metrics,
        }
    }

    /// Feed `candles` through one cycle each, returning the last outcome.
    pub async fn drive(
        &self,
        candles: impl IntoIterator<Item = Candle>,
    ) -> Option<breakdown_alert::core::CycleOutcome> {
        let mut last = None;
        for candle in candles {
            self.source.push(Step::Candle(candle));
            last = Some(self.orchestrator.run_cycle().await);
        }
        last
    }
}
