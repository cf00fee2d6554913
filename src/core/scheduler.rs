//! Periodic driver for the cycle orchestrator.

use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::INITIAL_CYCLE_DELAY;
use crate::core::orchestrator::CycleOrchestrator;

type SchedulerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Runs cycles on a fixed interval or a cron expression.
///
/// Ticks that fall due while a cycle is still in progress are skipped, never
/// queued. `stop` lets an in-flight cycle finish before returning.
///
/// Each loop subscribes to `shutdown` when spawned and only reacts to sends
/// made after that, so a stopped scheduler can be started again.
pub struct CycleScheduler {
    orchestrator: Arc<CycleOrchestrator>,
    cycle_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
    status_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
    shutdown: watch::Sender<bool>,
}

impl CycleScheduler {
    pub fn new(orchestrator: Arc<CycleOrchestrator>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            orchestrator,
            cycle_handle: Arc::new(RwLock::new(None)),
            status_handle: Arc::new(RwLock::new(None)),
            shutdown,
        }
    }

    pub fn orchestrator(&self) -> &Arc<CycleOrchestrator> {
        &self.orchestrator
    }

    /// Run a cycle every `interval_minutes`, the first one shortly after start.
    pub async fn start(&self, interval_minutes: u64) -> SchedulerResult {
        if interval_minutes == 0 {
            return Err("Scheduler interval must be greater than zero".into());
        }
        let period = interval_minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("Scheduler interval of {} minutes is too large", interval_minutes))?;

        let mut slot = self.cycle_handle.write().await;
        if slot.is_some() {
            warn!("Scheduler is already running");
            return Ok(());
        }

        let orchestrator = self.orchestrator.clone();
        let mut shutdown = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + INITIAL_CYCLE_DELAY, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        orchestrator.run_cycle().await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
            debug!("Interval loop exited");
        });
        *slot = Some(handle);
        self.orchestrator.set_schedule(true, Some(interval_minutes));

        info!(
            interval_minutes = interval_minutes,
            "Scheduler started: running every {} minute(s)", interval_minutes
        );
        Ok(())
    }

    /// Run a cycle at every upcoming time of a six-field cron expression.
    pub async fn start_with_cron(&self, expression: &str) -> SchedulerResult {
        let schedule = Schedule::from_str(expression)
            .map_err(|e| format!("Invalid cron expression '{}': {}", expression, e))?;

        let mut slot = self.cycle_handle.write().await;
        if slot.is_some() {
            warn!("Scheduler is already running");
            return Ok(());
        }

        let orchestrator = self.orchestrator.clone();
        let mut shutdown = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                let Some(next_tick) = schedule.upcoming(chrono::Utc).next() else {
                    warn!("Cron schedule has no upcoming times");
                    break;
                };
                let wait = (next_tick - chrono::Utc::now()).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        orchestrator.run_cycle().await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
            debug!("Cron loop exited");
        });
        *slot = Some(handle);
        self.orchestrator.set_schedule(true, None);

        info!(cron = %expression, "Scheduler started with cron expression {}", expression);
        Ok(())
    }

    /// Send a status report every `minutes` while the market is open.
    pub async fn start_status_updates(&self, minutes: u64) {
        if minutes == 0 {
            debug!("Periodic status updates disabled");
            return;
        }
        let Some(period) = minutes.checked_mul(60).map(Duration::from_secs) else {
            warn!(minutes = minutes, "Status update interval too large, updates disabled");
            return;
        };

        let mut slot = self.status_handle.write().await;
        if slot.is_some() {
            warn!("Status updates already running");
            return;
        }
        let orchestrator = self.orchestrator.clone();
        let mut shutdown = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if orchestrator.calendar().is_market_open() {
                            orchestrator.send_status_update().await;
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        });
        *slot = Some(handle);
        info!(minutes = minutes, "Status updates every {} minute(s) during market hours", minutes);
    }

    /// Stop all loops, waiting for any in-flight cycle to complete.
    pub async fn stop(&self) {
        let cycle = self.cycle_handle.write().await.take();
        let status = self.status_handle.write().await.take();
        if cycle.is_none() && status.is_none() {
            return;
        }
        self.shutdown.send_replace(true);
        for handle in cycle.into_iter().chain(status) {
            if let Err(e) = handle.await {
                warn!(error = %e, "Scheduler task ended abnormally");
            }
        }
        self.orchestrator.set_schedule(false, None);
        info!("Scheduler stopped");
    }

    /// True while a cycle loop is scheduled. Status updates alone do not count.
    pub async fn is_running(&self) -> bool {
        self.cycle_handle.read().await.is_some()
    }
}
