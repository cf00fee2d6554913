//! Breakdown Alert Worker
//!
//! Runs the alert cycle on a fixed interval and serves health, status and
//! metrics over HTTP. `--test` runs one diagnostic cycle, `--status` prints
//! the status JSON; both exit afterwards.

use breakdown_alert::config::{get_environment, Config};
use breakdown_alert::core::messages::{format_shutdown_message, format_startup_message};
use breakdown_alert::core::{
    start_server, AppState, CycleOrchestrator, CycleScheduler, ShutdownSignal,
};
use breakdown_alert::logging::{self, FileSignalLog};
use breakdown_alert::metrics::Metrics;
use breakdown_alert::services::{
    ConsoleNotifier, MarketCalendar, NseCalendar, Notifier, OptionChainSource, WebhookNotifier,
};
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const NOTIFIER_WAIT: Duration = Duration::from_secs(60);
const NOTIFIER_POLL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Run,
    Test,
    Status,
}

fn parse_mode() -> Mode {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--test") {
        Mode::Test
    } else if args.iter().any(|a| a == "--status") {
        Mode::Status
    } else {
        Mode::Run
    }
}

async fn wait_for_notifier(notifier: &dyn Notifier) -> bool {
    let deadline = tokio::time::Instant::now() + NOTIFIER_WAIT;
    while !notifier.is_ready() {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(NOTIFIER_POLL).await;
    }
    true
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();
    logging::init_logging();

    let mode = parse_mode();
    let config = Config::from_env()?;

    info!("Starting Breakdown Alert Worker");
    info!(environment = %get_environment(), "Environment");
    info!(
        interval_minutes = config.run_interval_minutes,
        fast = config.detector.ema_fast_period,
        slow = config.detector.ema_slow_period,
        volume = config.detector.volume_sma_period,
        "Configuration loaded"
    );

    let metrics = Arc::new(Metrics::new()?);
    let calendar: Arc<dyn MarketCalendar> = Arc::new(NseCalendar);
    let source = Arc::new(OptionChainSource::new(
        config.data_source_url.clone(),
        config.strike_interval,
        config.fetch_timeout,
    )?);
    let notifier: Arc<dyn Notifier> = match config.notifier_webhook_url {
        Some(ref url) => Arc::new(WebhookNotifier::new(url.clone(), config.send_timeout)?),
        None => {
            warn!("NOTIFIER_WEBHOOK_URL not set, alerts will only be logged");
            Arc::new(ConsoleNotifier)
        }
    };

    if !wait_for_notifier(notifier.as_ref()).await {
        return Err("Notifier did not become ready in time".into());
    }
    info!("Notifier ready");

    let signal_log = Arc::new(FileSignalLog::new(config.signal_log_path.clone()));
    let orchestrator = Arc::new(
        CycleOrchestrator::from_config(&config, source, notifier.clone(), calendar.clone())
            .with_signal_log(signal_log.clone())
            .with_metrics(metrics.clone()),
    );

    match mode {
        Mode::Test => {
            let evaluation = orchestrator.run_test_cycle().await;
            info!(result = ?evaluation, "Test cycle finished");
            signal_log.flush().await;
            return Ok(());
        }
        Mode::Status => {
            let report = json!({
                "scheduler": orchestrator.get_status().await,
                "detector": orchestrator.detector_status().await,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        Mode::Run => {}
    }

    let shutdown_signal = ShutdownSignal::install()?;
    let server_state = AppState::new(orchestrator.clone(), metrics.clone());
    let port = config.status_port;
    let server = tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state).await {
            error!(error = %e, "HTTP server failed");
        }
    });

    let scheduler = CycleScheduler::new(orchestrator.clone());
    scheduler.start(config.run_interval_minutes).await?;
    scheduler
        .start_status_updates(config.status_update_minutes)
        .await;

    let startup = format_startup_message(
        config.run_interval_minutes,
        calendar.is_market_open(),
        calendar.now(),
    );
    if !notifier.send(&config.alert_target, &startup).await {
        warn!("Startup notification could not be delivered");
    }

    info!("Worker started, waiting for shutdown signal...");
    let reason = shutdown_signal.recv().await;

    info!(reason = ?reason, "Shutting down worker...");
    scheduler.stop().await;
    let status = orchestrator.get_status().await;
    let shutdown = format_shutdown_message(&status, calendar.now());
    if !notifier.send(&config.alert_target, &shutdown).await {
        warn!("Shutdown notification could not be delivered");
    }
    server.abort();
    signal_log.flush().await;
    info!("Worker stopped");

    Ok(())
}
