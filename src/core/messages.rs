//! Plain-text message bodies sent through the notifier.

use chrono::{DateTime, Utc};

use crate::models::{AlertEvent, DetectorStatus, SchedulerStatus};
use crate::services::market_hours::ist;

pub fn format_currency(value: f64) -> String {
    format!("₹{:.2}", value)
}

/// Wall-clock time in IST, `HH:MM:SS`.
pub fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&ist()).format("%H:%M:%S").to_string()
}

fn optional_currency(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_else(|| "N/A".to_string())
}

fn check(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn format_alert_message(alert: &AlertEvent) -> String {
    format!(
        "*BEARISH ENTRY TRIGGERED*\n\
         \n\
         Option: Nifty {strike} PUT\n\
         Entry price: {entry}\n\
         Time: {time}\n\
         Signal candle low: {low}\n\
         \n\
         Breaks signal low: {breaks}\n\
         Bearish candle: {bearish}\n\
         Volume above average: {volume_ok}\n\
         Below slow EMA: {below}\n\
         \n\
         Volume: {volume:.0} (SMA {volume_sma:.0})\n\
         EMA fast: {ema_fast}\n\
         EMA slow: {ema_slow}\n\
         \n\
         Strategy: EMA breakdown",
        strike = alert.strike,
        entry = format_currency(alert.entry_price),
        time = format_time(alert.timestamp),
        low = format_currency(alert.signal_candle_low),
        breaks = check(alert.conditions.breaks_signal_low),
        bearish = check(alert.conditions.bearish),
        volume_ok = check(alert.conditions.high_volume),
        below = check(alert.conditions.below_slow_trend),
        volume = alert.volume,
        volume_sma = alert.volume_sma,
        ema_fast = format_currency(alert.ema_fast),
        ema_slow = format_currency(alert.ema_slow),
    )
}

pub fn format_error_message(error: &str, at: DateTime<Utc>) -> String {
    format!(
        "*SYSTEM ERROR*\n\nAlert system encountered an error:\n{}\n\nTime: {}\nCheck the system logs.",
        error,
        format_time(at)
    )
}

pub fn format_status_message(
    scheduler: &SchedulerStatus,
    detector: &DetectorStatus,
    at: DateTime<Utc>,
) -> String {
    format!(
        "*SYSTEM STATUS REPORT*\n\
         \n\
         Scheduler: {running}\n\
         Cycles: {runs}\n\
         Errors: {errors} ({rate:.2}%)\n\
         Alerts: {alerts}\n\
         \n\
         Market: {market}\n\
         Notifier: {notifier}\n\
         \n\
         Data points: {points}\n\
         Current price: {price}\n\
         Signal candle: {armed}\n\
         EMA fast: {ema_fast}\n\
         EMA slow: {ema_slow}\n\
         \n\
         Last run: {last_run}\n\
         Reported at: {now}",
        running = if scheduler.running { "running" } else { "stopped" },
        runs = scheduler.run_count,
        errors = scheduler.error_count,
        rate = scheduler.error_rate,
        alerts = scheduler.alert_count,
        market = if scheduler.market_open { "open" } else { "closed" },
        notifier = if scheduler.notifier_ready { "ready" } else { "not ready" },
        points = detector.data_points,
        price = optional_currency(detector.current_price),
        armed = if detector.has_signal_candle { "active" } else { "none" },
        ema_fast = optional_currency(detector.ema_fast),
        ema_slow = optional_currency(detector.ema_slow),
        last_run = scheduler
            .last_run_time
            .map(format_time)
            .unwrap_or_else(|| "never".to_string()),
        now = format_time(at),
    )
}

pub fn format_test_message(at: DateTime<Utc>) -> String {
    format!(
        "*TEST MESSAGE*\n\nAlert system is running.\nTime: {}\n\nThis is a test message from the Nifty options alert system.",
        format_time(at)
    )
}

pub fn format_startup_message(interval_minutes: u64, market_open: bool, at: DateTime<Utc>) -> String {
    format!(
        "*ALERT SYSTEM STARTED*\n\
         \n\
         Strategy: EMA breakdown (bearish)\n\
         Instrument: Nifty 50 ATM PUT\n\
         Interval: {} minute(s)\n\
         Market: {}\n\
         Time: {}\n\
         \n\
         Monitoring is active.",
        interval_minutes,
        if market_open { "open" } else { "closed" },
        format_time(at)
    )
}

pub fn format_shutdown_message(scheduler: &SchedulerStatus, at: DateTime<Utc>) -> String {
    format!(
        "*ALERT SYSTEM STOPPED*\n\nTime: {}\nCycles: {}\nAlerts: {}\n\nMonitoring has stopped.",
        format_time(at),
        scheduler.run_count,
        scheduler.alert_count
    )
}
