//! Unit tests for environment configuration

use breakdown_alert::config::{Config, DetectorConfig};
use breakdown_alert::error::ConfigError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

const REQUIRED: [(&str, &str); 3] = [
    ("RUN_INTERVAL_MINUTES", "5"),
    ("ALERT_TARGET", "919999999999"),
    ("DATA_SOURCE_URL", "http://localhost/option-chain"),
];

#[test]
fn test_defaults_applied() {
    let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

    assert_eq!(config.run_interval_minutes, 5);
    assert_eq!(config.alert_target, "919999999999");
    assert_eq!(config.notifier_webhook_url, None);
    assert_eq!(config.detector, DetectorConfig::default());
    assert_eq!(config.detector.min_history(), 202);
    assert_eq!(config.strike_interval, 50.0);
    assert_eq!(config.fetch_timeout, Duration::from_secs(10));
    assert_eq!(config.send_timeout, Duration::from_secs(15));
    assert_eq!(config.status_update_minutes, 30);
    assert_eq!(config.status_port, 3000);
    assert_eq!(config.signal_log_path, PathBuf::from("logs/signals.log"));
}

#[test]
fn test_overrides_parsed() {
    let mut vars = REQUIRED.to_vec();
    vars.extend([
        ("EMA_FAST_PERIOD", "9"),
        ("EMA_SLOW_PERIOD", "50"),
        ("MIN_BODY_SIZE_PERCENT", "0.25"),
        ("NOTIFIER_WEBHOOK_URL", " http://gateway/send "),
        ("STATUS_UPDATE_MINUTES", "0"),
    ]);
    let config = Config::from_lookup(lookup(&vars)).unwrap();

    assert_eq!(config.detector.ema_fast_period, 9);
    assert_eq!(config.detector.ema_slow_period, 50);
    assert_eq!(config.detector.min_body_size_percent, 0.25);
    assert_eq!(config.notifier_webhook_url.as_deref(), Some("http://gateway/send"));
    assert_eq!(config.status_update_minutes, 0);
}

#[test]
fn test_missing_required() {
    let err = Config::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("RUN_INTERVAL_MINUTES")));

    let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
    assert!(matches!(err, ConfigError::Missing("DATA_SOURCE_URL")));
}

#[test]
fn test_invalid_values_rejected() {
    let mut vars = REQUIRED.to_vec();
    vars[0] = ("RUN_INTERVAL_MINUTES", "0");
    assert!(matches!(
        Config::from_lookup(lookup(&vars)),
        Err(ConfigError::Invalid { name: "RUN_INTERVAL_MINUTES", .. })
    ));

    let mut vars = REQUIRED.to_vec();
    vars.push(("EMA_SLOW_PERIOD", "abc"));
    assert!(matches!(
        Config::from_lookup(lookup(&vars)),
        Err(ConfigError::Invalid { name: "EMA_SLOW_PERIOD", .. })
    ));

    let mut vars = REQUIRED.to_vec();
    vars.push(("VOLUME_SMA_PERIOD", "0"));
    assert!(Config::from_lookup(lookup(&vars)).is_err());
}

fn rejected_as(extra: (&'static str, &'static str)) -> Option<&'static str> {
    let mut vars = REQUIRED.to_vec();
    vars.retain(|(k, _)| *k != extra.0);
    vars.push(extra);
    match Config::from_lookup(lookup(&vars)) {
        Err(ConfigError::Invalid { name, .. }) => Some(name),
        _ => None,
    }
}

#[test]
fn test_warmup_window_must_fit_history() {
    assert_eq!(rejected_as(("EMA_SLOW_PERIOD", "249")), Some("EMA_SLOW_PERIOD"));
    assert_eq!(rejected_as(("VOLUME_SMA_PERIOD", "300")), Some("VOLUME_SMA_PERIOD"));
    assert_eq!(rejected_as(("EMA_SLOW_PERIOD", "248")), None);
}

#[test]
fn test_strike_interval_must_be_positive() {
    assert_eq!(rejected_as(("STRIKE_INTERVAL", "0")), Some("STRIKE_INTERVAL"));
    assert_eq!(rejected_as(("STRIKE_INTERVAL", "-50")), Some("STRIKE_INTERVAL"));
    assert_eq!(rejected_as(("STRIKE_INTERVAL", "NaN")), Some("STRIKE_INTERVAL"));
    assert_eq!(rejected_as(("STRIKE_INTERVAL", "inf")), Some("STRIKE_INTERVAL"));
    assert_eq!(rejected_as(("STRIKE_INTERVAL", "100")), None);
}

#[test]
fn test_body_size_must_be_non_negative() {
    assert_eq!(rejected_as(("MIN_BODY_SIZE_PERCENT", "-0.1")), Some("MIN_BODY_SIZE_PERCENT"));
    assert_eq!(rejected_as(("MIN_BODY_SIZE_PERCENT", "NaN")), Some("MIN_BODY_SIZE_PERCENT"));
    assert_eq!(rejected_as(("MIN_BODY_SIZE_PERCENT", "0")), None);
}

#[test]
fn test_intervals_capped_at_one_day() {
    assert_eq!(rejected_as(("RUN_INTERVAL_MINUTES", "1441")), Some("RUN_INTERVAL_MINUTES"));
    assert_eq!(
        rejected_as(("RUN_INTERVAL_MINUTES", "18446744073709551615")),
        Some("RUN_INTERVAL_MINUTES")
    );
    assert_eq!(rejected_as(("RUN_INTERVAL_MINUTES", "1440")), None);
    assert_eq!(rejected_as(("STATUS_UPDATE_MINUTES", "1441")), Some("STATUS_UPDATE_MINUTES"));
}
