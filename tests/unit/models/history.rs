//! Unit tests for candles, the history buffer and report types

use breakdown_alert::models::{CycleStats, HistoryBuffer, NoSignal, NoSignalReason};

use crate::fixtures::{candle, doji, t0};

#[test]
fn test_history_evicts_oldest() {
    let mut history = HistoryBuffer::with_capacity(3);
    for price in [1.0, 2.0, 3.0, 4.0] {
        history.push(doji(price, t0()));
    }

    assert_eq!(history.len(), 3);
    assert_eq!(history.closes(), vec![2.0, 3.0, 4.0]);
    assert_eq!(history.latest().map(|c| c.close), Some(4.0));
    assert_eq!(history.previous().map(|c| c.close), Some(3.0));
}

#[test]
fn test_history_default_capacity() {
    let mut history = HistoryBuffer::new();
    assert_eq!(history.capacity(), 250);
    for i in 0..260 {
        history.push(doji(100.0 + i as f64, t0()));
    }
    assert_eq!(history.len(), 250);
    assert_eq!(history.iter().next().map(|c| c.close), Some(110.0));
}

#[test]
fn test_previous_needs_two_candles() {
    let mut history = HistoryBuffer::new();
    assert!(history.is_empty());
    history.push(doji(1.0, t0()));
    assert!(history.previous().is_none());
}

#[test]
fn test_well_formed_candle() {
    assert!(candle(1.0, 2.0, 0.5, 1.5, 0.0).is_well_formed());
    assert!(!candle(1.0, 2.0, 0.0, 1.5, 10.0).is_well_formed());
    assert!(!candle(1.0, f64::NAN, 0.5, 1.5, 10.0).is_well_formed());
    assert!(!candle(1.0, 2.0, 0.5, 1.5, -1.0).is_well_formed());
}

#[test]
fn test_error_rate_rounding() {
    let stats = CycleStats {
        run_count: 3,
        error_count: 1,
        ..Default::default()
    };
    assert_eq!(stats.error_rate(), 33.33);
    assert_eq!(CycleStats::default().error_rate(), 0.0);
}

#[test]
fn test_no_signal_reason_text() {
    let cooldown = NoSignalReason::CooldownActive { remaining_secs: 240 };
    assert_eq!(cooldown.to_string(), "cooldown active (240s remaining)");
    assert_eq!(NoSignalReason::NoEntry.to_string(), "no entry conditions met");
    assert!(NoSignalReason::InsufficientHistory { have: 3, need: 202 }
        .to_string()
        .starts_with("insufficient data"));
    assert!(NoSignal::new(NoSignalReason::IndicatorUnavailable).is_insufficient_data());
    assert!(!NoSignal::new(NoSignalReason::SignalExpired).is_insufficient_data());
}
