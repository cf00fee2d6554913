use crate::config::DetectorConfig;
use crate::indicators::trend::{compute_ema, compute_sma};
use crate::models::{HistoryBuffer, IndicatorSnapshot};

/// Recompute every indicator the detector needs from the full history.
pub fn compute_snapshot(history: &HistoryBuffer, config: &DetectorConfig) -> IndicatorSnapshot {
    let closes = history.closes();
    let volumes = history.volumes();

    let ema_fast = compute_ema(&closes, config.ema_fast_period);
    let ema_slow = compute_ema(&closes, config.ema_slow_period);
    let volume_sma = compute_sma(&volumes, config.volume_sma_period);

    IndicatorSnapshot {
        ema_fast: ema_fast.last().copied(),
        ema_fast_prev: ema_fast.len().checked_sub(2).map(|i| ema_fast[i]),
        ema_slow: ema_slow.last().copied(),
        volume_sma: volume_sma.last().copied(),
    }
}
