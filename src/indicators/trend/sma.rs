//! SMA (Simple Moving Average) indicator

/// Trailing arithmetic mean over every window of `period` values.
///
/// Same length rule as [`super::compute_ema`]: `len - period + 1` outputs,
/// or an empty series when the input is shorter than `period`.
pub fn compute_sma(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    values
        .windows(period)
        .map(|window| window.iter().sum::<f64>() / period as f64)
        .collect()
}
