//! EMA (Exponential Moving Average) indicator

/// Full EMA series over `values`, aligned to the tail of the input.
///
/// The first output is the arithmetic mean of the first `period` values;
/// every later one is `v * k + prev * (1 - k)` with `k = 2 / (period + 1)`.
/// Returns an empty series when there are fewer than `period` values, so
/// callers treat "empty" as "not yet available".
pub fn compute_ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(seed);

    let mut prev = seed;
    for &value in &values[period..] {
        prev = value * k + prev * (1.0 - k);
        series.push(prev);
    }

    series
}

/// Latest EMA value, if the series is available.
pub fn latest_ema(values: &[f64], period: usize) -> Option<f64> {
    compute_ema(values, period).last().copied()
}
