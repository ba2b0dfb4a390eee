/// Last value of the simple moving average over `period` closes.
///
/// `None` until the window is full.
pub fn sma_last(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let sum: f64 = data[data.len() - period..].iter().sum();
    Some(sum / period as f64)
}

/// RSI over `period` via rolling mean of gains and losses.
///
/// `rs = mean_gain / mean_loss`, `rsi = 100 - 100 / (1 + rs)`; only the
/// last value is reported. A zero mean loss pins RSI at 100, a zero mean
/// gain at 0. `None` when fewer than `period + 1` closes.
pub fn rsi_last(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period + 1 {
        return None;
    }

    let window = &data[data.len() - (period + 1)..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;
    for pair in window.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gain_sum += change;
        } else {
            loss_sum += change.abs();
        }
    }

    let mean_gain = gain_sum / period as f64;
    let mean_loss = loss_sum / period as f64;

    if mean_loss == 0.0 {
        return Some(100.0);
    }

    let rs = mean_gain / mean_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Percent return over the last `n` periods: `(last - base) / base * 100`.
///
/// `None` when fewer than `n + 1` closes or the base close is zero.
pub fn pct_return(data: &[f64], n: usize) -> Option<f64> {
    if n == 0 || data.len() < n + 1 {
        return None;
    }
    let last = data[data.len() - 1];
    let base = data[data.len() - 1 - n];
    if base == 0.0 {
        return None;
    }
    Some((last - base) / base * 100.0)
}

/// (high, low) over the trailing `window` closes, or the whole series when
/// shorter. `None` on an empty series.
pub fn trailing_extremes(data: &[f64], window: usize) -> Option<(f64, f64)> {
    if data.is_empty() || window == 0 {
        return None;
    }
    let start = data.len().saturating_sub(window);
    let slice = &data[start..];
    let high = slice.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let low = slice.iter().copied().fold(f64::INFINITY, f64::min);
    Some((high, low))
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
