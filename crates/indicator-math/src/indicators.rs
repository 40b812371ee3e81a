use stats_core::Trend;

/// Default RSI window
pub const RSI_PERIOD: usize = 14;

/// Default momentum lookback (points back from the last close)
pub const MOMENTUM_LOOKBACK: usize = 15;

/// Momentum / MA-deviation threshold separating up/down from flat, in percent
const TREND_THRESHOLD_PCT: f64 = 0.5;

/// Simple Moving Average over the last `period` values.
/// `None` when there are fewer than `period` points — no partial windows.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Relative Strength Index over a single (period+1)-point window using
/// simple average gain/loss (not exponentially smoothed).
///
/// When the window holds no losses the RSI is exactly 100.0 — that is a
/// policy choice guarding the divide-by-zero, not a numerical accident.
/// `None` when the series has `period` points or fewer.
pub fn rsi(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() <= period {
        return None;
    }

    let window = &data[data.len() - (period + 1)..];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;

    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gain_sum += delta;
        } else {
            loss_sum += delta.abs();
        }
    }

    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Percentage change over the last `lookback + 1` points:
/// `(last / first - 1) * 100`.
/// `None` on insufficient history or a zero/non-finite divisor.
pub fn momentum_pct(data: &[f64], lookback: usize) -> Option<f64> {
    if lookback == 0 || data.len() < lookback + 1 {
        return None;
    }

    let first = data[data.len() - 1 - lookback];
    let last = data[data.len() - 1];

    if first == 0.0 || !first.is_finite() || !last.is_finite() {
        return None;
    }

    let pct = (last / first - 1.0) * 100.0;
    pct.is_finite().then_some(pct)
}

/// Classify trend from momentum, falling back to MA50 deviation.
/// Momentum takes precedence whenever it is present.
pub fn trend_from_momentum(momentum: Option<f64>, pct_vs_ma50: Option<f64>) -> Trend {
    if let Some(m) = momentum {
        if m > TREND_THRESHOLD_PCT {
            return Trend::Up;
        }
        if m < -TREND_THRESHOLD_PCT {
            return Trend::Down;
        }
    }

    if let Some(p) = pct_vs_ma50 {
        if p > TREND_THRESHOLD_PCT {
            return Trend::Up;
        }
        if p < -TREND_THRESHOLD_PCT {
            return Trend::Down;
        }
    }

    Trend::Flat
}

/// Force a close series to ascending (oldest first) order: reverse once
/// when the first value is greater than the last, otherwise leave it
/// alone. Applying it twice gives the same result as applying it once.
pub fn force_ascending(series: &mut [f64]) {
    if series.len() >= 2 {
        let first = series[0];
        let last = series[series.len() - 1];
        if first > last {
            series.reverse();
        }
    }
}
