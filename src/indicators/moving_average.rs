//! Simple and exponential moving averages
//!
//! Both return tail-aligned series: the last element corresponds to the last
//! input value, and the output starts at the first full window.

use crate::{Period, Result, ScreenError, OHLCV};

/// Simple moving average. Output length is `values.len() - period + 1`.
pub fn sma(values: &[f64], period: Period) -> Result<Vec<f64>> {
    let p = period.get();
    if values.len() < p {
        return Err(ScreenError::InsufficientData {
            indicator: "sma",
            need: p,
            got: values.len(),
        });
    }

    let mut out = Vec::with_capacity(values.len() - p + 1);
    let mut sum: f64 = values[..p].iter().sum();
    out.push(sum / p as f64);
    for i in p..values.len() {
        sum += values[i] - values[i - p];
        out.push(sum / p as f64);
    }
    Ok(out)
}

/// Exponential moving average seeded with the SMA of the first `period`
/// values, then `ema = prev + alpha * (value - prev)` with `alpha = 2 / (period + 1)`.
pub fn ema(values: &[f64], period: Period) -> Result<Vec<f64>> {
    let p = period.get();
    if values.len() < p {
        return Err(ScreenError::InsufficientData {
            indicator: "ema",
            need: p,
            got: values.len(),
        });
    }

    let alpha = 2.0 / (p as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len() - p + 1);
    let mut prev = values[..p].iter().sum::<f64>() / p as f64;
    out.push(prev);
    for value in &values[p..] {
        prev += alpha * (value - prev);
        out.push(prev);
    }
    Ok(out)
}

/// EMA of bar closes
pub fn ema_of_closes<T: OHLCV>(bars: &[T], period: Period) -> Result<Vec<f64>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
    ema(&closes, period)
}

/// SMA of bar closes
pub fn sma_of_closes<T: OHLCV>(bars: &[T], period: Period) -> Result<Vec<f64>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close()).collect();
    sma(&closes, period)
}
