//! Force Index: price change times volume, EMA-smoothed

use super::moving_average::ema;
use crate::{Period, Result, ScreenError, OHLCV};

/// `(close[t] - close[t-1]) * volume[t]`, one value per bar after the first.
pub fn raw_force_index<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| (w[1].close() - w[0].close()) * w[1].volume())
        .collect()
}

/// EMA of the raw Force Index. Needs `period + 1` bars.
pub fn force_index<T: OHLCV>(bars: &[T], period: Period) -> Result<Vec<f64>> {
    let need = period.get() + 1;
    if bars.len() < need {
        return Err(ScreenError::InsufficientData {
            indicator: "force_index",
            need,
            got: bars.len(),
        });
    }
    ema(&raw_force_index(bars), period)
}
