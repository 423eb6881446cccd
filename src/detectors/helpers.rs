//! Common helper functions for candlestick pattern detection
//!
//! Thresholds and comparison functions shared across all detector modules.

use crate::{OHLCVExt, OHLCV};

// ============================================================
// THRESHOLDS
// ============================================================

/// Body is long: body > avg_body * BODY_LONG_FACTOR
pub const BODY_LONG_FACTOR: f64 = 1.0;
/// Fallback when no trailing bars exist: body / range >= BODY_LONG_RATIO
pub const BODY_LONG_RATIO: f64 = 0.6;
/// Marubozu: each shadow at most this share of the range
pub const MARUBOZU_SHADOW_RATIO: f64 = 0.05;
/// Tweezer lows/highs match within this fraction of price
pub const TWEEZER_TOLERANCE: f64 = 0.001;
/// Bars of prior decline/advance required before a tweezer
pub const TWEEZER_TREND_LOOKBACK: usize = 5;
/// Default candle averaging window
pub const CANDLE_PERIOD: usize = 10;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// Check if body is long relative to recent bodies, or to its own range when
/// no average is available
#[inline]
pub fn is_body_long_f(body: f64, avg_body: f64, range: f64, factor: f64) -> bool {
    if avg_body > 0.0 {
        body > avg_body * factor
    } else {
        range > 0.0 && body / range >= BODY_LONG_RATIO
    }
}

/// Trailing average body over bars before `at` (excluding `at`).
/// None when no earlier bar exists.
#[inline]
pub fn trailing_avg_body<T: OHLCV>(bars: &[T], at: usize, period: usize) -> Option<f64> {
    trailing_avg(bars, at, period, |b| b.body())
}

fn trailing_avg<T: OHLCV>(
    bars: &[T],
    at: usize,
    period: usize,
    f: impl Fn(&T) -> f64,
) -> Option<f64> {
    if at == 0 || at > bars.len() || period == 0 {
        return None;
    }
    let slice = &bars[at.saturating_sub(period)..at];
    Some(slice.iter().map(f).sum::<f64>() / slice.len() as f64)
}

/// Check if a bar is a marubozu (no/minimal shadows).
/// Returns `Some(true)` if marubozu, `Some(false)` if not, `None` if range is zero.
#[inline]
pub fn is_marubozu<T: OHLCVExt>(bar: &T, shadow_max_ratio: f64) -> Option<bool> {
    let upper = bar.upper_shadow_ratio()?;
    let lower = bar.lower_shadow_ratio()?;
    Some(upper <= shadow_max_ratio && lower <= shadow_max_ratio)
}

/// Two prices equal within `tolerance` of the reference price
#[inline]
pub fn nearly_equal(a: f64, b: f64, reference: f64, tolerance: f64) -> bool {
    (a - b).abs() <= reference.abs() * tolerance
}

/// Close at `end` is below the close `lookback` bars earlier
#[inline]
pub fn declined_into<T: OHLCV>(bars: &[T], end: usize, lookback: usize) -> bool {
    end >= lookback && end < bars.len() && bars[end].close() < bars[end - lookback].close()
}

/// Close at `end` is above the close `lookback` bars earlier
#[inline]
pub fn advanced_into<T: OHLCV>(bars: &[T], end: usize, lookback: usize) -> bool {
    end >= lookback && end < bars.len() && bars[end].close() > bars[end - lookback].close()
}
