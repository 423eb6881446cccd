//! Price/oscillator divergence over a recent window

use serde::{Deserialize, Serialize};

use crate::OHLCV;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    /// Price made a lower low while the oscillator made a higher low
    pub bullish: bool,
    /// Price made a higher high while the oscillator made a lower high
    pub bearish: bool,
}

/// Compare the extreme of the earlier half of the last `lookback` bars with
/// the extreme of the recent half. `oscillator` is tail-aligned with `bars`.
/// Returns no divergence when either input is shorter than `lookback` or
/// `lookback < 4`.
///
/// Any tail-aligned series works as `oscillator`. The screener passes the
/// daily series of the configured momentum indicator (MACD histogram by
/// default, MACD line under `sma_trend`), not the oscillator category, so the
/// bullish divergence rule reads momentum troughs.
pub fn detect_divergence<T: OHLCV>(bars: &[T], oscillator: &[f64], lookback: usize) -> Divergence {
    if lookback < 4 || bars.len() < lookback || oscillator.len() < lookback {
        return Divergence::default();
    }

    let bars = &bars[bars.len() - lookback..];
    let osc = &oscillator[oscillator.len() - lookback..];
    let half = lookback / 2;

    let lows: Vec<f64> = bars.iter().map(|b| b.low()).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high()).collect();

    let early_low = extreme_index(&lows[..half], |a, b| a < b);
    let recent_low = half + extreme_index(&lows[half..], |a, b| a < b);
    let early_high = extreme_index(&highs[..half], |a, b| a > b);
    let recent_high = half + extreme_index(&highs[half..], |a, b| a > b);

    Divergence {
        bullish: lows[recent_low] < lows[early_low] && osc[recent_low] > osc[early_low],
        bearish: highs[recent_high] > highs[early_high] && osc[recent_high] < osc[early_high],
    }
}

/// Index of the first value that beats every other under `better`
fn extreme_index(values: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    values
        .iter()
        .enumerate()
        .fold(0, |best, (i, &v)| if better(v, values[best]) { i } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bar {
        high: f64,
        low: f64,
    }

    impl OHLCV for Bar {
        fn open(&self) -> f64 {
            (self.high + self.low) / 2.0
        }
        fn high(&self) -> f64 {
            self.high
        }
        fn low(&self) -> f64 {
            self.low
        }
        fn close(&self) -> f64 {
            (self.high + self.low) / 2.0
        }
        fn volume(&self) -> f64 {
            0.0
        }
    }

    fn bars_from_lows(lows: &[f64]) -> Vec<Bar> {
        lows.iter()
            .map(|&low| Bar {
                high: low + 1.0,
                low,
            })
            .collect()
    }

    #[test]
    fn test_bullish_divergence() {
        // Lower low in the recent half, oscillator bottoms higher
        let bars = bars_from_lows(&[10.0, 8.0, 9.0, 10.0, 9.0, 7.0, 8.0, 9.0]);
        let osc = [-1.0, -3.0, -2.0, -1.0, -1.5, -2.0, -1.0, 0.0];
        let d = detect_divergence(&bars, &osc, 8);
        assert!(d.bullish);
    }

    #[test]
    fn test_no_divergence_when_oscillator_confirms() {
        let bars = bars_from_lows(&[10.0, 8.0, 9.0, 10.0, 9.0, 7.0, 8.0, 9.0]);
        let osc = [-1.0, -3.0, -2.0, -1.0, -1.5, -4.0, -1.0, 0.0];
        assert!(!detect_divergence(&bars, &osc, 8).bullish);
    }

    #[test]
    fn test_bearish_divergence() {
        let bars = bars_from_lows(&[10.0, 12.0, 11.0, 10.0, 11.0, 13.0, 12.0, 11.0]);
        let osc = [1.0, 3.0, 2.0, 1.0, 1.5, 2.0, 1.0, 0.0];
        let d = detect_divergence(&bars, &osc, 8);
        assert!(d.bearish);
        assert!(!d.bullish);
    }

    #[test]
    fn test_short_input() {
        let bars = bars_from_lows(&[10.0, 8.0, 9.0]);
        assert_eq!(detect_divergence(&bars, &[1.0, 2.0, 3.0], 8), Divergence::default());
    }
}
