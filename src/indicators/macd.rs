//! MACD line, signal and histogram

use super::moving_average::ema;
use super::tail_pairs;
use crate::{Period, Result, ScreenError};

/// Tail-aligned MACD output. `line` is longer than `signal` and `histogram`,
/// which share the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Bars needed before the first histogram value exists
pub fn macd_min_len(fast: Period, slow: Period, signal: Period) -> usize {
    fast.get().max(slow.get()) + signal.get() - 1
}

/// `line = EMA(fast) - EMA(slow)`, `signal = EMA(line, signal)`,
/// `histogram = line - signal`.
pub fn macd(closes: &[f64], fast: Period, slow: Period, signal: Period) -> Result<MacdSeries> {
    let need = macd_min_len(fast, slow, signal);
    if closes.len() < need {
        return Err(ScreenError::InsufficientData {
            indicator: "macd",
            need,
            got: closes.len(),
        });
    }

    let fast_ema = ema(closes, fast)?;
    let slow_ema = ema(closes, slow)?;
    let line: Vec<f64> = tail_pairs(&fast_ema, &slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&line, signal)?;
    let histogram = tail_pairs(&line, &signal_line).map(|(l, s)| l - s).collect();

    Ok(MacdSeries {
        line,
        signal: signal_line,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: usize) -> Period {
        Period::new(n).unwrap()
    }

    #[test]
    fn test_lengths() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let m = macd(&closes, p(12), p(26), p(9)).unwrap();
        assert_eq!(m.line.len(), 50 - 26 + 1);
        assert_eq!(m.histogram.len(), m.line.len() - 9 + 1);
        assert_eq!(m.signal.len(), m.histogram.len());
    }

    #[test]
    fn test_flat_prices_zero() {
        let m = macd(&[50.0; 40], p(12), p(26), p(9)).unwrap();
        assert!(m.histogram.iter().all(|h| h.abs() < 1e-12));
    }

    #[test]
    fn test_uptrend_line_positive() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 2.0 * i as f64).collect();
        let m = macd(&closes, p(12), p(26), p(9)).unwrap();
        assert!(m.line.last().copied().unwrap() > 0.0);
    }

    #[test]
    fn test_insufficient() {
        let err = macd(&[1.0; 33], p(12), p(26), p(9)).unwrap_err();
        assert_eq!(
            err,
            ScreenError::InsufficientData {
                indicator: "macd",
                need: 34,
                got: 33
            }
        );
    }
}
