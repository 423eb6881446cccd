//! Bounded oscillators: Stochastic and RSI

use super::moving_average::sma;
use crate::{Period, Result, ScreenError, OHLCV};

/// Stochastic %K over `period` bars. A window with zero high-low range
/// reads 50. Output length is `bars.len() - period + 1`.
pub fn stochastic_k<T: OHLCV>(bars: &[T], period: Period) -> Result<Vec<f64>> {
    let p = period.get();
    if bars.len() < p {
        return Err(ScreenError::InsufficientData {
            indicator: "stochastic",
            need: p,
            got: bars.len(),
        });
    }

    Ok(bars
        .windows(p)
        .map(|w| {
            let hh = w.iter().map(|b| b.high()).fold(f64::NEG_INFINITY, f64::max);
            let ll = w.iter().map(|b| b.low()).fold(f64::INFINITY, f64::min);
            let span = hh - ll;
            if span <= f64::EPSILON {
                50.0
            } else {
                let close = w[p - 1].close();
                (close - ll) / span * 100.0
            }
        })
        .collect())
}

/// %K and its `d_period` SMA (%D), tail-aligned
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

pub fn stochastic<T: OHLCV>(
    bars: &[T],
    k_period: Period,
    d_period: Period,
) -> Result<StochasticSeries> {
    let need = k_period.get() + d_period.get() - 1;
    if bars.len() < need {
        return Err(ScreenError::InsufficientData {
            indicator: "stochastic",
            need,
            got: bars.len(),
        });
    }
    let k = stochastic_k(bars, k_period)?;
    let d = sma(&k, d_period)?;
    Ok(StochasticSeries { k, d })
}

/// Wilder RSI. Needs `period + 1` closes; output length is `closes.len() - period`.
/// All-gain windows read 100, flat windows read 50.
pub fn rsi(closes: &[f64], period: Period) -> Result<Vec<f64>> {
    let p = period.get();
    if closes.len() < p + 1 {
        return Err(ScreenError::InsufficientData {
            indicator: "rsi",
            need: p + 1,
            got: closes.len(),
        });
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let mut avg_gain = changes[..p].iter().map(|c| c.max(0.0)).sum::<f64>() / p as f64;
    let mut avg_loss = changes[..p].iter().map(|c| (-c).max(0.0)).sum::<f64>() / p as f64;

    let mut out = Vec::with_capacity(closes.len() - p);
    out.push(rsi_value(avg_gain, avg_loss));
    for change in &changes[p..] {
        avg_gain = (avg_gain * (p - 1) as f64 + change.max(0.0)) / p as f64;
        avg_loss = (avg_loss * (p - 1) as f64 + (-change).max(0.0)) / p as f64;
        out.push(rsi_value(avg_gain, avg_loss));
    }
    Ok(out)
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= f64::EPSILON {
        if avg_gain <= f64::EPSILON {
            50.0
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bar(f64, f64, f64);

    impl OHLCV for Bar {
        fn open(&self) -> f64 {
            self.2
        }
        fn high(&self) -> f64 {
            self.0
        }
        fn low(&self) -> f64 {
            self.1
        }
        fn close(&self) -> f64 {
            self.2
        }
        fn volume(&self) -> f64 {
            0.0
        }
    }

    fn p(n: usize) -> Period {
        Period::new(n).unwrap()
    }

    #[test]
    fn test_stochastic_position_in_range() {
        let bars = vec![Bar(12.0, 8.0, 10.0), Bar(11.0, 9.0, 10.0), Bar(11.0, 9.0, 9.0)];
        let k = stochastic_k(&bars, p(3)).unwrap();
        assert_eq!(k.len(), 1);
        assert!((k[0] - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_stochastic_flat_window() {
        let bars: Vec<Bar> = (0..5).map(|_| Bar(10.0, 10.0, 10.0)).collect();
        let k = stochastic_k(&bars, p(3)).unwrap();
        assert!(k.iter().all(|v| *v == 50.0));
    }

    #[test]
    fn test_stochastic_d_length() {
        let bars: Vec<Bar> = (0..20)
            .map(|i| {
                let c = 10.0 + i as f64;
                Bar(c + 1.0, c - 1.0, c)
            })
            .collect();
        let s = stochastic(&bars, p(14), p(3)).unwrap();
        assert_eq!(s.k.len(), 7);
        assert_eq!(s.d.len(), 5);
    }

    #[test]
    fn test_rsi_bounds_and_extremes() {
        let up: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert!(rsi(&up, p(14)).unwrap().iter().all(|v| *v == 100.0));

        let flat = [5.0; 20];
        assert!(rsi(&flat, p(14)).unwrap().iter().all(|v| *v == 50.0));

        let down: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        assert!(rsi(&down, p(14)).unwrap().iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn test_rsi_length() {
        let closes: Vec<f64> = (0..30).map(|i| (i as f64).sin() + 10.0).collect();
        let out = rsi(&closes, p(14)).unwrap();
        assert_eq!(out.len(), 16);
        assert!(out.iter().all(|v| (0.0..=100.0).contains(v)));
    }
}
