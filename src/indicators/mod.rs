//! Indicator catalog
//!
//! Every indicator is a variant of [`IndicatorKind`] with one compute path.
//! Series outputs are tail-aligned: the last element always corresponds to
//! the most recent bar, and each series starts at its first defined value.

pub mod divergence;
pub mod force_index;
pub mod impulse;
pub mod macd;
pub mod moving_average;
pub mod oscillators;
pub mod volatility;

pub use divergence::{detect_divergence, Divergence};
pub use force_index::{force_index, raw_force_index};
pub use impulse::ImpulseColor;
pub use macd::{macd, MacdSeries};
pub use moving_average::{ema, ema_of_closes, sma, sma_of_closes};
pub use oscillators::{rsi, stochastic, stochastic_k, StochasticSeries};
pub use volatility::{atr, keltner, true_range, ChannelZone, KeltnerChannel, KeltnerReading};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Category;
use crate::params::IndicatorParams;
use crate::{Result, ScreenError, OHLCV};

/// Pair the last `min(a.len(), b.len())` values of two series.
pub(crate) fn tail_pairs<'a>(a: &'a [f64], b: &'a [f64]) -> impl Iterator<Item = (f64, f64)> + 'a {
    let m = a.len().min(b.len());
    a[a.len() - m..]
        .iter()
        .copied()
        .zip(b[b.len() - m..].iter().copied())
}

fn closes<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    bars.iter().map(|b| b.close()).collect()
}

// ============================================================
// SLOPE / READING
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slope {
    Rising,
    Falling,
    Flat,
}

impl Slope {
    #[inline]
    pub fn is_rising(self) -> bool {
        self == Slope::Rising
    }

    /// Flat counts as falling
    #[inline]
    pub fn is_falling(self) -> bool {
        !self.is_rising()
    }
}

/// Most recent value of a line indicator and the value `slope_lookback` bars earlier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub current: f64,
    pub previous: f64,
}

impl Reading {
    pub fn from_series(series: &[f64], lookback: usize, indicator: &'static str) -> Result<Self> {
        let n = series.len();
        if n <= lookback {
            return Err(ScreenError::InsufficientData {
                indicator,
                need: lookback + 1,
                got: n,
            });
        }
        Ok(Self {
            current: series[n - 1],
            previous: series[n - 1 - lookback],
        })
    }

    pub fn slope(&self) -> Slope {
        if self.current > self.previous {
            Slope::Rising
        } else if self.current < self.previous {
            Slope::Falling
        } else {
            Slope::Flat
        }
    }

    #[inline]
    pub fn change(&self) -> f64 {
        self.current - self.previous
    }

    /// Percent change relative to `|previous|`. None when previous is ~0.
    pub fn change_pct(&self) -> Option<f64> {
        (self.previous.abs() > f64::EPSILON)
            .then(|| (self.current - self.previous) / self.previous.abs() * 100.0)
    }
}

// ============================================================
// INDICATOR VALUES
// ============================================================

/// Output of one indicator on the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorValue {
    /// Line indicator with slope information
    Trailing(Reading),
    Scalar(f64),
    Band(KeltnerReading),
    Impulse(ImpulseColor),
}

impl IndicatorValue {
    /// Numeric value on the latest bar. Bands report their middle line.
    pub fn current(&self) -> Option<f64> {
        match self {
            IndicatorValue::Trailing(r) => Some(r.current),
            IndicatorValue::Scalar(v) => Some(*v),
            IndicatorValue::Band(b) => Some(b.middle),
            IndicatorValue::Impulse(_) => None,
        }
    }

    pub fn reading(&self) -> Option<Reading> {
        match self {
            IndicatorValue::Trailing(r) => Some(*r),
            _ => None,
        }
    }

    pub fn band(&self) -> Option<KeltnerReading> {
        match self {
            IndicatorValue::Band(b) => Some(*b),
            _ => None,
        }
    }

    pub fn impulse(&self) -> Option<ImpulseColor> {
        match self {
            IndicatorValue::Impulse(c) => Some(*c),
            _ => None,
        }
    }
}

// ============================================================
// INDICATOR KINDS
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Ema,
    Sma,
    MacdHistogram,
    MacdLine,
    ForceIndex,
    ForceIndexSlow,
    Stochastic,
    Rsi,
    Atr,
    KeltnerChannel,
    ImpulseSystem,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 11] = [
        IndicatorKind::Ema,
        IndicatorKind::Sma,
        IndicatorKind::MacdHistogram,
        IndicatorKind::MacdLine,
        IndicatorKind::ForceIndex,
        IndicatorKind::ForceIndexSlow,
        IndicatorKind::Stochastic,
        IndicatorKind::Rsi,
        IndicatorKind::Atr,
        IndicatorKind::KeltnerChannel,
        IndicatorKind::ImpulseSystem,
    ];

    /// Catalog name used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            IndicatorKind::Ema => "ema",
            IndicatorKind::Sma => "sma",
            IndicatorKind::MacdHistogram => "macd_histogram",
            IndicatorKind::MacdLine => "macd_line",
            IndicatorKind::ForceIndex => "force_index",
            IndicatorKind::ForceIndexSlow => "force_index_slow",
            IndicatorKind::Stochastic => "stochastic",
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Atr => "atr",
            IndicatorKind::KeltnerChannel => "keltner_channel",
            IndicatorKind::ImpulseSystem => "impulse_system",
        }
    }

    /// Short human label used in score breakdowns
    pub fn label(self) -> &'static str {
        match self {
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Sma => "SMA",
            IndicatorKind::MacdHistogram => "MACD-H",
            IndicatorKind::MacdLine => "MACD",
            IndicatorKind::ForceIndex => "Force Index",
            IndicatorKind::ForceIndexSlow => "Force Index (slow)",
            IndicatorKind::Stochastic => "Stochastic",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Atr => "ATR",
            IndicatorKind::KeltnerChannel => "Keltner",
            IndicatorKind::ImpulseSystem => "Impulse",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn category(self) -> Category {
        match self {
            IndicatorKind::Ema | IndicatorKind::Sma => Category::Trend,
            IndicatorKind::MacdHistogram | IndicatorKind::MacdLine => Category::Momentum,
            IndicatorKind::Stochastic | IndicatorKind::Rsi => Category::Oscillator,
            IndicatorKind::ForceIndex | IndicatorKind::ForceIndexSlow => Category::Volume,
            IndicatorKind::Atr | IndicatorKind::KeltnerChannel => Category::Volatility,
            IndicatorKind::ImpulseSystem => Category::Impulse,
        }
    }

    /// Line indicators report a [`Reading`] with slope
    pub fn is_trailing(self) -> bool {
        matches!(
            self,
            IndicatorKind::Ema
                | IndicatorKind::Sma
                | IndicatorKind::MacdHistogram
                | IndicatorKind::MacdLine
        )
    }

    /// Bars needed for one output value
    pub fn min_bars(self, params: &IndicatorParams) -> usize {
        match self {
            IndicatorKind::Ema => params.ema_period.get(),
            IndicatorKind::Sma => params.sma_period.get(),
            IndicatorKind::MacdHistogram | IndicatorKind::MacdLine => {
                macd::macd_min_len(params.macd_fast, params.macd_slow, params.macd_signal)
            }
            IndicatorKind::ForceIndex => params.force_fast.get() + 1,
            IndicatorKind::ForceIndexSlow => params.force_slow.get() + 1,
            IndicatorKind::Stochastic => params.stoch_k.get(),
            IndicatorKind::Rsi => params.rsi_period.get() + 1,
            IndicatorKind::Atr => params.atr_period.get() + 1,
            IndicatorKind::KeltnerChannel => {
                volatility::keltner_min_len(params.keltner_basis, params.keltner_atr)
            }
            IndicatorKind::ImpulseSystem => IndicatorKind::Ema
                .min_bars(params)
                .max(IndicatorKind::MacdHistogram.min_bars(params)),
        }
    }

    /// Bars needed by [`IndicatorKind::compute`], including the slope lookback
    pub fn required_bars(self, params: &IndicatorParams) -> usize {
        let lookback = if self.is_trailing() || self == IndicatorKind::ImpulseSystem {
            params.slope_lookback.get()
        } else {
            0
        };
        self.min_bars(params) + lookback
    }

    fn check_len(self, got: usize, need: usize) -> Result<()> {
        if got < need {
            return Err(ScreenError::InsufficientData {
                indicator: self.name(),
                need,
                got,
            });
        }
        Ok(())
    }

    /// Full tail-aligned series. The Keltner channel yields its middle line;
    /// the impulse system has no numeric series.
    pub fn series<T: OHLCV>(self, bars: &[T], params: &IndicatorParams) -> Result<Vec<f64>> {
        self.check_len(bars.len(), self.min_bars(params))?;
        match self {
            IndicatorKind::Ema => ema_of_closes(bars, params.ema_period),
            IndicatorKind::Sma => sma_of_closes(bars, params.sma_period),
            IndicatorKind::MacdHistogram => Ok(macd(
                &closes(bars),
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            )?
            .histogram),
            IndicatorKind::MacdLine => Ok(macd(
                &closes(bars),
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            )?
            .line),
            IndicatorKind::ForceIndex => force_index(bars, params.force_fast),
            IndicatorKind::ForceIndexSlow => force_index(bars, params.force_slow),
            IndicatorKind::Stochastic => stochastic_k(bars, params.stoch_k),
            IndicatorKind::Rsi => rsi(&closes(bars), params.rsi_period),
            IndicatorKind::Atr => atr(bars, params.atr_period),
            IndicatorKind::KeltnerChannel => Ok(keltner(
                bars,
                params.keltner_basis,
                params.keltner_atr,
                params.keltner_multiplier,
            )?
            .middle),
            IndicatorKind::ImpulseSystem => Err(ScreenError::InvalidConfig(
                "impulse_system has no numeric series".into(),
            )),
        }
    }

    /// Latest value and the value `slope_lookback` bars earlier
    pub fn reading<T: OHLCV>(self, bars: &[T], params: &IndicatorParams) -> Result<Reading> {
        let lookback = params.slope_lookback.get();
        self.check_len(bars.len(), self.min_bars(params) + lookback)?;
        Reading::from_series(&self.series(bars, params)?, lookback, self.name())
    }

    /// Value on the latest bar
    pub fn compute<T: OHLCV>(self, bars: &[T], params: &IndicatorParams) -> Result<IndicatorValue> {
        self.check_len(bars.len(), self.required_bars(params))?;
        match self {
            k if k.is_trailing() => Ok(IndicatorValue::Trailing(k.reading(bars, params)?)),
            IndicatorKind::KeltnerChannel => keltner(
                bars,
                params.keltner_basis,
                params.keltner_atr,
                params.keltner_multiplier,
            )?
            .latest()
            .map(IndicatorValue::Band)
            .ok_or(ScreenError::InsufficientData {
                indicator: self.name(),
                need: self.min_bars(params),
                got: bars.len(),
            }),
            IndicatorKind::ImpulseSystem => {
                let trend = IndicatorKind::Ema.reading(bars, params)?;
                let momentum = IndicatorKind::MacdHistogram.reading(bars, params)?;
                Ok(IndicatorValue::Impulse(ImpulseColor::from_slopes(
                    trend.slope(),
                    momentum.slope(),
                )))
            }
            k => {
                let series = k.series(bars, params)?;
                series
                    .last()
                    .copied()
                    .map(IndicatorValue::Scalar)
                    .ok_or(ScreenError::InsufficientData {
                        indicator: k.name(),
                        need: k.min_bars(params),
                        got: bars.len(),
                    })
            }
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// INDICATOR RESULT
// ============================================================

/// Latest values for a set of indicator kinds computed on one series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorResult {
    values: BTreeMap<IndicatorKind, IndicatorValue>,
}

impl IndicatorResult {
    /// Compute each distinct kind once. Fails on the first indicator that
    /// lacks data.
    pub fn compute<T: OHLCV>(
        bars: &[T],
        params: &IndicatorParams,
        kinds: impl IntoIterator<Item = IndicatorKind>,
    ) -> Result<Self> {
        let mut values = BTreeMap::new();
        for kind in kinds {
            if values.contains_key(&kind) {
                continue;
            }
            values.insert(kind, kind.compute(bars, params)?);
        }
        Ok(Self { values })
    }

    #[inline]
    pub fn get(&self, kind: IndicatorKind) -> Option<&IndicatorValue> {
        self.values.get(&kind)
    }

    pub fn current(&self, kind: IndicatorKind) -> Option<f64> {
        self.get(kind)?.current()
    }

    pub fn reading(&self, kind: IndicatorKind) -> Option<Reading> {
        self.get(kind)?.reading()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorKind, &IndicatorValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compute every catalog indicator on `bars`
pub fn compute<T: OHLCV>(bars: &[T], params: &IndicatorParams) -> Result<IndicatorResult> {
    IndicatorResult::compute(bars, params, IndicatorKind::ALL)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bar(f64);

    impl OHLCV for Bar {
        fn open(&self) -> f64 {
            self.0
        }
        fn high(&self) -> f64 {
            self.0 + 1.0
        }
        fn low(&self) -> f64 {
            self.0 - 1.0
        }
        fn close(&self) -> f64 {
            self.0
        }
        fn volume(&self) -> f64 {
            1000.0
        }
    }

    fn rising(n: usize) -> Vec<Bar> {
        (0..n).map(|i| Bar(100.0 + i as f64)).collect()
    }

    #[test]
    fn test_reading_slope() {
        let r = Reading {
            current: 11.0,
            previous: 10.0,
        };
        assert_eq!(r.slope(), Slope::Rising);
        assert!((r.change_pct().unwrap() - 10.0).abs() < 1e-12);

        let flat = Reading {
            current: 5.0,
            previous: 5.0,
        };
        assert_eq!(flat.slope(), Slope::Flat);
        assert!(flat.slope().is_falling());

        let zero = Reading {
            current: 1.0,
            previous: 0.0,
        };
        assert_eq!(zero.change_pct(), None);
    }

    #[test]
    fn test_names_round_trip() {
        for kind in IndicatorKind::ALL {
            assert_eq!(IndicatorKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(IndicatorKind::from_name("vwap"), None);
    }

    #[test]
    fn test_compute_all_on_uptrend() {
        let bars = rising(80);
        let result = compute(&bars, &IndicatorParams::default()).unwrap();
        assert_eq!(result.len(), IndicatorKind::ALL.len());
        assert_eq!(result.reading(IndicatorKind::Ema).unwrap().slope(), Slope::Rising);
        assert_eq!(result.current(IndicatorKind::Rsi), Some(100.0));
        assert!(result.current(IndicatorKind::ForceIndex).unwrap() > 0.0);
        assert!(result.get(IndicatorKind::KeltnerChannel).unwrap().band().is_some());
    }

    #[test]
    fn test_required_bars_boundary() {
        let params = IndicatorParams::default();
        for kind in IndicatorKind::ALL {
            let need = kind.required_bars(&params);
            assert!(kind.compute(&rising(need), &params).is_ok(), "{kind} at {need}");
            assert!(
                matches!(
                    kind.compute(&rising(need - 1), &params),
                    Err(ScreenError::InsufficientData { .. })
                ),
                "{kind} below {need}"
            );
        }
    }

    #[test]
    fn test_tail_pairs() {
        let pairs: Vec<_> = tail_pairs(&[1.0, 2.0, 3.0], &[10.0, 20.0]).collect();
        assert_eq!(pairs, vec![(2.0, 10.0), (3.0, 20.0)]);
    }
}
