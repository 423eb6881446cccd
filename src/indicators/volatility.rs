//! ATR and Keltner channel

use serde::{Deserialize, Serialize};

use super::moving_average::ema_of_closes;
use super::tail_pairs;
use crate::{Period, Result, ScreenError, OHLCV};

/// True range for every bar after the first
pub fn true_range<T: OHLCV>(bars: &[T]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| {
            let prev_close = w[0].close();
            let (h, l) = (w[1].high(), w[1].low());
            (h - l).max((h - prev_close).abs()).max((l - prev_close).abs())
        })
        .collect()
}

/// Wilder-smoothed average true range. Needs `period + 1` bars; output
/// length is `bars.len() - period`.
pub fn atr<T: OHLCV>(bars: &[T], period: Period) -> Result<Vec<f64>> {
    let p = period.get();
    if bars.len() < p + 1 {
        return Err(ScreenError::InsufficientData {
            indicator: "atr",
            need: p + 1,
            got: bars.len(),
        });
    }

    let tr = true_range(bars);
    let mut prev = tr[..p].iter().sum::<f64>() / p as f64;
    let mut out = Vec::with_capacity(tr.len() - p + 1);
    out.push(prev);
    for value in &tr[p..] {
        prev = (prev * (p - 1) as f64 + value) / p as f64;
        out.push(prev);
    }
    Ok(out)
}

/// Tail-aligned channel lines. All four vectors share one length.
#[derive(Debug, Clone, PartialEq)]
pub struct KeltnerChannel {
    pub middle: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub atr: Vec<f64>,
}

impl KeltnerChannel {
    pub fn latest(&self) -> Option<KeltnerReading> {
        Some(KeltnerReading {
            middle: *self.middle.last()?,
            upper: *self.upper.last()?,
            lower: *self.lower.last()?,
            atr: *self.atr.last()?,
        })
    }
}

pub fn keltner_min_len(basis: Period, atr_period: Period) -> usize {
    basis.get().max(atr_period.get() + 1)
}

/// EMA(close, basis) middle line with bands at `multiplier * ATR(atr_period)`.
pub fn keltner<T: OHLCV>(
    bars: &[T],
    basis: Period,
    atr_period: Period,
    multiplier: f64,
) -> Result<KeltnerChannel> {
    let need = keltner_min_len(basis, atr_period);
    if bars.len() < need {
        return Err(ScreenError::InsufficientData {
            indicator: "keltner_channel",
            need,
            got: bars.len(),
        });
    }

    let mid = ema_of_closes(bars, basis)?;
    let width = atr(bars, atr_period)?;

    let (middle, atr): (Vec<f64>, Vec<f64>) = tail_pairs(&mid, &width).unzip();
    let upper = middle.iter().zip(&atr).map(|(m, a)| m + multiplier * a).collect();
    let lower = middle.iter().zip(&atr).map(|(m, a)| m - multiplier * a).collect();
    Ok(KeltnerChannel {
        middle,
        upper,
        lower,
        atr,
    })
}

/// Channel values on the most recent bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeltnerReading {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
    pub atr: f64,
}

/// Where a price sits relative to the lower half of the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelZone {
    AboveMiddle,
    BelowMiddle,
    BelowLower,
    /// Below `lower - atr`
    BelowLowerAtr,
}

impl ChannelZone {
    /// Level number used by scan filters: 1, 0, -1, -2
    pub fn level(self) -> i32 {
        match self {
            ChannelZone::AboveMiddle => 1,
            ChannelZone::BelowMiddle => 0,
            ChannelZone::BelowLower => -1,
            ChannelZone::BelowLowerAtr => -2,
        }
    }
}

impl KeltnerReading {
    pub fn zone(&self, price: f64) -> ChannelZone {
        if price < self.lower - self.atr {
            ChannelZone::BelowLowerAtr
        } else if price < self.lower {
            ChannelZone::BelowLower
        } else if price < self.middle {
            ChannelZone::BelowMiddle
        } else {
            ChannelZone::AboveMiddle
        }
    }

    /// Price threshold for a filter level: 0 is the middle line, -1 the lower
    /// band, -2 one ATR below the lower band, any other level is
    /// `middle + level * atr`.
    pub fn threshold_for_level(&self, level: i32) -> f64 {
        match level {
            0 => self.middle,
            -1 => self.lower,
            -2 => self.lower - self.atr,
            other => self.middle + f64::from(other) * self.atr,
        }
    }
}
