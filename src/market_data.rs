//! Market data access
//!
//! [`MarketData`] is the only I/O seam of the engine. The screener asks it
//! for weekly and daily bars per symbol and never retries; a source that
//! cannot serve a symbol returns [`ScreenError::DataUnavailable`] and the
//! symbol is skipped.

use std::collections::HashMap;
use std::fmt;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{PriceBar, PriceSeries, Result, ScreenError, OHLCV};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Daily,
    Weekly,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
        })
    }
}

/// Source of price bars
pub trait MarketData {
    /// Bars for `symbol` covering roughly the last `lookback_days` calendar days
    fn get_bars(&self, symbol: &str, interval: Interval, lookback_days: u32) -> Result<PriceSeries>;
}

impl<M: MarketData + ?Sized> MarketData for &M {
    fn get_bars(&self, symbol: &str, interval: Interval, lookback_days: u32) -> Result<PriceSeries> {
        (**self).get_bars(symbol, interval, lookback_days)
    }
}

// ============================================================
// IN-MEMORY SOURCE
// ============================================================

/// Pre-loaded series keyed by symbol and interval
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    series: HashMap<(String, Interval), PriceSeries>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, interval: Interval, series: PriceSeries) {
        self.series.insert((symbol.into(), interval), series);
    }

    pub fn with(mut self, symbol: impl Into<String>, interval: Interval, series: PriceSeries) -> Self {
        self.insert(symbol, interval, series);
        self
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.series.keys().map(|(s, _)| s.as_str()).collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

impl MarketData for InMemoryMarketData {
    fn get_bars(&self, symbol: &str, interval: Interval, lookback_days: u32) -> Result<PriceSeries> {
        let series = self
            .series
            .get(&(symbol.to_string(), interval))
            .ok_or_else(|| ScreenError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("no {interval} bars"),
            })?;
        let trimmed = series.trailing_days(lookback_days);
        if trimmed.is_empty() {
            return Err(ScreenError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: format!("empty {interval} series"),
            });
        }
        Ok(trimmed)
    }
}

// ============================================================
// WEEKLY RESAMPLING
// ============================================================

/// Aggregate daily bars into ISO-week bars. Each weekly bar is dated by the
/// last trading day of its week.
pub fn resample_weekly(daily: &PriceSeries) -> Result<PriceSeries> {
    let mut weeks: Vec<PriceBar> = Vec::new();
    let mut current_week = None;

    for bar in daily.bars() {
        let iso = bar.date().iso_week();
        let key = (iso.year(), iso.week());
        if current_week != Some(key) {
            weeks.push(*bar);
            current_week = Some(key);
            continue;
        }
        if let Some(last) = weeks.last_mut() {
            *last = PriceBar::new(
                bar.date(),
                last.open(),
                last.high().max(bar.high()),
                last.low().min(bar.low()),
                bar.close(),
                last.volume() + bar.volume(),
            );
        }
    }

    PriceSeries::new(weeks)
}

/// Serves weekly bars by resampling the daily bars of an inner source
#[derive(Debug, Clone)]
pub struct WeeklyFromDaily<S> {
    inner: S,
}

impl<S: MarketData> WeeklyFromDaily<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: MarketData> MarketData for WeeklyFromDaily<S> {
    fn get_bars(&self, symbol: &str, interval: Interval, lookback_days: u32) -> Result<PriceSeries> {
        match interval {
            Interval::Daily => self.inner.get_bars(symbol, Interval::Daily, lookback_days),
            Interval::Weekly => {
                let daily = self.inner.get_bars(symbol, Interval::Daily, lookback_days)?;
                let weekly = resample_weekly(&daily)?;
                trace!(symbol, daily = daily.len(), weekly = weekly.len(), "resampled weekly bars");
                Ok(weekly)
            }
        }
    }
}
