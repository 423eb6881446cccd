//! # triple-screen
//!
//! Indicator and signal-scoring engine for the Triple Screen methodology.
//!
//! Weekly bars feed the trend filter (screen 1), daily bars feed the
//! oscillator and entry-timing filters (screens 2 and 3), and recent candle
//! geometry is classified into named reversal patterns. Every symbol ends up
//! with an explainable 0-10 signal strength, a grade and a score breakdown.
//!
//! ## Quick Start
//!
//! ```rust
//! use triple_screen::prelude::*;
//!
//! let screener = ScreenerBuilder::new().build().unwrap();
//!
//! // Any `MarketData` implementation works; this one is pre-loaded in memory.
//! let source = InMemoryMarketData::new();
//! let report = screener.scan_symbols(&source, &["AAPL", "MSFT"], ScanFilter::default());
//!
//! // Unknown symbols are omitted from the results, never zero-filled.
//! assert_eq!(report.attempted, 2);
//! assert!(report.results.is_empty());
//! ```

pub mod config;
pub mod detectors;
pub mod indicators;
pub mod market_data;
pub mod params;
pub mod scan;
pub mod scorer;

pub mod prelude {
    pub use crate::{
        // Configuration
        config::{Category, IndicatorConfiguration, ScoringConfig, ScreenConfig},
        // Patterns
        detectors::{
            PatternDetector, PatternEngine, PatternEngineBuilder, PatternId, PatternMatch,
            Reliability,
        },
        // Indicators
        indicators::{
            ChannelZone, Divergence, ImpulseColor, IndicatorKind, IndicatorResult, IndicatorValue,
            KeltnerReading, Reading, Slope,
        },
        // Market data
        market_data::{resample_weekly, InMemoryMarketData, Interval, MarketData, WeeklyFromDaily},
        params::IndicatorParams,
        // Scanning
        scan::{FilterStatus, GradeSummary, ScanFailure, ScanFilter, ScanReport},
        scan_symbol,
        scan_symbols,
        // Scoring
        scorer::{
            DailyInputs, Grade, ScoreBreakdownEntry, ScoreRule, Scorecard, TripleScreenScorer,
            WeeklyInputs,
        },
        DailySnapshot,
        OHLCVExt,
        Period,
        PriceBar,
        PriceSeries,
        Ratio,
        ScreenError,
        ScreenResult,
        Screener,
        ScreenerBuilder,
        OHLCV,
    };
}

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use config::ScreenConfig;
use detectors::{PatternEngine, PatternMatch};
use indicators::{
    detect_divergence, ImpulseColor, IndicatorKind, IndicatorResult, IndicatorValue,
    KeltnerReading,
};
use market_data::{Interval, MarketData};
use scan::{ScanFailure, ScanFilter, ScanReport};
use scorer::{DailyInputs, Grade, ScoreBreakdownEntry, TripleScreenScorer, WeeklyInputs};

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScreenError>;

/// Errors raised by indicator math, configuration loading and scanning
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScreenError {
    #[error("Insufficient data for {indicator}: need {need} bars, got {got}")]
    InsufficientData {
        indicator: &'static str,
        need: usize,
        got: usize,
    },

    #[error("Unknown indicator '{name}' for category '{category}'")]
    UnknownIndicator { category: String, name: String },

    #[error("Unknown indicator category '{0}'")]
    UnknownCategory(String),

    #[error("Market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLCV at index {index}: {reason}")]
    InvalidOHLCV { index: usize, reason: &'static str },
}

impl ScreenError {
    /// Per-symbol conditions that skip one symbol without failing a batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScreenError::InsufficientData { .. }
                | ScreenError::DataUnavailable { .. }
                | ScreenError::InvalidOHLCV { .. }
        )
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(ScreenError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScreenError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Lookback period (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScreenError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLCV TRAITS
// ============================================================

/// Core OHLCV data trait
pub trait OHLCV {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
}

/// Extension trait with computed candle geometry
pub trait OHLCVExt: OHLCV {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.body_top()
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.body_bottom() - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as ratio of range. Returns None if range is ~0
    #[inline]
    fn body_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.body() / range)
    }

    #[inline]
    fn upper_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.upper_shadow() / range)
    }

    #[inline]
    fn lower_shadow_ratio(&self) -> Option<f64> {
        let range = self.range();
        (range > f64::EPSILON).then(|| self.lower_shadow() / range)
    }

    /// Validate OHLCV data consistency
    fn validate(&self) -> Result<()> {
        let prices = [self.open(), self.high(), self.low(), self.close()];
        if prices.iter().any(|p| p.is_nan()) {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "NaN in OHLCV",
            });
        }
        if prices.iter().any(|p| p.is_infinite()) {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "Infinite value in OHLCV",
            });
        }
        if prices.iter().any(|p| *p <= 0.0) {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "non-positive price",
            });
        }
        if !self.volume().is_finite() || self.volume() < 0.0 {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "volume must be finite and >= 0",
            });
        }
        if self.high() < self.low() {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "high < low",
            });
        }
        if self.body_bottom() < self.low() || self.body_top() > self.high() {
            return Err(ScreenError::InvalidOHLCV {
                index: 0,
                reason: "open/close outside high-low range",
            });
        }
        Ok(())
    }
}

impl<T: OHLCV> OHLCVExt for T {}

// ============================================================
// PRICE DATA
// ============================================================

/// One daily or weekly bar
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PriceBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl OHLCV for PriceBar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Ordered bars with strictly increasing dates. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<PriceBar>", into = "Vec<PriceBar>")]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Validate every bar and the date ordering.
    pub fn new(bars: Vec<PriceBar>) -> Result<Self> {
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|e| match e {
                ScreenError::InvalidOHLCV { reason, .. } => {
                    ScreenError::InvalidOHLCV { index: i, reason }
                }
                other => other,
            })?;
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(ScreenError::InvalidOHLCV {
                    index: i,
                    reason: "dates must be strictly increasing",
                });
            }
        }
        Ok(Self { bars })
    }

    #[inline]
    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    #[inline]
    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bars dated within `days` calendar days of the last bar (inclusive).
    pub fn trailing_days(&self, days: u32) -> PriceSeries {
        let Some(last) = self.bars.last() else {
            return self.clone();
        };
        let cutoff = last.date - chrono::Days::new(u64::from(days));
        let start = self.bars.partition_point(|b| b.date < cutoff);
        PriceSeries {
            bars: self.bars[start..].to_vec(),
        }
    }
}

impl TryFrom<Vec<PriceBar>> for PriceSeries {
    type Error = ScreenError;

    fn try_from(bars: Vec<PriceBar>) -> Result<Self> {
        PriceSeries::new(bars)
    }
}

impl From<PriceSeries> for Vec<PriceBar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

impl std::ops::Deref for PriceSeries {
    type Target = [PriceBar];

    fn deref(&self) -> &[PriceBar] {
        &self.bars
    }
}

// ============================================================
// SCREEN RESULT
// ============================================================

/// Daily values that fed screens 2 and 3
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DailySnapshot {
    pub close: f64,
    pub trend: f64,
    pub oscillator: f64,
    pub volume: f64,
    pub volatility: IndicatorValue,
    pub keltner: KeltnerReading,
    pub rsi: f64,
}

/// Combined weekly + daily verdict for one symbol
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ScreenResult {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub weekly_bullish: bool,
    pub screen1_score: i32,
    pub screen2_score: i32,
    pub impulse_color: ImpulseColor,
    pub daily_impulse: ImpulseColor,
    pub patterns: Vec<PatternMatch>,
    pub bullish_divergence: bool,
    pub bearish_divergence: bool,
    /// Sum of `score_breakdown` before clamping
    pub raw_score: i32,
    /// `raw_score` clamped to 0..=10
    pub signal_strength: u8,
    pub grade: Grade,
    pub score_breakdown: Vec<ScoreBreakdownEntry>,
    pub weekly: WeeklyInputs,
    pub daily: DailySnapshot,
}

impl ScreenResult {
    #[inline]
    pub fn is_a_trade(&self) -> bool {
        self.grade == Grade::A
    }
}

// ============================================================
// SCREENER
// ============================================================

/// Scoring engine for one configuration. Holds no per-scan state.
#[derive(Debug, Clone)]
pub struct Screener {
    config: ScreenConfig,
    patterns: PatternEngine,
    scorer: TripleScreenScorer,
}

impl Screener {
    pub fn new(config: ScreenConfig) -> Result<Self> {
        ScreenerBuilder::new().config(config).build()
    }

    #[inline]
    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    #[inline]
    pub fn patterns(&self) -> &PatternEngine {
        &self.patterns
    }

    /// Indicators computed on daily bars: every configured category plus the
    /// Keltner channel and RSI used by the scan filters.
    fn daily_kinds(&self) -> Vec<IndicatorKind> {
        let mut kinds: Vec<IndicatorKind> = self.config.indicators.kinds().collect();
        kinds.push(IndicatorKind::KeltnerChannel);
        kinds.push(IndicatorKind::Rsi);
        kinds
    }

    /// Score one symbol from already-fetched bars. Performs no I/O.
    pub fn screen(
        &self,
        symbol: &str,
        weekly: &PriceSeries,
        daily: &PriceSeries,
    ) -> Result<ScreenResult> {
        let indicators = &self.config.indicators;
        let weekly_params = &self.config.weekly;
        let daily_params = &self.config.daily;

        // Screen 1: weekly trend filter
        let weekly_inputs = WeeklyInputs {
            trend: indicators.trend().reading(weekly.bars(), weekly_params)?,
            momentum: indicators.momentum().reading(weekly.bars(), weekly_params)?,
        };

        // Screens 2 and 3: daily oscillators and entry timing
        let values = IndicatorResult::compute(daily.bars(), daily_params, self.daily_kinds())?;
        let last = daily.last().ok_or(ScreenError::InsufficientData {
            indicator: "daily",
            need: 1,
            got: 0,
        })?;

        let snapshot = DailySnapshot {
            close: last.close(),
            trend: current_value(&values, indicators.trend())?,
            oscillator: current_value(&values, indicators.oscillator())?,
            volume: current_value(&values, indicators.volume())?,
            volatility: *require(&values, indicators.volatility())?,
            keltner: require(&values, IndicatorKind::KeltnerChannel)?
                .band()
                .ok_or(ScreenError::InvalidValue("keltner channel missing band"))?,
            rsi: current_value(&values, IndicatorKind::Rsi)?,
        };
        let daily_impulse = require(&values, indicators.impulse())?
            .impulse()
            .ok_or(ScreenError::InvalidValue("impulse indicator missing color"))?;

        // Divergence compares price lows against momentum, not the oscillator
        let momentum_series = indicators.momentum().series(daily.bars(), daily_params)?;
        let divergence = detect_divergence(
            daily.bars(),
            &momentum_series,
            daily_params.divergence_lookback.get(),
        );

        let patterns = self.patterns.detect(daily.bars());

        let card = self.scorer.score(
            &weekly_inputs,
            &DailyInputs {
                close: snapshot.close,
                trend: snapshot.trend,
                oscillator: snapshot.oscillator,
                volume: snapshot.volume,
                bullish_divergence: divergence.bullish,
            },
        );

        debug!(
            symbol,
            raw_score = card.raw_score,
            grade = %card.grade,
            impulse = %card.impulse,
            patterns = patterns.len(),
            "scored symbol"
        );

        Ok(ScreenResult {
            symbol: symbol.to_string(),
            as_of: last.date(),
            weekly_bullish: card.weekly_bullish,
            screen1_score: card.screen1_score,
            screen2_score: card.screen2_score,
            impulse_color: card.impulse,
            daily_impulse,
            patterns,
            bullish_divergence: divergence.bullish,
            bearish_divergence: divergence.bearish,
            raw_score: card.raw_score,
            signal_strength: card.signal_strength,
            grade: card.grade,
            score_breakdown: card.breakdown,
            weekly: weekly_inputs,
            daily: snapshot,
        })
    }

    /// Fetch weekly and daily bars for one symbol and score it.
    pub fn scan_symbol<M>(&self, source: &M, symbol: &str) -> Result<ScreenResult>
    where
        M: MarketData + ?Sized,
    {
        let weekly = source.get_bars(symbol, Interval::Weekly, self.config.weekly_lookback_days)?;
        let daily = source.get_bars(symbol, Interval::Daily, self.config.daily_lookback_days)?;
        self.screen(symbol, &weekly, &daily)
    }

    /// Scan many symbols in parallel. Failed symbols are omitted from the
    /// results and recorded in `ScanReport::failures`.
    pub fn scan_symbols<M, S>(&self, source: &M, symbols: &[S], filter: ScanFilter) -> ScanReport
    where
        M: MarketData + Sync + ?Sized,
        S: AsRef<str> + Sync,
    {
        self.scan_symbols_until(source, symbols, filter, &AtomicBool::new(false))
    }

    /// Like [`Screener::scan_symbols`], but stops issuing new symbols once
    /// `cancel` is set. Symbols never started are not counted as attempted.
    #[tracing::instrument(skip_all, fields(symbols = symbols.len()))]
    pub fn scan_symbols_until<M, S>(
        &self,
        source: &M,
        symbols: &[S],
        filter: ScanFilter,
        cancel: &AtomicBool,
    ) -> ScanReport
    where
        M: MarketData + Sync + ?Sized,
        S: AsRef<str> + Sync,
    {
        let outcomes: Vec<_> = symbols
            .par_iter()
            .map(|symbol| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let symbol = symbol.as_ref();
                Some(self.scan_symbol(source, symbol).map_err(|error| {
                    warn!(symbol, %error, "symbol skipped");
                    ScanFailure {
                        symbol: symbol.to_string(),
                        error,
                    }
                }))
            })
            .collect();

        let mut attempted = 0;
        let mut results = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes.into_iter().flatten() {
            attempted += 1;
            match outcome {
                Ok(r) => results.push(r),
                Err(f) => failures.push(f),
            }
        }

        let report = ScanReport::new(results, failures, attempted, filter);
        info!(
            attempted = report.attempted,
            scored = report.scored(),
            matched = report.matched().count(),
            "scan complete"
        );
        report
    }
}

fn require(values: &IndicatorResult, kind: IndicatorKind) -> Result<&IndicatorValue> {
    values.get(kind).ok_or(ScreenError::InsufficientData {
        indicator: kind.name(),
        need: 1,
        got: 0,
    })
}

fn current_value(values: &IndicatorResult, kind: IndicatorKind) -> Result<f64> {
    require(values, kind)?
        .current()
        .ok_or(ScreenError::InvalidValue("indicator has no numeric value"))
}

// ============================================================
// BUILDER
// ============================================================

/// Builder for [`Screener`] instances
#[derive(Debug, Clone, Default)]
pub struct ScreenerBuilder {
    config: ScreenConfig,
    patterns: Option<PatternEngine>,
}

impl ScreenerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole screen configuration
    pub fn config(mut self, config: ScreenConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom pattern engine instead of the full builtin catalog
    pub fn patterns(mut self, engine: PatternEngine) -> Self {
        self.patterns = Some(engine);
        self
    }

    /// Override the +2 weekly trend threshold (percent change per slope lookback)
    pub fn trend_strength_pct(mut self, pct: f64) -> Self {
        self.config.scoring.trend_strength_pct = pct;
        self
    }

    /// Set calendar-day lookbacks requested from the market data source
    pub fn lookback_days(mut self, weekly: u32, daily: u32) -> Self {
        self.config.weekly_lookback_days = weekly;
        self.config.daily_lookback_days = daily;
        self
    }

    /// Validate the configuration and build the screener
    pub fn build(self) -> Result<Screener> {
        self.config.validate()?;
        let patterns = match self.patterns {
            Some(engine) => engine,
            None => PatternEngine::builder().with_all_defaults().build()?,
        };
        let scorer = TripleScreenScorer::new(
            self.config.indicators.clone(),
            self.config.scoring.clone(),
        );
        Ok(Screener {
            config: self.config,
            patterns,
            scorer,
        })
    }
}

// ============================================================
// ONE-SHOT SCANS
// ============================================================

/// Scan symbols with an explicit configuration for this call only.
pub fn scan_symbols<M, S>(
    source: &M,
    symbols: &[S],
    config: &ScreenConfig,
    filter: ScanFilter,
) -> Result<ScanReport>
where
    M: MarketData + Sync + ?Sized,
    S: AsRef<str> + Sync,
{
    let screener = Screener::new(config.clone())?;
    Ok(screener.scan_symbols(source, symbols, filter))
}

/// Single-symbol variant of [`scan_symbols`].
pub fn scan_symbol<M>(source: &M, symbol: &str, config: &ScreenConfig) -> Result<ScreenResult>
where
    M: MarketData + ?Sized,
{
    Screener::new(config.clone())?.scan_symbol(source, symbol)
}

// ============================================================
// TESTS
// ============================================================
