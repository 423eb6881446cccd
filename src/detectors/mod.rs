//! Candlestick reversal pattern detectors
//!
//! Detectors classify the geometry of the last one to three bars into named
//! reversal patterns with a 1-5 reliability rating.
//!
//! # Pattern Categories
//!
//! - **Single-bar**: Hammer, Shooting Star, White/Black Marubozu
//! - **Two-bar**: Engulfing, Piercing, Dark Cloud Cover, Tweezers
//! - **Three-bar**: Morning/Evening Star, Three White Soldiers, Three Black Crows
//!
//! ```rust
//! use chrono::NaiveDate;
//! use triple_screen::detectors::{PatternEngine, PatternId};
//! use triple_screen::PriceBar;
//!
//! let d = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let bars = [
//!     PriceBar::new(d, 100.0, 101.0, 89.0, 90.0, 1e6),
//!     PriceBar::new(d.succ_opt().unwrap(), 89.0, 103.0, 88.0, 102.0, 1e6),
//! ];
//!
//! let matches = PatternEngine::default().detect(&bars);
//! assert!(matches.iter().any(|m| m.pattern_id == PatternId::BULLISH_ENGULFING));
//! ```

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;

use std::fmt;

use serde::Serialize;

use crate::{Result, ScreenError, OHLCV};

// ============================================================
// PATTERN TYPES
// ============================================================

/// Pattern identifier (display name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PatternId(pub &'static str);

impl PatternId {
    pub const HAMMER: PatternId = PatternId("Hammer");
    pub const SHOOTING_STAR: PatternId = PatternId("Shooting Star");
    pub const WHITE_MARUBOZU: PatternId = PatternId("White Marubozu");
    pub const BLACK_MARUBOZU: PatternId = PatternId("Black Marubozu");
    pub const BULLISH_ENGULFING: PatternId = PatternId("Bullish Engulfing");
    pub const BEARISH_ENGULFING: PatternId = PatternId("Bearish Engulfing");
    pub const PIERCING: PatternId = PatternId("Piercing");
    pub const DARK_CLOUD_COVER: PatternId = PatternId("Dark Cloud Cover");
    pub const TWEEZER_BOTTOM: PatternId = PatternId("Tweezer Bottom");
    pub const TWEEZER_TOP: PatternId = PatternId("Tweezer Top");
    pub const MORNING_STAR: PatternId = PatternId("Morning Star");
    pub const EVENING_STAR: PatternId = PatternId("Evening Star");
    pub const THREE_WHITE_SOLDIERS: PatternId = PatternId("Three White Soldiers");
    pub const THREE_BLACK_CROWS: PatternId = PatternId("Three Black Crows");

    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Case-insensitive name comparison, used by pattern selection filters
    pub fn matches_name(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name.trim())
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Pattern reliability rating, 1 (weak) ..= 5 (strong)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Reliability(u8);

impl Reliability {
    pub fn new(value: u8) -> Result<Self> {
        if !(1..=5).contains(&value) {
            return Err(ScreenError::OutOfRange {
                field: "Reliability",
                value: f64::from(value),
                min: 1.0,
                max: 5.0,
            });
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: u8) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Result of pattern detection - Copy, no allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternMatch {
    pub pattern_id: PatternId,
    /// Index of the bar that completes the pattern
    pub bar_index: usize,
    /// Index of the first bar of the pattern
    pub start_index: usize,
    pub bullish: bool,
    pub reliability: Reliability,
}

impl PatternMatch {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.pattern_id.as_str()
    }
}

// ============================================================
// PATTERN DETECTOR TRAIT
// ============================================================

pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;

    /// Bars that must exist up to and including `index`
    fn min_bars(&self) -> usize;

    /// Pattern completed by the bar at `index`, if any
    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }
}

/// Build a match ending at `index` spanning `span` bars
#[inline]
pub(crate) fn matched(
    id: PatternId,
    index: usize,
    span: usize,
    bullish: bool,
    reliability: u8,
) -> PatternMatch {
    PatternMatch {
        pattern_id: id,
        bar_index: index,
        start_index: index + 1 - span,
        bullish,
        reliability: Reliability::new_const(reliability),
    }
}

// ============================================================
// BUILTIN DETECTORS
// ============================================================

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, bars, index)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }

        $(impl From<$detector> for BuiltinDetector {
            fn from(d: $detector) -> Self {
                Self::$variant(d)
            }
        })*
    };
}

define_builtin_detectors! {
    // Single bar
    Hammer(HammerDetector),
    ShootingStar(ShootingStarDetector),
    WhiteMarubozu(WhiteMarubozuDetector),
    BlackMarubozu(BlackMarubozuDetector),

    // Two bar
    BullishEngulfing(BullishEngulfingDetector),
    BearishEngulfing(BearishEngulfingDetector),
    Piercing(PiercingDetector),
    DarkCloudCover(DarkCloudCoverDetector),
    TweezerBottom(TweezerBottomDetector),
    TweezerTop(TweezerTopDetector),

    // Three bar
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
    ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
    ThreeBlackCrows(ThreeBlackCrowsDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Runs a set of detectors over a bar series. Stateless between calls.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    detectors: Vec<BuiltinDetector>,
    pattern_filter: Option<Vec<PatternId>>,
}

impl Default for PatternEngine {
    /// Every builtin detector with default thresholds
    fn default() -> Self {
        PatternEngineBuilder::new().with_all_defaults().into_engine()
    }
}

impl PatternEngine {
    pub fn builder() -> PatternEngineBuilder {
        PatternEngineBuilder::new()
    }

    /// Pattern ids this engine can report
    pub fn catalog(&self) -> Vec<PatternId> {
        self.active().map(|d| d.id()).collect()
    }

    fn active(&self) -> impl Iterator<Item = &BuiltinDetector> {
        self.detectors.iter().filter(|d| match &self.pattern_filter {
            Some(ids) => ids.contains(&d.id()),
            None => true,
        })
    }

    /// Patterns completed by the bar at `index`. Detectors whose window does
    /// not fit before `index` are skipped.
    pub fn detect_at<T: OHLCV>(&self, bars: &[T], index: usize) -> Vec<PatternMatch> {
        if index >= bars.len() {
            return Vec::new();
        }
        self.active()
            .filter(|d| index + 1 >= d.min_bars())
            .filter_map(|d| d.detect(bars, index))
            .collect()
    }

    /// Patterns completed by the most recent bar
    pub fn detect<T: OHLCV>(&self, bars: &[T]) -> Vec<PatternMatch> {
        match bars.len() {
            0 => Vec::new(),
            n => self.detect_at(bars, n - 1),
        }
    }

    /// Patterns completed by any of the last `window` bars, oldest first
    pub fn scan_window<T: OHLCV>(&self, bars: &[T], window: usize) -> Vec<PatternMatch> {
        let start = bars.len().saturating_sub(window);
        (start..bars.len())
            .flat_map(|i| self.detect_at(bars, i))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        for d in &self.detectors {
            d.validate_config()?;
        }
        Ok(())
    }
}

/// Patterns completed by the most recent bar, using every builtin detector
pub fn detect<T: OHLCV>(bars: &[T]) -> Vec<PatternMatch> {
    PatternEngine::default().detect(bars)
}

// ============================================================
// BUILDER
// ============================================================

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

/// Builder for creating PatternEngine instances
#[derive(Debug, Clone, Default)]
pub struct PatternEngineBuilder {
    detectors: Vec<BuiltinDetector>,
    pattern_filter: Option<Vec<PatternId>>,
}

impl PatternEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add all builtin patterns with default configurations
    pub fn with_all_defaults(self) -> Self {
        self.with_bullish_defaults().with_bearish_defaults()
    }

    pub fn with_bullish_defaults(mut self) -> Self {
        self.detectors.extend(builtin_defaults![
            Hammer,
            WhiteMarubozu,
            BullishEngulfing,
            Piercing,
            TweezerBottom,
            MorningStar,
            ThreeWhiteSoldiers,
        ]);
        self
    }

    pub fn with_bearish_defaults(mut self) -> Self {
        self.detectors.extend(builtin_defaults![
            ShootingStar,
            BlackMarubozu,
            BearishEngulfing,
            DarkCloudCover,
            TweezerTop,
            EveningStar,
            ThreeBlackCrows,
        ]);
        self
    }

    /// Add a detector (replaces an existing detector with the same id)
    pub fn add(mut self, detector: impl Into<BuiltinDetector>) -> Self {
        let detector = detector.into();
        self.detectors.retain(|d| d.id() != detector.id());
        self.detectors.push(detector);
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    fn into_engine(self) -> PatternEngine {
        PatternEngine {
            detectors: self.detectors,
            pattern_filter: self.pattern_filter,
        }
    }

    /// Build the engine, validating every detector's thresholds
    pub fn build(self) -> Result<PatternEngine> {
        let engine = self.into_engine();
        engine.validate()?;
        Ok(engine)
    }
}

