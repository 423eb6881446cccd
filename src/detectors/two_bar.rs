//! Two-bar candlestick pattern detectors
//!
//! Bullish/Bearish Engulfing, Piercing, Dark Cloud Cover, Tweezer Bottom/Top

use std::collections::HashMap;

use super::helpers::{self, advanced_into, declined_into, nearly_equal};
use super::{matched, PatternDetector, PatternId, PatternMatch};
use crate::params::{get_period, get_ratio, ParamMeta, ParameterizedDetector};
use crate::{OHLCVExt, Period, Ratio, Result, OHLCV};

impl_with_defaults!(
    BullishEngulfingDetector,
    BearishEngulfingDetector,
    PiercingDetector,
    DarkCloudCoverDetector,
    TweezerBottomDetector,
    TweezerTopDetector,
);

/// Previous and current bar, if `index` has a predecessor
#[inline]
fn pair<T>(bars: &[T], index: usize) -> Option<(&T, &T)> {
    if index < 1 {
        return None;
    }
    Some((bars.get(index - 1)?, bars.get(index)?))
}

// ============================================================
// ENGULFING
// ============================================================

/// Bullish body wraps the previous bearish body
#[derive(Debug, Clone, Default)]
pub struct BullishEngulfingDetector;

impl PatternDetector for BullishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId::BULLISH_ENGULFING
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;
        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        if curr.open() > prev.close() || curr.close() < prev.open() {
            return None;
        }
        Some(matched(PatternDetector::id(self), index, 2, true, 4))
    }
}

/// Bearish body wraps the previous bullish body
#[derive(Debug, Clone, Default)]
pub struct BearishEngulfingDetector;

impl PatternDetector for BearishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId::BEARISH_ENGULFING
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;
        if !prev.is_bullish() || !curr.is_bearish() {
            return None;
        }
        if curr.open() < prev.close() || curr.close() > prev.open() {
            return None;
        }
        Some(matched(PatternDetector::id(self), index, 2, false, 4))
    }
}

// ============================================================
// PIERCING / DARK CLOUD COVER
// ============================================================

/// Opens below the prior low, closes past the prior body midpoint but not
/// above the prior open
#[derive(Debug, Clone)]
pub struct PiercingDetector {
    pub penetration: Ratio,
}

impl Default for PiercingDetector {
    fn default() -> Self {
        Self {
            penetration: Ratio::new_const(0.5),
        }
    }
}

impl PatternDetector for PiercingDetector {
    fn id(&self) -> PatternId {
        PatternId::PIERCING
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;
        if !prev.is_bearish() || !curr.is_bullish() {
            return None;
        }
        if curr.open() >= prev.low() {
            return None;
        }
        let threshold = prev.close() + prev.body() * self.penetration.get();
        if curr.close() <= threshold || curr.close() >= prev.open() {
            return None;
        }
        Some(matched(PatternDetector::id(self), index, 2, true, 3))
    }
}

/// Opens above the prior high, closes below the prior body midpoint but not
/// below the prior open
#[derive(Debug, Clone)]
pub struct DarkCloudCoverDetector {
    pub penetration: Ratio,
}

impl Default for DarkCloudCoverDetector {
    fn default() -> Self {
        Self {
            penetration: Ratio::new_const(0.5),
        }
    }
}

impl PatternDetector for DarkCloudCoverDetector {
    fn id(&self) -> PatternId {
        PatternId::DARK_CLOUD_COVER
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;
        if !prev.is_bullish() || !curr.is_bearish() {
            return None;
        }
        if curr.open() <= prev.high() {
            return None;
        }
        let threshold = prev.close() - prev.body() * self.penetration.get();
        if curr.close() >= threshold || curr.close() <= prev.open() {
            return None;
        }
        Some(matched(PatternDetector::id(self), index, 2, false, 3))
    }
}

// ============================================================
// TWEEZERS
// ============================================================

/// Matching lows after a decline. Reliability 3 when the first body is the
/// larger one, else 2.
#[derive(Debug, Clone)]
pub struct TweezerBottomDetector {
    pub tolerance: Ratio,
    pub trend_lookback: Period,
}

impl Default for TweezerBottomDetector {
    fn default() -> Self {
        Self {
            tolerance: Ratio::new_const(helpers::TWEEZER_TOLERANCE),
            trend_lookback: Period::new_const(helpers::TWEEZER_TREND_LOOKBACK),
        }
    }
}

impl PatternDetector for TweezerBottomDetector {
    fn id(&self) -> PatternId {
        PatternId::TWEEZER_BOTTOM
    }

    fn min_bars(&self) -> usize {
        self.trend_lookback.get() + 2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;
        if !declined_into(bars, index - 1, self.trend_lookback.get()) {
            return None;
        }
        if !nearly_equal(prev.low(), curr.low(), curr.low(), self.tolerance.get()) {
            return None;
        }
        let reliability = if prev.body() > curr.body() { 3 } else { 2 };
        Some(matched(PatternDetector::id(self), index, 2, true, reliability))
    }
}

/// Matching highs after an advance
#[derive(Debug, Clone)]
pub struct TweezerTopDetector {
    pub tolerance: Ratio,
    pub trend_lookback: Period,
}

impl Default for TweezerTopDetector {
    fn default() -> Self {
        Self {
            tolerance: Ratio::new_const(helpers::TWEEZER_TOLERANCE),
            trend_lookback: Period::new_const(helpers::TWEEZER_TREND_LOOKBACK),
        }
    }
}

impl PatternDetector for TweezerTopDetector {
    fn id(&self) -> PatternId {
        PatternId::TWEEZER_TOP
    }

    fn min_bars(&self) -> usize {
        self.trend_lookback.get() + 2
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let (prev, curr) = pair(bars, index)?;
        if !advanced_into(bars, index - 1, self.trend_lookback.get()) {
            return None;
        }
        if !nearly_equal(prev.high(), curr.high(), curr.high(), self.tolerance.get()) {
            return None;
        }
        let reliability = if prev.body() > curr.body() { 3 } else { 2 };
        Some(matched(PatternDetector::id(self), index, 2, false, reliability))
    }
}

// ============================================================
// PARAMETERS
// ============================================================

static PENETRATION_PARAMS: &[ParamMeta] = &[ParamMeta::ratio(
    "penetration",
    0.5,
    (0.3, 0.7, 0.1),
    "Share of the prior body the second close must cross",
)];

static TWEEZER_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio("tolerance", 0.001, (0.0005, 0.005, 0.0005), "Price match tolerance"),
    ParamMeta::period("trend_lookback", 5.0, (3.0, 10.0, 1.0), "Bars of prior trend"),
];

impl ParameterizedDetector for PiercingDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PENETRATION_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            penetration: get_ratio(params, "penetration", 0.5)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::PIERCING.0
    }
}

impl ParameterizedDetector for DarkCloudCoverDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PENETRATION_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            penetration: get_ratio(params, "penetration", 0.5)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::DARK_CLOUD_COVER.0
    }
}

impl ParameterizedDetector for TweezerBottomDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TWEEZER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            tolerance: get_ratio(params, "tolerance", helpers::TWEEZER_TOLERANCE)?,
            trend_lookback: get_period(params, "trend_lookback", helpers::TWEEZER_TREND_LOOKBACK)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::TWEEZER_BOTTOM.0
    }
}

impl ParameterizedDetector for TweezerTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        TWEEZER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            tolerance: get_ratio(params, "tolerance", helpers::TWEEZER_TOLERANCE)?,
            trend_lookback: get_period(params, "trend_lookback", helpers::TWEEZER_TREND_LOOKBACK)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::TWEEZER_TOP.0
    }
}
