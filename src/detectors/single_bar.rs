//! Single-bar candlestick pattern detectors
//!
//! Hammer, Shooting Star, White Marubozu, Black Marubozu

use std::collections::HashMap;

use super::helpers::{self, is_marubozu};
use super::{matched, PatternDetector, PatternId, PatternMatch};
use crate::params::{get_multiplier, get_ratio, ParamMeta, ParameterizedDetector};
use crate::{OHLCVExt, Ratio, Result, ScreenError, OHLCV};

impl_with_defaults!(
    HammerDetector,
    ShootingStarDetector,
    WhiteMarubozuDetector,
    BlackMarubozuDetector,
);

// ============================================================
// HAMMER / SHOOTING STAR
// ============================================================

/// Small body in the upper third, lower shadow at least twice the body
#[derive(Debug, Clone)]
pub struct HammerDetector {
    pub max_body_ratio: Ratio,
    pub shadow_factor: f64,
}

impl Default for HammerDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(1.0 / 3.0),
            shadow_factor: 2.0,
        }
    }
}

impl PatternDetector for HammerDetector {
    fn id(&self) -> PatternId {
        PatternId::HAMMER
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let range = bar.range();
        if range <= f64::EPSILON {
            return None;
        }
        let body = bar.body();

        if body > range * self.max_body_ratio.get() {
            return None;
        }
        if bar.lower_shadow() < body * self.shadow_factor {
            return None;
        }
        if bar.upper_shadow() > body {
            return None;
        }

        Some(matched(PatternDetector::id(self), index, 1, true, 3))
    }

    fn validate_config(&self) -> Result<()> {
        validate_shadow_factor(self.shadow_factor)
    }
}

/// Mirror of the hammer: long upper shadow, short lower shadow
#[derive(Debug, Clone)]
pub struct ShootingStarDetector {
    pub max_body_ratio: Ratio,
    pub shadow_factor: f64,
}

impl Default for ShootingStarDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(1.0 / 3.0),
            shadow_factor: 2.0,
        }
    }
}

impl PatternDetector for ShootingStarDetector {
    fn id(&self) -> PatternId {
        PatternId::SHOOTING_STAR
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        let range = bar.range();
        if range <= f64::EPSILON {
            return None;
        }
        let body = bar.body();

        if body > range * self.max_body_ratio.get() {
            return None;
        }
        if bar.upper_shadow() < body * self.shadow_factor {
            return None;
        }
        if bar.lower_shadow() > body {
            return None;
        }

        Some(matched(PatternDetector::id(self), index, 1, false, 3))
    }

    fn validate_config(&self) -> Result<()> {
        validate_shadow_factor(self.shadow_factor)
    }
}

fn validate_shadow_factor(factor: f64) -> Result<()> {
    if !factor.is_finite() || factor < 1.0 {
        return Err(ScreenError::OutOfRange {
            field: "shadow_factor",
            value: factor,
            min: 1.0,
            max: f64::MAX,
        });
    }
    Ok(())
}

// ============================================================
// MARUBOZU
// ============================================================

#[derive(Debug, Clone)]
pub struct WhiteMarubozuDetector {
    pub shadow_max_ratio: Ratio,
}

impl Default for WhiteMarubozuDetector {
    fn default() -> Self {
        Self {
            shadow_max_ratio: Ratio::new_const(helpers::MARUBOZU_SHADOW_RATIO),
        }
    }
}

impl PatternDetector for WhiteMarubozuDetector {
    fn id(&self) -> PatternId {
        PatternId::WHITE_MARUBOZU
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        if !bar.is_bullish() || !is_marubozu(bar, self.shadow_max_ratio.get())? {
            return None;
        }
        Some(matched(PatternDetector::id(self), index, 1, true, 2))
    }
}

#[derive(Debug, Clone)]
pub struct BlackMarubozuDetector {
    pub shadow_max_ratio: Ratio,
}

impl Default for BlackMarubozuDetector {
    fn default() -> Self {
        Self {
            shadow_max_ratio: Ratio::new_const(helpers::MARUBOZU_SHADOW_RATIO),
        }
    }
}

impl PatternDetector for BlackMarubozuDetector {
    fn id(&self) -> PatternId {
        PatternId::BLACK_MARUBOZU
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
        let bar = bars.get(index)?;
        if !bar.is_bearish() || !is_marubozu(bar, self.shadow_max_ratio.get())? {
            return None;
        }
        Some(matched(PatternDetector::id(self), index, 1, false, 2))
    }
}

// ============================================================
// PARAMETERS
// ============================================================

static HAMMER_PARAMS: &[ParamMeta] = &[
    ParamMeta::ratio("max_body_ratio", 1.0 / 3.0, (0.2, 0.4, 0.05), "Largest body as share of range"),
    ParamMeta::multiplier("shadow_factor", 2.0, (1.5, 3.0, 0.5), "Long shadow as multiple of body"),
];

impl ParameterizedDetector for HammerDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HAMMER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let d = Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", 1.0 / 3.0)?,
            shadow_factor: get_multiplier(params, "shadow_factor", 2.0)?,
        };
        d.validate_config()?;
        Ok(d)
    }

    fn pattern_id_str() -> &'static str {
        PatternId::HAMMER.0
    }
}

impl ParameterizedDetector for ShootingStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        HAMMER_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        let d = Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", 1.0 / 3.0)?,
            shadow_factor: get_multiplier(params, "shadow_factor", 2.0)?,
        };
        d.validate_config()?;
        Ok(d)
    }

    fn pattern_id_str() -> &'static str {
        PatternId::SHOOTING_STAR.0
    }
}
