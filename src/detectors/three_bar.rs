//! Three-bar candlestick pattern detectors
//!
//! Morning Star, Evening Star, Three White Soldiers, Three Black Crows

use std::collections::HashMap;

use super::helpers::{self, is_body_long_f};
use super::{matched, PatternDetector, PatternId, PatternMatch};
use crate::params::{get_multiplier, get_ratio, ParamMeta, ParameterizedDetector};
use crate::{OHLCVExt, Ratio, Result, OHLCV};

impl_with_defaults!(
  MorningStarDetector,
  EveningStarDetector,
  ThreeWhiteSoldiersDetector,
  ThreeBlackCrowsDetector,
);

#[inline]
fn triple<T>(bars: &[T], index: usize) -> Option<(&T, &T, &T)> {
  if index < 2 {
    return None;
  }
  Some((bars.get(index - 2)?, bars.get(index - 1)?, bars.get(index)?))
}

/// Long body relative to the bodies before `at`
#[inline]
fn first_body_long<T: OHLCV>(bars: &[T], at: usize, factor: f64) -> bool {
  let bar = &bars[at];
  let avg = helpers::trailing_avg_body(bars, at, helpers::CANDLE_PERIOD).unwrap_or(0.0);
  is_body_long_f(bar.body(), avg, bar.range(), factor)
}

// ============================================================
// MORNING / EVENING STAR
// ============================================================

/// Long bearish bar, small-bodied star at or below its close, then a bullish
/// bar closing above the first body's midpoint
#[derive(Debug, Clone)]
pub struct MorningStarDetector {
  pub body_long_factor: f64,
  /// Star body as a share of the first body
  pub star_body_ratio: Ratio,
  pub penetration: Ratio,
}

impl Default for MorningStarDetector {
  fn default() -> Self {
    Self {
      body_long_factor: helpers::BODY_LONG_FACTOR,
      star_body_ratio: Ratio::new_const(0.3),
      penetration: Ratio::new_const(0.5),
    }
  }
}

impl PatternDetector for MorningStarDetector {
  fn id(&self) -> PatternId {
    PatternId::MORNING_STAR
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
    let (first, star, third) = triple(bars, index)?;

    if !first.is_bearish() || !first_body_long(bars, index - 2, self.body_long_factor) {
      return None;
    }
    if star.body() > first.body() * self.star_body_ratio.get() {
      return None;
    }
    if star.body_top() > first.close() {
      return None;
    }
    if !third.is_bullish() {
      return None;
    }
    if third.close() <= first.close() + first.body() * self.penetration.get() {
      return None;
    }

    Some(matched(PatternDetector::id(self), index, 3, true, 5))
  }
}

/// Long bullish bar, small-bodied star at or above its close, then a bearish
/// bar closing below the first body's midpoint
#[derive(Debug, Clone)]
pub struct EveningStarDetector {
  pub body_long_factor: f64,
  pub star_body_ratio: Ratio,
  pub penetration: Ratio,
}

impl Default for EveningStarDetector {
  fn default() -> Self {
    Self {
      body_long_factor: helpers::BODY_LONG_FACTOR,
      star_body_ratio: Ratio::new_const(0.3),
      penetration: Ratio::new_const(0.5),
    }
  }
}

impl PatternDetector for EveningStarDetector {
  fn id(&self) -> PatternId {
    PatternId::EVENING_STAR
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
    let (first, star, third) = triple(bars, index)?;

    if !first.is_bullish() || !first_body_long(bars, index - 2, self.body_long_factor) {
      return None;
    }
    if star.body() > first.body() * self.star_body_ratio.get() {
      return None;
    }
    if star.body_bottom() < first.close() {
      return None;
    }
    if !third.is_bearish() {
      return None;
    }
    if third.close() >= first.close() - first.body() * self.penetration.get() {
      return None;
    }

    Some(matched(PatternDetector::id(self), index, 3, false, 5))
  }
}

// ============================================================
// THREE SOLDIERS / CROWS
// ============================================================

/// Three bullish bars with rising closes, each opening inside the prior body
#[derive(Debug, Clone)]
pub struct ThreeWhiteSoldiersDetector {
  pub min_body_ratio: Ratio,
  pub max_shadow_ratio: Ratio,
}

impl Default for ThreeWhiteSoldiersDetector {
  fn default() -> Self {
    Self { min_body_ratio: Ratio::new_const(0.5), max_shadow_ratio: Ratio::new_const(0.3) }
  }
}

impl PatternDetector for ThreeWhiteSoldiersDetector {
  fn id(&self) -> PatternId {
    PatternId::THREE_WHITE_SOLDIERS
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
    let (a, b, c) = triple(bars, index)?;
    let candles = [a, b, c];

    for bar in candles {
      if !bar.is_bullish() {
        return None;
      }
      if bar.body_ratio()? < self.min_body_ratio.get() {
        return None;
      }
      if bar.upper_shadow_ratio()? > self.max_shadow_ratio.get() {
        return None;
      }
    }
    for w in candles.windows(2) {
      let (prev, curr) = (w[0], w[1]);
      if curr.close() <= prev.close() {
        return None;
      }
      if curr.open() <= prev.open() || curr.open() > prev.close() {
        return None;
      }
    }

    Some(matched(PatternDetector::id(self), index, 3, true, 5))
  }
}

/// Three bearish bars with falling closes, each opening inside the prior body
#[derive(Debug, Clone)]
pub struct ThreeBlackCrowsDetector {
  pub min_body_ratio: Ratio,
  pub max_shadow_ratio: Ratio,
}

impl Default for ThreeBlackCrowsDetector {
  fn default() -> Self {
    Self { min_body_ratio: Ratio::new_const(0.5), max_shadow_ratio: Ratio::new_const(0.3) }
  }
}

impl PatternDetector for ThreeBlackCrowsDetector {
  fn id(&self) -> PatternId {
    PatternId::THREE_BLACK_CROWS
  }

  fn min_bars(&self) -> usize {
    3
  }

  fn detect<T: OHLCV>(&self, bars: &[T], index: usize) -> Option<PatternMatch> {
    let (a, b, c) = triple(bars, index)?;
    let candles = [a, b, c];

    for bar in candles {
      if !bar.is_bearish() {
        return None;
      }
      if bar.body_ratio()? < self.min_body_ratio.get() {
        return None;
      }
      if bar.lower_shadow_ratio()? > self.max_shadow_ratio.get() {
        return None;
      }
    }
    for w in candles.windows(2) {
      let (prev, curr) = (w[0], w[1]);
      if curr.close() >= prev.close() {
        return None;
      }
      if curr.open() >= prev.open() || curr.open() < prev.close() {
        return None;
      }
    }

    Some(matched(PatternDetector::id(self), index, 3, false, 5))
  }
}

// ============================================================
// PARAMETERS
// ============================================================

static STAR_PARAMS: &[ParamMeta] = &[
  ParamMeta::multiplier("body_long_factor", 1.0, (0.8, 2.0, 0.2), "First body vs recent average"),
  ParamMeta::ratio("star_body_ratio", 0.3, (0.1, 0.5, 0.1), "Star body vs first body"),
  ParamMeta::ratio("penetration", 0.5, (0.3, 0.7, 0.1), "Third close into first body"),
];

fn star_from_params(params: &HashMap<&str, f64>) -> Result<(f64, Ratio, Ratio)> {
  Ok((
    get_multiplier(params, "body_long_factor", helpers::BODY_LONG_FACTOR)?,
    get_ratio(params, "star_body_ratio", 0.3)?,
    get_ratio(params, "penetration", 0.5)?,
  ))
}

impl ParameterizedDetector for MorningStarDetector {
  fn param_meta() -> &'static [ParamMeta] {
    STAR_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    let (body_long_factor, star_body_ratio, penetration) = star_from_params(params)?;
    Ok(Self { body_long_factor, star_body_ratio, penetration })
  }

  fn pattern_id_str() -> &'static str {
    PatternId::MORNING_STAR.0
  }
}

impl ParameterizedDetector for EveningStarDetector {
  fn param_meta() -> &'static [ParamMeta] {
    STAR_PARAMS
  }

  fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    let (body_long_factor, star_body_ratio, penetration) = star_from_params(params)?;
    Ok(Self { body_long_factor, star_body_ratio, penetration })
  }

  fn pattern_id_str() -> &'static str {
    PatternId::EVENING_STAR.0
  }
}
