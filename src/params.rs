//! Indicator parameters and parameter metadata
//!
//! [`IndicatorParams`] carries every period and multiplier the indicator
//! catalog reads. One instance is used for weekly bars and another for daily
//! bars, so the same EMA kind can run at 13 weekly and 22 daily.
//!
//! Parameter metadata enables:
//! - Grid search over indicator and detector settings
//! - Parameter documentation
//! - Loading overrides from flat key/value maps
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use triple_screen::params::IndicatorParams;
//!
//! let mut overrides = HashMap::new();
//! overrides.insert("ema_period", 22.0);
//!
//! let params = IndicatorParams::with_params(&overrides).unwrap();
//! assert_eq!(params.ema_period.get(), 22);
//! assert_eq!(params.macd_slow.get(), 26);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Period, Ratio, Result, ScreenError};

// ============================================================
// PARAMETER TYPES
// ============================================================

/// Type of parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
  /// Ratio value in 0.0..=1.0
  Ratio,
  /// Period value (positive integer)
  Period,
  /// Positive real multiplier, e.g. Keltner ATR width or shadow factor
  Multiplier,
}

/// Metadata for a single parameter
#[derive(Debug, Clone)]
pub struct ParamMeta {
  /// Parameter name (e.g., "macd_fast")
  pub name: &'static str,
  pub param_type: ParamType,
  pub default: f64,
  /// Range for optimization: (min, max, step)
  pub range: (f64, f64, f64),
  pub description: &'static str,
}

impl ParamMeta {
  pub const fn ratio(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Ratio, default, range, description }
  }

  pub const fn period(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Period, default, range, description }
  }

  pub const fn multiplier(
    name: &'static str,
    default: f64,
    range: (f64, f64, f64),
    description: &'static str,
  ) -> Self {
    Self { name, param_type: ParamType::Multiplier, default, range, description }
  }

  /// Generate all values for grid search
  pub fn generate_grid(&self) -> Vec<f64> {
    let (min, max, step) = self.range;
    let mut values = Vec::new();
    let mut v = min;
    while v <= max + f64::EPSILON {
      values.push(v);
      v += step;
    }
    values
  }

  /// Validate a value for this parameter
  pub fn validate(&self, value: f64) -> Result<()> {
    let (min, max, _) = self.range;
    if value.is_nan() || value < min || value > max {
      return Err(ScreenError::OutOfRange { field: self.name, value, min, max });
    }
    match self.param_type {
      ParamType::Ratio => Ratio::new(value).map(|_| ()),
      ParamType::Period => {
        if value < 1.0 || value.fract() != 0.0 {
          return Err(ScreenError::InvalidValue("Period must be a positive integer"));
        }
        Ok(())
      },
      ParamType::Multiplier => {
        if value <= 0.0 {
          return Err(ScreenError::InvalidValue("Multiplier must be > 0"));
        }
        Ok(())
      },
    }
  }
}

// ============================================================
// PARAMETERIZED DETECTOR TRAIT
// ============================================================

/// Trait for pattern detectors that expose tunable thresholds
pub trait ParameterizedDetector: Sized {
  /// Returns metadata for all configurable parameters
  fn param_meta() -> &'static [ParamMeta];

  /// Creates a detector with parameters from a HashMap
  ///
  /// Missing parameters use their default values.
  fn with_params(params: &HashMap<&str, f64>) -> Result<Self>;

  /// Returns the pattern name
  fn pattern_id_str() -> &'static str;
}

// ============================================================
// PARAMETER VALUE HELPERS
// ============================================================

fn lookup(params: &HashMap<&str, f64>, key: &str, default: f64) -> f64 {
  params.get(key).copied().unwrap_or(default)
}

/// Helper to get a Ratio from params with default fallback
pub fn get_ratio(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<Ratio> {
  Ratio::new(lookup(params, key, default))
}

/// Helper to get a Period from params with default fallback
pub fn get_period(params: &HashMap<&str, f64>, key: &str, default: usize) -> Result<Period> {
  let value = lookup(params, key, default as f64);
  if value < 1.0 || value.fract() != 0.0 {
    return Err(ScreenError::InvalidValue("Period must be a positive integer"));
  }
  Period::new(value as usize)
}

/// Helper to get a positive multiplier from params with default fallback
pub fn get_multiplier(params: &HashMap<&str, f64>, key: &str, default: f64) -> Result<f64> {
  let value = lookup(params, key, default);
  if !value.is_finite() || value <= 0.0 {
    return Err(ScreenError::InvalidValue("Multiplier must be finite and > 0"));
  }
  Ok(value)
}

// ============================================================
// INDICATOR PARAMETERS
// ============================================================

/// Periods and multipliers for every indicator kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
  pub ema_period: Period,
  pub sma_period: Period,
  pub macd_fast: Period,
  pub macd_slow: Period,
  pub macd_signal: Period,
  /// Force Index smoothing used in the Volume category by default
  pub force_fast: Period,
  pub force_slow: Period,
  pub stoch_k: Period,
  pub stoch_d: Period,
  pub rsi_period: Period,
  pub atr_period: Period,
  /// EMA basis of the Keltner channel
  pub keltner_basis: Period,
  pub keltner_atr: Period,
  pub keltner_multiplier: f64,
  /// Bars between `previous` and `current` when reading a slope
  pub slope_lookback: Period,
  /// Daily bars examined for price/oscillator divergence
  pub divergence_lookback: Period,
}

impl Default for IndicatorParams {
  fn default() -> Self {
    Self {
      ema_period: Period::new_const(13),
      sma_period: Period::new_const(13),
      macd_fast: Period::new_const(12),
      macd_slow: Period::new_const(26),
      macd_signal: Period::new_const(9),
      force_fast: Period::new_const(2),
      force_slow: Period::new_const(13),
      stoch_k: Period::new_const(14),
      stoch_d: Period::new_const(3),
      rsi_period: Period::new_const(14),
      atr_period: Period::new_const(14),
      keltner_basis: Period::new_const(20),
      keltner_atr: Period::new_const(10),
      keltner_multiplier: 1.0,
      slope_lookback: Period::new_const(1),
      divergence_lookback: Period::new_const(20),
    }
  }
}

const INDICATOR_PARAMS: &[ParamMeta] = &[
  ParamMeta::period("ema_period", 13.0, (5.0, 50.0, 1.0), "EMA trend period"),
  ParamMeta::period("sma_period", 13.0, (5.0, 50.0, 1.0), "SMA trend period"),
  ParamMeta::period("macd_fast", 12.0, (5.0, 20.0, 1.0), "MACD fast EMA period"),
  ParamMeta::period("macd_slow", 26.0, (15.0, 50.0, 1.0), "MACD slow EMA period"),
  ParamMeta::period("macd_signal", 9.0, (3.0, 15.0, 1.0), "MACD signal EMA period"),
  ParamMeta::period("force_fast", 2.0, (1.0, 10.0, 1.0), "Short Force Index EMA period"),
  ParamMeta::period("force_slow", 13.0, (5.0, 30.0, 1.0), "Long Force Index EMA period"),
  ParamMeta::period("stoch_k", 14.0, (5.0, 30.0, 1.0), "Stochastic %K window"),
  ParamMeta::period("stoch_d", 3.0, (1.0, 10.0, 1.0), "Stochastic %D smoothing"),
  ParamMeta::period("rsi_period", 14.0, (5.0, 30.0, 1.0), "RSI period"),
  ParamMeta::period("atr_period", 14.0, (5.0, 30.0, 1.0), "ATR period"),
  ParamMeta::period("keltner_basis", 20.0, (10.0, 50.0, 1.0), "Keltner middle-line EMA period"),
  ParamMeta::period("keltner_atr", 10.0, (5.0, 30.0, 1.0), "Keltner ATR period"),
  ParamMeta::multiplier("keltner_multiplier", 1.0, (0.5, 3.0, 0.25), "Keltner ATR multiplier"),
  ParamMeta::period("slope_lookback", 1.0, (1.0, 5.0, 1.0), "Bars between slope samples"),
  ParamMeta::period("divergence_lookback", 20.0, (8.0, 60.0, 1.0), "Divergence window in bars"),
];

impl IndicatorParams {
  /// Daily-chart defaults: 22-period EMA value zone, everything else unchanged
  pub fn daily() -> Self {
    Self { ema_period: Period::new_const(22), ..Self::default() }
  }

  pub fn param_meta() -> &'static [ParamMeta] {
    INDICATOR_PARAMS
  }

  /// Build from a flat key/value map. Missing keys use the defaults.
  pub fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
    Self::default().override_with(params)
  }

  /// Apply overrides on top of `self`. Unknown keys and values outside the
  /// metadata range are rejected.
  pub fn override_with(&self, params: &HashMap<&str, f64>) -> Result<Self> {
    for (key, value) in params {
      let meta = INDICATOR_PARAMS.iter().find(|m| m.name == *key).ok_or_else(|| {
        ScreenError::InvalidConfig(format!("unknown indicator parameter '{key}'"))
      })?;
      meta.validate(*value)?;
    }
    let out = Self {
      ema_period: get_period(params, "ema_period", self.ema_period.get())?,
      sma_period: get_period(params, "sma_period", self.sma_period.get())?,
      macd_fast: get_period(params, "macd_fast", self.macd_fast.get())?,
      macd_slow: get_period(params, "macd_slow", self.macd_slow.get())?,
      macd_signal: get_period(params, "macd_signal", self.macd_signal.get())?,
      force_fast: get_period(params, "force_fast", self.force_fast.get())?,
      force_slow: get_period(params, "force_slow", self.force_slow.get())?,
      stoch_k: get_period(params, "stoch_k", self.stoch_k.get())?,
      stoch_d: get_period(params, "stoch_d", self.stoch_d.get())?,
      rsi_period: get_period(params, "rsi_period", self.rsi_period.get())?,
      atr_period: get_period(params, "atr_period", self.atr_period.get())?,
      keltner_basis: get_period(params, "keltner_basis", self.keltner_basis.get())?,
      keltner_atr: get_period(params, "keltner_atr", self.keltner_atr.get())?,
      keltner_multiplier: get_multiplier(params, "keltner_multiplier", self.keltner_multiplier)?,
      slope_lookback: get_period(params, "slope_lookback", self.slope_lookback.get())?,
      divergence_lookback: get_period(
        params,
        "divergence_lookback",
        self.divergence_lookback.get(),
      )?,
    };
    out.validate()?;
    Ok(out)
  }

  /// Current value of the field named by a `ParamMeta`
  fn value_of(&self, name: &str) -> Option<f64> {
    let period = match name {
      "ema_period" => self.ema_period,
      "sma_period" => self.sma_period,
      "macd_fast" => self.macd_fast,
      "macd_slow" => self.macd_slow,
      "macd_signal" => self.macd_signal,
      "force_fast" => self.force_fast,
      "force_slow" => self.force_slow,
      "stoch_k" => self.stoch_k,
      "stoch_d" => self.stoch_d,
      "rsi_period" => self.rsi_period,
      "atr_period" => self.atr_period,
      "keltner_basis" => self.keltner_basis,
      "keltner_atr" => self.keltner_atr,
      "slope_lookback" => self.slope_lookback,
      "divergence_lookback" => self.divergence_lookback,
      "keltner_multiplier" => return Some(self.keltner_multiplier),
      _ => return None,
    };
    Some(period.get() as f64)
  }

  /// Range checks from the parameter metadata, then the MACD ordering that a
  /// single `ParamMeta` cannot express
  pub fn validate(&self) -> Result<()> {
    for meta in INDICATOR_PARAMS {
      if let Some(value) = self.value_of(meta.name) {
        meta.validate(value)?;
      }
    }
    if self.macd_fast >= self.macd_slow {
      return Err(ScreenError::InvalidConfig(format!(
        "macd_fast ({}) must be shorter than macd_slow ({})",
        self.macd_fast.get(),
        self.macd_slow.get()
      )));
    }
    Ok(())
  }
}

// ============================================================
// TESTS
// ============================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_param_meta_period() {
    let meta = ParamMeta::period("test_period", 14.0, (10.0, 20.0, 2.0), "Test period parameter");

    assert_eq!(meta.name, "test_period");
    assert_eq!(meta.param_type, ParamType::Period);
    assert_eq!(meta.default, 14.0);
  }

  #[test]
  fn test_generate_grid() {
    let meta = ParamMeta::ratio("test", 0.5, (0.3, 0.7, 0.2), "Test");

    let grid = meta.generate_grid();
    assert_eq!(grid.len(), 3);
    assert!((grid[0] - 0.3).abs() < f64::EPSILON);
    assert!((grid[1] - 0.5).abs() < f64::EPSILON);
    assert!((grid[2] - 0.7).abs() < f64::EPSILON);
  }

  #[test]
  fn test_validate_period() {
    let meta = ParamMeta::period("test", 14.0, (10.0, 20.0, 2.0), "Test");

    assert!(meta.validate(14.0).is_ok());
    assert!(meta.validate(8.0).is_err());
    assert!(meta.validate(22.0).is_err());
    assert!(meta.validate(14.5).is_err());
  }

  #[test]
  fn test_validate_multiplier() {
    let meta = ParamMeta::multiplier("mult", 1.0, (0.5, 3.0, 0.25), "Test");
    assert!(meta.validate(1.5).is_ok());
    assert!(meta.validate(0.25).is_err());
    assert!(meta.validate(f64::NAN).is_err());
  }

  #[test]
  fn test_get_period_helper() {
    let mut params = HashMap::new();
    params.insert("key1", 20.0);
    params.insert("bad", 2.5);

    assert_eq!(get_period(&params, "key1", 14).unwrap().get(), 20);
    assert_eq!(get_period(&params, "key2", 14).unwrap().get(), 14);
    assert!(get_period(&params, "bad", 14).is_err());
  }

  #[test]
  fn test_defaults() {
    let p = IndicatorParams::default();
    assert_eq!(p.ema_period.get(), 13);
    assert_eq!((p.macd_fast.get(), p.macd_slow.get(), p.macd_signal.get()), (12, 26, 9));
    assert_eq!((p.stoch_k.get(), p.stoch_d.get()), (14, 3));
    assert_eq!(IndicatorParams::daily().ema_period.get(), 22);
    assert!(p.validate().is_ok());
  }

  #[test]
  fn test_meta_defaults_match_struct() {
    let p = IndicatorParams::default();
    let from_meta: HashMap<&str, f64> =
      IndicatorParams::param_meta().iter().map(|m| (m.name, m.default)).collect();
    assert_eq!(IndicatorParams::with_params(&from_meta).unwrap(), p);
  }

  #[test]
  fn test_override_rejects_unknown_key() {
    let mut params = HashMap::new();
    params.insert("ema_periods", 20.0);
    assert!(matches!(IndicatorParams::with_params(&params), Err(ScreenError::InvalidConfig(_))));
  }

  #[test]
  fn test_override_rejects_out_of_range() {
    let mut params = HashMap::new();
    params.insert("rsi_period", 200.0);
    assert!(matches!(
      IndicatorParams::with_params(&params),
      Err(ScreenError::OutOfRange { field: "rsi_period", .. })
    ));
  }

  #[test]
  fn test_validate_checks_every_field_range() {
    for meta in IndicatorParams::param_meta() {
      assert!(IndicatorParams::default().value_of(meta.name).is_some(), "{}", meta.name);
    }

    let p: IndicatorParams = serde_json::from_str(r#"{"rsi_period": 500}"#).unwrap();
    assert!(matches!(p.validate(), Err(ScreenError::OutOfRange { field: "rsi_period", .. })));

    let p: IndicatorParams = serde_json::from_str(r#"{"keltner_multiplier": 9.0}"#).unwrap();
    assert!(matches!(
      p.validate(),
      Err(ScreenError::OutOfRange { field: "keltner_multiplier", .. })
    ));
  }

  #[test]
  fn test_fast_must_be_shorter_than_slow() {
    let mut params = HashMap::new();
    params.insert("macd_fast", 20.0);
    params.insert("macd_slow", 15.0);
    assert!(matches!(IndicatorParams::with_params(&params), Err(ScreenError::InvalidConfig(_))));
  }

  #[test]
  fn test_serde_fills_missing_fields() {
    let p: IndicatorParams = serde_json::from_str(r#"{"ema_period": 22}"#).unwrap();
    assert_eq!(p, IndicatorParams::daily());
    assert!(serde_json::from_str::<IndicatorParams>(r#"{"rsi_period": 0}"#).is_err());
  }
}
