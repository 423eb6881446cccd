//! Indicator selection, scoring thresholds and screen configuration
//!
//! An [`IndicatorConfiguration`] binds each [`Category`] to exactly one
//! catalog indicator. Configurations are validated when constructed or
//! deserialized, so a scan never starts with an unknown category or name.
//!
//! ```rust
//! use triple_screen::config::{Category, IndicatorConfiguration};
//! use triple_screen::indicators::IndicatorKind;
//!
//! let cfg = IndicatorConfiguration::from_names("custom", [("oscillator", "rsi")]).unwrap();
//! assert_eq!(cfg.get(Category::Oscillator), IndicatorKind::Rsi);
//! assert_eq!(cfg.get(Category::Trend), IndicatorKind::Ema);
//!
//! assert!(IndicatorConfiguration::from_names("bad", [("trend", "vwap")]).is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorKind;
use crate::params::IndicatorParams;
use crate::{Result, ScreenError};

// ============================================================
// CATEGORIES
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Trend,
    Momentum,
    Oscillator,
    Volume,
    Volatility,
    Impulse,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Trend,
        Category::Momentum,
        Category::Oscillator,
        Category::Volume,
        Category::Volatility,
        Category::Impulse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Trend => "trend",
            Category::Momentum => "momentum",
            Category::Oscillator => "oscillator",
            Category::Volume => "volume",
            Category::Volatility => "volatility",
            Category::Impulse => "impulse",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ScreenError::UnknownCategory(name.to_string()))
    }

    /// Indicators selectable for this category
    pub fn catalog(self) -> &'static [IndicatorKind] {
        match self {
            Category::Trend => &[IndicatorKind::Ema, IndicatorKind::Sma],
            Category::Momentum => &[IndicatorKind::MacdHistogram, IndicatorKind::MacdLine],
            Category::Oscillator => &[IndicatorKind::Stochastic, IndicatorKind::Rsi],
            Category::Volume => &[IndicatorKind::ForceIndex, IndicatorKind::ForceIndexSlow],
            Category::Volatility => &[IndicatorKind::KeltnerChannel, IndicatorKind::Atr],
            Category::Impulse => &[IndicatorKind::ImpulseSystem],
        }
    }

    /// First catalog entry
    pub fn default_indicator(self) -> IndicatorKind {
        self.catalog()[0]
    }

    /// Resolve a catalog name within this category
    pub fn resolve(self, name: &str) -> Result<IndicatorKind> {
        self.catalog()
            .iter()
            .copied()
            .find(|k| k.name() == name)
            .ok_or_else(|| ScreenError::UnknownIndicator {
                category: self.name().to_string(),
                name: name.to_string(),
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================
// INDICATOR CONFIGURATION
// ============================================================

/// One indicator per category. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfiguration", into = "RawConfiguration")]
pub struct IndicatorConfiguration {
    name: String,
    selected: [IndicatorKind; 6],
}

#[derive(Serialize, Deserialize)]
struct RawConfiguration {
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    indicators: BTreeMap<String, String>,
}

impl TryFrom<RawConfiguration> for IndicatorConfiguration {
    type Error = ScreenError;

    fn try_from(raw: RawConfiguration) -> Result<Self> {
        IndicatorConfiguration::from_names(raw.name, raw.indicators)
    }
}

impl From<IndicatorConfiguration> for RawConfiguration {
    fn from(cfg: IndicatorConfiguration) -> Self {
        let indicators = Category::ALL
            .into_iter()
            .map(|c| (c.name().to_string(), cfg.get(c).name().to_string()))
            .collect();
        RawConfiguration {
            name: cfg.name,
            indicators,
        }
    }
}

fn invalid_json(e: serde_json::Error) -> ScreenError {
    ScreenError::InvalidConfig(e.to_string())
}

impl Default for IndicatorConfiguration {
    fn default() -> Self {
        Self::classic()
    }
}

impl IndicatorConfiguration {
    /// Build from `(category, indicator)` name pairs. Categories left out
    /// keep their default indicator.
    pub fn from_names<I, C, N>(name: impl Into<String>, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, N)>,
        C: AsRef<str>,
        N: AsRef<str>,
    {
        let mut cfg = Self::with_name(name);
        for (category, indicator) in pairs {
            let category = Category::from_name(category.as_ref())?;
            let kind = category.resolve(indicator.as_ref())?;
            cfg.selected[category as usize] = kind;
        }
        Ok(cfg)
    }

    /// Load a `{"name": .., "<category>": "<indicator>"}` object
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json).map_err(invalid_json)?)
    }

    fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: RawConfiguration = serde_json::from_value(value).map_err(invalid_json)?;
        Self::try_from(raw)
    }

    fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            selected: Category::ALL.map(Category::default_indicator),
        }
    }

    /// Return a copy with `category` bound to `kind`
    pub fn with(mut self, category: Category, kind: IndicatorKind) -> Result<Self> {
        if !category.catalog().contains(&kind) {
            return Err(ScreenError::UnknownIndicator {
                category: category.name().to_string(),
                name: kind.name().to_string(),
            });
        }
        self.selected[category as usize] = kind;
        Ok(self)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn get(&self, category: Category) -> IndicatorKind {
        self.selected[category as usize]
    }

    pub fn trend(&self) -> IndicatorKind {
        self.get(Category::Trend)
    }

    pub fn momentum(&self) -> IndicatorKind {
        self.get(Category::Momentum)
    }

    pub fn oscillator(&self) -> IndicatorKind {
        self.get(Category::Oscillator)
    }

    pub fn volume(&self) -> IndicatorKind {
        self.get(Category::Volume)
    }

    pub fn volatility(&self) -> IndicatorKind {
        self.get(Category::Volatility)
    }

    pub fn impulse(&self) -> IndicatorKind {
        self.get(Category::Impulse)
    }

    /// Selected indicators in category order
    pub fn kinds(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        self.selected.iter().copied()
    }

    // ============ PRESETS ============

    /// EMA, MACD-H, Stochastic, Force Index(2), Keltner, Impulse
    pub fn classic() -> Self {
        Self::with_name("classic")
    }

    pub fn rsi_oscillator() -> Self {
        let mut cfg = Self::with_name("rsi_oscillator");
        cfg.selected[Category::Oscillator as usize] = IndicatorKind::Rsi;
        cfg
    }

    /// SMA trend with MACD line momentum
    pub fn sma_trend() -> Self {
        let mut cfg = Self::with_name("sma_trend");
        cfg.selected[Category::Trend as usize] = IndicatorKind::Sma;
        cfg.selected[Category::Momentum as usize] = IndicatorKind::MacdLine;
        cfg
    }

    pub fn presets() -> Vec<Self> {
        vec![Self::classic(), Self::rsi_oscillator(), Self::sma_trend()]
    }

    pub fn preset(name: &str) -> Option<Self> {
        Self::presets().into_iter().find(|p| p.name == name)
    }
}

// ============================================================
// SCORING CONFIG
// ============================================================

/// Thresholds read by the scoring rules. Point values are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weekly trend must change by more than this percent to count as
    /// strongly rising
    pub trend_strength_pct: f64,
    /// Oscillator below this reads oversold
    pub oversold: f64,
    /// Oscillator in `[oversold, mid_zone_upper)` reads mid-zone
    pub mid_zone_upper: f64,
    /// Volume indicator below this reads as a pullback
    pub pullback_below: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            trend_strength_pct: 0.0,
            oversold: 30.0,
            mid_zone_upper: 50.0,
            pullback_below: 0.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            self.trend_strength_pct,
            self.oversold,
            self.mid_zone_upper,
            self.pullback_below,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(ScreenError::InvalidConfig("scoring thresholds must be finite".into()));
        }
        if self.trend_strength_pct < 0.0 {
            return Err(ScreenError::InvalidConfig("trend_strength_pct must be >= 0".into()));
        }
        if self.oversold >= self.mid_zone_upper {
            return Err(ScreenError::InvalidConfig(format!(
                "oversold ({}) must be below mid_zone_upper ({})",
                self.oversold, self.mid_zone_upper
            )));
        }
        Ok(())
    }
}

// ============================================================
// SCREEN CONFIG
// ============================================================

/// Everything a [`crate::Screener`] needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub indicators: IndicatorConfiguration,
    /// Parameters for weekly bars (screen 1)
    pub weekly: IndicatorParams,
    /// Parameters for daily bars (screens 2 and 3)
    pub daily: IndicatorParams,
    pub scoring: ScoringConfig,
    /// Calendar days of weekly history requested from the data source
    pub weekly_lookback_days: u32,
    pub daily_lookback_days: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorConfiguration::classic(),
            weekly: IndicatorParams::default(),
            daily: IndicatorParams::daily(),
            scoring: ScoringConfig::default(),
            weekly_lookback_days: 730,
            daily_lookback_days: 365,
        }
    }
}

impl ScreenConfig {
    /// Default thresholds with a different indicator selection
    pub fn with_indicators(indicators: IndicatorConfiguration) -> Self {
        Self {
            indicators,
            ..Self::default()
        }
    }

    /// Parse and validate. Indicator selection is resolved outside serde so
    /// unknown names surface as `UnknownCategory` or `UnknownIndicator`.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(json).map_err(invalid_json)?;
        let indicators = value
            .as_object_mut()
            .and_then(|obj| obj.remove("indicators"))
            .map(IndicatorConfiguration::from_value)
            .transpose()?;

        let mut cfg: ScreenConfig = serde_json::from_value(value).map_err(invalid_json)?;
        if let Some(indicators) = indicators {
            cfg.indicators = indicators;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScreenError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.weekly.validate()?;
        self.daily.validate()?;
        self.scoring.validate()?;
        if self.weekly_lookback_days == 0 || self.daily_lookback_days == 0 {
            return Err(ScreenError::InvalidConfig("lookback days must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_matches_kind_category() {
        for category in Category::ALL {
            for kind in category.catalog() {
                assert_eq!(kind.category(), category);
            }
        }
    }

    #[test]
    fn test_classic_preset() {
        let cfg = IndicatorConfiguration::classic();
        assert_eq!(cfg.trend(), IndicatorKind::Ema);
        assert_eq!(cfg.momentum(), IndicatorKind::MacdHistogram);
        assert_eq!(cfg.oscillator(), IndicatorKind::Stochastic);
        assert_eq!(cfg.volume(), IndicatorKind::ForceIndex);
        assert_eq!(cfg.volatility(), IndicatorKind::KeltnerChannel);
        assert_eq!(cfg.impulse(), IndicatorKind::ImpulseSystem);
    }

    #[test]
    fn test_sma_trend_preset() {
        let cfg = IndicatorConfiguration::sma_trend();
        assert_eq!(cfg.trend(), IndicatorKind::Sma);
        assert_eq!(cfg.momentum(), IndicatorKind::MacdLine);
        assert_eq!(cfg.oscillator(), IndicatorKind::Stochastic);
        assert_eq!(cfg.volume(), IndicatorKind::ForceIndex);
    }

    #[test]
    fn test_unknown_category_and_indicator() {
        assert_eq!(
            IndicatorConfiguration::from_names("x", [("sentiment", "ema")]),
            Err(ScreenError::UnknownCategory("sentiment".into()))
        );
        assert_eq!(
            IndicatorConfiguration::from_names("x", [("trend", "rsi")]),
            Err(ScreenError::UnknownIndicator {
                category: "trend".into(),
                name: "rsi".into()
            })
        );
    }

    #[test]
    fn test_with_rejects_wrong_category() {
        let cfg = IndicatorConfiguration::classic();
        assert!(cfg.clone().with(Category::Trend, IndicatorKind::Sma).is_ok());
        assert!(cfg.with(Category::Trend, IndicatorKind::Rsi).is_err());
    }

    #[test]
    fn test_presets_lookup() {
        assert_eq!(
            IndicatorConfiguration::preset("rsi_oscillator").unwrap().oscillator(),
            IndicatorKind::Rsi
        );
        assert!(IndicatorConfiguration::preset("nope").is_none());
    }

    #[test]
    fn test_configuration_json() {
        let json = r#"{"name":"mine","trend":"sma","oscillator":"rsi"}"#;
        let cfg: IndicatorConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.name(), "mine");
        assert_eq!(cfg.trend(), IndicatorKind::Sma);
        assert_eq!(cfg.momentum(), IndicatorKind::MacdHistogram);

        let back: IndicatorConfiguration =
            serde_json::from_str(&serde_json::to_string(&cfg).unwrap()).unwrap();
        assert_eq!(back, cfg);

        let bad = r#"{"trend":"vwap"}"#;
        assert!(serde_json::from_str::<IndicatorConfiguration>(bad).is_err());
    }

    #[test]
    fn test_screen_config_defaults() {
        let cfg = ScreenConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.weekly.ema_period.get(), 13);
        assert_eq!(cfg.daily.ema_period.get(), 22);
        assert_eq!(cfg.scoring.trend_strength_pct, 0.0);
    }

    #[test]
    fn test_screen_config_from_json() {
        let cfg = ScreenConfig::from_json(
            r#"{"indicators":{"oscillator":"rsi"},"scoring":{"oversold":25.0}}"#,
        )
        .unwrap();
        assert_eq!(cfg.indicators.oscillator(), IndicatorKind::Rsi);
        assert_eq!(cfg.scoring.oversold, 25.0);
        assert_eq!(cfg.scoring.mid_zone_upper, 50.0);

        assert!(ScreenConfig::from_json(r#"{"scoring":{"oversold":60.0}}"#).is_err());
    }

    #[test]
    fn test_screen_config_from_json_keeps_lookup_errors() {
        assert_eq!(
            ScreenConfig::from_json(r#"{"indicators":{"trend":"vwap"}}"#),
            Err(ScreenError::UnknownIndicator {
                category: "trend".into(),
                name: "vwap".into()
            })
        );
        assert_eq!(
            ScreenConfig::from_json(r#"{"indicators":{"sentiment":"ema"}}"#),
            Err(ScreenError::UnknownCategory("sentiment".into()))
        );
        assert_eq!(
            IndicatorConfiguration::from_json(r#"{"momentum":"macd"}"#),
            Err(ScreenError::UnknownIndicator {
                category: "momentum".into(),
                name: "macd".into()
            })
        );
        assert!(matches!(
            ScreenConfig::from_json(r#"{"indicators":"classic"}"#),
            Err(ScreenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_screen_config_from_json_checks_param_ranges() {
        assert!(matches!(
            ScreenConfig::from_json(r#"{"weekly":{"rsi_period":500}}"#),
            Err(ScreenError::OutOfRange { field: "rsi_period", .. })
        ));
        assert!(matches!(
            ScreenConfig::from_json(r#"{"daily":{"ema_period":2}}"#),
            Err(ScreenError::OutOfRange { field: "ema_period", .. })
        ));
    }
}
