//! Triple Screen scoring rules and grading
//!
//! Scoring is a fixed, ordered rule table. Each rule that fires contributes
//! one [`ScoreBreakdownEntry`], so the breakdown always sums to the raw score.
//!
//! | Rule                               | Points |
//! |------------------------------------|--------|
//! | Weekly trend strongly rising       | +2     |
//! | Weekly momentum rising             | +1     |
//! | Volume indicator below zero        | +2     |
//! | Oscillator oversold (< 30)         | +2     |
//! | Oscillator mid-zone (30-50)        | +1     |
//! | Close at or below daily trend      | +1     |
//! | Bullish divergence                 | +2     |
//! | Impulse GREEN                      | +1     |
//! | Impulse RED                        | -2     |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{IndicatorConfiguration, ScoringConfig};
use crate::indicators::{ImpulseColor, Reading};

// ============================================================
// INPUTS
// ============================================================

/// Weekly (screen 1) readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyInputs {
    pub trend: Reading,
    pub momentum: Reading,
}

/// Daily (screens 2 and 3) values on the latest bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyInputs {
    pub close: f64,
    pub trend: f64,
    pub oscillator: f64,
    pub volume: f64,
    pub bullish_divergence: bool,
}

// ============================================================
// RULES
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    WeeklyTrendStrong,
    WeeklyMomentumRising,
    Pullback,
    Oversold,
    MidZone,
    PriceAtValue,
    BullishDivergence,
    ImpulseGreen,
    ImpulseRed,
}

impl ScoreRule {
    pub fn points(self) -> i32 {
        match self {
            ScoreRule::WeeklyTrendStrong => 2,
            ScoreRule::WeeklyMomentumRising => 1,
            ScoreRule::Pullback => 2,
            ScoreRule::Oversold => 2,
            ScoreRule::MidZone => 1,
            ScoreRule::PriceAtValue => 1,
            ScoreRule::BullishDivergence => 2,
            ScoreRule::ImpulseGreen => 1,
            ScoreRule::ImpulseRed => -2,
        }
    }

    /// Weekly-screen rules, including the impulse adjustment
    pub fn is_weekly(self) -> bool {
        matches!(
            self,
            ScoreRule::WeeklyTrendStrong
                | ScoreRule::WeeklyMomentumRising
                | ScoreRule::ImpulseGreen
                | ScoreRule::ImpulseRed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdownEntry {
    pub rule: ScoreRule,
    pub label: String,
    pub points: i32,
}

// ============================================================
// GRADES
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    #[serde(rename = "AVOID")]
    Avoid,
}

impl Grade {
    /// Grade from the clamped signal strength. RED impulse always grades AVOID.
    pub fn from_signal(signal_strength: u8, impulse: ImpulseColor) -> Self {
        if impulse == ImpulseColor::Red {
            return Grade::Avoid;
        }
        match signal_strength {
            s if s >= 5 => Grade::A,
            3..=4 => Grade::B,
            1..=2 => Grade::C,
            _ => Grade::Avoid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::Avoid => "AVOID",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a raw rule sum into the 0..=10 signal strength
#[inline]
pub fn clamp_signal(raw: i32) -> u8 {
    raw.clamp(0, 10) as u8
}

// ============================================================
// SCORER
// ============================================================

/// Outcome of applying the rule table to one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub impulse: ImpulseColor,
    /// Weekly trend indicator is rising
    pub weekly_bullish: bool,
    pub breakdown: Vec<ScoreBreakdownEntry>,
    pub screen1_score: i32,
    pub screen2_score: i32,
    pub raw_score: i32,
    pub signal_strength: u8,
    pub grade: Grade,
}

#[derive(Debug, Clone)]
pub struct TripleScreenScorer {
    indicators: IndicatorConfiguration,
    config: ScoringConfig,
}

impl TripleScreenScorer {
    pub fn new(indicators: IndicatorConfiguration, config: ScoringConfig) -> Self {
        Self { indicators, config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn label(&self, rule: ScoreRule, daily: &DailyInputs) -> String {
        let ind = &self.indicators;
        match rule {
            ScoreRule::WeeklyTrendStrong => {
                format!("Weekly {} strongly rising", ind.trend().label())
            }
            ScoreRule::WeeklyMomentumRising => {
                format!("Weekly {} rising", ind.momentum().label())
            }
            ScoreRule::Pullback => format!(
                "{} pullback (< {})",
                ind.volume().label(),
                self.config.pullback_below
            ),
            ScoreRule::Oversold => format!(
                "{} oversold ({:.1} < {})",
                ind.oscillator().label(),
                daily.oscillator,
                self.config.oversold
            ),
            ScoreRule::MidZone => format!(
                "{} mid-zone ({:.1})",
                ind.oscillator().label(),
                daily.oscillator
            ),
            ScoreRule::PriceAtValue => {
                format!("Price at or below daily {}", ind.trend().label())
            }
            ScoreRule::BullishDivergence => {
                format!("Bullish {} divergence", ind.momentum().label())
            }
            ScoreRule::ImpulseGreen => "Impulse GREEN".to_string(),
            ScoreRule::ImpulseRed => "Impulse RED".to_string(),
        }
    }

    /// Rules that fire for these inputs, in table order
    pub fn fired_rules(&self, weekly: &WeeklyInputs, daily: &DailyInputs) -> Vec<ScoreRule> {
        let cfg = &self.config;
        let impulse = self.impulse(weekly);
        let mut rules = Vec::new();

        let trend_strong = weekly.trend.slope().is_rising()
            && weekly
                .trend
                .change_pct()
                .map_or(true, |pct| pct > cfg.trend_strength_pct);
        if trend_strong {
            rules.push(ScoreRule::WeeklyTrendStrong);
        }
        if weekly.momentum.slope().is_rising() {
            rules.push(ScoreRule::WeeklyMomentumRising);
        }
        if daily.volume < cfg.pullback_below {
            rules.push(ScoreRule::Pullback);
        }
        if daily.oscillator < cfg.oversold {
            rules.push(ScoreRule::Oversold);
        } else if daily.oscillator < cfg.mid_zone_upper {
            rules.push(ScoreRule::MidZone);
        }
        if daily.close <= daily.trend {
            rules.push(ScoreRule::PriceAtValue);
        }
        if daily.bullish_divergence {
            rules.push(ScoreRule::BullishDivergence);
        }
        match impulse {
            ImpulseColor::Green => rules.push(ScoreRule::ImpulseGreen),
            ImpulseColor::Red => rules.push(ScoreRule::ImpulseRed),
            ImpulseColor::Blue => {}
        }
        rules
    }

    /// Weekly impulse color from the configured trend and momentum slopes
    pub fn impulse(&self, weekly: &WeeklyInputs) -> ImpulseColor {
        ImpulseColor::from_slopes(weekly.trend.slope(), weekly.momentum.slope())
    }

    pub fn score(&self, weekly: &WeeklyInputs, daily: &DailyInputs) -> Scorecard {
        let impulse = self.impulse(weekly);
        let breakdown: Vec<ScoreBreakdownEntry> = self
            .fired_rules(weekly, daily)
            .into_iter()
            .map(|rule| ScoreBreakdownEntry {
                rule,
                label: self.label(rule, daily),
                points: rule.points(),
            })
            .collect();

        let screen1_score = breakdown
            .iter()
            .filter(|e| e.rule.is_weekly())
            .map(|e| e.points)
            .sum();
        let screen2_score = breakdown
            .iter()
            .filter(|e| !e.rule.is_weekly())
            .map(|e| e.points)
            .sum();
        let raw_score = screen1_score + screen2_score;
        let signal_strength = clamp_signal(raw_score);

        Scorecard {
            impulse,
            weekly_bullish: weekly.trend.slope().is_rising(),
            breakdown,
            screen1_score,
            screen2_score,
            raw_score,
            signal_strength,
            grade: Grade::from_signal(signal_strength, impulse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> TripleScreenScorer {
        TripleScreenScorer::new(IndicatorConfiguration::classic(), ScoringConfig::default())
    }

    fn reading(previous: f64, current: f64) -> Reading {
        Reading { current, previous }
    }

    fn neutral_daily() -> DailyInputs {
        DailyInputs {
            close: 110.0,
            trend: 100.0,
            oscillator: 70.0,
            volume: 5.0,
            bullish_divergence: false,
        }
    }

    #[test]
    fn test_grade_table() {
        use ImpulseColor::*;
        assert_eq!(Grade::from_signal(5, Blue), Grade::A);
        assert_eq!(Grade::from_signal(10, Green), Grade::A);
        assert_eq!(Grade::from_signal(4, Green), Grade::B);
        assert_eq!(Grade::from_signal(3, Blue), Grade::B);
        assert_eq!(Grade::from_signal(2, Green), Grade::C);
        assert_eq!(Grade::from_signal(1, Blue), Grade::C);
        assert_eq!(Grade::from_signal(0, Green), Grade::Avoid);
        assert_eq!(Grade::from_signal(9, Red), Grade::Avoid);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp_signal(-3), 0);
        assert_eq!(clamp_signal(7), 7);
        assert_eq!(clamp_signal(14), 10);
    }

    #[test]
    fn test_oscillator_zones_are_exclusive() {
        let s = scorer();
        let weekly = WeeklyInputs {
            trend: reading(100.0, 100.0),
            momentum: reading(1.0, 1.0),
        };
        let mut daily = neutral_daily();

        daily.oscillator = 29.9;
        let rules = s.fired_rules(&weekly, &daily);
        assert!(rules.contains(&ScoreRule::Oversold));
        assert!(!rules.contains(&ScoreRule::MidZone));

        daily.oscillator = 30.0;
        let rules = s.fired_rules(&weekly, &daily);
        assert!(rules.contains(&ScoreRule::MidZone));

        // flat weekly slopes read RED
        daily.oscillator = 50.0;
        assert_eq!(s.fired_rules(&weekly, &daily), vec![ScoreRule::ImpulseRed]);
    }

    #[test]
    fn test_trend_strength_threshold() {
        let weekly = WeeklyInputs {
            trend: reading(100.0, 100.5),
            momentum: reading(1.0, 0.5),
        };
        let daily = neutral_daily();

        assert!(scorer()
            .fired_rules(&weekly, &daily)
            .contains(&ScoreRule::WeeklyTrendStrong));

        let strict = TripleScreenScorer::new(
            IndicatorConfiguration::classic(),
            ScoringConfig {
                trend_strength_pct: 1.0,
                ..ScoringConfig::default()
            },
        );
        assert!(!strict
            .fired_rules(&weekly, &daily)
            .contains(&ScoreRule::WeeklyTrendStrong));
    }

    #[test]
    fn test_red_impulse_forces_avoid() {
        let weekly = WeeklyInputs {
            trend: reading(100.0, 99.0),
            momentum: reading(0.5, 0.2),
        };
        let daily = DailyInputs {
            close: 90.0,
            trend: 95.0,
            oscillator: 10.0,
            volume: -100.0,
            bullish_divergence: true,
        };
        let card = scorer().score(&weekly, &daily);
        // 2 + 2 + 1 + 2 - 2
        assert_eq!(card.raw_score, 5);
        assert_eq!(card.impulse, ImpulseColor::Red);
        assert_eq!(card.grade, Grade::Avoid);
        assert_eq!(card.screen1_score, -2);
        assert_eq!(card.screen2_score, 7);
    }

    #[test]
    fn test_labels_follow_configuration() {
        let s = TripleScreenScorer::new(
            IndicatorConfiguration::rsi_oscillator(),
            ScoringConfig::default(),
        );
        let weekly = WeeklyInputs {
            trend: reading(100.0, 100.0),
            momentum: reading(1.0, 1.0),
        };
        let daily = DailyInputs {
            oscillator: 20.0,
            ..neutral_daily()
        };
        let card = s.score(&weekly, &daily);
        assert!(card.breakdown[0].label.starts_with("RSI oversold"));
    }
}
