//! Integration tests for the scoring rule table and grading.

use proptest::prelude::*;
use triple_screen::prelude::*;
use triple_screen::scorer::clamp_signal;

fn scorer() -> TripleScreenScorer {
    TripleScreenScorer::new(IndicatorConfiguration::classic(), ScoringConfig::default())
}

fn reading(previous: f64, current: f64) -> Reading {
    Reading { current, previous }
}

fn rising_weekly() -> WeeklyInputs {
    WeeklyInputs {
        trend: reading(100.0, 101.0),
        momentum: reading(0.1, 0.2),
    }
}

fn falling_weekly() -> WeeklyInputs {
    WeeklyInputs {
        trend: reading(101.0, 100.0),
        momentum: reading(0.2, 0.1),
    }
}

#[test]
fn test_pullback_in_uptrend_grades_a() {
    let daily = DailyInputs {
        close: 105.0,
        trend: 100.0,
        oscillator: 25.0,
        volume: -1500.0,
        bullish_divergence: false,
    };
    let card = scorer().score(&rising_weekly(), &daily);

    let points: Vec<i32> = card.breakdown.iter().map(|e| e.points).collect();
    assert_eq!(points, vec![2, 1, 2, 2, 1]);
    assert_eq!(card.raw_score, 8);
    assert_eq!(card.signal_strength, 8);
    assert_eq!(card.impulse, ImpulseColor::Green);
    assert_eq!(card.grade, Grade::A);
    assert_eq!(card.screen1_score, 4);
    assert_eq!(card.screen2_score, 4);
    assert!(card.weekly_bullish);
}

#[test]
fn test_red_impulse_overrides_daily_setup() {
    let daily = DailyInputs {
        close: 95.0,
        trend: 100.0,
        oscillator: 12.0,
        volume: -10.0,
        bullish_divergence: true,
    };
    let card = scorer().score(&falling_weekly(), &daily);

    // Pullback, oversold, price at value and divergence sum to 7
    assert_eq!(card.screen2_score, 7);
    assert_eq!(card.screen1_score, -2);
    assert_eq!(card.raw_score, 5);
    assert_eq!(card.impulse, ImpulseColor::Red);
    assert_eq!(card.grade, Grade::Avoid);
    assert_eq!(Grade::from_signal(7, ImpulseColor::Red), Grade::Avoid);
}

#[test]
fn test_blue_impulse_adds_nothing() {
    let weekly = WeeklyInputs {
        trend: reading(100.0, 101.0),
        momentum: reading(0.2, 0.1),
    };
    let daily = DailyInputs {
        close: 105.0,
        trend: 100.0,
        oscillator: 40.0,
        volume: 10.0,
        bullish_divergence: false,
    };
    let card = scorer().score(&weekly, &daily);
    assert_eq!(card.impulse, ImpulseColor::Blue);
    let rules: Vec<ScoreRule> = card.breakdown.iter().map(|e| e.rule).collect();
    assert_eq!(rules, vec![ScoreRule::WeeklyTrendStrong, ScoreRule::MidZone]);
    assert_eq!(card.grade, Grade::B);
}

#[test]
fn test_labels_follow_configuration() {
    let rsi = TripleScreenScorer::new(
        IndicatorConfiguration::rsi_oscillator(),
        ScoringConfig::default(),
    );
    let daily = DailyInputs {
        close: 105.0,
        trend: 100.0,
        oscillator: 20.0,
        volume: 10.0,
        bullish_divergence: false,
    };
    let card = rsi.score(&rising_weekly(), &daily);
    let oversold = card
        .breakdown
        .iter()
        .find(|e| e.rule == ScoreRule::Oversold)
        .unwrap();
    assert!(oversold.label.starts_with("RSI"));
}

#[test]
fn test_scorecard_serializes_grade_names() {
    let daily = DailyInputs {
        close: 95.0,
        trend: 100.0,
        oscillator: 12.0,
        volume: -10.0,
        bullish_divergence: false,
    };
    let card = scorer().score(&falling_weekly(), &daily);
    let json = serde_json::to_value(&card).unwrap();
    assert_eq!(json["grade"], "AVOID");
    assert_eq!(json["impulse"], "RED");
}

fn arb_reading() -> impl Strategy<Value = Reading> {
    (-50.0f64..50.0, -50.0f64..50.0).prop_map(|(previous, current)| Reading { current, previous })
}

proptest! {
    #[test]
    fn prop_breakdown_sums_to_raw(
        trend in arb_reading(),
        momentum in arb_reading(),
        close in 50.0f64..150.0,
        daily_trend in 50.0f64..150.0,
        oscillator in 0.0f64..100.0,
        volume in -1e6f64..1e6,
        bullish_divergence in any::<bool>(),
    ) {
        let weekly = WeeklyInputs { trend, momentum };
        let daily = DailyInputs { close, trend: daily_trend, oscillator, volume, bullish_divergence };
        let card = scorer().score(&weekly, &daily);

        let sum: i32 = card.breakdown.iter().map(|e| e.points).sum();
        prop_assert_eq!(sum, card.raw_score);
        prop_assert_eq!(card.screen1_score + card.screen2_score, card.raw_score);
        prop_assert_eq!(card.signal_strength, clamp_signal(card.raw_score));
        prop_assert!(card.signal_strength <= 10);
        if card.impulse == ImpulseColor::Red {
            prop_assert_eq!(card.grade, Grade::Avoid);
        }
    }
}
