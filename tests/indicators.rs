//! Integration tests for the indicator catalog.

use proptest::prelude::*;
use triple_screen::indicators::{self, ema, keltner, macd, rsi, sma, stochastic_k};
use triple_screen::prelude::*;

#[derive(Debug, Clone, Copy)]
struct TestBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
}

impl OHLCV for TestBar {
    fn open(&self) -> f64 {
        self.o
    }

    fn high(&self) -> f64 {
        self.h
    }

    fn low(&self) -> f64 {
        self.l
    }

    fn close(&self) -> f64 {
        self.c
    }

    fn volume(&self) -> f64 {
        self.v
    }
}

/// Bars whose close moves by `growth` each bar, opening at the prior close
fn geometric(n: usize, growth: f64) -> Vec<TestBar> {
    let mut close = 100.0;
    (0..n)
        .map(|_| {
            let o = close;
            close *= growth;
            TestBar {
                o,
                h: o.max(close) * 1.002,
                l: o.min(close) * 0.998,
                c: close,
                v: 1e6,
            }
        })
        .collect()
}

fn period(p: usize) -> Period {
    Period::new(p).unwrap()
}

// ============================================================
// MOVING AVERAGES
// ============================================================

#[test]
fn test_ema_seed_is_sma() {
    let values = [2.0, 4.0, 6.0, 8.0, 10.0];
    let out = ema(&values, period(3)).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(out[0], 4.0);
    // alpha = 0.5
    assert_eq!(out[1], 6.0);
    assert_eq!(out[2], 8.0);
}

#[test]
fn test_short_input_is_insufficient() {
    let err = ema(&[1.0, 2.0], period(3)).unwrap_err();
    assert_eq!(
        err,
        ScreenError::InsufficientData {
            indicator: "ema",
            need: 3,
            got: 2
        }
    );
    assert!(err.is_recoverable());
}

#[test]
fn test_macd_alignment() {
    let closes: Vec<f64> = geometric(60, 1.01).iter().map(|b| b.c).collect();
    let m = macd(&closes, period(12), period(26), period(9)).unwrap();
    assert_eq!(m.histogram.len(), m.signal.len());
    let last = m.histogram.len() - 1;
    let line_last = m.line[m.line.len() - 1];
    assert!((m.histogram[last] - (line_last - m.signal[last])).abs() < 1e-12);
    // Steady growth keeps the fast average above the slow one
    assert!(line_last > 0.0);
}

#[test]
fn test_macd_needs_slow_plus_signal() {
    let closes = vec![100.0; 33];
    assert!(macd(&closes, period(12), period(26), period(9)).is_err());
    let closes = vec![100.0; 34];
    assert_eq!(macd(&closes, period(12), period(26), period(9)).unwrap().histogram.len(), 1);
}

// ============================================================
// OSCILLATORS
// ============================================================

#[test]
fn test_rsi_extremes() {
    let up: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let down: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
    let flat = vec![100.0; 30];

    assert_eq!(*rsi(&up, period(14)).unwrap().last().unwrap(), 100.0);
    assert!(*rsi(&down, period(14)).unwrap().last().unwrap() < 1e-9);
    assert_eq!(*rsi(&flat, period(14)).unwrap().last().unwrap(), 50.0);
}

#[test]
fn test_stochastic_flat_window_is_midpoint() {
    let bars = vec![
        TestBar {
            o: 10.0,
            h: 10.0,
            l: 10.0,
            c: 10.0,
            v: 1.0
        };
        20
    ];
    let k = stochastic_k(&bars, period(14)).unwrap();
    assert_eq!(k.len(), 7);
    assert!(k.iter().all(|v| *v == 50.0));
}

// ============================================================
// VOLATILITY
// ============================================================

#[test]
fn test_keltner_orders_bands() {
    let bars = geometric(80, 0.995);
    let kc = keltner(&bars, period(20), period(10), 1.0).unwrap();
    let r = kc.latest().unwrap();
    assert!(r.lower < r.middle && r.middle < r.upper);
    assert!(r.atr > 0.0);

    // A steady decline leaves the close under the lower band
    let close = bars.last().unwrap().c;
    assert!(r.zone(close).level() <= -1);
}

// ============================================================
// CATALOG
// ============================================================

#[test]
fn test_compute_every_kind() {
    let bars = geometric(120, 1.01);
    let result = indicators::compute(&bars, &IndicatorParams::default()).unwrap();
    assert_eq!(result.len(), IndicatorKind::ALL.len());

    let trend = result.reading(IndicatorKind::Ema).unwrap();
    assert_eq!(trend.slope(), Slope::Rising);
    assert_eq!(
        result.get(IndicatorKind::ImpulseSystem).and_then(|v| v.impulse()),
        Some(ImpulseColor::Green)
    );
    assert!(result.current(IndicatorKind::ForceIndex).unwrap() > 0.0);
    assert!(result.get(IndicatorKind::KeltnerChannel).unwrap().band().is_some());
}

#[test]
fn test_compute_reports_missing_bars() {
    let bars = geometric(20, 1.01);
    let err = IndicatorKind::MacdHistogram
        .compute(&bars, &IndicatorParams::default())
        .unwrap_err();
    assert!(matches!(
        err,
        ScreenError::InsufficientData {
            indicator: "macd_histogram",
            need: 35,
            got: 20
        }
    ));
}

#[test]
fn test_name_round_trip() {
    for kind in IndicatorKind::ALL {
        assert_eq!(IndicatorKind::from_name(kind.name()), Some(kind));
        assert!(kind.category().catalog().contains(&kind));
    }
    assert_eq!(IndicatorKind::from_name("vwap"), None);
}

// ============================================================
// PROPERTIES
// ============================================================

proptest! {
    #[test]
    fn prop_ema_length_and_seed(
        values in prop::collection::vec(1.0f64..1000.0, 1..80),
        p in 1usize..30,
    ) {
        prop_assume!(values.len() >= p);
        let out = ema(&values, period(p)).unwrap();
        prop_assert_eq!(out.len(), values.len() - p + 1);
        let seed = sma(&values, period(p)).unwrap()[0];
        prop_assert!((out[0] - seed).abs() < 1e-9);
    }

    #[test]
    fn prop_ema_stays_within_input_range(values in prop::collection::vec(1.0f64..1000.0, 10..80)) {
        let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for v in ema(&values, period(10)).unwrap() {
            prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9);
        }
    }

    #[test]
    fn prop_rsi_bounded(values in prop::collection::vec(1.0f64..1000.0, 15..80)) {
        let out = rsi(&values, period(14)).unwrap();
        prop_assert_eq!(out.len(), values.len() - 14);
        for v in out {
            prop_assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn prop_stochastic_bounded(
        raw in prop::collection::vec((1.0f64..100.0, 0.0f64..1.0, 0.0f64..5.0, 0.0f64..5.0), 14..60),
    ) {
        let bars: Vec<TestBar> = raw
            .into_iter()
            .map(|(c, t, up, down)| {
                let o = c * (0.98 + 0.04 * t);
                TestBar { o, h: o.max(c) + up, l: (o.min(c) - down).max(0.01), c, v: 1.0 }
            })
            .collect();
        for v in stochastic_k(&bars, period(14)).unwrap() {
            prop_assert!((0.0..=100.0).contains(&v));
        }
    }
}
