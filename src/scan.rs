//! Batch scan reports and post-scan filters

use serde::{Deserialize, Serialize, Serializer};

use crate::scorer::Grade;
use crate::{ScreenError, ScreenResult};

// ============================================================
// FILTERS
// ============================================================

/// Optional post-scan filters. Every unset filter passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanFilter {
    /// Keltner level the close must be below: 0 middle, -1 lower band,
    /// -2 one ATR under the lower band
    pub kc_level: Option<i32>,
    /// RSI must be below this value
    pub rsi_below: Option<f64>,
    /// At least one detected pattern must carry one of these names
    pub patterns: Vec<String>,
}

impl ScanFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kc_level(mut self, level: i32) -> Self {
        self.kc_level = Some(level);
        self
    }

    pub fn rsi_below(mut self, threshold: f64) -> Self {
        self.rsi_below = Some(threshold);
        self
    }

    pub fn patterns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_active(&self) -> bool {
        self.kc_level.is_some() || self.rsi_below.is_some() || !self.patterns.is_empty()
    }

    pub fn status(&self, result: &ScreenResult) -> FilterStatus {
        let daily = &result.daily;
        FilterStatus {
            below_kc: self
                .kc_level
                .map_or(true, |level| daily.close < daily.keltner.threshold_for_level(level)),
            rsi_oversold: self.rsi_below.map_or(true, |limit| daily.rsi < limit),
            pattern_match: self.patterns.is_empty()
                || result.patterns.iter().any(|m| {
                    self.patterns
                        .iter()
                        .any(|name| m.pattern_id.matches_name(name))
                }),
        }
    }
}

/// Per-filter outcome for one result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterStatus {
    pub below_kc: bool,
    pub rsi_oversold: bool,
    pub pattern_match: bool,
}

impl FilterStatus {
    #[inline]
    pub fn matched(&self) -> bool {
        self.below_kc && self.rsi_oversold && self.pattern_match
    }
}

// ============================================================
// REPORT
// ============================================================

/// A symbol that could not be scored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanFailure {
    pub symbol: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: ScreenError,
}

fn serialize_display<S: Serializer>(error: &ScreenError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeSummary {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub avoid: usize,
}

impl GradeSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ScreenResult>) -> Self {
        let mut summary = Self::default();
        for r in results {
            match r.grade {
                Grade::A => summary.a += 1,
                Grade::B => summary.b += 1,
                Grade::C => summary.c += 1,
                Grade::Avoid => summary.avoid += 1,
            }
        }
        summary
    }
}

/// Outcome of a batch scan. Results are sorted by signal strength
/// (descending), ties broken by symbol.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub results: Vec<ScreenResult>,
    pub failures: Vec<ScanFailure>,
    /// Symbols the scan started, scored or not
    pub attempted: usize,
    pub filter: ScanFilter,
    pub grades: GradeSummary,
}

impl ScanReport {
    pub fn new(
        mut results: Vec<ScreenResult>,
        mut failures: Vec<ScanFailure>,
        attempted: usize,
        filter: ScanFilter,
    ) -> Self {
        results.sort_by(|a, b| {
            b.signal_strength
                .cmp(&a.signal_strength)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        let grades = GradeSummary::from_results(&results);
        Self {
            results,
            failures,
            attempted,
            filter,
            grades,
        }
    }

    #[inline]
    pub fn scored(&self) -> usize {
        self.results.len()
    }

    /// Filter outcome for each result, in result order
    pub fn statuses(&self) -> impl Iterator<Item = (&ScreenResult, FilterStatus)> {
        self.results.iter().map(|r| (r, self.filter.status(r)))
    }

    /// Results passing every active filter
    pub fn matched(&self) -> impl Iterator<Item = &ScreenResult> {
        self.statuses()
            .filter(|(_, status)| status.matched())
            .map(|(r, _)| r)
    }

    /// Results graded A
    pub fn trades(&self) -> impl Iterator<Item = &ScreenResult> {
        self.results.iter().filter(|r| r.is_a_trade())
    }

    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ScreenError::InvalidConfig(e.to_string()))
    }
}
