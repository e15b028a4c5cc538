// In crates/core-types/src/report.rs

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CrossEvent, CrossKind, CrossState, Momentum, Symbol};

/// The per-instrument outcome of a successful evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub symbol: Symbol,
    /// Date of the last close the evaluation is based on.
    pub as_of: NaiveDate,
    pub last_close: f64,
    pub fast_ma: f64,
    pub slow_ma: f64,
    /// `|fast - slow| / slow * 100` at the last point.
    pub distance_pct: f64,
    /// How much the absolute gap shrank over the last bar, in price units.
    pub velocity: f64,
    /// `velocity` as a percentage of the slow average.
    pub slope: f64,
    pub projected_days_to_cross: Option<f64>,
    pub state: CrossState,
    pub momentum: Momentum,
    /// The kind of cross that would happen if the averages met.
    pub pending_cross: CrossKind,
    pub last_cross: Option<CrossEvent>,
    /// Heuristic ranking aid in `[0, 100]`. Not a probability.
    pub score: f64,
}

/// Why an instrument did not make it into the ranked report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InsufficientHistory,
    DegenerateSeries,
    DataUnavailable,
    OutsideThreshold,
    CrossedRecently,
    NotConverging,
    NoRecentCross,
}

impl SkipReason {
    /// True for reasons that come from a failure rather than a filter.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SkipReason::InsufficientHistory | SkipReason::DegenerateSeries | SkipReason::DataUnavailable
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::InsufficientHistory => "insufficient history",
            SkipReason::DegenerateSeries => "degenerate series",
            SkipReason::DataUnavailable => "data unavailable",
            SkipReason::OutsideThreshold => "outside threshold",
            SkipReason::CrossedRecently => "crossed recently",
            SkipReason::NotConverging => "not converging",
            SkipReason::NoRecentCross => "no recent cross",
        };
        f.write_str(label)
    }
}

/// Counts describing what happened to every symbol in a scan.
///
/// `processed_count + skipped_count == universe_size` always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostics {
    pub universe_size: usize,
    /// Instruments admitted to ranking.
    pub processed_count: usize,
    pub skipped_count: usize,
    /// Admitted instruments that fell below the `top_n` cut.
    pub truncated_count: usize,
    pub failure_breakdown: BTreeMap<SkipReason, usize>,
}

impl ScanDiagnostics {
    pub fn new(universe_size: usize) -> Self {
        Self {
            universe_size,
            ..Self::default()
        }
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        self.skipped_count += 1;
        *self.failure_breakdown.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.failure_breakdown.get(&reason).copied().unwrap_or(0)
    }

    /// Skips caused by failures, as opposed to filters.
    pub fn error_count(&self) -> usize {
        self.failure_breakdown
            .iter()
            .filter(|(reason, _)| reason.is_error())
            .map(|(_, count)| count)
            .sum()
    }
}

/// The ranked, bounded output of a single scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<ScanResult>,
}

impl ScanReport {
    pub fn new(results: Vec<ScanResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            results,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Everything a finished scan surfaces: the report plus its diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub report: ScanReport,
    pub diagnostics: ScanDiagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_split_errors_from_filters() {
        let mut diag = ScanDiagnostics::new(4);
        diag.record_skip(SkipReason::InsufficientHistory);
        diag.record_skip(SkipReason::OutsideThreshold);
        diag.record_skip(SkipReason::OutsideThreshold);
        diag.processed_count = 1;

        assert_eq!(diag.skipped_count, 3);
        assert_eq!(diag.error_count(), 1);
        assert_eq!(diag.skipped_for(SkipReason::OutsideThreshold), 2);
        assert_eq!(diag.skipped_for(SkipReason::DataUnavailable), 0);
        assert_eq!(diag.processed_count + diag.skipped_count, diag.universe_size);
    }
}
