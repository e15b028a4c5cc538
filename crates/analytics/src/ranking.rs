// In crates/analytics/src/ranking.rs

use std::cmp::Ordering;
use std::collections::HashSet;

use core_types::{Result, ScanReport, ScanResult, SkipReason, Symbol};

use crate::types::{RankingSettings, SortKey};

/// The aggregator's output: the bounded report plus what it left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub report: ScanReport,
    /// Symbols filtered out before ranking, in input order.
    pub rejected: Vec<(Symbol, SkipReason)>,
    /// Admitted results that did not fit under `top_n`.
    pub truncated: usize,
}

/// Filters, orders and truncates per-instrument results into a `ScanReport`.
#[derive(Debug, Clone)]
pub struct RankingAggregator {
    settings: RankingSettings,
    threshold_pct: f64,
}

impl RankingAggregator {
    pub fn new(settings: RankingSettings, threshold_pct: f64) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            threshold_pct,
        })
    }

    /// Ranks a snapshot of results. The input is never modified.
    ///
    /// A symbol appearing more than once keeps only its best-ranked entry.
    /// Ordering is total (score, distance, then symbol), so the same set of
    /// results always produces the same report regardless of input order.
    pub fn rank(&self, results: &[ScanResult]) -> Ranking {
        let total = results.len();
        let mut rejected = Vec::new();

        // 1. Filter out results outside the distance threshold.
        let mut admitted: Vec<ScanResult> = results
            .iter()
            .filter(|result| {
                let outside = self.settings.threshold_enabled && result.distance_pct > self.threshold_pct;
                if outside {
                    rejected.push((result.symbol.clone(), SkipReason::OutsideThreshold));
                }
                !outside
            })
            .cloned()
            .collect();

        // 2. Sort into a total order.
        let sort_by = self.settings.sort_by;
        admitted.sort_by(|a, b| compare(a, b, sort_by));

        // 3. Keep only the best-ranked entry per symbol.
        let mut seen = HashSet::new();
        admitted.retain(|result| seen.insert(result.symbol.clone()));

        // 4. Truncate to the top N.
        let truncated = admitted.len().saturating_sub(self.settings.top_n);
        admitted.truncate(self.settings.top_n);

        tracing::info!(
            total,
            rejected = rejected.len(),
            truncated,
            reported = admitted.len(),
            "Finished ranking scan results."
        );

        Ranking {
            report: ScanReport::new(admitted),
            rejected,
            truncated,
        }
    }
}

fn by_score_desc(a: &ScanResult, b: &ScanResult) -> Ordering {
    b.score.total_cmp(&a.score)
}

fn by_distance_asc(a: &ScanResult, b: &ScanResult) -> Ordering {
    a.distance_pct.total_cmp(&b.distance_pct)
}

fn compare(a: &ScanResult, b: &ScanResult, sort_by: SortKey) -> Ordering {
    let primary = match sort_by {
        SortKey::Score => by_score_desc(a, b).then_with(|| by_distance_asc(a, b)),
        SortKey::Distance => by_distance_asc(a, b).then_with(|| by_score_desc(a, b)),
    };
    primary.then_with(|| a.symbol.cmp(&b.symbol))
}
