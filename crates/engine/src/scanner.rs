// In crates/engine/src/scanner.rs

use std::collections::HashSet;
use std::sync::Arc;

use analytics::RankingAggregator;
use api_client::{PriceDataProvider, UniverseProvider};
use app_config::types::ScanSettings;
use chrono::{Days, NaiveDate};
use core_types::{Error, Result, ScanDiagnostics, ScanOutcome, Symbol};
use futures::{StreamExt, stream};
use strategies::{Detector, create_detector};

use crate::cancel::CancelToken;
use crate::task::{Evaluation, FetchWindow, SymbolTask};

/// Runs one scan over a universe of instruments.
///
/// The scanner owns only read-only state, so a single instance can serve any
/// number of sequential scans.
pub struct Scanner {
    settings: ScanSettings,
    detector: Arc<dyn Detector>,
    aggregator: RankingAggregator,
    provider: Arc<dyn PriceDataProvider>,
}

impl Scanner {
    /// Validates the settings and builds the detector and aggregator.
    ///
    /// Any invalid setting is reported here, before a single fetch is made.
    pub fn new(settings: ScanSettings, provider: Arc<dyn PriceDataProvider>) -> Result<Self> {
        settings.validate()?;
        let detector: Arc<dyn Detector> = Arc::from(create_detector(&settings.detection)?);
        let aggregator = RankingAggregator::new(settings.ranking.clone(), settings.detection.threshold_pct)?;
        Ok(Self {
            settings,
            detector,
            aggregator,
            provider,
        })
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Scans whatever the universe provider lists.
    pub async fn scan_universe(
        &self,
        universe: &dyn UniverseProvider,
        as_of: NaiveDate,
        cancel: &CancelToken,
    ) -> Result<ScanOutcome> {
        let symbols = universe
            .symbols()
            .await
            .map_err(|e| Error::DataUnavailable(format!("instrument universe: {e}")))?;
        self.scan(&symbols, as_of, cancel).await
    }

    /// Evaluates every symbol as of `as_of` and ranks the survivors.
    ///
    /// Per-symbol failures are tallied in the diagnostics and never abort the
    /// scan. Cancellation stops new fetches, lets in-flight ones finish, and
    /// returns `Error::Cancelled` without a report.
    pub async fn scan(&self, symbols: &[Symbol], as_of: NaiveDate, cancel: &CancelToken) -> Result<ScanOutcome> {
        // --- 1. Fix the processing order ---
        let mut seen = HashSet::new();
        let unique: Vec<Symbol> = symbols.iter().filter(|s| seen.insert(*s)).cloned().collect();

        let window = FetchWindow {
            start: as_of
                .checked_sub_days(Days::new(u64::from(self.settings.history_days)))
                .unwrap_or(NaiveDate::MIN),
            end: as_of,
        };
        let workers = self.settings.workers.max(1);

        tracing::info!(
            detector = self.detector.name(),
            symbols = unique.len(),
            workers,
            %as_of,
            "Starting crossover scan."
        );

        let task = SymbolTask {
            provider: self.provider.as_ref(),
            detector: self.detector.as_ref(),
            window,
            fetch_timeout: self.settings.fetch_timeout(),
            adjusted: self.settings.adjusted,
        };

        // --- 2. Evaluate, at most `workers` symbols in flight, in input order ---
        let evaluations: Vec<Option<Evaluation>> = stream::iter(unique.iter().cloned())
            .map(|symbol| {
                let task = &task;
                async move {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(task.run(symbol).await)
                }
            })
            .buffered(workers)
            .collect()
            .await;

        if cancel.is_cancelled() {
            let completed = evaluations.iter().flatten().count();
            tracing::warn!(completed, total = unique.len(), "Scan cancelled, discarding partial results.");
            return Err(Error::Cancelled);
        }

        // --- 3. Tally ---
        let mut diagnostics = ScanDiagnostics::new(unique.len());
        let mut admitted = Vec::new();
        for evaluation in evaluations.into_iter().flatten() {
            match evaluation {
                Evaluation::Admitted(result) => admitted.push(result),
                Evaluation::Skipped { reason, .. } => diagnostics.record_skip(reason),
            }
        }

        // --- 4. Rank ---
        let ranking = self.aggregator.rank(&admitted);
        for (_, reason) in &ranking.rejected {
            diagnostics.record_skip(*reason);
        }
        diagnostics.processed_count = ranking.report.len() + ranking.truncated;
        diagnostics.truncated_count = ranking.truncated;

        tracing::info!(
            universe = diagnostics.universe_size,
            processed = diagnostics.processed_count,
            skipped = diagnostics.skipped_count,
            errors = diagnostics.error_count(),
            reported = ranking.report.len(),
            "Crossover scan finished."
        );

        Ok(ScanOutcome {
            report: ranking.report,
            diagnostics,
        })
    }
}
