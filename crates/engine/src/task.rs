use std::time::Duration;

use api_client::PriceDataProvider;
use chrono::NaiveDate;
use core_types::{ScanResult, SkipReason, Symbol};
use strategies::Detector;

/// What happened to one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Scored and accepted by the detection mode; still subject to ranking.
    Admitted(ScanResult),
    Skipped { symbol: Symbol, reason: SkipReason },
}

/// The inclusive date range requested from the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The pipeline for a single instrument: fetch, then assess, then admit.
///
/// Never fails: every error becomes a `Skipped` evaluation with its reason.
pub struct SymbolTask<'a> {
    pub provider: &'a dyn PriceDataProvider,
    pub detector: &'a dyn Detector,
    pub window: FetchWindow,
    pub fetch_timeout: Duration,
    pub adjusted: bool,
}

impl SymbolTask<'_> {
    pub async fn run(&self, symbol: Symbol) -> Evaluation {
        // --- 1. Fetch ---
        // Queueing for the rate limit does not count against the fetch deadline.
        self.provider.ready().await;
        let fetch = self
            .provider
            .fetch_daily_closes(&symbol, self.window.start, self.window.end, self.adjusted);
        let mut raw = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!(symbol = %symbol, error = %e, "Price data unavailable.");
                return skipped(symbol, SkipReason::DataUnavailable);
            }
            Err(_) => {
                tracing::warn!(
                    symbol = %symbol,
                    timeout_secs = self.fetch_timeout.as_secs_f64(),
                    "Price fetch timed out."
                );
                return skipped(symbol, SkipReason::DataUnavailable);
            }
        };

        // Nothing after the evaluation date may influence it.
        raw.retain(|point| point.date <= self.window.end);

        // --- 2. Assess ---
        let result = match self.detector.assess(&symbol, &raw) {
            Ok(result) => result,
            Err(e) => {
                let reason = e.skip_reason().unwrap_or_else(|| {
                    tracing::error!(symbol = %symbol, error = %e, "Unexpected error while assessing symbol.");
                    SkipReason::DataUnavailable
                });
                tracing::debug!(symbol = %symbol, %reason, error = %e, "Symbol skipped.");
                return skipped(symbol, reason);
            }
        };

        // --- 3. Admit ---
        match self.detector.exclusion_reason(&result) {
            Some(reason) => {
                tracing::debug!(symbol = %symbol, %reason, state = %result.state, "Excluded by detection mode.");
                skipped(symbol, reason)
            }
            None => Evaluation::Admitted(result),
        }
    }
}

fn skipped(symbol: Symbol, reason: SkipReason) -> Evaluation {
    Evaluation::Skipped { symbol, reason }
}
