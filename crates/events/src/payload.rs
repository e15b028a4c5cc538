// --- Notification payloads and summary rendering ---

use chrono::{DateTime, Utc};
use core_types::{ScanDiagnostics, ScanOutcome, ScanResult};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// The headline message of a delivered report.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub generated_at: DateTime<Utc>,
    pub text: String,
    pub diagnostics: ScanDiagnostics,
}

/// One slice of the ranked results.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBatch {
    /// 1-based batch number.
    pub batch: usize,
    pub total_batches: usize,
    pub results: Vec<ScanResult>,
}

/// The top-level notifier message.
/// `tag` and `content` are used by serde for clean JSON representation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotifierMessage {
    Summary(ScanSummary),
    Results(ResultBatch),
}

/// Splits an outcome into a summary message followed by result batches.
pub fn build_messages(outcome: &ScanOutcome, summary: &str, batch_size: usize) -> Vec<NotifierMessage> {
    let batch_size = batch_size.max(1);
    let results = &outcome.report.results;
    let total_batches = results.len().div_ceil(batch_size);

    let mut messages = Vec::with_capacity(total_batches + 1);
    messages.push(NotifierMessage::Summary(ScanSummary {
        generated_at: outcome.report.generated_at,
        text: summary.to_string(),
        diagnostics: outcome.diagnostics.clone(),
    }));
    messages.extend(results.chunks(batch_size).enumerate().map(|(i, chunk)| {
        NotifierMessage::Results(ResultBatch {
            batch: i + 1,
            total_batches,
            results: chunk.to_vec(),
        })
    }));
    messages
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Close")]
    close: String,
    #[tabled(rename = "Fast")]
    fast: String,
    #[tabled(rename = "Slow")]
    slow: String,
    #[tabled(rename = "Dist %")]
    distance: String,
    #[tabled(rename = "Slope %")]
    slope: String,
    #[tabled(rename = "ETA (bars)")]
    eta: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Pending")]
    pending: String,
    #[tabled(rename = "Score")]
    score: String,
}

impl ReportRow {
    fn new(rank: usize, r: &ScanResult) -> Self {
        Self {
            rank,
            symbol: r.symbol.to_string(),
            close: format!("{:.2}", r.last_close),
            fast: format!("{:.2}", r.fast_ma),
            slow: format!("{:.2}", r.slow_ma),
            distance: format!("{:.3}", r.distance_pct),
            slope: format!("{:+.4}", r.slope),
            eta: r.projected_days_to_cross.map_or_else(|| "-".to_string(), |d| format!("{d:.1}")),
            state: r.state.to_string(),
            pending: r.pending_cross.to_string(),
            score: format!("{:.1}", r.score),
        }
    }
}

/// A one-line headline with the scan counts.
pub fn summary_line(outcome: &ScanOutcome) -> String {
    let diag = &outcome.diagnostics;
    let mut line = format!(
        "Crossover scan: {} reported of {} symbols ({} admitted, {} skipped, {} below top-N)",
        outcome.report.len(),
        diag.universe_size,
        diag.processed_count,
        diag.skipped_count,
        diag.truncated_count,
    );
    if !diag.failure_breakdown.is_empty() {
        let parts: Vec<String> = diag
            .failure_breakdown
            .iter()
            .map(|(reason, count)| format!("{reason}: {count}"))
            .collect();
        line.push_str(&format!(" [{}]", parts.join(", ")));
    }
    line
}

/// The headline followed by a table of the ranked results.
pub fn render_summary(outcome: &ScanOutcome) -> String {
    let headline = summary_line(outcome);
    if outcome.report.is_empty() {
        return format!("{headline}\nNo instruments matched.");
    }
    let rows: Vec<ReportRow> = outcome
        .report
        .results
        .iter()
        .enumerate()
        .map(|(i, r)| ReportRow::new(i + 1, r))
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    format!("{headline}\n{table}")
}
