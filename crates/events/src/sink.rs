// In crates/events/src/sink.rs

use std::time::Duration;

use async_trait::async_trait;
use core_types::ScanOutcome;

use crate::error::{Error, Result};
use crate::payload::{NotifierMessage, build_messages};

/// Somewhere a finished scan is delivered to.
///
/// Delivery happens after the scan is complete; a failing sink never
/// changes the outcome it was handed.
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn deliver(&self, outcome: &ScanOutcome, summary: &str) -> Result<()>;
}

/// Writes the summary to the log.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, outcome: &ScanOutcome, summary: &str) -> Result<()> {
        tracing::info!(
            reported = outcome.report.len(),
            universe = outcome.diagnostics.universe_size,
            "\n{summary}"
        );
        Ok(())
    }
}

/// Posts the report as JSON messages to a webhook.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    http_client: reqwest::Client,
    url: String,
    batch_size: usize,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, batch_size: usize, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        Ok(Self {
            http_client,
            url: url.into(),
            batch_size: batch_size.max(1),
        })
    }

    async fn post(&self, message: &NotifierMessage) -> Result<()> {
        let response = self
            .http_client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { status: status.as_u16() });
        }
        Ok(())
    }
}

#[async_trait]
impl ReportSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, outcome: &ScanOutcome, summary: &str) -> Result<()> {
        let messages = build_messages(outcome, summary, self.batch_size);
        let total = messages.len();
        for (i, message) in messages.iter().enumerate() {
            self.post(message).await?;
            tracing::debug!(message = i + 1, total, "Posted webhook message.");
        }
        tracing::info!(messages = total, "Delivered scan report to webhook.");
        Ok(())
    }
}

/// Delivers to every sink, logging failures instead of returning them.
///
/// Returns the number of sinks that succeeded.
pub async fn deliver_all(sinks: &[Box<dyn ReportSink>], outcome: &ScanOutcome, summary: &str) -> usize {
    let mut delivered = 0;
    for sink in sinks {
        match sink.deliver(outcome, summary).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(sink = sink.name(), error = %e, "Report delivery failed."),
        }
    }
    delivered
}
