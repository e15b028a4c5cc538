// In crates/app-config/src/types.rs

use std::time::Duration;

use analytics::types::RankingSettings;
use core_types::{Error, Result};
use serde::Deserialize;
use strategies::types::DetectionSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the daily price data provider.
    pub data_provider: DataProviderSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    pub scan: ScanSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
}

impl Settings {
    /// Rejects settings a scan could not start with.
    pub fn validate(&self) -> Result<()> {
        self.data_provider.validate()?;
        self.rate_limit.validate()?;
        self.scan.validate()?;
        self.notifier.validate()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DataProviderSettings {
    /// Base URL of a Yahoo-compatible chart API.
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Retries on HTTP 429 and 5xx, on top of the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every further retry.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl DataProviderSettings {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::Configuration("data_provider.base_url is empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Configuration(
                "data_provider.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

/// Token-bucket gate in front of the data provider.
#[derive(Deserialize, Debug, Clone)]
pub struct RateLimitSettings {
    /// One token is refilled every `min_spacing_ms`. Zero disables the gate.
    #[serde(default = "default_min_spacing_ms")]
    pub min_spacing_ms: u64,
    /// Tokens available up front.
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            min_spacing_ms: default_min_spacing_ms(),
            burst: default_burst(),
        }
    }
}

impl RateLimitSettings {
    pub fn validate(&self) -> Result<()> {
        if self.burst == 0 {
            return Err(Error::Configuration("rate_limit.burst must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn min_spacing(&self) -> Duration {
        Duration::from_millis(self.min_spacing_ms)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ScanSettings {
    /// Symbols to scan, in processing order.
    #[serde(default)]
    pub universe: Vec<String>,
    /// Instruments evaluated concurrently. 1 means strictly sequential.
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Calendar days of history requested per instrument.
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    /// Use split/dividend adjusted closes.
    #[serde(default)]
    pub adjusted: bool,
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            universe: Vec::new(),
            workers: default_workers(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            history_days: default_history_days(),
            adjusted: false,
            detection: DetectionSettings::default(),
            ranking: RankingSettings::default(),
        }
    }
}

impl ScanSettings {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Configuration("scan.workers must be at least 1".to_string()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(Error::Configuration("scan.fetch_timeout_secs must be positive".to_string()));
        }
        // Calendar days, so a slow window of N trading days needs noticeably more than N.
        if (self.history_days as u64) < self.detection.slow_period as u64 {
            return Err(Error::Configuration(format!(
                "scan.history_days ({}) is shorter than the slow window ({})",
                self.history_days, self.detection.slow_period
            )));
        }
        self.detection.validate()?;
        self.ranking.validate()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct NotifierSettings {
    /// Where finished reports are posted. No URL means reports are only logged.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Maximum result rows per webhook message.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            batch_size: default_batch_size(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl NotifierSettings {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Configuration("notifier.batch_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Helper functions for serde defaults
fn default_user_agent() -> String { "crossover-scanner/0.1".to_string() }
fn default_request_timeout_secs() -> u64 { 20 }
fn default_max_retries() -> u32 { 3 }
fn default_initial_backoff_ms() -> u64 { 500 }
fn default_min_spacing_ms() -> u64 { 250 }
fn default_burst() -> u32 { 1 }
fn default_workers() -> usize { 1 }
fn default_fetch_timeout_secs() -> u64 { 30 }
fn default_history_days() -> u32 { 400 }
fn default_batch_size() -> usize { 25 }
