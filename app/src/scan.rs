// In app/src/scan.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use api_client::{ApiClient, GatedProvider, PriceDataProvider, RateGate, StaticUniverse};
use app_config::Settings;
use chrono::{NaiveDate, Utc};
use core_types::MaKind;
use engine::{Scanner, cancellation};
use events::{LogSink, ReportSink, WebhookSink, deliver_all, render_summary, summary_line};
use strategies::{DetectionMode, create_detector};

/// Command-line overrides applied on top of the loaded settings.
#[derive(Debug, Default)]
pub struct ScanOverrides {
    pub symbols: Vec<String>,
    pub ma_kind: Option<MaKind>,
    pub fast: Option<u32>,
    pub slow: Option<u32>,
    pub threshold: Option<f64>,
    pub top_n: Option<usize>,
    pub mode: Option<DetectionMode>,
    pub workers: Option<usize>,
    pub adjusted: bool,
}

impl ScanOverrides {
    fn apply(self, settings: &mut Settings) {
        let scan = &mut settings.scan;
        if !self.symbols.is_empty() {
            scan.universe = self.symbols;
        }
        if let Some(kind) = self.ma_kind {
            scan.detection.ma_kind = kind;
        }
        if let Some(fast) = self.fast {
            scan.detection.fast_period = fast;
        }
        if let Some(slow) = self.slow {
            scan.detection.slow_period = slow;
        }
        if let Some(threshold) = self.threshold {
            scan.detection.threshold_pct = threshold;
        }
        if let Some(top_n) = self.top_n {
            scan.ranking.top_n = top_n;
        }
        if let Some(mode) = self.mode {
            scan.detection.mode = mode;
        }
        if let Some(workers) = self.workers {
            scan.workers = workers;
        }
        scan.adjusted |= self.adjusted;
    }
}

/// The logic for the `scan` command.
pub async fn handle_scan(
    mut settings: Settings,
    overrides: ScanOverrides,
    as_of: Option<NaiveDate>,
    json: Option<PathBuf>,
    notify: bool,
) -> Result<()> {
    // --- 1. Initialization ---
    overrides.apply(&mut settings);
    settings.validate()?;

    let universe = StaticUniverse::new(&settings.scan.universe);
    if universe.is_empty() {
        anyhow::bail!("No symbols to scan. Set scan.universe or pass --symbols.");
    }
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());

    // --- 2. Component Instantiation ---
    let api_client = ApiClient::new(&settings.data_provider)?;
    let gate = RateGate::new(settings.rate_limit.min_spacing(), settings.rate_limit.burst);
    let provider: Arc<dyn PriceDataProvider> = Arc::new(GatedProvider::new(api_client, gate));
    let scanner = Scanner::new(settings.scan.clone(), provider)?;

    let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(LogSink)];
    if let (true, Some(url)) = (notify, settings.notifier.webhook_url.as_deref()) {
        sinks.push(Box::new(WebhookSink::new(
            url,
            settings.notifier.batch_size,
            std::time::Duration::from_secs(settings.notifier.timeout_secs),
        )?));
    }

    // --- 3. Cancellation on Ctrl-C ---
    let (handle, token) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches and stopping.");
            handle.cancel();
        }
    });

    // --- 4. Run ---
    let outcome = scanner
        .scan_universe(&universe, as_of, &token)
        .await
        .context("crossover scan did not complete")?;

    println!("{}", render_summary(&outcome));

    if let Some(path) = json {
        let body = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote scan outcome as JSON.");
    }

    // --- 5. Deliver ---
    let summary = summary_line(&outcome);
    deliver_all(&sinks, &outcome, &summary).await;

    Ok(())
}

/// The logic for the `check-config` command.
pub fn handle_check_config(settings: &Settings) -> Result<()> {
    let detection = &settings.scan.detection;
    let detector = create_detector(detection)?;
    let universe = StaticUniverse::new(&settings.scan.universe);

    println!("Configuration OK");
    println!("  environment    : {}", settings.app.environment);
    println!("  data provider  : {}", settings.data_provider.base_url);
    println!("  detector       : {}", detector.name());
    println!(
        "  windows        : {} {}/{}",
        detection.ma_kind, detection.fast_period, detection.slow_period
    );
    println!("  threshold      : {}%", detection.threshold_pct);
    println!("  universe       : {} symbols", universe.len());
    println!("  workers        : {}", settings.scan.workers);
    println!("  rate limit     : {} ms, burst {}", settings.rate_limit.min_spacing_ms, settings.rate_limit.burst);
    println!(
        "  webhook        : {}",
        if settings.notifier.webhook_url.is_some() { "configured" } else { "none" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        app_config::load_settings_from_str(
            r#"
            [app]
            environment = "test"
            log_level = "info"

            [data_provider]
            base_url = "http://localhost:1"

            [scan]
            universe = ["AAPL"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn overrides_replace_configured_values() {
        let mut settings = settings();
        ScanOverrides {
            symbols: vec!["MSFT".to_string(), "NVDA".to_string()],
            ma_kind: Some(MaKind::Ema),
            threshold: Some(2.0),
            workers: Some(4),
            ..Default::default()
        }
        .apply(&mut settings);

        assert_eq!(settings.scan.universe, vec!["MSFT", "NVDA"]);
        assert_eq!(settings.scan.detection.ma_kind, MaKind::Ema);
        assert_eq!(settings.scan.detection.threshold_pct, 2.0);
        assert_eq!(settings.scan.workers, 4);
        assert_eq!(settings.scan.detection.fast_period, 50);
    }

    #[test]
    fn empty_overrides_keep_the_universe() {
        let mut settings = settings();
        ScanOverrides::default().apply(&mut settings);
        assert_eq!(settings.scan.universe, vec!["AAPL"]);
    }

    #[test]
    fn check_config_accepts_valid_settings() {
        assert!(handle_check_config(&settings()).is_ok());
    }
}
