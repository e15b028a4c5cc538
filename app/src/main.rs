// In app/src/main.rs

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use core_types::MaKind;
use strategies::DetectionMode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

mod scan;

use crate::scan::ScanOverrides;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Scans a universe of instruments for moving-average crossovers.")]
struct Cli {
    /// Directory holding base.toml and the per-environment overrides.
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs one scan and prints the ranked report.
    Scan {
        /// Comma-separated symbols to scan instead of the configured universe.
        #[arg(short, long, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Moving average type: sma or ema.
        #[arg(long, value_parser = parse_ma_kind)]
        ma_kind: Option<MaKind>,

        #[arg(long)]
        fast: Option<u32>,

        #[arg(long)]
        slow: Option<u32>,

        /// Maximum distance between the averages, in percent of the slow one.
        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long)]
        top_n: Option<usize>,

        /// Detection mode: anticipation, proximity or exact_cross.
        #[arg(long, value_parser = parse_mode)]
        mode: Option<DetectionMode>,

        /// Instruments evaluated concurrently.
        #[arg(short, long)]
        workers: Option<usize>,

        /// Evaluate as of this date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Use split/dividend adjusted closes.
        #[arg(long)]
        adjusted: bool,

        /// Also write the full outcome as JSON to this file.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Skip the webhook even if one is configured.
        #[arg(long)]
        no_notify: bool,
    },

    /// Loads and validates the configuration, then exits.
    CheckConfig,
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    // Parse command-line arguments.
    let cli = Cli::parse();

    let settings = app_config::load_settings_from_dir(&cli.config_dir)?;
    init_tracing(&settings.app.log_level);

    tracing::info!(environment = %settings.app.environment, "Starting crossover scanner");

    // Match on the parsed command and call the appropriate handler.
    match cli.command {
        Commands::Scan {
            symbols,
            ma_kind,
            fast,
            slow,
            threshold,
            top_n,
            mode,
            workers,
            as_of,
            adjusted,
            json,
            no_notify,
        } => {
            let overrides = ScanOverrides {
                symbols,
                ma_kind,
                fast,
                slow,
                threshold,
                top_n,
                mode,
                workers,
                adjusted,
            };
            scan::handle_scan(settings, overrides, as_of, json, !no_notify).await?;
        }
        Commands::CheckConfig => {
            scan::handle_check_config(&settings)?;
        }
    }

    tracing::info!("Crossover scanner has finished successfully.");

    Ok(())
}

/// Logs go to stderr so stdout carries only the report.
/// `RUST_LOG`, when set, replaces the configured level.
fn init_tracing(log_level: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => {
            tracing_subscriber::registry().with(fmt_layer.with_filter(env_filter)).init();
        }
        Err(_) => {
            let level = log_level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
            let targets = Targets::new()
                .with_target("hyper_util", tracing::Level::WARN) // Connection pool chatter
                .with_target("reqwest", tracing::Level::WARN)
                .with_default(level);
            tracing_subscriber::registry().with(fmt_layer.with_filter(targets)).init();
        }
    }
}

fn parse_ma_kind(value: &str) -> std::result::Result<MaKind, String> {
    match value.to_ascii_lowercase().as_str() {
        "sma" => Ok(MaKind::Sma),
        "ema" => Ok(MaKind::Ema),
        other => Err(format!("unknown moving average type '{other}' (expected sma or ema)")),
    }
}

fn parse_mode(value: &str) -> std::result::Result<DetectionMode, String> {
    match value.to_ascii_lowercase().replace('-', "_").as_str() {
        "anticipation" => Ok(DetectionMode::Anticipation),
        "proximity" => Ok(DetectionMode::Proximity),
        "exact_cross" => Ok(DetectionMode::ExactCross),
        other => Err(format!(
            "unknown detection mode '{other}' (expected anticipation, proximity or exact_cross)"
        )),
    }
}
