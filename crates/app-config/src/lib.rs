// In crates/app-config/src/lib.rs

use std::path::Path;

use config::{Config, Environment, File, Map};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    AppSettings, DataProviderSettings, NotifierSettings, RateLimitSettings, ScanSettings, Settings,
};

/// Loads the application settings from the TOML files in `dir`.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
///
/// The merged settings are validated before they are returned.
pub fn load_settings_from_dir(dir: impl AsRef<Path>) -> Result<Settings> {
    load_layered(dir.as_ref(), None)
}

/// `vars` replaces the process environment when given.
fn load_layered(dir: &Path, vars: Option<Map<String, String>>) -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = match &vars {
        Some(vars) => vars.get("APP_ENVIRONMENT").cloned(),
        None => std::env::var("APP_ENVIRONMENT").ok(),
    }
    .unwrap_or_else(|| "development".into());

    let settings = Config::builder()
        // 1. Load the base configuration file.
        .add_source(File::with_name(&dir.join("base").to_string_lossy()))
        // 2. Load the environment-specific configuration file.
        .add_source(File::with_name(&dir.join(&environment).to_string_lossy()).required(false))
        // 3. Load settings from environment variables (e.g., `APP_NOTIFIER__WEBHOOK_URL=...`).
        // The prefix is `APP`, separator is `__`.
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("scan.universe")
                .try_parsing(true)
                .source(vars),
        )
        .build()?;

    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

/// Parses and validates settings from a single TOML document.
pub fn load_settings_from_str(content: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(content)?;
    settings.validate()?;
    Ok(settings)
}
