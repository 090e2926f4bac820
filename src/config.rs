// =============================================================================
// Service Configuration — JSON file with serde defaults and atomic save
// =============================================================================
//
// Every tunable of the screener lives here. All fields carry
// `#[serde(default)]` so that adding new fields never breaks loading an
// older config file. Persistence uses an atomic tmp + rename pattern to
// prevent corruption on crash.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_db_path() -> String {
    "data/stock_data.db".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_provider_base_url() -> String {
    "http://localhost:8010/api".to_string()
}

fn default_refresh_interval_hours() -> u64 {
    24
}

fn default_true() -> bool {
    true
}

fn default_symbols() -> Vec<String> {
    vec![
        "AAPL".to_string(),
        "MSFT".to_string(),
        "GOOGL".to_string(),
        "AMZN".to_string(),
        "NVDA".to_string(),
    ]
}

// =============================================================================
// ScreenerConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Path to the SQLite series store.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Address the HTTP API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the daily-bars provider.
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    /// Hours between market-data refresh rounds.
    #[serde(default = "default_refresh_interval_hours")]
    pub refresh_interval_hours: u64,

    /// Run a refresh round immediately on startup.
    #[serde(default = "default_true")]
    pub refresh_on_startup: bool,

    /// Symbols the refresh job keeps up to date.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            provider_base_url: default_provider_base_url(),
            refresh_interval_hours: default_refresh_interval_hours(),
            refresh_on_startup: true,
            symbols: default_symbols(),
        }
    }
}

impl ScreenerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            "config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }
}
