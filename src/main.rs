// =============================================================================
// Equiscan — Main Entry Point
// =============================================================================
//
// Technical screening service for daily equity data: keeps a SQLite store of
// OHLCV history fresh via a provider refresh job, and serves indicator
// detail + bulk screening over a REST API.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod config;
mod errors;
mod indicators;
mod models;
mod provider;
mod screener;
mod store;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::ScreenerConfig;
use crate::store::SqliteStore;

const CONFIG_PATH: &str = "screener_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║              Equiscan — Starting Up                     ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = ScreenerConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ScreenerConfig::default()
    });

    // Env overrides.
    if let Ok(addr) = std::env::var("EQUISCAN_BIND_ADDR") {
        config.bind_addr = addr;
    }
    if let Ok(path) = std::env::var("EQUISCAN_DB_PATH") {
        config.db_path = path;
    }
    if let Ok(syms) = std::env::var("EQUISCAN_SYMBOLS") {
        config.symbols = syms
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    info!(
        symbols = ?config.symbols,
        db_path = %config.db_path,
        "Configured screening universe"
    );

    // ── 2. Open the series store ─────────────────────────────────────────
    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("failed to open series store at {}", config.db_path))?;

    // ── 3. Build shared state ────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, store));

    // ── 4. Market-data refresh loop ──────────────────────────────────────
    let refresh_state = state.clone();
    tokio::spawn(async move {
        provider::run_refresh_loop(refresh_state).await;
    });

    // ── 5. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr_clone = bind_addr.clone();
    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr_clone)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr_clone, "API server listening");
        axum::serve(listener, app).await.expect("API server failed");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save config on shutdown");
    }

    info!("Equiscan shut down complete.");
    Ok(())
}
