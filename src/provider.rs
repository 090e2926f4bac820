// =============================================================================
// Market-Data Provider — daily OHLCV download + periodic refresh
// =============================================================================
//
// Pull-based acquisition: a small REST client fetches up to a year of daily
// bars per symbol from the configured provider endpoint, and a background
// task upserts them into the series store on a fixed cadence. A symbol that
// fails to download is logged and skipped; the refresh round always runs to
// completion. Raw bars only — computed indicators are never persisted.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::models::Bar;

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
struct DailyBarsResponse {
    bars: Vec<ProviderBar>,
}

#[derive(Debug, Deserialize)]
struct ProviderBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl From<ProviderBar> for Bar {
    fn from(p: ProviderBar) -> Self {
        Bar {
            date: p.date,
            open: p.open,
            high: p.high,
            low: p.low,
            close: p.close,
            volume: p.volume,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// REST client for the daily-bars provider endpoint.
#[derive(Clone)]
pub struct MarketDataClient {
    base_url: String,
    client: reqwest::Client,
}

impl MarketDataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// GET {base}/daily?symbol=SYM — fetch the symbol's daily bar history.
    pub async fn fetch_daily(&self, symbol: &str) -> Result<Vec<Bar>> {
        let url = format!("{}/daily?symbol={}", self.base_url, symbol);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("daily bars request failed for {symbol}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("provider returned {status} for {symbol}");
        }

        let body: DailyBarsResponse = resp
            .json()
            .await
            .with_context(|| format!("failed to parse daily bars for {symbol}"))?;

        let mut bars: Vec<Bar> = body.bars.into_iter().map(Bar::from).collect();
        // Provider output is not guaranteed chronological.
        bars.sort_by_key(|b| b.date);

        debug!(symbol, count = bars.len(), "daily bars fetched");
        Ok(bars)
    }
}

// =============================================================================
// Refresh job
// =============================================================================

/// Download and store fresh bars for every configured symbol.
/// Returns `(refreshed, failed)` counts.
pub async fn refresh_universe(state: &Arc<AppState>) -> (usize, usize) {
    let (symbols, base_url) = {
        let config = state.config.read();
        (config.symbols.clone(), config.provider_base_url.clone())
    };
    let client = MarketDataClient::new(base_url);

    info!(count = symbols.len(), "market-data refresh starting");
    let mut refreshed = 0usize;
    let mut failed = 0usize;

    for symbol in &symbols {
        match client.fetch_daily(symbol).await {
            Ok(bars) if bars.is_empty() => {
                warn!(symbol = %symbol, "provider returned no bars");
                failed += 1;
            }
            Ok(bars) => {
                let stored = state
                    .store
                    .upsert_bars(symbol, &bars)
                    .and_then(|count| {
                        state.store.upsert_symbol(symbol, None)?;
                        Ok(count)
                    });
                match stored {
                    Ok(count) => {
                        info!(symbol = %symbol, bars = count, "series refreshed");
                        refreshed += 1;
                    }
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "failed to store bars");
                        failed += 1;
                    }
                }
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "provider fetch failed");
                failed += 1;
            }
        }
    }

    if failed == 0 {
        *state.last_refresh_ok.write() = Some(chrono::Utc::now());
        *state.last_refresh_error.write() = None;
    } else {
        *state.last_refresh_error.write() =
            Some(format!("{failed} of {} symbols failed", symbols.len()));
    }

    info!(refreshed, failed, "market-data refresh complete");
    (refreshed, failed)
}

/// Background refresh loop: optional immediate run, then a fixed cadence.
pub async fn run_refresh_loop(state: Arc<AppState>) {
    let (on_startup, interval_hours) = {
        let config = state.config.read();
        (config.refresh_on_startup, config.refresh_interval_hours)
    };

    if on_startup {
        refresh_universe(&state).await;
    }

    let period = Duration::from_secs(interval_hours.max(1) * 3600);
    loop {
        tokio::time::sleep(period).await;
        refresh_universe(&state).await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_bars_response_parses() {
        let json = r#"{
            "symbol": "AAPL",
            "bars": [
                {"date": "2024-06-03", "open": 192.9, "high": 194.99,
                 "low": 192.52, "close": 194.03, "volume": 50080500},
                {"date": "2024-06-04", "open": 194.64, "high": 195.32,
                 "low": 193.03, "close": 194.35, "volume": 47471400}
            ]
        }"#;
        let parsed: DailyBarsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.bars.len(), 2);

        let bar: Bar = parsed.bars.into_iter().next().unwrap().into();
        assert_eq!(bar.date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(bar.close, 194.03);
        assert_eq!(bar.volume, 50_080_500.0);
    }

    #[test]
    fn bars_are_sorted_chronologically() {
        let json = r#"{
            "symbol": "AAPL",
            "bars": [
                {"date": "2024-06-04", "open": 1, "high": 1, "low": 1, "close": 1, "volume": 1},
                {"date": "2024-06-03", "open": 2, "high": 2, "low": 2, "close": 2, "volume": 2}
            ]
        }"#;
        let parsed: DailyBarsResponse = serde_json::from_str(json).unwrap();
        let mut bars: Vec<Bar> = parsed.bars.into_iter().map(Bar::from).collect();
        bars.sort_by_key(|b| b.date);
        assert!(bars[0].date < bars[1].date);
    }
}
