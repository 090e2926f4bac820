// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The API is a thin adapter: request
// validation, error→status mapping, and response shaping only — every
// decision about indicators and screening lives in the core.
//
// Failure semantics split by path:
//   - Single-symbol lookups fail LOUD: unknown symbol → 404, storage fault
//     → 503, malformed series → 500.
//   - Bulk screening always answers 200 with a (possibly empty) list for
//     per-symbol or criteria problems; only a universe-level store failure
//     is a 500.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::errors::ScreenerError;
use crate::models::IndicatorReport;
use crate::screener::{self, ReportFamilies, ScreenCriteria};
use crate::store::SeriesStore;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/symbols", get(symbols))
        .route("/api/v1/stocks/:symbol", get(stock_detail))
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/screen", post(screen_stocks))
        .route("/api/v1/refresh", post(trigger_refresh))
        .layer(cors)
        .with_state(state)
}

/// Map a core error onto the HTTP contract for single-symbol paths.
fn error_response(err: ScreenerError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &err {
        ScreenerError::NotFound { .. } => StatusCode::NOT_FOUND,
        ScreenerError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        ScreenerError::Computation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    server_time: i64,
    last_refresh_ok: Option<String>,
    last_refresh_error: Option<String>,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
        last_refresh_ok: state.last_refresh_ok.read().map(|t| t.to_rfc3339()),
        last_refresh_error: state.last_refresh_error.read().clone(),
    };
    Json(resp)
}

// =============================================================================
// Symbols — the universe
// =============================================================================

async fn symbols(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    match state.store.list_symbols() {
        Ok(symbols) => Ok(Json(symbols)),
        Err(err) => {
            error!(error = %err, "failed to list symbols");
            Err(error_response(err))
        }
    }
}

// =============================================================================
// Single-symbol detail (fail loud)
// =============================================================================

#[derive(Debug, Serialize)]
struct StockSnapshot {
    symbol: String,
    price: f64,
    date: String,
    indicators: IndicatorReport,
}

/// Fetch one symbol's series and shape the latest indicator values.
fn snapshot(
    state: &AppState,
    symbol: &str,
    families: ReportFamilies,
) -> Result<StockSnapshot, ScreenerError> {
    let series = state.store.get_series(symbol)?;
    // get_series never returns an empty series, so the last bar exists.
    let last = match series.last_bar() {
        Some(bar) => *bar,
        None => {
            return Err(ScreenerError::NotFound {
                symbol: symbol.to_string(),
            })
        }
    };

    Ok(StockSnapshot {
        symbol: series.symbol().to_string(),
        price: last.close,
        date: last.date.format("%Y-%m-%d").to_string(),
        indicators: screener::indicator_report(&series, families),
    })
}

async fn stock_detail(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    match snapshot(&state, &symbol, ReportFamilies::all()) {
        Ok(snap) => Ok(Json(snap)),
        Err(err) => {
            warn!(symbol = %symbol, error = %err, "stock detail lookup failed");
            Err(error_response(err))
        }
    }
}

// =============================================================================
// Analyze — selected indicator families for one symbol (fail loud)
// =============================================================================

#[derive(Deserialize)]
struct AnalyzeRequest {
    symbol: String,
    #[serde(default)]
    indicators: Vec<String>,
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let families = ReportFamilies::from_names(&req.indicators);
    match snapshot(&state, &req.symbol, families) {
        Ok(snap) => Ok(Json(snap)),
        Err(err) => {
            warn!(symbol = %req.symbol, error = %err, "analyze failed");
            Err(error_response(err))
        }
    }
}

// =============================================================================
// Screen — bulk criteria evaluation (best effort)
// =============================================================================

#[derive(Deserialize)]
struct ScreenRequest {
    #[serde(default)]
    show_all: bool,

    #[serde(flatten)]
    criteria: ScreenCriteria,
}

#[derive(Serialize)]
struct ScreenResponse {
    stocks: Vec<crate::models::ScreenResult>,
}

async fn screen_stocks(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScreenRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let criteria = if req.show_all {
        ScreenCriteria::default()
    } else {
        req.criteria
    };

    match screener::screen(state.store.as_ref(), &criteria) {
        Ok(stocks) => Ok(Json(ScreenResponse { stocks })),
        Err(err) => {
            // Only a universe-level store failure reaches here.
            error!(error = %err, "screen aborted");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": err.to_string() })),
            ))
        }
    }
}

// =============================================================================
// Refresh — manual market-data refresh trigger
// =============================================================================

async fn trigger_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("manual market-data refresh requested");
    tokio::spawn(async move {
        crate::provider::refresh_universe(&state).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "refresh started" })),
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScreenerConfig;
    use crate::models::Bar;
    use crate::store::SqliteStore;
    use chrono::NaiveDate;

    fn state_with_bars(symbol: &str, closes: &[f64]) -> Arc<AppState> {
        let store = SqliteStore::open_in_memory().unwrap();
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000.0,
            })
            .collect();
        store.upsert_bars(symbol, &bars).unwrap();
        Arc::new(AppState::new(ScreenerConfig::default(), store))
    }

    #[test]
    fn snapshot_returns_latest_bar_values() {
        let closes: Vec<f64> = (1..=250).map(|x| x as f64).collect();
        let state = state_with_bars("AAPL", &closes);

        let snap = snapshot(&state, "AAPL", ReportFamilies::all()).unwrap();
        assert_eq!(snap.symbol, "AAPL");
        assert_eq!(snap.price, 250.0);
        assert_eq!(snap.date, "2023-09-07");
        assert!(snap.indicators.rsi.is_some());
        assert!(snap.indicators.macd.is_some());
        assert_eq!(snap.indicators.ma.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn snapshot_unknown_symbol_propagates_not_found() {
        let state = state_with_bars("AAPL", &[100.0, 101.0]);
        let err = snapshot(&state, "ZZZZ", ReportFamilies::all()).unwrap_err();
        assert!(matches!(err, ScreenerError::NotFound { .. }));
    }

    #[test]
    fn screen_request_parses_flattened_criteria() {
        let req: ScreenRequest =
            serde_json::from_str(r#"{"RSI": {"below": 30}, "show_all": false}"#).unwrap();
        assert!(!req.show_all);
        assert_eq!(req.criteria.rsi.unwrap().below, Some(30.0));

        let req: ScreenRequest = serde_json::from_str(r#"{"show_all": true}"#).unwrap();
        assert!(req.show_all);
        assert!(req.criteria.is_empty());
    }

    #[test]
    fn error_response_status_mapping() {
        let (status, _) = error_response(ScreenerError::NotFound {
            symbol: "X".into(),
        });
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            error_response(ScreenerError::Store(rusqlite::Error::QueryReturnedNoRows));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = error_response(ScreenerError::computation("X", "bad"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
