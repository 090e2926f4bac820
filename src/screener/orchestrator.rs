// =============================================================================
// Screening Orchestrator — evaluate the whole symbol universe
// =============================================================================
//
// Walks the universe in enumeration order and applies every supplied
// criterion family (logical AND) to each symbol independently. A symbol's
// own failure — fetch error, malformed series, too little history — becomes
// an observed skip and never aborts the scan; only a universe-level store
// failure does.
//
// Observability is injected: callers that care about skip/match events pass
// a `ScanObserver` instead of scraping process-wide log output. The default
// observer logs through `tracing`.
// =============================================================================

use tracing::{debug, info, warn};

use crate::errors::ScreenerError;
use crate::models::{ScreenResult, Series};
use crate::screener::criteria::{ma_passes, macd_passes, rsi_passes, ScreenCriteria};
use crate::screener::report::{indicator_report, ReportFamilies};
use crate::store::SeriesStore;

/// Blanket completeness gate for the bulk path: the longest moving average
/// needs 200 bars to be meaningful, so shorter histories are skipped even
/// when the supplied criteria would need less.
pub const MIN_SCREEN_BARS: usize = 200;

// =============================================================================
// Scan observation
// =============================================================================

/// Why a symbol was left out of a scan.
#[derive(Debug)]
pub enum SkipReason {
    /// Fetching or validating the series failed.
    Fetch(ScreenerError),
    /// The series is shorter than the completeness gate.
    InsufficientHistory { bars: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch(err) => write!(f, "fetch failed: {err}"),
            Self::InsufficientHistory { bars } => {
                write!(f, "only {bars} bars, need {MIN_SCREEN_BARS}")
            }
        }
    }
}

/// Receives per-symbol scan events.
pub trait ScanObserver {
    fn on_skip(&mut self, symbol: &str, reason: &SkipReason) {
        let _ = (symbol, reason);
    }
    fn on_match(&mut self, symbol: &str) {
        let _ = symbol;
    }
}

/// Default observer: structured log records, nothing else.
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn on_skip(&mut self, symbol: &str, reason: &SkipReason) {
        warn!(symbol, reason = %reason, "symbol skipped during screen");
    }

    fn on_match(&mut self, symbol: &str) {
        debug!(symbol, "symbol matches all criteria");
    }
}

// =============================================================================
// Screening
// =============================================================================

/// Screen the full universe against `criteria`, logging skip/match events.
pub fn screen<S: SeriesStore>(
    store: &S,
    criteria: &ScreenCriteria,
) -> Result<Vec<ScreenResult>, ScreenerError> {
    screen_with_observer(store, criteria, &mut TracingObserver)
}

/// Screen the full universe against `criteria`, reporting per-symbol events
/// to `observer`.
///
/// Returns results in universe enumeration order. An empty criteria mapping
/// means "no filter": every symbol is returned verbatim without fetching a
/// single series.
pub fn screen_with_observer<S: SeriesStore>(
    store: &S,
    criteria: &ScreenCriteria,
    observer: &mut dyn ScanObserver,
) -> Result<Vec<ScreenResult>, ScreenerError> {
    // A universe-level store failure aborts the whole scan — there is no
    // partial-universe fallback.
    let universe = store.list_symbols()?;

    if criteria.is_empty() {
        info!(count = universe.len(), "no criteria supplied — returning full universe");
        return Ok(universe.into_iter().map(ScreenResult::symbol_only).collect());
    }

    info!(count = universe.len(), "screening universe");
    let mut results = Vec::new();

    for symbol in universe {
        let series = match store.get_series(&symbol) {
            Ok(series) => series,
            Err(err) => {
                observer.on_skip(&symbol, &SkipReason::Fetch(err));
                continue;
            }
        };

        if series.len() < MIN_SCREEN_BARS {
            observer.on_skip(
                &symbol,
                &SkipReason::InsufficientHistory { bars: series.len() },
            );
            continue;
        }

        if !passes_all(&series, criteria) {
            continue;
        }

        observer.on_match(&symbol);
        if let Some(result) = build_result(&series, criteria) {
            results.push(result);
        }
    }

    info!(matches = results.len(), "screen complete");
    Ok(results)
}

/// Every supplied family must pass — there is no OR mode.
fn passes_all(series: &Series, criteria: &ScreenCriteria) -> bool {
    if let Some(criterion) = &criteria.rsi {
        if !rsi_passes(series, criterion) {
            return false;
        }
    }
    if let Some(criterion) = &criteria.macd {
        if !macd_passes(series, criterion) {
            return false;
        }
    }
    if let Some(criterion) = &criteria.ma {
        if !ma_passes(series, criterion) {
            return false;
        }
    }
    true
}

/// Attach the latest values of exactly the requested families.
fn build_result(series: &Series, criteria: &ScreenCriteria) -> Option<ScreenResult> {
    let last = series.last_bar()?;
    let families = ReportFamilies {
        rsi: criteria.rsi.is_some(),
        macd: criteria.macd.is_some(),
        ma: criteria.ma.is_some(),
    };
    Some(ScreenResult {
        symbol: series.symbol().to_string(),
        price: Some(last.close),
        date: Some(last.date),
        indicators: indicator_report(series, families),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;
    use crate::screener::criteria::{MacdCriterion, RsiCriterion};
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::collections::HashMap;

    // ---- Fixtures --------------------------------------------------------

    /// In-memory store fixture: ordered symbols, canned series, optional
    /// per-symbol fetch failures, and a fetch counter.
    #[derive(Default)]
    struct FixtureStore {
        symbols: Vec<String>,
        series: HashMap<String, Vec<Bar>>,
        failing: Vec<String>,
        fetches: Cell<usize>,
    }

    impl FixtureStore {
        fn with_symbol(mut self, symbol: &str, closes: &[f64]) -> Self {
            let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
            let bars = closes
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
            self.symbols.push(symbol.to_string());
            self.series.insert(symbol.to_string(), bars);
            self
        }

        fn with_failing(mut self, symbol: &str) -> Self {
            self.symbols.push(symbol.to_string());
            self.failing.push(symbol.to_string());
            self
        }
    }

    impl SeriesStore for FixtureStore {
        fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
            Ok(self.symbols.clone())
        }

        fn get_series(&self, symbol: &str) -> Result<Series, ScreenerError> {
            self.fetches.set(self.fetches.get() + 1);
            if self.failing.iter().any(|s| s == symbol) {
                return Err(ScreenerError::computation(symbol, "simulated fetch failure"));
            }
            match self.series.get(symbol) {
                Some(bars) => Series::new(symbol, bars.clone()),
                None => Err(ScreenerError::NotFound {
                    symbol: symbol.to_string(),
                }),
            }
        }
    }

    /// Observer that records events for assertions.
    #[derive(Default)]
    struct RecordingObserver {
        skips: Vec<(String, String)>,
        matches: Vec<String>,
    }

    impl ScanObserver for RecordingObserver {
        fn on_skip(&mut self, symbol: &str, reason: &SkipReason) {
            self.skips.push((symbol.to_string(), reason.to_string()));
        }

        fn on_match(&mut self, symbol: &str) {
            self.matches.push(symbol.to_string());
        }
    }

    fn rising(n: usize) -> Vec<f64> {
        (1..=n).map(|x| x as f64).collect()
    }

    fn falling(n: usize) -> Vec<f64> {
        (1..=n).rev().map(|x| x as f64).collect()
    }

    fn rsi_above(threshold: f64) -> ScreenCriteria {
        ScreenCriteria {
            rsi: Some(RsiCriterion {
                above: Some(threshold),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    // ---- No-filter path --------------------------------------------------

    #[test]
    fn empty_criteria_returns_universe_without_fetching() {
        let store = FixtureStore::default()
            .with_symbol("AAA", &rising(250))
            .with_symbol("BBB", &rising(250))
            .with_symbol("CCC", &rising(250));

        let results = screen(&store, &ScreenCriteria::default()).unwrap();
        let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "BBB", "CCC"]);
        assert!(results.iter().all(|r| r.price.is_none()));
        assert_eq!(store.fetches.get(), 0, "no series may be fetched");
    }

    // ---- Criteria gating -------------------------------------------------

    #[test]
    fn out_of_range_rsi_threshold_yields_empty_not_error() {
        let store = FixtureStore::default().with_symbol("AAA", &rising(250));
        let criteria = ScreenCriteria {
            rsi: Some(RsiCriterion {
                below: Some(150.0),
                ..Default::default()
            }),
            ..Default::default()
        };
        let results = screen(&store, &criteria).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn invalid_macd_signal_yields_empty_not_error() {
        let store = FixtureStore::default().with_symbol("AAA", &rising(250));
        let criteria = ScreenCriteria {
            macd: Some(MacdCriterion {
                signal: Some("invalid".into()),
            }),
            ..Default::default()
        };
        let results = screen(&store, &criteria).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn matching_symbols_carry_requested_indicators_only() {
        let store = FixtureStore::default()
            .with_symbol("UP", &rising(250))
            .with_symbol("DOWN", &falling(250));

        let results = screen(&store, &rsi_above(70.0)).unwrap();
        assert_eq!(results.len(), 1);
        let hit = &results[0];
        assert_eq!(hit.symbol, "UP");
        assert_eq!(hit.price, Some(250.0));
        assert!(hit.indicators.rsi.is_some());
        assert!(hit.indicators.macd.is_none());
        assert!(hit.indicators.ma.is_none());
        assert_eq!(
            hit.date,
            Some(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap() + chrono::Duration::days(249))
        );
    }

    // ---- Per-symbol isolation --------------------------------------------

    #[test]
    fn failing_symbol_is_skipped_not_fatal() {
        let store = FixtureStore::default()
            .with_symbol("AAA", &rising(250))
            .with_failing("BAD")
            .with_symbol("CCC", &rising(250));

        let mut observer = RecordingObserver::default();
        let results = screen_with_observer(&store, &rsi_above(70.0), &mut observer).unwrap();

        let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "CCC"]);

        assert_eq!(observer.skips.len(), 1);
        assert_eq!(observer.skips[0].0, "BAD");
        assert!(observer.skips[0].1.contains("fetch failed"));
        assert_eq!(observer.matches, vec!["AAA", "CCC"]);
    }

    #[test]
    fn short_history_is_skipped() {
        let store = FixtureStore::default()
            .with_symbol("SHORT", &rising(199))
            .with_symbol("LONG", &rising(250));

        let mut observer = RecordingObserver::default();
        let results = screen_with_observer(&store, &rsi_above(70.0), &mut observer).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].symbol, "LONG");
        assert_eq!(observer.skips.len(), 1);
        assert_eq!(observer.skips[0].0, "SHORT");
        assert!(observer.skips[0].1.contains("199 bars"));
    }

    #[test]
    fn results_preserve_universe_order() {
        let mut store = FixtureStore::default();
        for name in ["ZZ", "MM", "AA"] {
            store = store.with_symbol(name, &rising(250));
        }
        let results = screen(&store, &rsi_above(70.0)).unwrap();
        let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
        // Enumeration order, not alphabetical.
        assert_eq!(symbols, vec!["ZZ", "MM", "AA"]);
    }

    // ---- Universe-level failure ------------------------------------------

    struct BrokenStore;

    impl SeriesStore for BrokenStore {
        fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
            Err(ScreenerError::Store(rusqlite::Error::QueryReturnedNoRows))
        }

        fn get_series(&self, symbol: &str) -> Result<Series, ScreenerError> {
            Err(ScreenerError::NotFound {
                symbol: symbol.to_string(),
            })
        }
    }

    #[test]
    fn universe_failure_aborts_scan() {
        let err = screen(&BrokenStore, &rsi_above(70.0)).unwrap_err();
        assert!(matches!(err, ScreenerError::Store(_)));
    }
}
