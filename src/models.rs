// =============================================================================
// Shared data model — bars, series, and screening results
// =============================================================================
//
// A `Series` is the unit of work for the whole engine: an immutable,
// date-ordered run of daily OHLCV bars for one symbol. Construction is the
// single validation point — every downstream computation may assume strictly
// increasing dates and finite closes.
// =============================================================================

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ScreenerError;

// =============================================================================
// Bar
// =============================================================================

/// One trading day of OHLCV data for a single symbol.
///
/// Upstream data is expected (not enforced) to satisfy
/// `high >= close >= low` and `high >= open >= low` with non-negative fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

// =============================================================================
// Series
// =============================================================================

/// An immutable, validated daily price series for one symbol.
///
/// Bars are strictly increasing by date with no duplicates. The series is
/// owned exclusively by the computation invoked on it — nothing mutates it
/// in place after construction.
#[derive(Debug, Clone)]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

impl Series {
    /// Validate and wrap a run of bars.
    ///
    /// Fails with `ScreenerError::Computation` when dates are not strictly
    /// increasing or any close is non-finite. Empty input is accepted — the
    /// calculator's insufficient-history policies handle it.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, ScreenerError> {
        let symbol = symbol.into();

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ScreenerError::computation(
                    &symbol,
                    format!(
                        "dates not strictly increasing: {} then {}",
                        pair[0].date, pair[1].date
                    ),
                ));
            }
        }
        if let Some(bad) = bars.iter().find(|b| !b.close.is_finite()) {
            return Err(ScreenerError::computation(
                &symbol,
                format!("non-finite close at {}", bad.date),
            ));
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent bar, if any.
    pub fn last_bar(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Closing prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

// =============================================================================
// Indicator report — latest values exposed to callers
// =============================================================================

/// Latest MACD triple for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdReport {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Latest indicator values for one symbol. Only the families a caller asked
/// for are populated; absent families are omitted from serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    #[serde(rename = "RSI", skip_serializing_if = "Option::is_none", default)]
    pub rsi: Option<f64>,

    #[serde(rename = "MACD", skip_serializing_if = "Option::is_none", default)]
    pub macd: Option<MacdReport>,

    #[serde(rename = "MA", skip_serializing_if = "Option::is_none", default)]
    pub ma: Option<BTreeMap<String, f64>>,
}

impl IndicatorReport {
    pub fn is_empty(&self) -> bool {
        self.rsi.is_none() && self.macd.is_none() && self.ma.is_none()
    }
}

// =============================================================================
// Screen result
// =============================================================================

/// One qualifying symbol from a bulk screen.
///
/// `price` and `date` come from the most recent bar of the series the
/// screen evaluated. In the no-filter path (empty criteria) no series is
/// fetched at all, so both are absent and the report is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenResult {
    pub symbol: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "IndicatorReport::is_empty", default)]
    pub indicators: IndicatorReport,
}

impl ScreenResult {
    /// A bare universe entry for the no-filter screening path.
    pub fn symbol_only(symbol: String) -> Self {
        Self {
            symbol,
            price: None,
            date: None,
            indicators: IndicatorReport::default(),
        }
    }
}
