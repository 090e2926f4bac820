// =============================================================================
// Criteria Evaluator — per-family pass/fail for one symbol
// =============================================================================
//
// Each family gets one evaluation function over a validated `Series`, all
// pure reads of calculator output. Every malformed or out-of-range criterion
// value fails CLOSED: the symbol does not pass that criterion, and nothing
// is raised — bulk screening must always produce a result list, never a
// user error, for unsatisfiable input.
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::indicators::{macd, moving_averages, rsi};
use crate::models::Series;

/// How many trailing histogram samples the MACD crossover scan inspects.
pub const CROSSOVER_WINDOW: usize = 10;

// =============================================================================
// Criterion types
// =============================================================================

/// The full criteria mapping accepted by a screen request. Families absent
/// from the request are not evaluated and not reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenCriteria {
    #[serde(rename = "RSI", skip_serializing_if = "Option::is_none", default)]
    pub rsi: Option<RsiCriterion>,

    #[serde(rename = "MACD", skip_serializing_if = "Option::is_none", default)]
    pub macd: Option<MacdCriterion>,

    #[serde(rename = "MA", skip_serializing_if = "Option::is_none", default)]
    pub ma: Option<MaCriterion>,
}

impl ScreenCriteria {
    /// No filter supplied: "show all" semantics.
    pub fn is_empty(&self) -> bool {
        self.rsi.is_none() && self.macd.is_none() && self.ma.is_none()
    }
}

/// RSI thresholds; both present means both must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RsiCriterion {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub below: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub above: Option<f64>,
}

/// MACD crossover direction. Kept as a free-form string so unrecognized
/// directions fail closed instead of rejecting the whole request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdCriterion {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signal: Option<String>,
}

/// MA criteria come in two shapes:
///   `{"criteria": "price_above_ma20"}`  — a named single-shot comparison
///   `{"MA20": "price_above", ...}`      — per-MA price comparisons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaCriterion {
    Named { criteria: String },
    Levels(BTreeMap<String, String>),
}

// =============================================================================
// RSI evaluation
// =============================================================================

/// Pass iff the latest RSI value satisfies the given bounds.
///
/// Thresholds outside [0, 100] fail the criterion (logged, not raised).
/// With no bounds at all the criterion trivially passes.
pub fn rsi_passes(series: &Series, criterion: &RsiCriterion) -> bool {
    if criterion.below.is_none() && criterion.above.is_none() {
        return true;
    }

    let sequence = rsi(series, crate::indicators::rsi::DEFAULT_PERIOD);
    let last = match sequence.last() {
        Some(&v) => v,
        None => return false,
    };

    if let Some(threshold) = criterion.below {
        if !(0.0..=100.0).contains(&threshold) {
            warn!(threshold, "RSI 'below' threshold outside [0, 100]");
            return false;
        }
        if last >= threshold {
            return false;
        }
    }

    if let Some(threshold) = criterion.above {
        if !(0.0..=100.0).contains(&threshold) {
            warn!(threshold, "RSI 'above' threshold outside [0, 100]");
            return false;
        }
        if last <= threshold {
            return false;
        }
    }

    true
}

// =============================================================================
// MACD evaluation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CrossDirection {
    Bullish,
    Bearish,
}

/// Pass iff a crossover in the requested direction occurred within the
/// trailing window. Without a direction the criterion trivially passes;
/// an unrecognized direction fails closed.
pub fn macd_passes(series: &Series, criterion: &MacdCriterion) -> bool {
    let direction = match criterion.signal.as_deref() {
        None => return true,
        Some("bullish") => CrossDirection::Bullish,
        Some("bearish") => CrossDirection::Bearish,
        Some(other) => {
            warn!(signal = other, "unrecognized MACD signal direction");
            return false;
        }
    };

    let output = macd(series);
    let hist = &output.histogram;
    let start = hist.len().saturating_sub(CROSSOVER_WINDOW);
    crossover_in_window(&hist[start..], direction)
}

/// Scan adjacent pairs oldest→newest for a sign change, returning on the
/// first qualifying pair. The prior sample is compared with `<= 0` / `>= 0`
/// so a histogram resting exactly at zero counts as part of a crossover.
pub(crate) fn crossover_in_window(hist: &[f64], direction: CrossDirection) -> bool {
    for pair in hist.windows(2) {
        let crossed = match direction {
            CrossDirection::Bullish => pair[0] <= 0.0 && pair[1] > 0.0,
            CrossDirection::Bearish => pair[0] >= 0.0 && pair[1] < 0.0,
        };
        if crossed {
            return true;
        }
    }
    false
}

// =============================================================================
// MA evaluation
// =============================================================================

/// Pass iff the requested moving-average comparison holds on the latest
/// values. Unknown criterion strings, unknown MA names, and not-yet-defined
/// (NaN) averages all fail closed.
pub fn ma_passes(series: &Series, criterion: &MaCriterion) -> bool {
    let averages = moving_averages(series);
    let last_close = match series.last_bar() {
        Some(bar) => bar.close,
        None => return false,
    };

    match criterion {
        MaCriterion::Named { criteria } => match criteria.as_str() {
            "price_above_ma20" => match latest(&averages.ma20) {
                Some(ma) => last_close > ma,
                None => false,
            },
            "ma20_above_ma50" => match (latest(&averages.ma20), latest(&averages.ma50)) {
                (Some(ma20), Some(ma50)) => ma20 > ma50,
                _ => false,
            },
            other => {
                warn!(criteria = other, "unrecognized MA criterion");
                false
            }
        },
        MaCriterion::Levels(levels) => {
            for (name, comparison) in levels {
                let ma = match averages.by_name(name).and_then(|s| latest(s)) {
                    Some(v) => v,
                    None => {
                        warn!(ma = %name, "unknown or not-yet-defined moving average");
                        return false;
                    }
                };
                let holds = match comparison.as_str() {
                    "price_above" => last_close > ma,
                    "price_below" => last_close < ma,
                    other => {
                        warn!(comparison = other, "unrecognized MA comparison");
                        false
                    }
                };
                if !holds {
                    return false;
                }
            }
            true
        }
    }
}

/// Latest value of a sequence, if defined.
fn latest(sequence: &[f64]) -> Option<f64> {
    sequence.last().copied().filter(|v| v.is_finite())
}
