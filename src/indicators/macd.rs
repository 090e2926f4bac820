// =============================================================================
// Moving Average Convergence Divergence (MACD) — 12/26/9 EMA scheme
// =============================================================================
//
// MACD line = EMA(12) - EMA(26) of closing prices.
// Signal    = EMA(9) of the MACD line.
// Histogram = MACD line - signal line, recomputed elementwise AFTER the fill
//             step so the identity `histogram == macd - signal` holds exactly
//             for every index, including the filled warm-up region.
//
// A series shorter than 35 bars (26 for the slow average + 9 for signal
// smoothing) yields three all-zero sequences of the input's length — the
// exponential averages are under-determined and their values would be noise.
// =============================================================================

use crate::indicators::ema::ema;
use crate::models::Series;

/// Fast EMA window for the MACD line.
pub const FAST_PERIOD: usize = 12;
/// Slow EMA window for the MACD line.
pub const SLOW_PERIOD: usize = 26;
/// EMA window for the signal line.
pub const SIGNAL_PERIOD: usize = 9;
/// Minimum bars for a determined MACD: slow window + signal smoothing.
pub const MIN_BARS: usize = SLOW_PERIOD + SIGNAL_PERIOD;

/// The three index-aligned MACD output sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Compute the MACD triple for `series`.
pub fn macd(series: &Series) -> MacdSeries {
    let closes = series.closes();

    if closes.len() < MIN_BARS {
        let zeros = vec![0.0; closes.len()];
        return MacdSeries {
            macd_line: zeros.clone(),
            signal_line: zeros.clone(),
            histogram: zeros,
        };
    }

    let fast = ema(&closes, FAST_PERIOD);
    let slow = ema(&closes, SLOW_PERIOD);

    // NaN warm-up propagates: the line is undefined until the slow EMA is.
    let raw_macd: Vec<f64> = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| f - s)
        .collect();
    let raw_signal = ema(&raw_macd, SIGNAL_PERIOD);

    let macd_line = ffill_then_zero(raw_macd);
    let signal_line = ffill_then_zero(raw_signal);

    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| m - s)
        .collect();

    MacdSeries {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Forward-fill NaN from the last finite value, then zero-fill whatever NaN
/// remains (the leading warm-up region has nothing to fill from).
fn ffill_then_zero(mut values: Vec<f64>) -> Vec<f64> {
    let mut prev_finite: Option<f64> = None;
    for v in values.iter_mut() {
        if v.is_finite() {
            prev_finite = Some(*v);
        } else {
            *v = prev_finite.unwrap_or(0.0);
        }
    }
    values
}
