// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first
//          `period` gains / losses.
// Step 3 — Apply Wilder's exponential smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Output policy (one value per bar, aligned by index):
//   - Fewer than `2 * period` bars => the whole sequence is the neutral 50.0
//     ("insufficient history", not an error).
//   - The warm-up region is forward-filled at most one step, then any
//     remaining NaN becomes 50.0.
//   - Every value is clamped to [0, 100].
// =============================================================================

use crate::models::Series;

/// Standard RSI look-back window.
pub const DEFAULT_PERIOD: usize = 14;

/// Compute the RSI sequence for `series`, one value per bar.
///
/// A series shorter than `2 * period` (or a zero period) yields a constant
/// neutral sequence of 50.0 with the input's length.
pub fn rsi(series: &Series, period: usize) -> Vec<f64> {
    let closes = series.closes();

    if period == 0 || closes.len() < 2 * period {
        return vec![50.0; closes.len()];
    }

    let mut out = vec![f64::NAN; closes.len()];

    // --- Price deltas; delta[i] belongs to close index i + 1 ---------------
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // --- Seed averages with the SMA of the first `period` deltas -----------
    let (sum_gain, sum_loss) = deltas[..period]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l + d.abs())
            }
        });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;
    out[period] = rsi_from_averages(avg_gain, avg_loss);

    // --- Wilder's smoothing for the remaining bars --------------------------
    for (i, &delta) in deltas.iter().enumerate().skip(period) {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        out[i + 1] = rsi_from_averages(avg_gain, avg_loss);
    }

    fill_and_clamp(out)
}

/// Convert average gain / average loss into an RSI value.
///
/// - Both averages zero (no movement) => 50.0.
/// - Average loss zero (only gains)   => 100.0.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

/// Forward-fill NaN at most one step, neutral-fill the rest, clamp to
/// [0, 100].
fn fill_and_clamp(mut values: Vec<f64>) -> Vec<f64> {
    let mut prev_finite: Option<f64> = None;
    for v in values.iter_mut() {
        if v.is_finite() {
            prev_finite = Some(*v);
        } else {
            // One-step forward fill: only the immediately preceding value
            // carries over, so a longer NaN run falls through to neutral.
            *v = prev_finite.take().unwrap_or(50.0);
        }
    }
    for v in values.iter_mut() {
        *v = v.clamp(0.0, 100.0);
    }
    values
}
