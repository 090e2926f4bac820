// =============================================================================
// Simple Moving Averages — MA20 / MA50 / MA200
// =============================================================================
//
// Plain unweighted mean of closing price over a fixed trailing window,
// index-aligned with the source series. Indices before `window - 1` are NaN;
// there is no special-casing for short series — a NaN value means "not yet
// comparable" and callers must not compare it.
// =============================================================================

use std::collections::BTreeMap;

use crate::models::Series;

/// The three standard windows exposed by the screener.
pub const WINDOWS: [(&str, usize); 3] = [("MA20", 20), ("MA50", 50), ("MA200", 200)];

/// Index-aligned simple moving averages of closing price.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverages {
    pub ma20: Vec<f64>,
    pub ma50: Vec<f64>,
    pub ma200: Vec<f64>,
}

impl MovingAverages {
    /// Look up a sequence by its exposed name ("MA20", "MA50", "MA200").
    pub fn by_name(&self, name: &str) -> Option<&[f64]> {
        match name {
            "MA20" => Some(&self.ma20),
            "MA50" => Some(&self.ma50),
            "MA200" => Some(&self.ma200),
            _ => None,
        }
    }

    /// Latest value per window, omitting windows that are not yet defined
    /// for the series length.
    pub fn latest(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        for (name, _) in WINDOWS {
            if let Some(v) = self.by_name(name).and_then(|s| s.last()).copied() {
                if v.is_finite() {
                    out.insert(name.to_string(), v);
                }
            }
        }
        out
    }
}

/// Compute MA20/MA50/MA200 for `series`.
pub fn moving_averages(series: &Series) -> MovingAverages {
    let closes = series.closes();
    MovingAverages {
        ma20: sma(&closes, 20),
        ma50: sma(&closes, 50),
        ma200: sma(&closes, 200),
    }
}

/// Rolling-sum SMA aligned by index; NaN before the window is full.
pub fn sma(values: &[f64], window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let mut sum: f64 = values[..window].iter().sum();
    out[window - 1] = sum / window as f64;
    for i in window..values.len() {
        sum += values[i] - values[i - window];
        out[i] = sum / window as f64;
    }
    out
}
