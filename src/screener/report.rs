// =============================================================================
// Indicator report assembly — latest values for one symbol
// =============================================================================
//
// Turns a series into the externally-exposed snapshot of latest indicator
// values. Computation is on demand and per request; nothing here is cached
// or persisted. Only the requested families are computed and included.
// =============================================================================

use crate::indicators::{macd, moving_averages, rsi};
use crate::models::{IndicatorReport, MacdReport, Series};

/// Which indicator families a report should include.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportFamilies {
    pub rsi: bool,
    pub macd: bool,
    pub ma: bool,
}

impl ReportFamilies {
    /// All families — the full detail view.
    pub fn all() -> Self {
        Self {
            rsi: true,
            macd: true,
            ma: true,
        }
    }

    /// Families selected by name; unknown names are ignored.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut families = Self::default();
        for name in names {
            match name.as_ref() {
                "RSI" => families.rsi = true,
                "MACD" => families.macd = true,
                "MA" => families.ma = true,
                _ => {}
            }
        }
        families
    }
}

/// Compute the latest indicator values for the requested families.
pub fn indicator_report(series: &Series, families: ReportFamilies) -> IndicatorReport {
    let mut report = IndicatorReport::default();

    if families.rsi {
        report.rsi = rsi(series, crate::indicators::rsi::DEFAULT_PERIOD)
            .last()
            .copied();
    }

    if families.macd {
        let output = macd(series);
        if let (Some(&m), Some(&s), Some(&h)) = (
            output.macd_line.last(),
            output.signal_line.last(),
            output.histogram.last(),
        ) {
            report.macd = Some(MacdReport {
                macd: m,
                signal: s,
                histogram: h,
            });
        }
    }

    if families.ma {
        report.ma = Some(moving_averages(series).latest());
    }

    report
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bar, Series};
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> Series {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
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
        Series::new("TEST", bars).unwrap()
    }

    #[test]
    fn families_from_names_ignores_unknown() {
        let families = ReportFamilies::from_names(&["RSI", "VWAP", "MA"]);
        assert!(families.rsi);
        assert!(!families.macd);
        assert!(families.ma);
    }

    #[test]
    fn report_contains_only_requested_families() {
        let closes: Vec<f64> = (1..=250).map(|x| 100.0 + (x as f64 / 7.0).sin()).collect();
        let s = series(&closes);

        let report = indicator_report(
            &s,
            ReportFamilies {
                rsi: true,
                ..Default::default()
            },
        );
        assert!(report.rsi.is_some());
        assert!(report.macd.is_none());
        assert!(report.ma.is_none());
    }

    #[test]
    fn full_report_on_long_series() {
        let closes: Vec<f64> = (1..=250).map(|x| 100.0 + x as f64 * 0.2).collect();
        let report = indicator_report(&series(&closes), ReportFamilies::all());

        let rsi = report.rsi.unwrap();
        assert!((0.0..=100.0).contains(&rsi));

        let macd = report.macd.unwrap();
        assert_eq!(macd.histogram, macd.macd - macd.signal);

        let ma = report.ma.unwrap();
        assert_eq!(ma.len(), 3);
        assert!(ma["MA20"] > ma["MA50"]);
        assert!(ma["MA50"] > ma["MA200"]);
    }

    #[test]
    fn empty_series_yields_empty_report() {
        let report = indicator_report(&series(&[]), ReportFamilies::all());
        assert!(report.rsi.is_none());
        assert!(report.macd.is_none());
        assert_eq!(report.ma.unwrap().len(), 0);
    }
}
