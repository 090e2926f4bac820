// =============================================================================
// Error taxonomy for the screening engine
// =============================================================================
//
// Three failure classes cross the core boundary:
//   - NotFound:    the store has no bars for a symbol (detail paths → 404).
//   - Store:       the storage layer itself failed (detail paths → 503;
//                  universe-level occurrence aborts a bulk scan).
//   - Computation: a fetched series is malformed (non-increasing dates,
//                  non-finite closes). Propagates on detail paths, becomes a
//                  logged per-symbol skip on the bulk path.
//
// Insufficient history is deliberately NOT an error anywhere — short series
// produce neutral/zero filler values in the calculator and a skip in the
// bulk screening gate.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenerError {
    /// The store has no price history for this symbol.
    #[error("symbol not found: {symbol}")]
    NotFound { symbol: String },

    /// The storage layer failed.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// A fetched series is internally inconsistent.
    #[error("computation error for {symbol}: {cause}")]
    Computation { symbol: String, cause: String },
}

impl ScreenerError {
    /// Shorthand for a malformed-series error.
    pub fn computation(symbol: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Computation {
            symbol: symbol.into(),
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_symbol_and_cause() {
        let err = ScreenerError::computation("AAPL", "dates not strictly increasing");
        let msg = err.to_string();
        assert!(msg.contains("AAPL"));
        assert!(msg.contains("dates not strictly increasing"));
    }

    #[test]
    fn not_found_display() {
        let err = ScreenerError::NotFound {
            symbol: "ZZZZ".into(),
        };
        assert_eq!(err.to_string(), "symbol not found: ZZZZ");
    }
}
