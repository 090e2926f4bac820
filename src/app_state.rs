// =============================================================================
// Central Application State — Equiscan
// =============================================================================
//
// Shared across the API handlers and the refresh task via `Arc<AppState>`.
// The series store manages its own interior locking; everything else mutable
// sits behind parking_lot locks.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::config::ScreenerConfig;
use crate::store::SqliteStore;

pub struct AppState {
    // ── Configuration ───────────────────────────────────────────────────
    pub config: RwLock<ScreenerConfig>,

    // ── Storage ─────────────────────────────────────────────────────────
    pub store: Arc<SqliteStore>,

    // ── Refresh status ──────────────────────────────────────────────────
    pub last_refresh_ok: RwLock<Option<DateTime<Utc>>>,
    pub last_refresh_error: RwLock<Option<String>>,

    // ── Timing ──────────────────────────────────────────────────────────
    /// Instant the service started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct a new `AppState`; typically wrapped in `Arc` immediately.
    pub fn new(config: ScreenerConfig, store: SqliteStore) -> Self {
        Self {
            config: RwLock::new(config),
            store: Arc::new(store),
            last_refresh_ok: RwLock::new(None),
            last_refresh_error: RwLock::new(None),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_clean() {
        let state = AppState::new(
            ScreenerConfig::default(),
            SqliteStore::open_in_memory().unwrap(),
        );
        assert!(state.last_refresh_ok.read().is_none());
        assert!(state.last_refresh_error.read().is_none());
    }
}
