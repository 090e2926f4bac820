// =============================================================================
// Series Store — SQLite-backed daily price history
// =============================================================================
//
// The storage boundary of the engine. The core consumes it through the
// `SeriesStore` trait ("list the universe", "fetch one series"); the refresh
// job writes through the concrete `SqliteStore` only.
//
// The connection is wrapped in a Mutex because rusqlite::Connection is Send
// but not Sync. WAL mode keeps concurrent readers cheap. Dates are stored as
// `YYYY-MM-DD` text so the (symbol, date) primary key sorts chronologically.
// =============================================================================

use std::path::Path;

use chrono::NaiveDate;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::errors::ScreenerError;
use crate::models::{Bar, Series};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS stocks (
    symbol TEXT PRIMARY KEY,
    name TEXT,
    last_updated TEXT
);

CREATE TABLE IF NOT EXISTS daily_prices (
    symbol TEXT NOT NULL,
    date TEXT NOT NULL,
    open REAL NOT NULL,
    high REAL NOT NULL,
    low REAL NOT NULL,
    close REAL NOT NULL,
    volume REAL NOT NULL,
    PRIMARY KEY (symbol, date)
);

CREATE INDEX IF NOT EXISTS idx_daily_prices_symbol_date
ON daily_prices(symbol, date);
"#;

// =============================================================================
// Core-facing contract
// =============================================================================

/// What the screening engine needs from storage.
pub trait SeriesStore {
    /// The full symbol universe, ordered, symbol-unique.
    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError>;

    /// The complete daily series for one symbol, ascending by date.
    /// `NotFound` when the symbol has no price history.
    fn get_series(&self, symbol: &str) -> Result<Series, ScreenerError>;
}

// =============================================================================
// SQLite implementation
// =============================================================================

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScreenerError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        info!(db_path = %path.as_ref().display(), "series store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database, schema included. Used by tests.
    pub fn open_in_memory() -> Result<Self, ScreenerError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Register (or touch) a symbol in the metadata table.
    pub fn upsert_symbol(&self, symbol: &str, name: Option<&str>) -> Result<(), ScreenerError> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
            INSERT INTO stocks (symbol, name, last_updated)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(symbol) DO UPDATE SET
                name = COALESCE(excluded.name, stocks.name),
                last_updated = excluded.last_updated
            "#,
            params![symbol, name, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Insert-or-replace a run of bars for `symbol`. Returns the number of
    /// bars written.
    pub fn upsert_bars(&self, symbol: &str, bars: &[Bar]) -> Result<usize, ScreenerError> {
        if bars.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        for bar in bars {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO daily_prices
                (symbol, date, open, high, low, close, volume)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    symbol,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                ],
            )?;
        }
        tx.commit()?;

        debug!(symbol, count = bars.len(), "bars upserted");
        Ok(bars.len())
    }

    fn row_to_bar(row: &rusqlite::Row) -> rusqlite::Result<Bar> {
        let date_str: String = row.get(0)?;
        let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Bar {
            date,
            open: row.get(1)?,
            high: row.get(2)?,
            low: row.get(3)?,
            close: row.get(4)?,
            volume: row.get(5)?,
        })
    }
}

impl SeriesStore for SqliteStore {
    fn list_symbols(&self) -> Result<Vec<String>, ScreenerError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT DISTINCT symbol FROM daily_prices ORDER BY symbol")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row?);
        }
        Ok(symbols)
    }

    fn get_series(&self, symbol: &str) -> Result<Series, ScreenerError> {
        let bars = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare(
                r#"
                SELECT date, open, high, low, close, volume
                FROM daily_prices
                WHERE symbol = ?1
                ORDER BY date
                "#,
            )?;
            let rows = stmt.query_map(params![symbol], Self::row_to_bar)?;

            let mut bars = Vec::new();
            for row in rows {
                bars.push(row?);
            }
            bars
        };

        if bars.is_empty() {
            return Err(ScreenerError::NotFound {
                symbol: symbol.to_string(),
            });
        }

        Series::new(symbol, bars)
    }
}
