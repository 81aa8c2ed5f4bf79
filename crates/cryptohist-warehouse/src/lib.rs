//! # cryptohist warehouse
//!
//! DuckDB-backed storage for daily OHLC price rows.
//!
//! The warehouse is deliberately ignorant of the core domain types: it stores
//! and returns plain [`PriceRow`] values whose prices are kept as the decimal
//! strings received from the upstream API, so nothing is rounded on the way
//! through the database.
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `ohlc_daily` | One row per `(coin, date)` |
//! | `ingest_log` | Audit trail of upstream fetches |
//! | `schema_migrations` | Applied migration versions |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cryptohist_warehouse::{PriceRow, Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::default())?;
//!     let row = PriceRow {
//!         coin: "btc-bitcoin".to_string(),
//!         date: "2020-01-01".to_string(),
//!         open: "7194.89".to_string(),
//!         high: "7254.33".to_string(),
//!         low: "7174.94".to_string(),
//!         close: "7200.17".to_string(),
//!     };
//!     warehouse.insert_if_absent(&row)?;
//!     let rows = warehouse.query_range("btc-bitcoin", "2020-01-01", "2020-01-31")?;
//!     println!("{} cached rows", rows.len());
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod migrations;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use thiserror::Error;
use tracing::debug;

pub use connection::ConnectionHandle;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (creating the database directory).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The connection mutex was poisoned by a panicking holder.
    #[error("warehouse connection lock poisoned")]
    Poisoned,
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    /// Root directory for cryptohist data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
}

impl WarehouseConfig {
    /// Configuration rooted at `home`, with the database in `home/cache`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let db_path = home.join("cache").join("warehouse.duckdb");
        Self { home, db_path }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::with_home(resolve_home())
    }
}

/// A persisted daily price row. Dates are `YYYY-MM-DD`, prices decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRow {
    pub coin: String,
    pub date: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
}

/// Outcome recorded for one upstream fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    Ok,
    Failed,
}

impl IngestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
        }
    }
}

/// One `ingest_log` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestLogEntry {
    pub request_id: String,
    pub coin: String,
    pub range_start: String,
    pub range_end: String,
    pub status: IngestStatus,
    pub row_count: u64,
    pub latency_ms: Option<u64>,
    pub message: Option<String>,
}

/// The price warehouse.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    handle: ConnectionHandle,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse, creating the database directory and schema as needed.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let handle = ConnectionHandle::open(config.db_path.clone())?;
        let warehouse = Self { config, handle };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply pending schema migrations.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.handle.lock()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.handle.db_path()
    }

    /// All rows for `coin` with `from <= date <= to`, ordered by date.
    pub fn query_range(
        &self,
        coin: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<PriceRow>, WarehouseError> {
        let connection = self.handle.lock()?;
        let mut statement = connection.prepare(
            "SELECT coin, CAST(date AS VARCHAR), open, high, low, close \
             FROM ohlc_daily \
             WHERE coin = ? AND date BETWEEN CAST(? AS DATE) AND CAST(? AS DATE) \
             ORDER BY date",
        )?;
        let params: [&dyn ToSql; 3] = [&coin, &from, &to];
        let rows = statement.query_map(params.as_slice(), |row| {
            Ok(PriceRow {
                coin: row.get(0)?,
                date: row.get(1)?,
                open: row.get(2)?,
                high: row.get(3)?,
                low: row.get(4)?,
                close: row.get(5)?,
            })
        })?;

        let rows = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(coin, from, to, rows = rows.len(), "warehouse range query");
        Ok(rows)
    }

    /// Insert a row unless `(coin, date)` already exists. Returns whether it was new.
    pub fn insert_if_absent(&self, row: &PriceRow) -> Result<bool, WarehouseError> {
        let connection = self.handle.lock()?;
        insert_row(&connection, row)
    }

    /// Insert-if-absent for a batch inside one transaction. Returns the number of new rows.
    pub fn insert_rows_if_absent(&self, rows: &[PriceRow]) -> Result<usize, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let connection = self.handle.lock()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            let mut inserted = 0;
            for row in rows {
                if insert_row(&connection, row)? {
                    inserted += 1;
                }
            }
            Ok(inserted)
        })();

        finalize_transaction(&connection, result)
    }

    /// Number of stored rows for `coin`.
    pub fn count_prices(&self, coin: &str) -> Result<u64, WarehouseError> {
        let connection = self.handle.lock()?;
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM ohlc_daily WHERE coin = ?",
            [coin],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Append an entry to the ingest audit log.
    pub fn log_ingest(&self, entry: &IngestLogEntry) -> Result<(), WarehouseError> {
        let connection = self.handle.lock()?;
        let status = entry.status.as_str();
        let row_count = i64::try_from(entry.row_count).unwrap_or(i64::MAX);
        let latency_ms = entry
            .latency_ms
            .map(|value| i64::try_from(value).unwrap_or(i64::MAX));
        let params: [&dyn ToSql; 8] = [
            &entry.request_id,
            &entry.coin,
            &entry.range_start,
            &entry.range_end,
            &status,
            &row_count,
            &latency_ms,
            &entry.message,
        ];
        connection.execute(
            "INSERT INTO ingest_log \
             (request_id, coin, range_start, range_end, status, row_count, latency_ms, message, timestamp) \
             VALUES (?, ?, CAST(? AS DATE), CAST(? AS DATE), ?, ?, ?, ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// `(range_start, range_end)` of successful fetches for `coin` that
    /// overlap `from..=to`, ordered by start.
    pub fn fetched_ranges(
        &self,
        coin: &str,
        from: &str,
        to: &str,
    ) -> Result<Vec<(String, String)>, WarehouseError> {
        let connection = self.handle.lock()?;
        let mut statement = connection.prepare(
            "SELECT CAST(range_start AS VARCHAR), CAST(range_end AS VARCHAR) \
             FROM ingest_log \
             WHERE coin = ? AND status = ? \
               AND range_end >= CAST(? AS DATE) AND range_start <= CAST(? AS DATE) \
             ORDER BY range_start",
        )?;
        let status = IngestStatus::Ok.as_str();
        let params: [&dyn ToSql; 4] = [&coin, &status, &from, &to];
        let ranges = statement.query_map(params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?;

        Ok(ranges.collect::<Result<Vec<_>, _>>()?)
    }

    /// Ingest log entries for `coin`, oldest first.
    pub fn ingest_history(&self, coin: &str) -> Result<Vec<IngestLogEntry>, WarehouseError> {
        let connection = self.handle.lock()?;
        let mut statement = connection.prepare(
            "SELECT request_id, coin, CAST(range_start AS VARCHAR), CAST(range_end AS VARCHAR), \
                    status, row_count, latency_ms, message \
             FROM ingest_log WHERE coin = ? ORDER BY timestamp, range_start",
        )?;
        let entries = statement.query_map([coin], |row| {
            let status: String = row.get(4)?;
            let row_count: i64 = row.get(5)?;
            let latency_ms: Option<i64> = row.get(6)?;
            Ok(IngestLogEntry {
                request_id: row.get(0)?,
                coin: row.get(1)?,
                range_start: row.get(2)?,
                range_end: row.get(3)?,
                status: if status == IngestStatus::Ok.as_str() {
                    IngestStatus::Ok
                } else {
                    IngestStatus::Failed
                },
                row_count: u64::try_from(row_count).unwrap_or_default(),
                latency_ms: latency_ms.and_then(|value| u64::try_from(value).ok()),
                message: row.get(7)?,
            })
        })?;

        Ok(entries.collect::<Result<Vec<_>, _>>()?)
    }
}

fn insert_row(connection: &Connection, row: &PriceRow) -> Result<bool, WarehouseError> {
    let params: [&dyn ToSql; 6] = [
        &row.coin,
        &row.date,
        &row.open,
        &row.high,
        &row.low,
        &row.close,
    ];
    let changed = connection.execute(
        "INSERT OR IGNORE INTO ohlc_daily (coin, date, open, high, low, close, inserted_at) \
         VALUES (?, CAST(? AS DATE), ?, ?, ?, ?, CURRENT_TIMESTAMP)",
        params.as_slice(),
    )?;
    Ok(changed > 0)
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the cryptohist home directory from environment or default.
fn resolve_home() -> PathBuf {
    if let Some(path) = env::var_os("CRYPTOHIST_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".cryptohist");
    }

    PathBuf::from(".cryptohist")
}
