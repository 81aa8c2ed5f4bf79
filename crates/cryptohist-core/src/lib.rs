//! # cryptohist core
//!
//! Daily cryptocurrency OHLC history: date-range resolution, cache
//! synchronization against a local store, and price analytics.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`analytics`] | Longest increasing run and monthly averages |
//! | [`config`] | Environment driven configuration |
//! | [`coverage`] | Missing sub-range computation |
//! | [`date_range`] | `YYYY-MM-DD` / `YYYY-MM` resolution |
//! | [`domain`] | Coin, records, series, field selector |
//! | [`error`] | Core error types |
//! | [`export`] | CSV and JSON export |
//! | [`fetcher`] | Market data fetcher and Coinpaprika client |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`store`] | Price store trait, DuckDB and in-memory stores |
//! | [`sync`] | Cache synchronizer |
//!
//! ## Flow
//!
//! ```text
//! DateRange::resolve ──▶ CacheSynchronizer ──▶ PriceSeries ──▶ analytics / export
//!                          │            │
//!                          ▼            ▼
//!                     PriceStore   MarketDataFetcher
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cryptohist_core::{
//!     longest_increasing_run, CacheSynchronizer, CoinpaprikaFetcher, Coin, Config, DateRange,
//!     OhlcField, Warehouse,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let store = Arc::new(Warehouse::open(config.warehouse.clone())?);
//!     let fetcher = Arc::new(CoinpaprikaFetcher::new(config.api.clone()));
//!     let sync = CacheSynchronizer::new(store, fetcher);
//!
//!     let range = DateRange::resolve("2020-01", "2020-03")?;
//!     let outcome = sync.get_series(&Coin::default(), range).await?;
//!     let run = longest_increasing_run(&outcome.series, OhlcField::Close)?;
//!     println!("{} to {} (+{})", run.start_date, run.end_date, run.increase);
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod coverage;
pub mod date_range;
pub mod domain;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod http_client;
pub mod store;
pub mod sync;

/// Coin used when none is given.
pub const DEFAULT_COIN: &str = "btc-bitcoin";

pub use analytics::{
    average_by_month, longest_increasing_run, longest_increasing_run_with,
    longest_increasing_runs, GapPolicy, IncreasingRun, MonthlyAverage, RunOptions,
};
pub use config::{ApiConfig, Config};
pub use coverage::missing_sub_ranges;
pub use date_range::{DateInput, DateRange};
pub use domain::{Coin, OhlcField, OhlcRecord, PriceSeries, YearMonth};
pub use error::{CoreError, ValidationError};
pub use export::{export, export_named, ExportFormat, ExportRow};
pub use fetcher::{CoinpaprikaFetcher, FetchError, FetchErrorKind, MarketDataFetcher};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use store::{FetchAudit, MemoryStore, PriceStore};
pub use sync::{CacheSynchronizer, FailedRange, SyncOutcome, SyncReport};

pub use cryptohist_warehouse::{Warehouse, WarehouseConfig, WarehouseError};
