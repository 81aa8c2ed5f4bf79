//! CLI argument definitions for cryptohist.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `consecutive-increase` | Longest run of strictly increasing prices |
//! | `average-price-by-month` | Mean price per calendar month |
//! | `export` | Write the series to CSV or JSON |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--start-date` | prompted | `YYYY-MM-DD` or `YYYY-MM` |
//! | `--end-date` | prompted | `YYYY-MM-DD` or `YYYY-MM` |
//! | `--coin` | `btc-bitcoin` | Upstream coin id |
//! | `--ohlc` | `close` | Price column to analyze |
//! | `--strict` | `false` | Fail when some days could not be fetched |
//! | `--reset-on-gap` | `false` | Missing days end an increasing run |
//!
//! # Examples
//!
//! ```bash
//! cryptohist --start-date 2020-01-01 --end-date 2020-01-31 consecutive-increase
//! cryptohist --start-date 2020-01 --end-date 2020-03 --ohlc high average-price-by-month
//! cryptohist --start-date 2020-01 --end-date 2020-01 export --format json --file january
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use cryptohist_core::{ExportFormat, OhlcField, DEFAULT_COIN};

/// Daily cryptocurrency price history with a local cache.
#[derive(Debug, Parser)]
#[command(name = "cryptohist", author, version, about)]
pub struct Cli {
    /// First day of the range (`YYYY-MM-DD`, or `YYYY-MM` for the first of the month).
    #[arg(long, global = true)]
    pub start_date: Option<String>,

    /// Last day of the range (`YYYY-MM-DD`, or `YYYY-MM` for the end of the month).
    #[arg(long, global = true)]
    pub end_date: Option<String>,

    /// Coin identifier as used by the market data API.
    #[arg(long, global = true, default_value = DEFAULT_COIN)]
    pub coin: String,

    /// Which OHLC value to analyze.
    #[arg(long, global = true, value_enum, default_value_t = OhlcArg::Close)]
    pub ohlc: OhlcArg,

    /// Exit with an error when part of the range could not be fetched.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Treat a missing day as the end of an increasing run.
    #[arg(long, global = true, default_value_t = false)]
    pub reset_on_gap: bool,

    /// DuckDB cache file (overrides CRYPTOHIST_DB_PATH).
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Market data API base URL (overrides CRYPTOHIST_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OhlcArg {
    Open,
    High,
    Low,
    Close,
}

impl From<OhlcArg> for OhlcField {
    fn from(value: OhlcArg) -> Self {
        match value {
            OhlcArg::Open => Self::Open,
            OhlcArg::High => Self::High,
            OhlcArg::Low => Self::Low,
            OhlcArg::Close => Self::Close,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Find the longest period of consecutive price increases.
    ConsecutiveIncrease,

    /// Average price for each month in the range.
    AveragePriceByMonth,

    /// Export the price series to a file.
    Export(ExportArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => Self::Csv,
            FormatArg::Json => Self::Json,
        }
    }
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output format.
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    pub format: FormatArg,

    /// Output file name; any extension is replaced by the format's.
    #[arg(long, default_value = "historical_data")]
    pub file: PathBuf,
}
