//! Runtime configuration threaded explicitly through the fetcher and store.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CRYPTOHIST_HOME` | `$HOME/.cryptohist` |
//! | `CRYPTOHIST_DB_PATH` | `$CRYPTOHIST_HOME/cache/warehouse.duckdb` |
//! | `CRYPTOHIST_API_URL` | `https://api.coinpaprika.com/v1` |
//! | `CRYPTOHIST_TIMEOUT_MS` | `5000` |
//! | `CRYPTOHIST_ROWS_PER_REQUEST` | `360` |
//! | `CRYPTOHIST_REQUESTS_PER_SECOND` | `5` |

use std::env;
use std::path::PathBuf;

use cryptohist_warehouse::WarehouseConfig;

pub const DEFAULT_API_URL: &str = "https://api.coinpaprika.com/v1";
/// Upstream refuses historical requests spanning more rows than this.
pub const MAX_ROWS_PER_REQUEST: u32 = 360;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

/// Remote market data API settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub rows_per_request: u32,
    pub requests_per_second: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_API_URL),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
            rows_per_request: MAX_ROWS_PER_REQUEST,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Page size clamped to `1..=MAX_ROWS_PER_REQUEST`.
    pub fn page_size(&self) -> u32 {
        self.rows_per_request.clamp(1, MAX_ROWS_PER_REQUEST)
    }
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub warehouse: WarehouseConfig,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut warehouse = match var("CRYPTOHIST_HOME") {
            Some(home) => WarehouseConfig::with_home(home),
            None => WarehouseConfig::default(),
        };
        if let Some(db_path) = var("CRYPTOHIST_DB_PATH") {
            warehouse.db_path = PathBuf::from(db_path);
        }

        let mut api = ApiConfig::default();
        if let Some(url) = var("CRYPTOHIST_API_URL") {
            api = api.with_base_url(url);
        }
        if let Some(timeout) = var("CRYPTOHIST_TIMEOUT_MS").and_then(|v| v.trim().parse().ok()) {
            api.request_timeout_ms = timeout;
        }
        if let Some(rows) = var("CRYPTOHIST_ROWS_PER_REQUEST").and_then(|v| v.trim().parse().ok())
        {
            api.rows_per_request = rows;
        }
        if let Some(rps) = var("CRYPTOHIST_REQUESTS_PER_SECOND").and_then(|v| v.trim().parse().ok())
        {
            api.requests_per_second = rps;
        }

        Self { api, warehouse }
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.warehouse.db_path = db_path.into();
        self
    }

    pub fn with_api_url(mut self, base_url: impl Into<String>) -> Self {
        self.api = self.api.with_base_url(base_url);
        self
    }
}
