use thiserror::Error;

/// Validation errors for domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("coin id cannot be empty")]
    EmptyCoin,
    #[error("coin id length {len} exceeds max {max}")]
    CoinTooLong { len: usize, max: usize },
    #[error("coin id must start with an ASCII letter or digit: '{ch}'")]
    CoinInvalidStart { ch: char },
    #[error("coin id contains invalid character '{ch}' at index {index}")]
    CoinInvalidChar { ch: char, index: usize },

    #[error("invalid price '{value}' in field '{field}'")]
    InvalidPrice { field: &'static str, value: String },
    #[error("invalid date '{value}'")]
    InvalidDate { value: String },
    #[error("unknown OHLC field '{value}', expected one of open, high, low, close")]
    UnknownField { value: String },
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid date format '{value}', expected YYYY-MM-DD or YYYY-MM")]
    InvalidDateFormat { value: String },

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: String, end: String },

    #[error("no price records available for the requested range")]
    EmptySeries,

    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    #[error("unsupported export format '{value}', expected csv or json")]
    UnsupportedFormat { value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] cryptohist_warehouse::WarehouseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
