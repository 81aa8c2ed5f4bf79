//! # Domain Models
//!
//! Validated value types shared by every component.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Coin`] | Normalized upstream coin id (`btc-bitcoin`) |
//! | [`OhlcRecord`] | One day of open/high/low/close prices |
//! | [`PriceSeries`] | Date-ordered records for one coin |
//! | [`OhlcField`] | Closed selector over the four price columns |
//! | [`YearMonth`] | Calendar month bucket |
//!
//! Prices are [`rust_decimal::Decimal`] so values round-trip exactly from
//! the API, through the warehouse, into exports.

mod coin;
mod models;

pub use coin::Coin;
pub use models::{OhlcField, OhlcRecord, PriceSeries, YearMonth};
