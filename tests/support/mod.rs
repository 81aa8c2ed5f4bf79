//! Shared fixtures for behaviour tests.

#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use cryptohist_core::{Coin, DateRange, FetchError, MarketDataFetcher, OhlcRecord, PriceSeries};
use rust_decimal::Decimal;
use time::{Date, Duration, Month};

/// Day `n` of January 2020.
pub fn jan(n: u8) -> Date {
    Date::from_calendar_date(2020, Month::January, n).expect("valid January day")
}

pub fn record(date: Date, close: Decimal) -> OhlcRecord {
    OhlcRecord::new(Coin::default(), date, close, close, close, close).expect("valid record")
}

/// Series with one record per consecutive day starting 2020-01-01.
pub fn daily_series(closes: &[Decimal]) -> PriceSeries {
    PriceSeries::from_records(
        Coin::default(),
        closes
            .iter()
            .enumerate()
            .map(|(offset, close)| record(jan(1) + Duration::days(offset as i64), *close)),
    )
}

/// Fetcher serving a fixed data set, or failing every call.
pub struct ScriptedFetcher {
    available: Vec<OhlcRecord>,
    fail_with: Option<String>,
    calls: Mutex<Vec<DateRange>>,
}

impl ScriptedFetcher {
    pub fn serving(available: Vec<OhlcRecord>) -> Self {
        Self {
            available,
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            available: Vec::new(),
            fail_with: Some(message.to_owned()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Ranges requested so far, in call order.
    pub fn calls(&self) -> Vec<DateRange> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl MarketDataFetcher for ScriptedFetcher {
    fn fetch<'a>(
        &'a self,
        coin: &'a Coin,
        range: DateRange,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<OhlcRecord>, FetchError>> + Send + 'a>> {
        self.calls.lock().expect("calls lock").push(range);
        let result = match &self.fail_with {
            Some(message) => Err(FetchError::transport(message.clone())),
            None => Ok(self
                .available
                .iter()
                .filter(|record| record.coin == *coin && range.contains(record.date))
                .cloned()
                .collect()),
        };
        Box::pin(async move { result })
    }
}
