//! Market data fetcher contract and the Coinpaprika implementation.
//!
//! A fetch returns records only for days the upstream has data for. An empty
//! result is not an error.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::num::NonZeroU32;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use rust_decimal::Decimal;
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::config::ApiConfig;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::{Coin, DateRange, OhlcRecord};

/// Fetch failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    UnknownCoin,
    Status,
    Transport,
    Timeout,
    Decode,
}

/// Structured fetch error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    status: Option<u16>,
}

impl FetchError {
    pub fn unknown_coin(coin: &Coin) -> Self {
        Self {
            kind: FetchErrorKind::UnknownCoin,
            message: format!("coin '{coin}' is not known upstream"),
            status: Some(404),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Status,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Transport,
            message: message.into(),
            status: None,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Timeout,
            message: message.into(),
            status: None,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Decode,
            message: message.into(),
            status: None,
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn http_status(&self) -> Option<u16> {
        self.status
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::UnknownCoin => "fetch.unknown_coin",
            FetchErrorKind::Status => "fetch.status",
            FetchErrorKind::Transport => "fetch.transport",
            FetchErrorKind::Timeout => "fetch.timeout",
            FetchErrorKind::Decode => "fetch.decode",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

/// Source of daily OHLC records for a coin.
pub trait MarketDataFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        coin: &'a Coin,
        range: DateRange,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<OhlcRecord>, FetchError>> + Send + 'a>>;
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Fetcher for `GET /coins/{coin}/ohlcv/historical`.
///
/// Ranges longer than the configured page size are requested page by page,
/// each page paced by a shared rate limiter.
#[derive(Clone)]
pub struct CoinpaprikaFetcher {
    config: ApiConfig,
    http_client: Arc<dyn HttpClient>,
    limiter: Arc<DirectRateLimiter>,
}

impl CoinpaprikaFetcher {
    pub fn new(config: ApiConfig) -> Self {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(config: ApiConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn page_url(&self, coin: &Coin, page: DateRange) -> String {
        format!(
            "{}/coins/{}/ohlcv/historical?start={}&end={}&limit={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(coin.as_str()),
            page.start(),
            page.end(),
            page.days()
        )
    }

    async fn fetch_page(&self, coin: &Coin, page: DateRange) -> Result<Vec<OhlcRecord>, FetchError> {
        self.limiter.until_ready().await;

        let request = HttpRequest::get(self.page_url(coin, page))
            .with_header("accept", "application/json")
            .with_timeout_ms(self.config.request_timeout_ms);

        let started = Instant::now();
        let response = self.http_client.execute(request).await.map_err(|error| {
            if error.timed_out() {
                FetchError::timeout(format!("coinpaprika: {}", error.message()))
            } else {
                FetchError::transport(format!("coinpaprika: {}", error.message()))
            }
        })?;

        debug!(
            coin = %coin,
            page = %page,
            status = response.status,
            latency_ms = started.elapsed().as_millis() as u64,
            "coinpaprika page received"
        );

        if response.status == 404 {
            return Err(FetchError::unknown_coin(coin));
        }
        if !response.is_success() {
            return Err(FetchError::status(
                response.status,
                format!(
                    "coinpaprika returned status {}: {}",
                    response.status,
                    upstream_message(&response.body)
                ),
            ));
        }

        parse_history(coin, page, &response.body)
    }
}

impl MarketDataFetcher for CoinpaprikaFetcher {
    fn fetch<'a>(
        &'a self,
        coin: &'a Coin,
        range: DateRange,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<OhlcRecord>, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let mut records = Vec::new();
            for page in range.split(self.config.page_size()) {
                records.extend(self.fetch_page(coin, page).await?);
            }
            Ok(records)
        })
    }
}

#[derive(Debug, Deserialize)]
struct PaprikaRow {
    time_close: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    open: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    high: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    low: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    close: Decimal,
}

#[derive(Debug, Deserialize)]
struct PaprikaErrorBody {
    error: String,
}

fn upstream_message(body: &str) -> String {
    serde_json::from_str::<PaprikaErrorBody>(body)
        .map(|payload| payload.error)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

/// Decode a historical OHLCV payload, keeping only rows dated inside `page`.
fn parse_history(coin: &Coin, page: DateRange, body: &str) -> Result<Vec<OhlcRecord>, FetchError> {
    let rows: Vec<PaprikaRow> = serde_json::from_str(body)
        .map_err(|e| FetchError::decode(format!("coinpaprika payload: {e}")))?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let date = OffsetDateTime::parse(&row.time_close, &Rfc3339)
            .map_err(|e| {
                FetchError::decode(format!("invalid time_close '{}': {e}", row.time_close))
            })?
            .date();
        if !page.contains(date) {
            continue;
        }

        let record = OhlcRecord::new(coin.clone(), date, row.open, row.high, row.low, row.close)
            .map_err(|e| FetchError::decode(e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use rust_decimal_macros::dec;
    use time::macros::date;

    use super::*;
    use crate::http_client::{HttpError, HttpResponse};

    struct ScriptedHttpClient {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttpClient {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .expect("request log should not be poisoned")
                .iter()
                .map(|request| request.url.clone())
                .collect()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request log should not be poisoned")
                .push(request);
            let response = self
                .responses
                .lock()
                .expect("script should not be poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::ok_json("[]")));
            Box::pin(async move { response })
        }
    }

    fn config(rows_per_request: u32) -> ApiConfig {
        ApiConfig {
            base_url: String::from("http://paprika.test/v1"),
            rows_per_request,
            requests_per_second: 1_000,
            ..ApiConfig::default()
        }
    }

    fn range(start: time::Date, end: time::Date) -> DateRange {
        DateRange::new(start, end).expect("range")
    }

    const TWO_DAYS: &str = r#"[
        {"time_open":"2020-01-01T00:00:00Z","time_close":"2020-01-01T23:59:59Z",
         "open":7194.89,"high":7254.33,"low":7174.94,"close":7200.17,"volume":1,"market_cap":2},
        {"time_open":"2020-01-02T00:00:00Z","time_close":"2020-01-02T23:59:59Z",
         "open":7202.55,"high":7212.16,"low":6935.27,"close":6985.47,"volume":1,"market_cap":2}
    ]"#;

    #[tokio::test]
    async fn parses_rows_with_exact_decimals() {
        let client = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json(TWO_DAYS))]));
        let fetcher = CoinpaprikaFetcher::with_http_client(config(360), client.clone());

        let records = fetcher
            .fetch(
                &Coin::default(),
                range(date!(2020 - 01 - 01), date!(2020 - 01 - 02)),
            )
            .await
            .expect("fetch should succeed");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, date!(2020 - 01 - 01));
        assert_eq!(records[0].close, dec!(7200.17));
        assert_eq!(records[1].low, dec!(6935.27));
        assert_eq!(
            client.urls(),
            vec![String::from(
                "http://paprika.test/v1/coins/btc-bitcoin/ohlcv/historical?start=2020-01-01&end=2020-01-02&limit=2"
            )]
        );
    }

    #[tokio::test]
    async fn long_ranges_are_paginated() {
        let client = Arc::new(ScriptedHttpClient::new(Vec::new()));
        let fetcher = CoinpaprikaFetcher::with_http_client(config(4), client.clone());

        let records = fetcher
            .fetch(
                &Coin::default(),
                range(date!(2020 - 01 - 01), date!(2020 - 01 - 10)),
            )
            .await
            .expect("empty pages are not an error");

        assert!(records.is_empty());
        let urls = client.urls();
        assert_eq!(urls.len(), 3);
        assert!(urls[1].contains("start=2020-01-05&end=2020-01-08&limit=4"));
        assert!(urls[2].contains("start=2020-01-09&end=2020-01-10&limit=2"));
    }

    #[tokio::test]
    async fn rows_outside_page_are_dropped() {
        let client = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::ok_json(TWO_DAYS))]));
        let fetcher = CoinpaprikaFetcher::with_http_client(config(360), client);

        let records = fetcher
            .fetch(&Coin::default(), DateRange::single(date!(2020 - 01 - 02)))
            .await
            .expect("fetch should succeed");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, date!(2020 - 01 - 02));
    }

    #[tokio::test]
    async fn not_found_is_unknown_coin() {
        let client = Arc::new(ScriptedHttpClient::new(vec![Ok(HttpResponse::with_status(
            404,
            r#"{"error":"id not found"}"#,
        ))]));
        let fetcher = CoinpaprikaFetcher::with_http_client(config(360), client);
        let coin = Coin::parse("nope-coin").expect("coin");

        let error = fetcher
            .fetch(&coin, DateRange::single(date!(2020 - 01 - 01)))
            .await
            .expect_err("404 must fail");

        assert_eq!(error.kind(), FetchErrorKind::UnknownCoin);
        assert_eq!(error.http_status(), Some(404));
    }

    #[tokio::test]
    async fn status_and_transport_failures_are_classified() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            Ok(HttpResponse::with_status(
                402,
                r#"{"error":"Getting historical OHLCV data before 2024 is not allowed"}"#,
            )),
            Err(HttpError::timeout("deadline elapsed")),
            Ok(HttpResponse::ok_json("{not json")),
        ]));
        let fetcher = CoinpaprikaFetcher::with_http_client(config(360), client);
        let day = DateRange::single(date!(2020 - 01 - 01));

        let status = fetcher.fetch(&Coin::default(), day).await.expect_err("402");
        assert_eq!(status.kind(), FetchErrorKind::Status);
        assert!(status.message().contains("before 2024"));

        let timeout = fetcher.fetch(&Coin::default(), day).await.expect_err("timeout");
        assert_eq!(timeout.kind(), FetchErrorKind::Timeout);

        let decode = fetcher.fetch(&Coin::default(), day).await.expect_err("decode");
        assert_eq!(decode.kind(), FetchErrorKind::Decode);
    }
}
