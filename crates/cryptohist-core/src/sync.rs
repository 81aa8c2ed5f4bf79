//! Cache synchronization: serve a range from the store, fetching only the
//! days it lacks.

use std::sync::Arc;
use std::time::Instant;

use time::{Date, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::coverage::missing_sub_ranges;
use crate::fetcher::MarketDataFetcher;
use crate::store::{FetchAudit, PriceStore};
use crate::{Coin, CoreError, DateRange, OhlcRecord, PriceSeries};

/// A missing sub-range whose fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRange {
    pub range: DateRange,
    pub message: String,
}

/// What a synchronization did to assemble a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub requested: DateRange,
    /// Records already present in the store.
    pub cached_records: usize,
    /// Records returned by the fetcher.
    pub fetched_records: usize,
    /// Fetched records that were new to the store.
    pub inserted_records: usize,
    pub fetched_ranges: Vec<DateRange>,
    pub failed_ranges: Vec<FailedRange>,
}

impl SyncReport {
    fn new(requested: DateRange) -> Self {
        Self {
            requested,
            cached_records: 0,
            fetched_records: 0,
            inserted_records: 0,
            fetched_ranges: Vec::new(),
            failed_ranges: Vec::new(),
        }
    }

    /// The store covered every requested day, nothing was fetched.
    pub fn cache_hit(&self) -> bool {
        self.fetched_ranges.is_empty() && self.failed_ranges.is_empty()
    }

    /// At least one missing sub-range could not be fetched.
    pub fn is_partial(&self) -> bool {
        !self.failed_ranges.is_empty()
    }
}

/// Assembled series plus the report describing how it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub series: PriceSeries,
    pub report: SyncReport,
}

/// Merges cached and freshly fetched records for a requested range.
#[derive(Clone)]
pub struct CacheSynchronizer {
    store: Arc<dyn PriceStore>,
    fetcher: Arc<dyn MarketDataFetcher>,
}

impl CacheSynchronizer {
    pub fn new(store: Arc<dyn PriceStore>, fetcher: Arc<dyn MarketDataFetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Return the series for `coin` over `range`.
    ///
    /// Sub-ranges the store lacks are fetched in order and persisted with
    /// insert-if-absent. A failed fetch does not abort the others: the series
    /// is returned with the failure listed in [`SyncReport::failed_ranges`].
    /// Only when fetching failed and nothing at all is available does this
    /// return [`CoreError::UpstreamUnavailable`].
    pub async fn get_series(&self, coin: &Coin, range: DateRange) -> Result<SyncOutcome, CoreError> {
        let cached = self.store.query_range(coin, range)?;
        let mut report = SyncReport::new(range);
        report.cached_records = cached.len();

        // Days an earlier fetch returned nothing for count as covered once
        // they are in the past; today and later may still gain data.
        let today = OffsetDateTime::now_utc().date();
        let fetched_before = self.store.covered_ranges(coin, range)?;
        let mut covered: Vec<Date> = cached.iter().map(|record| record.date).collect();
        covered.extend(
            fetched_before
                .iter()
                .flat_map(DateRange::iter_days)
                .filter(|day| *day < today),
        );
        let missing = missing_sub_ranges(range, &covered);
        debug!(
            coin = %coin,
            range = %range,
            cached = cached.len(),
            previously_fetched = fetched_before.len(),
            missing = missing.len(),
            "cache plan computed"
        );

        let mut fetched: Vec<OhlcRecord> = Vec::new();
        for sub_range in missing {
            let started = Instant::now();
            let result = self.fetcher.fetch(coin, sub_range).await;
            let latency_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(records) => {
                    let records: Vec<OhlcRecord> = records
                        .into_iter()
                        .filter(|record| record.coin == *coin && sub_range.contains(record.date))
                        .collect();
                    let inserted = self.store.insert_all_if_absent(&records)?;
                    info!(
                        coin = %coin,
                        range = %sub_range,
                        fetched = records.len(),
                        inserted,
                        "fetched missing range"
                    );
                    self.audit(FetchAudit {
                        coin: coin.clone(),
                        range: sub_range,
                        row_count: records.len(),
                        latency_ms,
                        error: None,
                    });

                    report.fetched_records += records.len();
                    report.inserted_records += inserted;
                    report.fetched_ranges.push(sub_range);
                    fetched.extend(records);
                }
                Err(error) => {
                    warn!(coin = %coin, range = %sub_range, error = %error, "fetch failed");
                    self.audit(FetchAudit {
                        coin: coin.clone(),
                        range: sub_range,
                        row_count: 0,
                        latency_ms,
                        error: Some(error.to_string()),
                    });
                    report.failed_ranges.push(FailedRange {
                        range: sub_range,
                        message: error.to_string(),
                    });
                }
            }
        }

        // Cached records come first so they win any duplicate date.
        let series = PriceSeries::from_records(coin.clone(), cached.into_iter().chain(fetched));

        if series.is_empty() && report.is_partial() {
            let message = report
                .failed_ranges
                .iter()
                .map(|failed| format!("{}: {}", failed.range, failed.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CoreError::UpstreamUnavailable { message });
        }

        Ok(SyncOutcome { series, report })
    }

    fn audit(&self, audit: FetchAudit) {
        if let Err(error) = self.store.record_fetch(&audit) {
            warn!(error = %error, "failed to record fetch audit");
        }
    }
}
