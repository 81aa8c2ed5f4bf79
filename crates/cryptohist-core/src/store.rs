//! Persistent price store seam.
//!
//! [`PriceStore`] is what the synchronizer consumes. The DuckDB
//! [`Warehouse`] implements it for real runs, [`MemoryStore`] backs tests and
//! throwaway sessions.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cryptohist_warehouse::{IngestLogEntry, IngestStatus, PriceRow, Warehouse};
use rust_decimal::Decimal;
use time::Date;
use tracing::debug;
use uuid::Uuid;

use crate::date_range::{format_date, parse_date};
use crate::{Coin, CoreError, DateRange, OhlcRecord, ValidationError};

/// Audit details of one upstream fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAudit {
    pub coin: Coin,
    pub range: DateRange,
    pub row_count: usize,
    pub latency_ms: u64,
    /// Failure message, `None` on success.
    pub error: Option<String>,
}

/// Keyed `(coin, date) -> record` storage.
pub trait PriceStore: Send + Sync {
    /// Records of `coin` inside `range`, ordered by date.
    fn query_range(&self, coin: &Coin, range: DateRange) -> Result<Vec<OhlcRecord>, CoreError>;

    /// Insert unless a record for the same coin and date exists.
    /// Returns whether the record was newly inserted.
    fn insert_if_absent(&self, record: &OhlcRecord) -> Result<bool, CoreError>;

    /// Insert every absent record, returning how many were new.
    fn insert_all_if_absent(&self, records: &[OhlcRecord]) -> Result<usize, CoreError> {
        let mut inserted = 0;
        for record in records {
            if self.insert_if_absent(record)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Record an upstream fetch. Stores without an audit trail ignore it.
    fn record_fetch(&self, audit: &FetchAudit) -> Result<(), CoreError> {
        let _ = audit;
        Ok(())
    }

    /// Parts of `range` already fetched successfully for `coin`, whether or
    /// not upstream had records for them. Clamped to `range`.
    fn covered_ranges(&self, coin: &Coin, range: DateRange) -> Result<Vec<DateRange>, CoreError> {
        let _ = (coin, range);
        Ok(Vec::new())
    }
}

impl PriceStore for Warehouse {
    fn query_range(&self, coin: &Coin, range: DateRange) -> Result<Vec<OhlcRecord>, CoreError> {
        let rows = Warehouse::query_range(
            self,
            coin.as_str(),
            &format_date(range.start()),
            &format_date(range.end()),
        )?;
        rows.into_iter().map(record_from_row).collect()
    }

    fn insert_if_absent(&self, record: &OhlcRecord) -> Result<bool, CoreError> {
        Ok(Warehouse::insert_if_absent(self, &row_from_record(record))?)
    }

    fn insert_all_if_absent(&self, records: &[OhlcRecord]) -> Result<usize, CoreError> {
        let rows: Vec<PriceRow> = records.iter().map(row_from_record).collect();
        Ok(self.insert_rows_if_absent(&rows)?)
    }

    fn record_fetch(&self, audit: &FetchAudit) -> Result<(), CoreError> {
        let entry = IngestLogEntry {
            request_id: Uuid::new_v4().to_string(),
            coin: audit.coin.to_string(),
            range_start: format_date(audit.range.start()),
            range_end: format_date(audit.range.end()),
            status: if audit.error.is_some() {
                IngestStatus::Failed
            } else {
                IngestStatus::Ok
            },
            row_count: audit.row_count as u64,
            latency_ms: Some(audit.latency_ms),
            message: audit.error.clone(),
        };
        debug!(request_id = %entry.request_id, coin = %entry.coin, "recording ingest");
        self.log_ingest(&entry)?;
        Ok(())
    }

    fn covered_ranges(&self, coin: &Coin, range: DateRange) -> Result<Vec<DateRange>, CoreError> {
        let logged = self.fetched_ranges(
            coin.as_str(),
            &format_date(range.start()),
            &format_date(range.end()),
        )?;

        let mut covered = Vec::with_capacity(logged.len());
        for (start, end) in logged {
            let fetched = DateRange::new(stored_date(&start)?, stored_date(&end)?)?;
            covered.extend(fetched.intersect(range));
        }
        Ok(covered)
    }
}

fn stored_date(value: &str) -> Result<Date, ValidationError> {
    parse_date(value).map_err(|_| ValidationError::InvalidDate {
        value: value.to_owned(),
    })
}

fn row_from_record(record: &OhlcRecord) -> PriceRow {
    PriceRow {
        coin: record.coin.to_string(),
        date: format_date(record.date),
        open: record.open.to_string(),
        high: record.high.to_string(),
        low: record.low.to_string(),
        close: record.close.to_string(),
    }
}

fn record_from_row(row: PriceRow) -> Result<OhlcRecord, CoreError> {
    let coin = Coin::parse(&row.coin)?;
    let date = stored_date(&row.date)?;

    Ok(OhlcRecord::new(
        coin,
        date,
        decimal("open", &row.open)?,
        decimal("high", &row.high)?,
        decimal("low", &row.low)?,
        decimal("close", &row.close)?,
    )?)
}

fn decimal(field: &'static str, value: &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str_exact(value)
        .or_else(|_| Decimal::from_str(value))
        .map_err(|_| ValidationError::InvalidPrice {
            field,
            value: value.to_owned(),
        })
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<(Coin, Date), OhlcRecord>>,
    audits: Mutex<Vec<FetchAudit>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `records`; later duplicates are ignored.
    pub fn with_records(records: impl IntoIterator<Item = OhlcRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.lock_records();
            for record in records {
                map.entry((record.coin.clone(), record.date))
                    .or_insert(record);
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.lock_records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_records().is_empty()
    }

    pub fn audits(&self) -> Vec<FetchAudit> {
        self.audits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_records(&self) -> MutexGuard<'_, BTreeMap<(Coin, Date), OhlcRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PriceStore for MemoryStore {
    fn query_range(&self, coin: &Coin, range: DateRange) -> Result<Vec<OhlcRecord>, CoreError> {
        let map = self.lock_records();
        let lower = (coin.clone(), range.start());
        let upper = (coin.clone(), range.end());
        Ok(map.range(lower..=upper).map(|(_, record)| record.clone()).collect())
    }

    fn insert_if_absent(&self, record: &OhlcRecord) -> Result<bool, CoreError> {
        let mut map = self.lock_records();
        let key = (record.coin.clone(), record.date);
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(key, record.clone());
        Ok(true)
    }

    fn record_fetch(&self, audit: &FetchAudit) -> Result<(), CoreError> {
        self.audits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(audit.clone());
        Ok(())
    }

    fn covered_ranges(&self, coin: &Coin, range: DateRange) -> Result<Vec<DateRange>, CoreError> {
        let audits = self.audits.lock().unwrap_or_else(PoisonError::into_inner);
        let mut covered: Vec<DateRange> = audits
            .iter()
            .filter(|audit| audit.error.is_none() && audit.coin == *coin)
            .filter_map(|audit| audit.range.intersect(range))
            .collect();
        covered.sort_by_key(DateRange::start);
        Ok(covered)
    }
}
