//! Pure analytics over a date-ordered [`PriceSeries`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use time::Date;

use crate::{CoreError, OhlcField, OhlcRecord, PriceSeries, YearMonth};

/// Whether a missing calendar day between two records breaks a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapPolicy {
    /// Compare values across gaps; only a non-increase ends a run.
    #[default]
    Ignore,
    /// A missing day ends the run even if the value increased.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub gap_policy: GapPolicy,
}

impl RunOptions {
    pub const fn reset_on_gap() -> Self {
        Self {
            gap_policy: GapPolicy::Reset,
        }
    }
}

/// A maximal stretch of strictly increasing values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncreasingRun {
    pub start_date: Date,
    pub end_date: Date,
    /// Number of days in the run (increases + 1).
    pub length: usize,
    pub values: Vec<Decimal>,
    /// Last value minus first value.
    pub increase: Decimal,
}

impl IncreasingRun {
    fn from_slice(records: &[OhlcRecord], field: OhlcField) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;
        let values: Vec<Decimal> = records.iter().map(|record| record.value(field)).collect();
        Some(Self {
            start_date: first.date,
            end_date: last.date,
            length: records.len(),
            increase: last.value(field) - first.value(field),
            values,
        })
    }
}

/// The earliest longest run, comparing by value order only.
pub fn longest_increasing_run(
    series: &PriceSeries,
    field: OhlcField,
) -> Result<IncreasingRun, CoreError> {
    longest_increasing_run_with(series, field, RunOptions::default())
}

/// The earliest longest run under `options`.
pub fn longest_increasing_run_with(
    series: &PriceSeries,
    field: OhlcField,
    options: RunOptions,
) -> Result<IncreasingRun, CoreError> {
    longest_increasing_runs(series, field, options)?
        .into_iter()
        .next()
        .ok_or(CoreError::EmptySeries)
}

/// Every run of maximal length, in chronological order.
pub fn longest_increasing_runs(
    series: &PriceSeries,
    field: OhlcField,
    options: RunOptions,
) -> Result<Vec<IncreasingRun>, CoreError> {
    let records = series.records();
    if records.is_empty() {
        return Err(CoreError::EmptySeries);
    }

    // (start index, length) of every maximal run.
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut start = 0;
    for index in 1..records.len() {
        if !extends_run(&records[index - 1], &records[index], field, options) {
            runs.push((start, index - start));
            start = index;
        }
    }
    runs.push((start, records.len() - start));

    let best = runs.iter().map(|(_, len)| *len).max().unwrap_or(1);
    Ok(runs
        .into_iter()
        .filter(|(_, len)| *len == best)
        .filter_map(|(start, len)| IncreasingRun::from_slice(&records[start..start + len], field))
        .collect())
}

fn extends_run(
    previous: &OhlcRecord,
    current: &OhlcRecord,
    field: OhlcField,
    options: RunOptions,
) -> bool {
    if options.gap_policy == GapPolicy::Reset && previous.date.next_day() != Some(current.date) {
        return false;
    }
    current.value(field) > previous.value(field)
}

/// Average of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyAverage {
    pub month: YearMonth,
    pub average: Decimal,
    pub sample_count: usize,
}

/// Arithmetic mean of `field` per calendar month present in the series,
/// ordered chronologically. Months without records are omitted.
pub fn average_by_month(
    series: &PriceSeries,
    field: OhlcField,
) -> Result<Vec<MonthlyAverage>, CoreError> {
    if series.is_empty() {
        return Err(CoreError::EmptySeries);
    }

    let mut buckets: BTreeMap<YearMonth, (Decimal, usize)> = BTreeMap::new();
    for record in series {
        let bucket = buckets
            .entry(YearMonth::of(record.date))
            .or_insert((Decimal::ZERO, 0));
        bucket.0 += record.value(field);
        bucket.1 += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|(month, (sum, count))| MonthlyAverage {
            month,
            average: (sum / Decimal::from(count)).normalize(),
            sample_count: count,
        })
        .collect())
}
