//! Resolution of user supplied date strings into inclusive calendar ranges.
//!
//! Each endpoint is accepted either at day granularity (`YYYY-MM-DD`) or at
//! month granularity (`YYYY-MM`). A month given as the start expands to the
//! first day of that month, a month given as the end expands to its last day.
//! The two endpoints are resolved independently, so `2020-01` to `2020-03-15`
//! is a valid request.

use std::fmt::{Display, Formatter};

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Duration};

use crate::CoreError;

const DAY_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month padding:none]-[day padding:none]");

/// Canonical textual form of a date (`YYYY-MM-DD`).
pub fn format_date(date: Date) -> String {
    date.to_string()
}

/// Parse a date in day granularity.
pub fn parse_date(raw: &str) -> Result<Date, CoreError> {
    Date::parse(raw.trim(), DAY_FORMAT).map_err(|_| CoreError::InvalidDateFormat {
        value: raw.to_owned(),
    })
}

/// One endpoint of a requested range, before month expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateInput {
    Day(Date),
    /// First day of the named month.
    Month(Date),
}

impl DateInput {
    /// Parse `YYYY-MM-DD` or `YYYY-MM`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let invalid = || CoreError::InvalidDateFormat {
            value: raw.to_owned(),
        };

        match trimmed.matches('-').count() {
            2 => Date::parse(trimmed, DAY_FORMAT)
                .map(Self::Day)
                .map_err(|_| invalid()),
            1 => Date::parse(&format!("{trimmed}-01"), DAY_FORMAT)
                .map(Self::Month)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    /// Resolve as the start of a range.
    pub fn as_start(self) -> Date {
        match self {
            Self::Day(date) | Self::Month(date) => date,
        }
    }

    /// Resolve as the end of a range.
    pub fn as_end(self) -> Date {
        match self {
            Self::Day(date) => date,
            Self::Month(first) => last_day_of_month(first),
        }
    }
}

fn last_day_of_month(first: Date) -> Date {
    let next_month = first.month().next();
    let next_year = if next_month == time::Month::January {
        first.year() + 1
    } else {
        first.year()
    };

    Date::from_calendar_date(next_year, next_month, 1)
        .ok()
        .and_then(Date::previous_day)
        .unwrap_or_else(|| {
            // Only reachable at the edge of the representable calendar.
            first
                .replace_day(time::util::days_in_year_month(first.year(), first.month()))
                .unwrap_or(first)
        })
}

/// Inclusive range of calendar days. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidRange {
                start: format_date(start),
                end: format_date(end),
            });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one day.
    pub const fn single(day: Date) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Resolve two user strings into a range, expanding month granularity.
    ///
    /// Both strings are parsed before ordering is checked, so a malformed end
    /// date is reported as [`CoreError::InvalidDateFormat`] even when the
    /// start date would also be out of order.
    pub fn resolve(start_raw: &str, end_raw: &str) -> Result<Self, CoreError> {
        let start = DateInput::parse(start_raw)?.as_start();
        let end = DateInput::parse(end_raw)?.as_end();
        Self::new(start, end)
    }

    pub const fn start(&self) -> Date {
        self.start
    }

    pub const fn end(&self) -> Date {
        self.end
    }

    /// Number of calendar days in the range.
    pub fn days(&self) -> u32 {
        let span = (self.end - self.start).whole_days();
        u32::try_from(span + 1).unwrap_or(u32::MAX)
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }

    /// Days shared by both ranges, if any.
    pub fn intersect(&self, other: DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }

    pub fn iter_days(&self) -> impl Iterator<Item = Date> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |day| {
            day.next_day().filter(|next| *next <= end)
        })
    }

    /// Split into consecutive chunks of at most `max_days` days.
    pub fn split(&self, max_days: u32) -> Vec<DateRange> {
        let step = i64::from(max_days.max(1));
        let mut chunks = Vec::new();
        let mut cursor = self.start;

        loop {
            let tail = cursor
                .checked_add(Duration::days(step - 1))
                .map_or(self.end, |tail| tail.min(self.end));
            chunks.push(Self {
                start: cursor,
                end: tail,
            });

            match tail.next_day() {
                Some(next) if tail < self.end => cursor = next,
                _ => break,
            }
        }

        chunks
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
