use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use time::{Date, Month};

use crate::{Coin, ValidationError};

/// Which price column an analysis reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OhlcField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl OhlcField {
    pub const ALL: [Self; 4] = [Self::Open, Self::High, Self::Low, Self::Close];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
        }
    }

    /// Read this field from a record.
    pub const fn select(self, record: &OhlcRecord) -> Decimal {
        match self {
            Self::Open => record.open,
            Self::High => record.high,
            Self::Low => record.low,
            Self::Close => record.close,
        }
    }
}

impl Display for OhlcField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OhlcField {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ValidationError::UnknownField {
                value: value.to_owned(),
            })
    }
}

/// One day of OHLC prices for a coin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OhlcRecord {
    pub coin: Coin,
    pub date: Date,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl OhlcRecord {
    pub fn new(
        coin: Coin,
        date: Date,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;

        Ok(Self {
            coin,
            date,
            open,
            high,
            low,
            close,
        })
    }

    pub const fn value(&self, field: OhlcField) -> Decimal {
        field.select(self)
    }
}

fn validate_non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::InvalidPrice {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Date-ordered daily prices for one coin.
///
/// Dates are strictly increasing but not necessarily contiguous: days the
/// upstream source has no data for are simply absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSeries {
    coin: Coin,
    records: Vec<OhlcRecord>,
}

impl PriceSeries {
    /// Build a series from records in any order.
    ///
    /// Records for other coins are dropped. When two records share a date the
    /// one that appears first in `records` is kept.
    pub fn from_records(coin: Coin, records: impl IntoIterator<Item = OhlcRecord>) -> Self {
        let mut records: Vec<OhlcRecord> = records
            .into_iter()
            .filter(|record| record.coin == coin)
            .collect();
        // Stable sort keeps the first occurrence of a date ahead of later ones.
        records.sort_by_key(|record| record.date);
        records.dedup_by_key(|record| record.date);
        Self { coin, records }
    }

    pub fn empty(coin: Coin) -> Self {
        Self {
            coin,
            records: Vec::new(),
        }
    }

    pub fn coin(&self) -> &Coin {
        &self.coin
    }

    pub fn records(&self) -> &[OhlcRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OhlcRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OhlcRecord> {
        self.records.iter()
    }

    pub fn dates(&self) -> Vec<Date> {
        self.records.iter().map(|record| record.date).collect()
    }
}

impl<'a> IntoIterator for &'a PriceSeries {
    type Item = &'a OhlcRecord;
    type IntoIter = std::slice::Iter<'a, OhlcRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u8,
}

impl YearMonth {
    pub fn new(year: i32, month: Month) -> Self {
        Self {
            year,
            month: u8::from(month),
        }
    }

    pub fn of(date: Date) -> Self {
        Self::new(date.year(), date.month())
    }

    pub const fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> Month {
        Month::try_from(self.month).unwrap_or(Month::January)
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use time::macros::date;

    fn record(date: Date, close: Decimal) -> OhlcRecord {
        OhlcRecord::new(Coin::default(), date, close, close, close, close).expect("record")
    }

    #[test]
    fn field_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<OhlcField>().expect("field"), OhlcField::High);
        assert!(matches!(
            "volume".parse::<OhlcField>(),
            Err(ValidationError::UnknownField { .. })
        ));
        assert_eq!(OhlcField::default(), OhlcField::Close);
    }

    #[test]
    fn rejects_negative_prices() {
        let err = OhlcRecord::new(
            Coin::default(),
            date!(2020 - 01 - 01),
            dec!(1),
            dec!(1),
            dec!(-1),
            dec!(1),
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidPrice { field: "low", .. }));
    }

    #[test]
    fn series_sorts_and_keeps_first_duplicate() {
        let series = PriceSeries::from_records(
            Coin::default(),
            vec![
                record(date!(2020 - 01 - 03), dec!(3)),
                record(date!(2020 - 01 - 01), dec!(1)),
                record(date!(2020 - 01 - 03), dec!(99)),
            ],
        );

        assert_eq!(
            series.dates(),
            vec![date!(2020 - 01 - 01), date!(2020 - 01 - 03)]
        );
        assert_eq!(series.records()[1].close, dec!(3));
    }

    #[test]
    fn year_month_displays_zero_padded() {
        let month = YearMonth::of(date!(2021 - 02 - 14));
        assert_eq!(month.to_string(), "2021-02");
        assert_eq!(month.month(), Month::February);
        assert!(YearMonth::new(2020, Month::December) < YearMonth::new(2021, Month::January));
    }
}
