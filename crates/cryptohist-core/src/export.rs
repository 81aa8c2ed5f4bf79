//! Flat-file export of a price series.
//!
//! Existing files at the target path are overwritten. A failed write may
//! leave a partially written file behind.

use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::info;

use crate::{CoreError, OhlcRecord, PriceSeries};

pub const CSV_HEADER: &str = "date,open,high,low,close";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Replace any extension on `name` with this format's extension.
    ///
    /// `report.json` exported as CSV becomes `report.csv`.
    pub fn file_name_for(self, name: impl AsRef<Path>) -> PathBuf {
        name.as_ref().with_extension(self.extension())
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(CoreError::UnsupportedFormat {
                value: value.to_owned(),
            }),
        }
    }
}

/// One exported row. Prices serialize as JSON numbers with every digit kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub open: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub high: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub low: Decimal,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub close: Decimal,
}

impl From<&OhlcRecord> for ExportRow {
    fn from(record: &OhlcRecord) -> Self {
        Self {
            date: record.date,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
        }
    }
}

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Write `series` to `path` in `format`.
pub fn export(series: &PriceSeries, format: ExportFormat, path: &Path) -> Result<(), CoreError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_series(series, format, &mut writer)?;
    writer.flush()?;

    info!(
        path = %path.display(),
        format = %format,
        rows = series.len(),
        "exported series"
    );
    Ok(())
}

/// Like [`export`], with the format given by name. An unknown name fails with
/// [`CoreError::UnsupportedFormat`] before the file is created.
pub fn export_named(series: &PriceSeries, format: &str, path: &Path) -> Result<(), CoreError> {
    let format = format.parse::<ExportFormat>()?;
    export(series, format, path)
}

/// Serialize `series` into any writer.
pub fn write_series<W: Write>(
    series: &PriceSeries,
    format: ExportFormat,
    writer: &mut W,
) -> Result<(), CoreError> {
    match format {
        ExportFormat::Csv => {
            writeln!(writer, "{CSV_HEADER}")?;
            for record in series {
                writeln!(
                    writer,
                    "{},{},{},{},{}",
                    record.date, record.open, record.high, record.low, record.close
                )?;
            }
        }
        ExportFormat::Json => {
            let rows: Vec<ExportRow> = series.iter().map(ExportRow::from).collect();
            serde_json::to_writer_pretty(&mut *writer, &rows)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

/// Parse a JSON export back into rows.
pub fn read_json_rows(json: &str) -> Result<Vec<ExportRow>, CoreError> {
    Ok(serde_json::from_str(json)?)
}
