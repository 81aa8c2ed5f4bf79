//! Export the synchronized series to a flat file.

use cryptohist_core::{export, ExportFormat, PriceSeries};

use crate::cli::ExportArgs;
use crate::error::CliError;

pub fn run(args: &ExportArgs, series: &PriceSeries) -> Result<String, CliError> {
    let format = ExportFormat::from(args.format);
    let path = format.file_name_for(&args.file);

    export(series, format, &path)?;

    Ok(format!(
        "Exported {} records to {}\n",
        series.len(),
        path.display()
    ))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::date;

    use cryptohist_core::{Coin, OhlcRecord};

    use super::*;
    use crate::cli::FormatArg;

    #[test]
    fn replaces_extension_with_chosen_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let series = PriceSeries::from_records(
            Coin::default(),
            [OhlcRecord::new(
                Coin::default(),
                date!(2020 - 01 - 01),
                dec!(1),
                dec!(2),
                dec!(0.5),
                dec!(1.5),
            )
            .expect("record")],
        );
        let args = ExportArgs {
            format: FormatArg::Csv,
            file: dir.path().join("test_name.json"),
        };

        let message = run(&args, &series).expect("export");

        assert!(dir.path().join("test_name.csv").is_file());
        assert!(!dir.path().join("test_name.json").exists());
        assert!(message.starts_with("Exported 1 records"));
    }
}
