use cryptohist_core::{average_by_month, MonthlyAverage, OhlcField, PriceSeries};

use crate::error::CliError;

use super::money;

pub fn run(series: &PriceSeries, field: OhlcField) -> Result<String, CliError> {
    let averages = average_by_month(series, field)?;
    Ok(render(&averages))
}

fn render(averages: &[MonthlyAverage]) -> String {
    let mut out = format!("{:<10}{:>20}{:>8}\n", "Date", "Average price ($)", "Days");
    for average in averages {
        out.push_str(&format!(
            "{:<10}{:>20}{:>8}\n",
            average.month.to_string(),
            money(average.average),
            average.sample_count
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::Month;

    use cryptohist_core::YearMonth;

    use super::*;

    #[test]
    fn renders_one_row_per_month() {
        let text = render(&[
            MonthlyAverage {
                month: YearMonth::new(2020, Month::January),
                average: dec!(8388.2467),
                sample_count: 31,
            },
            MonthlyAverage {
                month: YearMonth::new(2020, Month::February),
                average: dec!(15),
                sample_count: 2,
            },
        ]);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Average price ($)"));
        assert!(lines[1].starts_with("2020-01"));
        assert!(lines[1].contains("8388.25"));
        assert!(lines[2].contains("15.00"));
    }
}
