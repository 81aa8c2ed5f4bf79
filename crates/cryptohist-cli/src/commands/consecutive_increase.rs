use cryptohist_core::{longest_increasing_runs, IncreasingRun, OhlcField, PriceSeries, RunOptions};

use crate::error::CliError;

use super::money;

pub fn run(series: &PriceSeries, field: OhlcField, options: RunOptions) -> Result<String, CliError> {
    let runs = longest_increasing_runs(series, field, options)?;
    Ok(render(&runs))
}

fn render(runs: &[IncreasingRun]) -> String {
    match runs {
        [run] => format!("Longest consecutive period was {}\n", describe(run)),
        _ => {
            let mut out = String::from("More than one consecutive period of the same length:\n");
            for run in runs {
                out.push_str(&format!("  {}\n", describe(run)));
            }
            out
        }
    }
}

fn describe(run: &IncreasingRun) -> String {
    format!(
        "from {} to {} ({} {}) with increase of ${}",
        run.start_date,
        run.end_date,
        run.length,
        if run.length == 1 { "day" } else { "days" },
        money(run.increase)
    )
}
