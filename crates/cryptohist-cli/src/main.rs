mod cli;
mod commands;
mod error;
mod prompt;

use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let result = commands::run(cli).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(result.output.as_bytes())?;
    stdout.flush()?;

    let report = &result.report;
    if report.is_partial() {
        eprintln!("warning: some days could not be fetched, results are partial:");
        for failed in &report.failed_ranges {
            eprintln!("  {}: {}", failed.range, failed.message);
        }
        if cli.strict {
            return Err(CliError::StrictModeViolation {
                failed_ranges: report.failed_ranges.len(),
            });
        }
    }

    Ok(ExitCode::SUCCESS)
}
