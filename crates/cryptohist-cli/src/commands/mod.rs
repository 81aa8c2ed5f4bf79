mod average_price;
mod consecutive_increase;
mod export;

use std::sync::Arc;

use cryptohist_core::{
    CacheSynchronizer, Coin, CoinpaprikaFetcher, Config, DateRange, OhlcField, RunOptions,
    SyncReport, Warehouse,
};
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::prompt;

/// Rendered command output plus the cache report behind it.
pub struct CommandResult {
    pub output: String,
    pub report: SyncReport,
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let start_raw = prompt::value_or_prompt(cli.start_date.as_deref(), "Start date")?;
    let end_raw = prompt::value_or_prompt(cli.end_date.as_deref(), "End date")?;
    let range = DateRange::resolve(&start_raw, &end_raw)?;
    let coin = Coin::parse(&cli.coin)?;

    let config = config_for(cli);
    debug!(
        db_path = %config.warehouse.db_path.display(),
        api_url = %config.api.base_url,
        "configuration resolved"
    );
    let synchronizer = synchronizer_for(&config)?;
    let outcome = synchronizer.get_series(&coin, range).await?;

    let field = OhlcField::from(cli.ohlc);
    let output = match &cli.command {
        Command::ConsecutiveIncrease => {
            let options = if cli.reset_on_gap {
                RunOptions::reset_on_gap()
            } else {
                RunOptions::default()
            };
            consecutive_increase::run(&outcome.series, field, options)?
        }
        Command::AveragePriceByMonth => average_price::run(&outcome.series, field)?,
        Command::Export(args) => export::run(args, &outcome.series)?,
    };

    Ok(CommandResult {
        output,
        report: outcome.report,
    })
}

fn config_for(cli: &Cli) -> Config {
    let mut config = Config::from_env();
    if let Some(db_path) = &cli.db_path {
        config = config.with_db_path(db_path);
    }
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url);
    }
    config
}

fn synchronizer_for(config: &Config) -> Result<CacheSynchronizer, CliError> {
    let warehouse = Warehouse::open(config.warehouse.clone())?;
    let fetcher = CoinpaprikaFetcher::new(config.api.clone());
    Ok(CacheSynchronizer::new(
        Arc::new(warehouse),
        Arc::new(fetcher),
    ))
}

/// Price with two decimals, the way amounts are shown to the user.
fn money(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use cryptohist_core::CoreError;

    use super::*;

    fn cli_with_db(start: &str, db_path: &std::path::Path) -> Cli {
        Cli::try_parse_from([
            "cryptohist",
            "--start-date",
            start,
            "--end-date",
            "2020-01-31",
            "--api-url",
            "http://127.0.0.1:9",
            "--db-path",
            db_path.to_str().expect("utf-8 path"),
            "consecutive-increase",
        ])
        .expect("arguments parse")
    }

    #[tokio::test]
    async fn bad_dates_fail_before_the_store_is_opened() {
        // A regular file where the cache directory should be makes the store unopenable.
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").expect("blocker file");
        let db_path = blocker.join("cache").join("warehouse.duckdb");

        let error = match run(&cli_with_db("2020/01/01", &db_path)).await {
            Err(error) => error,
            Ok(_) => panic!("malformed start date must be rejected"),
        };
        assert!(matches!(
            error,
            CliError::Core(CoreError::InvalidDateFormat { .. })
        ));
        assert_eq!(error.exit_code(), 2);

        let error = match run(&cli_with_db("2020-01-01", &db_path)).await {
            Err(error) => error,
            Ok(_) => panic!("store at {} must not open", db_path.display()),
        };
        assert_eq!(error.exit_code(), 7);
    }

    #[test]
    fn money_rounds_half_away_from_zero() {
        assert_eq!(money(Decimal::new(96625, 2)), "966.25");
        assert_eq!(money(Decimal::new(9662685, 4)), "966.27");
        assert_eq!(money(Decimal::new(5, 3)), "0.01");
    }
}
