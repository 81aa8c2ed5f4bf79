//! Behavior-driven tests for the DuckDB warehouse
//!
//! These tests verify persistence, idempotent inserts and range queries as
//! seen through the store the synchronizer consumes.

mod support;

use cryptohist_core::{Coin, DateRange, PriceStore, Warehouse, WarehouseConfig};
use cryptohist_warehouse::PriceRow;
use rust_decimal_macros::dec;
use support::{jan, record};
use tempfile::tempdir;

fn price_row(date: &str, close: &str) -> PriceRow {
    PriceRow {
        coin: "btc-bitcoin".to_string(),
        date: date.to_string(),
        open: close.to_string(),
        high: close.to_string(),
        low: close.to_string(),
        close: close.to_string(),
    }
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn when_warehouse_is_reopened_previous_rows_are_still_there() {
    // Given: A warehouse with two rows
    let temp = tempdir().expect("tempdir");
    let config = WarehouseConfig::with_home(temp.path());
    {
        let warehouse = Warehouse::open(config.clone()).expect("warehouse open");
        warehouse
            .insert_rows_if_absent(&[
                price_row("2020-01-01", "7200.17"),
                price_row("2020-01-02", "6985.47"),
            ])
            .expect("insert");
    }

    // When: The same database is opened again
    let warehouse = Warehouse::open(config).expect("warehouse reopen");

    // Then: Rows survive and migrations do not fail on rerun
    assert_eq!(warehouse.count_prices("btc-bitcoin").expect("count"), 2);
    assert!(warehouse.db_path().ends_with("cache/warehouse.duckdb"));
}

#[test]
fn when_the_same_rows_are_inserted_twice_nothing_is_duplicated() {
    // Given: Two handles to the same warehouse
    let temp = tempdir().expect("tempdir");
    let warehouse = Warehouse::open(WarehouseConfig::with_home(temp.path())).expect("open");
    let other = warehouse.clone();
    let rows = [
        price_row("2020-01-01", "1"),
        price_row("2020-01-02", "2"),
    ];

    // When: Both insert the same batch
    let first = warehouse.insert_rows_if_absent(&rows).expect("first insert");
    let second = other.insert_rows_if_absent(&rows).expect("second insert");

    // Then: Only the first insert added rows
    assert_eq!(first, 2);
    assert_eq!(second, 0);
    assert_eq!(warehouse.count_prices("btc-bitcoin").expect("count"), 2);
}

// =============================================================================
// Store seam
// =============================================================================

#[test]
fn when_queried_through_the_store_trait_records_come_back_typed_and_ordered() {
    // Given: Records inserted out of order through the store trait
    let temp = tempdir().expect("tempdir");
    let warehouse = Warehouse::open(WarehouseConfig::with_home(temp.path())).expect("open");
    let inserted = PriceStore::insert_all_if_absent(
        &warehouse,
        &[
            record(jan(3), dec!(3.3)),
            record(jan(1), dec!(1.1)),
            record(jan(2), dec!(2.2)),
        ],
    )
    .expect("insert");
    assert_eq!(inserted, 3);

    // When: A sub-range is queried
    let range = DateRange::new(jan(2), jan(3)).expect("range");
    let records = PriceStore::query_range(&warehouse, &Coin::default(), range).expect("query");

    // Then: Only that range comes back, in date order, with exact prices
    let dates: Vec<_> = records.iter().map(|record| record.date).collect();
    assert_eq!(dates, vec![jan(2), jan(3)]);
    assert_eq!(records[0].close, dec!(2.2));
}

#[test]
fn when_another_coin_is_stored_it_does_not_leak_into_queries() {
    let temp = tempdir().expect("tempdir");
    let warehouse = Warehouse::open(WarehouseConfig::with_home(temp.path())).expect("open");
    let mut eth = price_row("2020-01-01", "130.8");
    eth.coin = "eth-ethereum".to_string();
    warehouse.insert_if_absent(&eth).expect("insert eth");
    warehouse
        .insert_if_absent(&price_row("2020-01-01", "7200.17"))
        .expect("insert btc");

    let records = PriceStore::query_range(
        &warehouse,
        &Coin::default(),
        DateRange::single(jan(1)),
    )
    .expect("query");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].close, dec!(7200.17));
}
