//! Behavior-driven tests for date range resolution
//!
//! These tests verify how user supplied start and end dates become an
//! inclusive range of calendar days.

use cryptohist_core::{CoreError, DateRange};
use time::macros::date;

// =============================================================================
// Month granularity
// =============================================================================

#[test]
fn when_user_gives_months_the_range_spans_whole_months() {
    // Given: Month granularity on both ends
    // When: The range is resolved
    let range = DateRange::resolve("2020-01", "2020-03").expect("range");

    // Then: It starts on the 1st and ends on the last day of March
    assert_eq!(range.start(), date!(2020 - 01 - 01));
    assert_eq!(range.end(), date!(2020 - 03 - 31));
    assert_eq!(range.days(), 91);
}

#[test]
fn when_end_month_is_february_leap_years_are_respected() {
    // Given/When: February in a leap year and a common year
    let leap = DateRange::resolve("2020-02", "2020-02").expect("leap");
    let common = DateRange::resolve("2021-02", "2021-02").expect("common");

    // Then: The month ends on the correct day
    assert_eq!(leap.end(), date!(2020 - 02 - 29));
    assert_eq!(common.end(), date!(2021 - 02 - 28));
}

#[test]
fn when_granularities_are_mixed_each_end_resolves_independently() {
    // Given: A month start and a day-level end
    let range = DateRange::resolve("2020-01", "2020-01-15").expect("range");

    // Then: Start expands to the 1st, end is kept as given
    assert_eq!(range.start(), date!(2020 - 01 - 01));
    assert_eq!(range.end(), date!(2020 - 01 - 15));

    // And: A day-level start with a month end reaches the end of that month
    let range = DateRange::resolve("2020-04-10", "2020-04").expect("range");
    assert_eq!(range.end(), date!(2020 - 04 - 30));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn when_start_is_after_end_resolution_fails_with_invalid_range() {
    // Given/When: Dates out of order
    let result = DateRange::resolve("2020-01-01", "2019-12-31");

    // Then: The range is rejected
    assert!(matches!(result, Err(CoreError::InvalidRange { .. })));
}

#[test]
fn when_a_date_is_malformed_resolution_fails_with_invalid_date_format() {
    for (start, end) in [
        ("2020/01/01", "2020-01-31"),
        ("2020-01-01", "31.01.2020"),
        ("2020-02-30", "2020-03-01"),
        ("", "2020-01"),
    ] {
        let result = DateRange::resolve(start, end);
        assert!(
            matches!(result, Err(CoreError::InvalidDateFormat { .. })),
            "({start:?}, {end:?}) should be rejected"
        );
    }
}

#[test]
fn when_start_equals_end_the_range_is_a_single_day() {
    let range = DateRange::resolve("2020-01-05", "2020-01-05").expect("range");
    assert_eq!(range.days(), 1);
    assert!(range.contains(date!(2020 - 01 - 05)));
    assert!(!range.contains(date!(2020 - 01 - 06)));
}
