//! Interval subtraction over calendar days.

use time::Date;

use crate::DateRange;

/// Days of `range` not present in `covered`, compressed into the minimal list
/// of contiguous sub-ranges in ascending order.
///
/// `covered` may be unsorted, contain duplicates or dates outside `range`.
pub fn missing_sub_ranges(range: DateRange, covered: &[Date]) -> Vec<DateRange> {
    let mut present: Vec<Date> = covered
        .iter()
        .copied()
        .filter(|date| range.contains(*date))
        .collect();
    present.sort_unstable();
    present.dedup();

    let mut missing = Vec::new();
    let mut cursor = Some(range.start());

    for date in present {
        let Some(gap_start) = cursor else { break };
        if date > gap_start {
            if let Some(gap_end) = date.previous_day() {
                missing.push(span(gap_start, gap_end));
            }
        }
        cursor = date.next_day().filter(|next| *next <= range.end());
    }

    if let Some(gap_start) = cursor {
        missing.push(span(gap_start, range.end()));
    }

    missing
}

fn span(start: Date, end: Date) -> DateRange {
    DateRange::new(start, end).unwrap_or(DateRange::single(start))
}
