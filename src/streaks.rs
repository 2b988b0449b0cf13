//! Zero-consumption streak detection.
//!
//! A house is flagged when its total daily consumption, summed over all
//! appliances, is exactly zero for a threshold-length run of consecutive
//! calendar days. Consecutive means the previous *present* day plus one:
//! a day with no readings at all breaks the run rather than extending
//! it. That is the documented source-data policy, not calendar-exact
//! zero filling.

use polars::prelude::*;
use rayon::prelude::*;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{PipelineError, PipelineResult};
use crate::segment::runs_by_key;
use crate::store::{required_f64, required_i64, Table};
use crate::types::{COL_EPOCH_TIME, COL_HOUSE_IDREF, COL_VALUE};

/// Convert an epoch-seconds timestamp to its UTC calendar date.
pub fn epoch_to_date(epoch: i64) -> PipelineResult<NaiveDate> {
    chrono::DateTime::from_timestamp(epoch, 0)
        .map(|dt| dt.date_naive())
        .ok_or_else(|| PipelineError::validation(format!("epoch time {} is out of range", epoch)))
}

/// Walk per-day totals in date order and decide whether a zero run of at
/// least `threshold_days` consecutive present days occurs.
///
/// A zero-total day extends the run only when it directly follows the
/// previous present day; any other zero day restarts the run at one. A
/// non-zero day resets the run. Scanning stops at the first qualifying
/// run.
pub fn has_zero_streak(daily: &BTreeMap<NaiveDate, f64>, threshold_days: usize) -> bool {
    let mut streak = 0usize;
    let mut last_day: Option<NaiveDate> = None;

    for (&day, &total) in daily {
        if total == 0.0 {
            let contiguous = last_day.map_or(true, |prev| prev.succ_opt() == Some(day));
            streak = if contiguous { streak + 1 } else { 1 };
            if streak >= threshold_days {
                return true;
            }
        } else {
            streak = 0;
        }
        last_day = Some(day);
    }

    false
}

/// Detect houses with a qualifying zero-consumption streak in the
/// Consumption table. Returns the flagged house IDs in ascending order.
pub fn zero_streak_houses(df: &DataFrame, threshold_days: usize) -> PipelineResult<Vec<i64>> {
    let sorted = df
        .clone()
        .lazy()
        .sort(
            [COL_HOUSE_IDREF, COL_EPOCH_TIME],
            SortMultipleOptions::default()
                .with_order_descending(false)
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()
        .map_err(PipelineError::from)?;

    let houses = required_i64(&sorted, Table::Consumption, COL_HOUSE_IDREF)?;
    let epochs = required_i64(&sorted, Table::Consumption, COL_EPOCH_TIME)?;
    let values = required_f64(&sorted, Table::Consumption, COL_VALUE)?;

    // Dates are resolved up front so an out-of-range timestamp fails the
    // stage instead of one worker.
    let mut dates = Vec::with_capacity(epochs.len());
    for &epoch in &epochs {
        dates.push(epoch_to_date(epoch)?);
    }

    let mut flagged: Vec<i64> = runs_by_key(&houses)
        .par_iter()
        .filter_map(|range| {
            let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
            for i in range.clone() {
                *daily.entry(dates[i]).or_insert(0.0) += values[i];
            }
            if has_zero_streak(&daily, threshold_days) {
                Some(houses[range.start])
            } else {
                None
            }
        })
        .collect();

    flagged.sort_unstable();
    Ok(flagged)
}
