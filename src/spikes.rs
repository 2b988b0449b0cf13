//! Spike correction over per-appliance consumption series.
//!
//! A spike is a single interior sample whose value exceeds three times
//! the average of its immediate chronological neighbors within the same
//! (house, appliance) series. Spikes are rewritten to that neighbor
//! average; edge samples have no symmetric neighbor pair and are never
//! evaluated.

use polars::prelude::*;
use rayon::prelude::*;

use crate::error::{PipelineError, PipelineResult};
use crate::segment::runs_by_key_pair;
use crate::store::{required_f64, required_i64, Table};
use crate::types::{COL_APPLIANCE_IDREF, COL_EPOCH_TIME, COL_HOUSE_IDREF, COL_VALUE};

/// Correct spikes within one chronologically sorted series.
///
/// A single left-to-right pass. Neighbor averages are taken from the
/// original input values, not from values already rewritten earlier in
/// the pass, so a correction never feeds the next comparison. Returns
/// the corrected series and the number of corrections.
pub fn correct_group(values: &[f64], threshold: f64) -> (Vec<f64>, u64) {
    let mut corrected = values.to_vec();
    let mut count = 0u64;

    for i in 1..values.len().saturating_sub(1) {
        let local_avg = (values[i - 1] + values[i + 1]) / 2.0;
        if values[i] > local_avg * threshold {
            corrected[i] = local_avg;
            count += 1;
        }
    }

    (corrected, count)
}

/// Correct spikes across the whole Consumption table.
///
/// Sorts the table by (HouseIDREF, ApplianceIDREF, EpochTime) with a
/// stable sort, corrects each series independently in parallel, and
/// returns the rewritten table (in that sort order) together with the
/// total correction count. Per-group counts are reduced by summation;
/// there is no shared mutable counter.
pub fn correct_consumption(df: DataFrame, threshold: f64) -> PipelineResult<(DataFrame, u64)> {
    let mut sorted = df
        .lazy()
        .sort(
            [COL_HOUSE_IDREF, COL_APPLIANCE_IDREF, COL_EPOCH_TIME],
            SortMultipleOptions::default()
                .with_order_descending(false)
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()
        .map_err(PipelineError::from)?;

    let houses = required_i64(&sorted, Table::Consumption, COL_HOUSE_IDREF)?;
    let appliances = required_i64(&sorted, Table::Consumption, COL_APPLIANCE_IDREF)?;
    let values = required_f64(&sorted, Table::Consumption, COL_VALUE)?;

    let groups = runs_by_key_pair(&houses, &appliances);
    let corrected_groups: Vec<(Vec<f64>, u64)> = groups
        .par_iter()
        .map(|range| correct_group(&values[range.clone()], threshold))
        .collect();

    let mut corrected = Vec::with_capacity(values.len());
    let mut total = 0u64;
    for (group_values, group_count) in corrected_groups {
        corrected.extend(group_values);
        total += group_count;
    }

    sorted
        .with_column(Series::new(COL_VALUE.into(), corrected))
        .map_err(PipelineError::from)?;

    Ok((sorted, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interior_spike_is_rewritten() {
        // Neighbors average to 11, threshold is 33, so 100 is a spike.
        let (corrected, count) = correct_group(&[10.0, 100.0, 12.0], 3.0);
        assert_eq!(corrected, vec![10.0, 11.0, 12.0]);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_two_point_series_never_corrected() {
        let (corrected, count) = correct_group(&[10.0, 10_000.0], 3.0);
        assert_eq!(corrected, vec![10.0, 10_000.0]);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_edges_are_exempt() {
        let (corrected, count) = correct_group(&[900.0, 1.0, 1.0, 900.0], 3.0);
        assert_eq!(corrected[0], 900.0);
        assert_eq!(corrected[3], 900.0);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_exactly_three_times_is_not_a_spike() {
        // 33 == 3 * avg(10, 12); the comparison is strict.
        let (corrected, count) = correct_group(&[10.0, 33.0, 12.0], 3.0);
        assert_eq!(corrected, vec![10.0, 33.0, 12.0]);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_neighbors_are_original_values() {
        // 100 at index 1 is corrected to 13. When index 2 is evaluated,
        // its left neighbor is still the original 100 (avg 50.5), so 25
        // survives; against the corrected 13 it would have been a spike.
        let (corrected, count) = correct_group(&[1.0, 100.0, 25.0, 1.0], 3.0);
        assert_eq!(corrected, vec![1.0, 13.0, 25.0, 1.0]);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rerun_finds_no_new_spikes() {
        let (once, first) = correct_group(&[5.0, 80.0, 5.0, 90.0, 5.0], 3.0);
        let (twice, second) = correct_group(&once, 3.0);
        assert!(first > 0);
        assert_eq!(second, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_correct_consumption_sorts_and_counts() {
        // Rows deliberately unsorted; series (1, 10) is [10, 100, 12]
        // chronologically and gets one correction. Series (2, 20) is
        // clean.
        let df = df! {
            "HouseIDREF" => &[2i64, 1, 1, 1, 2],
            "ApplianceIDREF" => &[20i64, 10, 10, 10, 20],
            "EpochTime" => &[100i64, 1200, 0, 600, 200],
            "Value" => &[7.0, 12.0, 10.0, 100.0, 8.0]
        }
        .unwrap();

        let (corrected, count) = correct_consumption(df, 3.0).unwrap();
        assert_eq!(count, 1);

        let values = required_f64(&corrected, Table::Consumption, COL_VALUE).unwrap();
        assert_eq!(values, vec![10.0, 11.0, 12.0, 7.0, 8.0]);
    }

    #[test]
    fn test_groups_are_independent() {
        // The appliance boundary splits what would otherwise be one
        // series; the 100 sits at a group edge and survives.
        let df = df! {
            "HouseIDREF" => &[1i64, 1, 1],
            "ApplianceIDREF" => &[10i64, 10, 11],
            "EpochTime" => &[0i64, 600, 1200],
            "Value" => &[10.0, 100.0, 12.0]
        }
        .unwrap();

        let (_, count) = correct_consumption(df, 3.0).unwrap();
        assert_eq!(count, 0);
    }
}
