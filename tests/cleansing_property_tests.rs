//! Property-based tests for the per-series correction passes.
//!
//! The corrections must converge: clamping is fully idempotent, and a
//! corrected consumption series must never produce new spikes when
//! scanned again with unchanged neighbors.

use proptest::prelude::*;

use enerclean_core::filters::short_duration_houses;
use enerclean_core::ranges::clamp_negative;
use enerclean_core::spikes::correct_group;
use enerclean_core::types::HouseRow;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Clamping leaves no negative value behind and counts exactly the
    /// values it touched.
    #[test]
    fn clamp_removes_every_negative(values in prop::collection::vec(-1000.0f64..1000.0, 0..200)) {
        let negatives = values.iter().filter(|v| **v < 0.0).count();
        let (corrected, count) = clamp_negative(&values);

        prop_assert_eq!(count, negatives);
        prop_assert!(corrected.iter().all(|v| *v >= 0.0));
    }

    /// Running the clamp twice yields the same table as running it once.
    #[test]
    fn clamp_is_idempotent(values in prop::collection::vec(-1000.0f64..1000.0, 0..200)) {
        let (once, _) = clamp_negative(&values);
        let (twice, second_count) = clamp_negative(&once);

        prop_assert_eq!(second_count, 0);
        prop_assert_eq!(once, twice);
    }

    /// Re-scanning an already corrected series finds zero new spikes:
    /// the pass must not oscillate.
    #[test]
    fn spike_correction_does_not_oscillate(
        values in prop::collection::vec(0.0f64..10_000.0, 0..100),
    ) {
        let (once, _) = correct_group(&values, 3.0);
        let (twice, second_count) = correct_group(&once, 3.0);

        prop_assert_eq!(second_count, 0);
        prop_assert_eq!(once, twice);
    }

    /// Edge samples are never rewritten, whatever their magnitude.
    #[test]
    fn spike_correction_preserves_edges(
        values in prop::collection::vec(0.0f64..10_000.0, 2..100),
    ) {
        let (corrected, _) = correct_group(&values, 3.0);

        prop_assert_eq!(corrected[0], values[0]);
        prop_assert_eq!(corrected[values.len() - 1], values[values.len() - 1]);
        prop_assert_eq!(corrected.len(), values.len());
    }

    /// The duration filter flags exactly the houses under the minimum.
    #[test]
    fn duration_filter_flags_every_short_house(
        spans in prop::collection::vec(0i64..100_000_000, 1..50),
    ) {
        let min = 31_536_000i64;
        let houses: Vec<HouseRow> = spans
            .iter()
            .enumerate()
            .map(|(i, &span)| HouseRow {
                id: i as i64,
                starting_epoch_time: 1_500_000_000,
                ending_epoch_time: 1_500_000_000 + span,
                weather_station: Some(10),
            })
            .collect();

        let flagged = short_duration_houses(&houses, min);
        let expected: Vec<i64> = houses
            .iter()
            .filter(|h| h.duration_secs() < min)
            .map(|h| h.id)
            .collect();

        prop_assert_eq!(flagged, expected);
    }
}
