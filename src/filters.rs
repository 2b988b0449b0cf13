//! House-level removal decisions: observed-span duration and
//! solar-radiation availability.
//!
//! Both filters only decide which house IDs must go; the caller applies
//! the removal to the House table and persists it, so flag collection
//! can run against the original snapshot.

use polars::prelude::*;
use std::collections::HashSet;

use crate::error::PipelineResult;
use crate::store::{filter_rows, required_i64, Table};
use crate::types::{HouseRow, COL_ID};

/// Houses whose observed span is shorter than the given duration.
/// Returns the flagged IDs in input order.
pub fn short_duration_houses(houses: &[HouseRow], min_duration_secs: i64) -> Vec<i64> {
    houses
        .iter()
        .filter(|h| h.duration_secs() < min_duration_secs)
        .map(|h| h.id)
        .collect()
}

/// Stations that recorded at least one observation of the given
/// variable code.
pub fn radiating_stations(stations: &[i64], variables: &[i64], code: i64) -> HashSet<i64> {
    stations
        .iter()
        .zip(variables)
        .filter(|(_, &v)| v == code)
        .map(|(&s, _)| s)
        .collect()
}

/// Houses whose assigned station is not in the radiating set. A house
/// with no station reference at all has no radiation data either and is
/// flagged too.
pub fn houses_without_radiation(houses: &[HouseRow], radiating: &HashSet<i64>) -> Vec<i64> {
    houses
        .iter()
        .filter(|h| !h.weather_station.map_or(false, |s| radiating.contains(&s)))
        .map(|h| h.id)
        .collect()
}

/// Drop the House rows whose ID is in the removal set. Returns the
/// reduced table and the number of rows removed.
pub fn remove_houses(df: &DataFrame, remove: &HashSet<i64>) -> PipelineResult<(DataFrame, usize)> {
    let ids = required_i64(df, Table::House, COL_ID)?;
    let mask: Vec<bool> = ids.iter().map(|id| !remove.contains(id)).collect();
    let filtered = filter_rows(df, mask)?;
    let removed = df.height() - filtered.height();
    Ok((filtered, removed))
}
