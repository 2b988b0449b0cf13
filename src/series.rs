//! In-memory series handed to the indicator components.
//!
//! The downstream consumers work on per-house mappings keyed by epoch
//! timestamp: hourly consumption in kWh and solar irradiance at the
//! house's station. They assume the tables were already cleaned; this
//! module only aggregates.

use log::warn;
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};

use crate::error::PipelineResult;
use crate::store::{required_f64, required_i64, Table};
use crate::types::{
    COL_EPOCH_TIME, COL_HOUSE_IDREF, COL_STATION_IDREF, COL_VALUE, COL_VARIABLE_IDREF,
};

/// Hourly total consumption of one house, in kWh, keyed by the
/// hour-aligned epoch timestamp (truncated down to the hour).
pub fn hourly_consumption(df: &DataFrame, house_id: i64) -> PipelineResult<BTreeMap<i64, f64>> {
    let houses = required_i64(df, Table::Consumption, COL_HOUSE_IDREF)?;
    let epochs = required_i64(df, Table::Consumption, COL_EPOCH_TIME)?;
    let values = required_f64(df, Table::Consumption, COL_VALUE)?;

    let mut hourly: BTreeMap<i64, f64> = BTreeMap::new();
    for i in 0..houses.len() {
        if houses[i] != house_id {
            continue;
        }
        let hour = epochs[i] - epochs[i].rem_euclid(3600);
        *hourly.entry(hour).or_insert(0.0) += values[i];
    }

    // Readings are logged in Wh; the indicator contract is kWh.
    for total in hourly.values_mut() {
        *total /= 1000.0;
    }

    Ok(hourly)
}

/// Solar irradiance recorded at one station, keyed by epoch timestamp.
///
/// A station can be valid yet yield nothing here (e.g. a query outside
/// its coverage); that is reported as an empty map, not an error.
pub fn solar_irradiance(
    df: &DataFrame,
    station_id: i64,
    variable_code: i64,
) -> PipelineResult<BTreeMap<i64, f64>> {
    let stations = required_i64(df, Table::WeatherData, COL_STATION_IDREF)?;
    let variables = required_i64(df, Table::WeatherData, COL_VARIABLE_IDREF)?;
    let epochs = required_i64(df, Table::WeatherData, COL_EPOCH_TIME)?;
    let values = required_f64(df, Table::WeatherData, COL_VALUE)?;

    let mut irradiance: BTreeMap<i64, f64> = BTreeMap::new();
    for i in 0..stations.len() {
        if stations[i] != station_id || variables[i] != variable_code {
            continue;
        }
        *irradiance.entry(epochs[i]).or_insert(0.0) += values[i];
    }

    if irradiance.is_empty() {
        warn!("no solar radiation data for station {}", station_id);
    }

    Ok(irradiance)
}

/// Number of distinct houses present in the Consumption table.
pub fn distinct_house_count(df: &DataFrame) -> PipelineResult<usize> {
    let houses = required_i64(df, Table::Consumption, COL_HOUSE_IDREF)?;
    let distinct: HashSet<i64> = houses.into_iter().collect();
    Ok(distinct.len())
}
