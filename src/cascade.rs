//! Referential cascade from the finalized House table into the five
//! tables that reference houses or their weather stations.
//!
//! Must run after every house-removal pass and before the corrective
//! passes, so corrections are never spent on rows about to be dropped
//! and the valid-station set is never derived from a stale House table.

use polars::prelude::*;
use std::collections::HashSet;

use crate::error::{PipelineError, PipelineResult};
use crate::store::{filter_rows, optional_i64, Table, TableStore};
use crate::types::{COL_HOUSE_IDREF, COL_ID, COL_STATION_IDREF};

/// Rows removed per dependent table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub appliance_rows_removed: usize,
    pub consumption_rows_removed: usize,
    pub stations_removed: usize,
    pub weather_rows_removed: usize,
    pub record_rows_removed: usize,
}

impl CascadeReport {
    /// True when the cascade dropped nothing anywhere.
    pub fn is_noop(&self) -> bool {
        self.appliance_rows_removed == 0
            && self.consumption_rows_removed == 0
            && self.stations_removed == 0
            && self.weather_rows_removed == 0
            && self.record_rows_removed == 0
    }
}

/// Filter the five dependent tables against the valid house and station
/// ID sets. The five sub-filters have no cross-dependency; each loads,
/// filters, verifies and persists its own table.
pub fn run(
    store: &dyn TableStore,
    valid_houses: &HashSet<i64>,
    valid_stations: &HashSet<i64>,
) -> PipelineResult<CascadeReport> {
    Ok(CascadeReport {
        appliance_rows_removed: filter_table(store, Table::Appliance, COL_HOUSE_IDREF, valid_houses)?,
        consumption_rows_removed: filter_table(
            store,
            Table::Consumption,
            COL_HOUSE_IDREF,
            valid_houses,
        )?,
        stations_removed: filter_table(store, Table::WeatherStation, COL_ID, valid_stations)?,
        weather_rows_removed: filter_table(
            store,
            Table::WeatherData,
            COL_STATION_IDREF,
            valid_stations,
        )?,
        record_rows_removed: filter_table(store, Table::Record, COL_STATION_IDREF, valid_stations)?,
    })
}

fn filter_table(
    store: &dyn TableStore,
    table: Table,
    key_column: &str,
    keep: &HashSet<i64>,
) -> PipelineResult<usize> {
    let df = store.load(table)?;
    let keys = optional_i64(&df, table, key_column)?;

    // A null foreign key cannot reference a valid parent.
    let mask: Vec<bool> = keys
        .iter()
        .map(|key| key.map_or(false, |k| keep.contains(&k)))
        .collect();

    let removed = df.height() - mask.iter().filter(|&&m| m).count();
    let mut filtered = filter_rows(&df, mask)?;

    verify_references(&filtered, table, key_column, keep)?;
    store.save(table, &mut filtered)?;

    Ok(removed)
}

/// Assert every remaining key is in its valid set. Filtering guarantees
/// this; a violation means a stage ran out of order and must surface as
/// a hard error rather than a silently dropped row.
pub fn verify_references(
    df: &DataFrame,
    table: Table,
    key_column: &str,
    valid: &HashSet<i64>,
) -> PipelineResult<()> {
    let keys = optional_i64(df, table, key_column)?;
    for key in keys {
        match key {
            Some(k) if valid.contains(&k) => {}
            Some(k) => return Err(PipelineError::integrity(table.file_name(), key_column, k)),
            None => {
                return Err(PipelineError::validation(format!(
                    "null {} survived filtering of {}",
                    key_column,
                    table.file_name()
                )))
            }
        }
    }
    Ok(())
}
