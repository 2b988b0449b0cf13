//! Table storage for the six-table household-energy dataset.
//!
//! Tables are flat CSV files with a header row, rewritten in place at
//! their own path. A stage loads a table fully into memory, processes
//! it, and writes it back before the next stage reads it, so no stage
//! ever observes a half-written table.
//!
//! Column presence is validated at load; dtypes are validated on first
//! typed extraction. Columns the pipeline does not interpret pass
//! through a rewrite untouched.

use polars::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{
    HouseRow, COL_APPLIANCE_IDREF, COL_ENDING_EPOCH, COL_EPOCH_TIME, COL_HOUSE_IDREF, COL_ID,
    COL_STARTING_EPOCH, COL_STATION_IDREF, COL_VALUE, COL_VARIABLE_IDREF,
};

/// The six logical tables of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    House,
    Appliance,
    Consumption,
    WeatherStation,
    WeatherData,
    Record,
}

impl Table {
    /// All tables, in load-check order.
    pub const ALL: [Table; 6] = [
        Table::House,
        Table::Appliance,
        Table::Consumption,
        Table::WeatherStation,
        Table::WeatherData,
        Table::Record,
    ];

    /// File name of the table within the database directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Table::House => "House.csv",
            Table::Appliance => "Appliance.csv",
            Table::Consumption => "Consumption.csv",
            Table::WeatherStation => "WeatherStation.csv",
            Table::WeatherData => "WeatherData.csv",
            Table::Record => "Record.csv",
        }
    }

    /// Columns the pipeline reads from this table. Extra columns are
    /// allowed and preserved.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            Table::House => &[COL_ID, COL_STARTING_EPOCH, COL_ENDING_EPOCH, COL_STATION_IDREF],
            Table::Appliance => &[COL_ID, COL_HOUSE_IDREF],
            Table::Consumption => &[COL_HOUSE_IDREF, COL_APPLIANCE_IDREF, COL_EPOCH_TIME, COL_VALUE],
            Table::WeatherStation => &[COL_ID],
            Table::WeatherData => &[COL_STATION_IDREF, COL_VARIABLE_IDREF, COL_EPOCH_TIME, COL_VALUE],
            Table::Record => &[COL_STATION_IDREF],
        }
    }
}

/// Abstract table access.
///
/// The pipeline only ever talks to this trait, so the file layout can be
/// swapped without touching the stages.
pub trait TableStore: Send + Sync {
    /// Load a full table snapshot.
    fn load(&self, table: Table) -> PipelineResult<DataFrame>;

    /// Write a full table snapshot back, replacing the previous one.
    fn save(&self, table: Table, df: &mut DataFrame) -> PipelineResult<()>;

    /// Check whether the table exists at all.
    fn exists(&self, table: Table) -> bool;
}

/// CSV-file-backed table store. One file per table, rewritten in place.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    base_dir: PathBuf,
}

impl CsvTableStore {
    /// Create a store rooted at the given database directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of a table file within the database directory.
    pub fn table_path(&self, table: Table) -> PathBuf {
        self.base_dir.join(table.file_name())
    }
}

impl TableStore for CsvTableStore {
    fn load(&self, table: Table) -> PipelineResult<DataFrame> {
        let path = self.table_path(table);
        if !path.exists() {
            return Err(PipelineError::missing_table(path.display().to_string()));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(|e| PipelineError::Io(e.to_string()))?
            .finish()
            .map_err(PipelineError::from)?;

        for column in table.required_columns() {
            if df.column(column).is_err() {
                return Err(PipelineError::missing_column(table.file_name(), *column));
            }
        }

        Ok(df)
    }

    fn save(&self, table: Table, df: &mut DataFrame) -> PipelineResult<()> {
        let path = self.table_path(table);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(&path)?;
        CsvWriter::new(&mut file)
            .finish(df)
            .map_err(PipelineError::from)?;

        Ok(())
    }

    fn exists(&self, table: Table) -> bool {
        self.table_path(table).exists()
    }
}

// ============================================================================
// Typed column extraction
// ============================================================================

/// Extract a required integer column. Nulls and non-numeric dtypes are
/// schema errors.
pub fn required_i64(df: &DataFrame, table: Table, name: &str) -> PipelineResult<Vec<i64>> {
    let casted = integer_column(df, table, name)?;
    let chunked = casted
        .i64()
        .map_err(|_| PipelineError::type_mismatch(name, "i64", format!("{:?}", casted.dtype())))?;
    let mut out = Vec::with_capacity(chunked.len());
    for value in chunked.into_iter() {
        match value {
            Some(v) => out.push(v),
            None => {
                return Err(PipelineError::validation(format!(
                    "null value in required column '{}' of {}",
                    name,
                    table.file_name()
                )))
            }
        }
    }
    Ok(out)
}

/// Extract a nullable integer column (e.g. a house without a station).
pub fn optional_i64(df: &DataFrame, table: Table, name: &str) -> PipelineResult<Vec<Option<i64>>> {
    let casted = integer_column(df, table, name)?;
    let chunked = casted
        .i64()
        .map_err(|_| PipelineError::type_mismatch(name, "i64", format!("{:?}", casted.dtype())))?;
    Ok(chunked.into_iter().collect())
}

/// Extract a required float column. Nulls and non-numeric dtypes are
/// schema errors.
pub fn required_f64(df: &DataFrame, table: Table, name: &str) -> PipelineResult<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::missing_column(table.file_name(), name))?;
    if !column.dtype().is_numeric() {
        return Err(PipelineError::type_mismatch(
            name,
            "f64",
            format!("{:?}", column.dtype()),
        ));
    }
    let casted = column
        .cast(&DataType::Float64)
        .map_err(|_| PipelineError::type_mismatch(name, "f64", format!("{:?}", column.dtype())))?;
    let chunked = casted
        .f64()
        .map_err(|_| PipelineError::type_mismatch(name, "f64", format!("{:?}", column.dtype())))?;

    let mut out = Vec::with_capacity(chunked.len());
    for value in chunked.into_iter() {
        match value {
            Some(v) => out.push(v),
            None => {
                return Err(PipelineError::validation(format!(
                    "null value in required column '{}' of {}",
                    name,
                    table.file_name()
                )))
            }
        }
    }
    Ok(out)
}

fn integer_column(df: &DataFrame, table: Table, name: &str) -> PipelineResult<Column> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::missing_column(table.file_name(), name))?;
    if !column.dtype().is_numeric() {
        return Err(PipelineError::type_mismatch(
            name,
            "i64",
            format!("{:?}", column.dtype()),
        ));
    }
    column
        .cast(&DataType::Int64)
        .map_err(|_| PipelineError::type_mismatch(name, "i64", format!("{:?}", column.dtype())))
}

/// Build the typed House view the removal stages decide on.
pub fn house_rows(df: &DataFrame) -> PipelineResult<Vec<HouseRow>> {
    let ids = required_i64(df, Table::House, COL_ID)?;
    let starts = required_i64(df, Table::House, COL_STARTING_EPOCH)?;
    let ends = required_i64(df, Table::House, COL_ENDING_EPOCH)?;
    let stations = optional_i64(df, Table::House, COL_STATION_IDREF)?;

    Ok(ids
        .into_iter()
        .zip(starts)
        .zip(ends)
        .zip(stations)
        .map(|(((id, start), end), station)| HouseRow {
            id,
            starting_epoch_time: start,
            ending_epoch_time: end,
            weather_station: station,
        })
        .collect())
}

/// Keep the rows whose mask entry is true. Preserves all columns.
pub fn filter_rows(df: &DataFrame, mask: Vec<bool>) -> PipelineResult<DataFrame> {
    let mask_series = Series::new("mask".into(), mask);
    let bool_chunked = mask_series
        .bool()
        .map_err(|e| PipelineError::Polars(e.to_string()))?;
    df.filter(bool_chunked).map_err(PipelineError::from)
}

// ============================================================================
// Tests
// ============================================================================
