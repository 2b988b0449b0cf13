//! Shared column names, domain constants and typed row views.
//!
//! Tables travel through the pipeline as DataFrames so that columns the
//! pipeline does not interpret survive a full rewrite untouched. The
//! fields a stage actually reads are pulled out through validated,
//! strongly typed extraction (see `store`); `HouseRow` is the one table
//! view rich enough to deserve a named struct.

/// Primary key column of House and WeatherStation.
pub const COL_ID: &str = "ID";
/// Foreign key to House on Appliance and Consumption rows.
pub const COL_HOUSE_IDREF: &str = "HouseIDREF";
/// Foreign key to Appliance on Consumption rows.
pub const COL_APPLIANCE_IDREF: &str = "ApplianceIDREF";
/// Sample timestamp, integer seconds since the UNIX epoch, UTC.
pub const COL_EPOCH_TIME: &str = "EpochTime";
/// Measured value column of Consumption and WeatherData rows.
pub const COL_VALUE: &str = "Value";
/// Foreign key to WeatherStation on House, WeatherData and Record rows.
pub const COL_STATION_IDREF: &str = "WeatherStationIDREF";
/// Weather variable code column of WeatherData rows.
pub const COL_VARIABLE_IDREF: &str = "WeatherVariableIDREF";
/// First observed timestamp of a House row.
pub const COL_STARTING_EPOCH: &str = "StartingEpochTime";
/// Last observed timestamp of a House row.
pub const COL_ENDING_EPOCH: &str = "EndingEpochTime";

/// Weather variable code reserved for solar irradiance. The only code
/// the pipeline interprets; all others pass through opaquely.
pub const SOLAR_IRRADIANCE_CODE: i64 = 4;

/// One non-leap year, in seconds.
pub const SECONDS_PER_YEAR: i64 = 365 * 24 * 3600;

/// The fields of a House row the pipeline reads.
///
/// Remaining columns (ZIPcode, Location, ...) stay in the DataFrame and
/// are rewritten untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HouseRow {
    pub id: i64,
    pub starting_epoch_time: i64,
    pub ending_epoch_time: i64,
    /// Assigned weather station; absent for houses never wired to one.
    pub weather_station: Option<i64>,
}

impl HouseRow {
    /// Observed time span of the house in seconds.
    pub fn duration_secs(&self) -> i64 {
        self.ending_epoch_time - self.starting_epoch_time
    }
}
