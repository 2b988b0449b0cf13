//! Pipeline orchestration.
//!
//! Runs the detection and correction passes in their mandated order:
//!
//! 1. Zero-consumption streak detection over the original Consumption
//!    table, and duration filtering over the original House table; both
//!    flag sets are applied to House in one removal.
//! 2. Radiation-availability filtering on the reduced House table.
//! 3. Referential cascade from the final House table into the five
//!    dependent tables.
//! 4. Spike correction over the cascade-filtered Consumption table.
//! 5. Negative-value clamping over the cascade-filtered WeatherData
//!    table.
//!
//! Removal decisions must see the original data (a house with years of
//! readings and a short trailing gap is judged on its full span);
//! corrections must run after the cascade so no effort is spent on rows
//! already condemned. Each stage loads its tables, processes them and
//! writes them back before the next stage reads them.

use log::info;
use std::collections::HashSet;

use crate::cascade::{self, CascadeReport};
use crate::error::{PipelineError, PipelineResult};
use crate::filters;
use crate::ranges;
use crate::spikes;
use crate::store::{house_rows, required_i64, Table, TableStore};
use crate::streaks;
use crate::types::{COL_STATION_IDREF, COL_VARIABLE_IDREF, SECONDS_PER_YEAR, SOLAR_IRRADIANCE_CODE};

/// Tunable thresholds of the cleansing passes.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// A sample is a spike when it exceeds the neighbor average times
    /// this factor.
    pub spike_threshold: f64,
    /// Consecutive zero-consumption days that disqualify a house.
    pub zero_streak_days: usize,
    /// Minimum observed span of a house, in seconds.
    pub min_duration_secs: i64,
    /// Weather variable code counted as solar radiation.
    pub solar_variable_code: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            spike_threshold: 3.0,
            zero_streak_days: 30,
            min_duration_secs: SECONDS_PER_YEAR,
            solar_variable_code: SOLAR_IRRADIANCE_CODE,
        }
    }
}

/// Outcome of a full pipeline run. Every stage reports here, including
/// stages that changed nothing.
#[derive(Debug, Clone, Default)]
pub struct CleanseReport {
    /// Houses flagged for a qualifying zero-consumption streak.
    pub zero_streak_houses: Vec<i64>,
    /// Houses flagged for an observed span under the minimum.
    pub short_duration_houses: Vec<i64>,
    /// Houses removed for lacking station radiation data.
    pub houses_without_radiation: usize,
    /// Rows removed from the five dependent tables.
    pub cascade: CascadeReport,
    /// Spikes rewritten in the Consumption table.
    pub spikes_corrected: u64,
    /// Negative WeatherData values clamped to zero.
    pub negative_values_corrected: usize,
}

/// The data-quality pipeline.
#[derive(Debug)]
pub struct CleansePipeline {
    config: PipelineConfig,
}

impl CleansePipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(PipelineConfig::default())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every pass in order against the store.
    ///
    /// Fails before touching any file when a table is missing; a
    /// stage-local failure aborts before that stage's write, so no
    /// table is ever persisted half-filtered.
    pub fn run(&self, store: &dyn TableStore) -> PipelineResult<CleanseReport> {
        for table in Table::ALL {
            if !store.exists(table) {
                return Err(PipelineError::missing_table(table.file_name()));
            }
        }

        let mut report = CleanseReport::default();

        // Detection passes see the original tables.
        let consumption = store.load(Table::Consumption)?;
        report.zero_streak_houses =
            streaks::zero_streak_houses(&consumption, self.config.zero_streak_days)?;
        drop(consumption);
        if report.zero_streak_houses.is_empty() {
            info!(
                "no houses with {} consecutive zero-consumption days",
                self.config.zero_streak_days
            );
        } else {
            info!(
                "houses with {} consecutive zero-consumption days: {:?}",
                self.config.zero_streak_days, report.zero_streak_houses
            );
        }

        let house_df = store.load(Table::House)?;
        let houses = house_rows(&house_df)?;
        report.short_duration_houses =
            filters::short_duration_houses(&houses, self.config.min_duration_secs);
        if report.short_duration_houses.is_empty() {
            info!("no houses with less than a year of data");
        } else {
            info!(
                "houses removed with less than a year of data: {:?}",
                report.short_duration_houses
            );
        }

        let flagged: HashSet<i64> = report
            .zero_streak_houses
            .iter()
            .chain(&report.short_duration_houses)
            .copied()
            .collect();
        let (mut reduced, _) = filters::remove_houses(&house_df, &flagged)?;
        store.save(Table::House, &mut reduced)?;

        report.houses_without_radiation = self.radiation_stage(store)?;

        let house_df = store.load(Table::House)?;
        let houses = house_rows(&house_df)?;
        let valid_houses: HashSet<i64> = houses.iter().map(|h| h.id).collect();
        let valid_stations: HashSet<i64> = houses.iter().filter_map(|h| h.weather_station).collect();
        drop(house_df);

        report.cascade = cascade::run(store, &valid_houses, &valid_stations)?;
        info!(
            "cascade removed {} appliance, {} consumption, {} weather and {} record rows; {} stations",
            report.cascade.appliance_rows_removed,
            report.cascade.consumption_rows_removed,
            report.cascade.weather_rows_removed,
            report.cascade.record_rows_removed,
            report.cascade.stations_removed
        );

        let consumption = store.load(Table::Consumption)?;
        let (mut corrected, spike_count) =
            spikes::correct_consumption(consumption, self.config.spike_threshold)?;
        store.save(Table::Consumption, &mut corrected)?;
        report.spikes_corrected = spike_count;
        info!("spikes corrected: {}", spike_count);

        let weather = store.load(Table::WeatherData)?;
        let (mut clamped, negative_count) = ranges::clamp_weather_values(weather)?;
        if negative_count == 0 {
            info!("no negative weather values found");
        } else {
            store.save(Table::WeatherData, &mut clamped)?;
            info!("negative weather values corrected: {}", negative_count);
        }
        report.negative_values_corrected = negative_count;

        Ok(report)
    }

    /// Remove houses whose station never recorded solar radiation and
    /// persist the reduced House table. Returns the number removed.
    fn radiation_stage(&self, store: &dyn TableStore) -> PipelineResult<usize> {
        let weather = store.load(Table::WeatherData)?;
        let stations = required_i64(&weather, Table::WeatherData, COL_STATION_IDREF)?;
        let variables = required_i64(&weather, Table::WeatherData, COL_VARIABLE_IDREF)?;
        let radiating =
            filters::radiating_stations(&stations, &variables, self.config.solar_variable_code);
        drop(weather);

        let house_df = store.load(Table::House)?;
        let houses = house_rows(&house_df)?;
        let dark: HashSet<i64> = filters::houses_without_radiation(&houses, &radiating)
            .into_iter()
            .collect();

        let (mut reduced, removed) = filters::remove_houses(&house_df, &dark)?;
        store.save(Table::House, &mut reduced)?;

        if removed == 0 {
            info!("all remaining houses have station radiation data");
        } else {
            info!(
                "{} houses removed with no radiation data at their station",
                removed
            );
        }
        Ok(removed)
    }
}
