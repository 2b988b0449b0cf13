//! Out-of-domain weather value correction.
//!
//! Sensor glitches record physically impossible negative readings
//! (irradiance below zero); those are clamped to zero rather than
//! dropped, since the row itself is otherwise sound.

use polars::prelude::*;

use crate::error::{PipelineError, PipelineResult};
use crate::store::{required_f64, Table};
use crate::types::COL_VALUE;

/// Clamp negative values to zero. Returns the corrected values and how
/// many were touched.
pub fn clamp_negative(values: &[f64]) -> (Vec<f64>, usize) {
    let mut corrected = values.to_vec();
    let mut count = 0usize;
    for value in corrected.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
            count += 1;
        }
    }
    (corrected, count)
}

/// Clamp every negative Value in the WeatherData table to zero.
///
/// Returns the corrected table and the correction count; when the count
/// is zero the table is returned untouched so the caller can skip the
/// rewrite.
pub fn clamp_weather_values(df: DataFrame) -> PipelineResult<(DataFrame, usize)> {
    let values = required_f64(&df, Table::WeatherData, COL_VALUE)?;
    let (corrected, count) = clamp_negative(&values);

    if count == 0 {
        return Ok((df, 0));
    }

    let mut df = df;
    df.with_column(Series::new(COL_VALUE.into(), corrected))
        .map_err(PipelineError::from)?;
    Ok((df, count))
}
