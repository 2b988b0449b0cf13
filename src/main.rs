use log::{error, info};
use std::process::ExitCode;

use enerclean_core::{CleansePipeline, CsvTableStore};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let database_dir = std::env::args().nth(1).unwrap_or_else(|| "Database".to_string());
    let store = CsvTableStore::new(&database_dir);
    let pipeline = CleansePipeline::with_defaults();

    match pipeline.run(&store) {
        Ok(report) => {
            info!(
                "cleansing finished: {} houses flagged for zero streaks, {} for short duration, {} for missing radiation data",
                report.zero_streak_houses.len(),
                report.short_duration_houses.len(),
                report.houses_without_radiation
            );
            info!(
                "{} spikes corrected, {} negative weather values corrected",
                report.spikes_corrected, report.negative_values_corrected
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("cleansing failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
