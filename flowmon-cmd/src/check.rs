//! Dry run: load and validate the exports, print what a report would contain.

use crate::report::{aggregate_all, summarize};
use flowmon_core::{config::FlowConfig, dat_file::load_directory};
use std::path::Path;

pub fn run_check(input_dir: &Path, config: &FlowConfig) -> anyhow::Result<()> {
    let samples = load_directory(input_dir, config)?;
    let reports = aggregate_all(&samples, config);
    let summary = summarize(config, &samples, &reports);

    println!(
        "{} samples ({} valid) from {} to {}",
        summary.sample_count,
        summary.valid_count,
        summary.first_timestamp.as_deref().unwrap_or("-"),
        summary.last_timestamp.as_deref().unwrap_or("-"),
    );
    for counts in &summary.granularities {
        println!(
            "{:>9}: {} windows, {} with data, {} empty, {} all invalid, {} below {}%",
            counts.granularity.label(),
            counts.windows,
            counts.windows_with_data,
            counts.empty_windows,
            counts.all_invalid_windows,
            counts.below_threshold_windows,
            config.minimum_percentage(),
        );
    }
    Ok(())
}
