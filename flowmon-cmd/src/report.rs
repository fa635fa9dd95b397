//! Report emitter: per-sample and per-window CSV files plus a JSON summary.
//!
//! Everything is computed before the first file is written, so a malformed
//! input never leaves a partial report behind. A write failure part way
//! through removes the files already written. Number formatting is fixed,
//! making repeated runs over the same input byte-identical.

use flowmon_core::{config::FlowConfig, dat_file::load_directory, sample::Sample};
use flowmon_data::{
    quality::{aggregate, NoDataReason, WindowFlow, WindowSummary},
    window::Granularity,
};
use flowmon_utils::dates::format_timestamp;
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Placeholder written where a flow or average is absent.
pub const NO_DATA: &str = "-";

pub const SAMPLES_FILE: &str = "samples.csv";
pub const SUMMARY_FILE: &str = "summary.json";

const SAMPLE_HEADER: [&str; 7] = [
    "Date and Time",
    "Level (inches)",
    "Level (ft)",
    "Velocity (ft/sec)",
    "Velocity (ft/min)",
    "Temperature (F)",
    "Flow (USG/min)",
];

/// Windowed results for one granularity.
#[derive(Debug, Clone)]
pub struct GranularityReport {
    pub granularity: Granularity,
    pub windows: Vec<WindowSummary>,
}

/// Counts recorded in `summary.json`.
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub config: &'a FlowConfig,
    pub sample_count: usize,
    pub valid_count: usize,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
    pub granularities: Vec<GranularityCounts>,
}

#[derive(Debug, Serialize)]
pub struct GranularityCounts {
    pub granularity: Granularity,
    pub windows: usize,
    pub windows_with_data: usize,
    pub empty_windows: usize,
    pub all_invalid_windows: usize,
    pub below_threshold_windows: usize,
}

impl GranularityCounts {
    fn from_report(report: &GranularityReport) -> GranularityCounts {
        let count_reason = |reason: NoDataReason| {
            report
                .windows
                .iter()
                .filter(|w| w.flow == WindowFlow::NoData(reason))
                .count()
        };
        GranularityCounts {
            granularity: report.granularity,
            windows: report.windows.len(),
            windows_with_data: report.windows.iter().filter(|w| w.average().is_some()).count(),
            empty_windows: count_reason(NoDataReason::Empty),
            all_invalid_windows: count_reason(NoDataReason::AllInvalid),
            below_threshold_windows: count_reason(NoDataReason::BelowThreshold),
        }
    }
}

/// Load the exports in `input_dir`, aggregate them at every granularity and
/// write the reports into `output_dir`.
pub fn run_report(input_dir: &Path, output_dir: &Path, config: &FlowConfig) -> anyhow::Result<()> {
    let samples = load_directory(input_dir, config)?;
    let reports = aggregate_all(&samples, config);

    let created = !output_dir.exists();
    std::fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();
    if let Err(err) = write_report(output_dir, config, &samples, &reports, &mut written) {
        discard_partial(output_dir, created, &written);
        return Err(err);
    }

    info!("Report complete. Output: {}", output_dir.display());
    Ok(())
}

/// Write every report file, recording each path before it is opened.
fn write_report(
    output_dir: &Path,
    config: &FlowConfig,
    samples: &[Sample],
    reports: &[GranularityReport],
    written: &mut Vec<PathBuf>,
) -> anyhow::Result<()> {
    let path = output_dir.join(SAMPLES_FILE);
    written.push(path.clone());
    write_samples_csv(&path, samples)?;
    for report in reports {
        let path = output_dir.join(format!("{}.csv", report.granularity.file_stem()));
        written.push(path.clone());
        write_windows_csv(&path, report)?;
    }
    let summary = summarize(config, samples, reports);
    let mut json = serde_json::to_string_pretty(&summary)?;
    json.push('\n');
    let path = output_dir.join(SUMMARY_FILE);
    written.push(path.clone());
    std::fs::write(&path, json)?;
    Ok(())
}

fn discard_partial(output_dir: &Path, created: bool, written: &[PathBuf]) {
    for path in written.iter().filter(|p| p.is_file()) {
        if let Err(err) = std::fs::remove_file(path) {
            warn!("Could not remove partial report file {}: {}", path.display(), err);
        }
    }
    if created {
        if let Err(err) = std::fs::remove_dir(output_dir) {
            warn!("Could not remove report directory {}: {}", output_dir.display(), err);
        }
    }
}

/// Run the window aggregator once per granularity.
pub fn aggregate_all(samples: &[Sample], config: &FlowConfig) -> Vec<GranularityReport> {
    Granularity::ALL
        .iter()
        .map(|&granularity| GranularityReport {
            granularity,
            windows: aggregate(samples, granularity, config),
        })
        .collect()
}

pub fn summarize<'a>(
    config: &'a FlowConfig,
    samples: &[Sample],
    reports: &[GranularityReport],
) -> RunSummary<'a> {
    RunSummary {
        config,
        sample_count: samples.len(),
        valid_count: samples.iter().filter(|s| s.is_valid()).count(),
        first_timestamp: samples.first().map(|s| format_timestamp(&s.timestamp())),
        last_timestamp: samples.last().map(|s| format_timestamp(&s.timestamp())),
        granularities: reports.iter().map(GranularityCounts::from_report).collect(),
    }
}

/// One row of `samples.csv`.
pub fn sample_record(sample: &Sample) -> [String; 7] {
    [
        format_timestamp(&sample.timestamp()),
        sample.level().to_string(),
        format!("{:.4}", sample.level_ft()),
        sample.velocity().to_string(),
        format!("{:.3}", sample.velocity_per_min()),
        format!("{:.2}", sample.temperature()),
        sample
            .flow()
            .map_or(NO_DATA.to_string(), |flow| format!("{:.3}", flow)),
    ]
}

pub fn window_header(granularity: Granularity) -> [String; 4] {
    [
        "Date and Time Start".to_string(),
        format!("Average {} data (USG/min)", granularity.label()),
        format!("Total flow (USG/{})", granularity.period()),
        "Percentage of Good Data".to_string(),
    ]
}

/// One row of a window report.
pub fn window_record(summary: &WindowSummary) -> [String; 4] {
    let or_no_data = |value: Option<f64>| value.map_or(NO_DATA.to_string(), |v| format!("{:.3}", v));
    [
        format_timestamp(&summary.start),
        or_no_data(summary.average()),
        or_no_data(summary.scaled_total()),
        format!("{:.2}", summary.quality_pct),
    ]
}

pub fn write_samples_csv(path: &Path, samples: &[Sample]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(SAMPLE_HEADER)?;
    for sample in samples {
        wtr.write_record(sample_record(sample))?;
    }
    wtr.flush()?;
    info!("Wrote {} samples to {}", samples.len(), path.display());
    Ok(())
}

pub fn write_windows_csv(path: &Path, report: &GranularityReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(window_header(report.granularity))?;
    for summary in &report.windows {
        wtr.write_record(window_record(summary))?;
    }
    wtr.flush()?;
    info!(
        "Wrote {} {} windows to {}",
        report.windows.len(),
        report.granularity.label(),
        path.display()
    );
    Ok(())
}
