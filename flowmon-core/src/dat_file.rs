//! Loader for the flow monitor's `.Dat` exports.
//!
//! An export holds three sections, introduced by the words `Level`,
//! `Velocity` and `Temperature` in that order. Inside a section each reading
//! is a `#<timestamp>` line followed by a line holding the value:
//!
//! ```text
//! Level (in)
//! #2023-05-01 08:00:00
//! 6.25
//! #2023-05-01 08:05:00
//! 6.31
//! Velocity (ft/s)
//! #2023-05-01 08:00:00
//! 1.92
//! ...
//! ```
//!
//! Header text before the first `#` of a section is ignored, as is anything
//! between a value line and the next `#`. The three sections are joined by
//! position into one [`Reading`] per timestamp.

use crate::{
    config::FlowConfig,
    error::{Field, FlowmonError, Result},
    sample::{Reading, Sample},
};
use chrono::NaiveDateTime;
use flowmon_utils::dates::{format_timestamp, parse_timestamp};
use log::info;
use std::path::{Path, PathBuf};

pub const LEVEL_SECTION: &str = "Level";
pub const VELOCITY_SECTION: &str = "Velocity";
pub const TEMPERATURE_SECTION: &str = "Temperature";

/// Extension of monitor exports; files are named `1.Dat`, `2.Dat`, ...
pub const DAT_EXTENSION: &str = "Dat";

/// A `#timestamp` / value pair as it appears in a section.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RawEntry<'a> {
    timestamp: &'a str,
    value: &'a str,
}

/// List the numbered exports in `dir`: `1.Dat`, `2.Dat`, ... up to the first gap.
pub fn dat_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for number in 1.. {
        let path = dir.join(format!("{number}.{DAT_EXTENSION}"));
        if !path.is_file() {
            break;
        }
        files.push(path);
    }
    files
}

/// Load every export in `dir`, in file-number order, into validated samples.
///
/// Fails on the first unreadable file, malformed field, out-of-order
/// timestamp or impossible depth; no partial series is returned.
pub fn load_directory(dir: &Path, config: &FlowConfig) -> Result<Vec<Sample>> {
    let files = dat_files(dir);
    if files.is_empty() {
        return Err(FlowmonError::NoInput(dir.display().to_string()));
    }
    info!("Loading {} .Dat files from {}", files.len(), dir.display());

    let mut located: Vec<(String, usize, Reading)> = Vec::new();
    for path in &files {
        let name = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| FlowmonError::Io {
            path: name.clone(),
            source,
        })?;
        let readings = parse_readings(&name, &contents)?;
        info!("{}: {} readings", name, readings.len());
        located.extend(
            readings
                .into_iter()
                .enumerate()
                .map(|(i, reading)| (name.clone(), i + 1, reading)),
        );
    }

    check_order(&located)?;
    build_samples(&located, config)
}

/// Parse the contents of one export into readings, in file order.
///
/// `file` is only used to label errors.
pub fn parse_readings(file: &str, contents: &str) -> Result<Vec<Reading>> {
    let level_start = find_section(file, contents, LEVEL_SECTION, 0)?;
    let velocity_start = find_section(file, contents, VELOCITY_SECTION, level_start)?;
    let temperature_start =
        find_section(file, contents, TEMPERATURE_SECTION, velocity_start)?;

    let levels = section_entries(file, LEVEL_SECTION, &contents[level_start..velocity_start])?;
    let velocities =
        section_entries(file, VELOCITY_SECTION, &contents[velocity_start..temperature_start])?;
    let temperatures =
        section_entries(file, TEMPERATURE_SECTION, &contents[temperature_start..])?;

    for (name, other) in [
        (VELOCITY_SECTION, &velocities),
        (TEMPERATURE_SECTION, &temperatures),
    ] {
        if other.len() != levels.len() {
            return Err(FlowmonError::SectionMismatch {
                file: file.to_string(),
                reason: format!(
                    "{} section has {} readings but {} section has {}",
                    LEVEL_SECTION,
                    levels.len(),
                    name,
                    other.len()
                ),
            });
        }
    }

    levels
        .iter()
        .zip(velocities.iter())
        .zip(temperatures.iter())
        .enumerate()
        .map(|(i, ((level, velocity), temperature))| {
            let sample = i + 1;
            let timestamp = parse_field_timestamp(file, sample, level.timestamp)?;
            for (name, entry) in [
                (VELOCITY_SECTION, velocity),
                (TEMPERATURE_SECTION, temperature),
            ] {
                let other = parse_field_timestamp(file, sample, entry.timestamp)?;
                if other != timestamp {
                    return Err(FlowmonError::SectionMismatch {
                        file: file.to_string(),
                        reason: format!(
                            "sample {}: {} timestamp {} does not match {} timestamp {}",
                            sample,
                            name,
                            format_timestamp(&other),
                            LEVEL_SECTION,
                            format_timestamp(&timestamp)
                        ),
                    });
                }
            }
            Ok(Reading {
                timestamp,
                level: parse_number(file, sample, Field::Level, level.value)?,
                velocity: parse_number(file, sample, Field::Velocity, velocity.value)?,
                temperature: parse_number(file, sample, Field::Temperature, temperature.value)?,
            })
        })
        .collect()
}

fn find_section(file: &str, contents: &str, section: &'static str, from: usize) -> Result<usize> {
    contents[from..]
        .find(section)
        .map(|offset| from + offset)
        .ok_or_else(|| FlowmonError::MissingSection {
            file: file.to_string(),
            section,
        })
}

fn section_entries<'a>(
    file: &str,
    section: &str,
    text: &'a str,
) -> Result<Vec<RawEntry<'a>>> {
    let mut entries = Vec::new();
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let Some(timestamp) = line.trim_start().strip_prefix('#') else {
            continue;
        };
        let value = lines.next().ok_or_else(|| FlowmonError::SectionMismatch {
            file: file.to_string(),
            reason: format!(
                "{} section ends after timestamp {:?} with no value",
                section,
                timestamp.trim()
            ),
        })?;
        entries.push(RawEntry { timestamp, value });
    }
    Ok(entries)
}

fn parse_field_timestamp(file: &str, sample: usize, raw: &str) -> Result<NaiveDateTime> {
    parse_timestamp(raw).map_err(|e| FlowmonError::Parse {
        file: file.to_string(),
        sample,
        field: Field::Timestamp,
        value: raw.trim().to_string(),
        reason: e.to_string(),
    })
}

fn parse_number(file: &str, sample: usize, field: Field, raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(FlowmonError::Parse {
            file: file.to_string(),
            sample,
            field,
            value: trimmed.to_string(),
            reason: "value is not finite".to_string(),
        }),
        Err(e) => Err(FlowmonError::Parse {
            file: file.to_string(),
            sample,
            field,
            value: trimmed.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn check_order(located: &[(String, usize, Reading)]) -> Result<()> {
    for pair in located.windows(2) {
        let (_, _, previous) = &pair[0];
        let (file, sample, current) = &pair[1];
        if current.timestamp < previous.timestamp {
            return Err(FlowmonError::OutOfOrder {
                file: file.clone(),
                sample: *sample,
                timestamp: format_timestamp(&current.timestamp),
            });
        }
    }
    Ok(())
}

fn build_samples(located: &[(String, usize, Reading)], config: &FlowConfig) -> Result<Vec<Sample>> {
    let total = located.len();
    let mut samples = Vec::with_capacity(total);
    let mut last_reported = 0;
    for (i, (file, sample, reading)) in located.iter().enumerate() {
        samples.push(Sample::new(*reading, config).map_err(|e| e.at(file, *sample))?);
        let percent = (i + 1) * 100 / total;
        if percent / 10 > last_reported / 10 {
            info!("Computed flow for {}% of samples", percent);
            last_reported = percent;
        }
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;
    use std::fs;

    const ONE_FILE: &str = "\
Site: North Interceptor
Level (in)
#2023-05-01 08:00:00
6.0
#2023-05-01 08:05:00
6.5
Velocity (ft/s)
#2023-05-01 08:00:00
2.0
#2023-05-01 08:05:00
12.0
Temperature (F)
#2023-05-01 08:00:00
54.25
#2023-05-01 08:05:00
54.5
End of data
";

    fn config() -> FlowConfig {
        FlowConfig::new(
            Bounds::new("velocity", 0.0, 10.0).unwrap(),
            Bounds::new("level", 0.0, 12.0).unwrap(),
            12.0,
            75.0,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_readings() {
        let readings = parse_readings("1.Dat", ONE_FILE).unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].level, 6.0);
        assert_eq!(readings[0].velocity, 2.0);
        assert_eq!(readings[0].temperature, 54.25);
        assert_eq!(format_timestamp(&readings[1].timestamp), "2023-05-01 08:05:00");
        assert_eq!(readings[1].velocity, 12.0);
    }

    #[test]
    fn test_date_only_timestamps() {
        let contents = "Level\n#2023-05-01\n3.0\nVelocity\n#2023-05-01\n1.0\nTemperature\n#2023-05-01\n50\n";
        let readings = parse_readings("1.Dat", contents).unwrap();
        assert_eq!(format_timestamp(&readings[0].timestamp), "2023-05-01 00:00:00");
    }

    #[test]
    fn test_missing_section() {
        let contents = "Level\n#2023-05-01\n3.0\nVelocity\n#2023-05-01\n1.0\n";
        let err = parse_readings("1.Dat", contents).unwrap_err();
        assert!(matches!(
            err,
            FlowmonError::MissingSection {
                section: TEMPERATURE_SECTION,
                ..
            }
        ));
    }

    #[test]
    fn test_non_numeric_level_names_field() {
        let contents = ONE_FILE.replacen("6.5", "six", 1);
        let err = parse_readings("2.Dat", &contents).unwrap_err();
        match err {
            FlowmonError::Parse {
                file,
                sample,
                field,
                value,
                ..
            } => {
                assert_eq!(file, "2.Dat");
                assert_eq!(sample, 2);
                assert_eq!(field, Field::Level);
                assert_eq!(value, "six");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_timestamp_is_parse_error() {
        let contents = ONE_FILE.replacen("#2023-05-01 08:00:00", "#05/01/2023 8am", 1);
        let err = parse_readings("1.Dat", &contents).unwrap_err();
        assert!(matches!(
            err,
            FlowmonError::Parse {
                field: Field::Timestamp,
                sample: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_uneven_sections() {
        let contents = ONE_FILE.replacen("#2023-05-01 08:05:00\n54.5\n", "", 1);
        let err = parse_readings("1.Dat", &contents).unwrap_err();
        assert!(matches!(err, FlowmonError::SectionMismatch { .. }));
    }

    #[test]
    fn test_misaligned_timestamps() {
        let contents = ONE_FILE.replacen(
            "#2023-05-01 08:05:00\n12.0",
            "#2023-05-01 08:10:00\n12.0",
            1,
        );
        let err = parse_readings("1.Dat", &contents).unwrap_err();
        assert!(matches!(err, FlowmonError::SectionMismatch { .. }));
    }

    #[test]
    fn test_dangling_timestamp() {
        let contents = "Level\n#2023-05-01\n3.0\nVelocity\n#2023-05-01\n1.0\nTemperature\n#2023-05-01";
        let err = parse_readings("1.Dat", contents).unwrap_err();
        assert!(matches!(err, FlowmonError::SectionMismatch { .. }));
    }

    #[test]
    fn test_load_directory_concatenates_in_number_order() {
        let dir = tempfile::tempdir().unwrap();
        let second = ONE_FILE.replace("2023-05-01 08:0", "2023-05-01 09:0");
        fs::write(dir.path().join("1.Dat"), ONE_FILE).unwrap();
        fs::write(dir.path().join("2.Dat"), second).unwrap();
        // not reached: 3.Dat is missing
        fs::write(dir.path().join("4.Dat"), "garbage").unwrap();

        let samples = load_directory(dir.path(), &config()).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(format_timestamp(&samples[2].timestamp()), "2023-05-01 09:00:00");
        assert!(samples[0].is_valid());
        assert_eq!(samples[0].flow(), Some(352.511));
        assert!(!samples[1].is_valid());
        assert_eq!(samples[1].flow(), None);
    }

    #[test]
    fn test_load_directory_rejects_out_of_order_files() {
        let dir = tempfile::tempdir().unwrap();
        let earlier = ONE_FILE.replace("2023-05-01 08:0", "2023-05-01 07:0");
        fs::write(dir.path().join("1.Dat"), ONE_FILE).unwrap();
        fs::write(dir.path().join("2.Dat"), earlier).unwrap();
        let err = load_directory(dir.path(), &config()).unwrap_err();
        assert!(matches!(err, FlowmonError::OutOfOrder { sample: 1, .. }));
    }

    #[test]
    fn test_load_directory_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_directory(dir.path(), &config()).unwrap_err();
        assert!(matches!(err, FlowmonError::NoInput(_)));
    }

    #[test]
    fn test_geometry_error_names_sample() {
        let dir = tempfile::tempdir().unwrap();
        let config = FlowConfig::new(
            Bounds::new("velocity", 0.0, 10.0).unwrap(),
            Bounds::new("level", 0.0, 20.0).unwrap(),
            5.0,
            75.0,
        )
        .unwrap();
        fs::write(dir.path().join("1.Dat"), ONE_FILE).unwrap();
        let err = load_directory(dir.path(), &config).unwrap_err();
        match err {
            FlowmonError::AtSample { sample, source, .. } => {
                assert_eq!(sample, 1);
                assert!(matches!(*source, FlowmonError::Geometry { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
