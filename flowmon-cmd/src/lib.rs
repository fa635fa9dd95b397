//! Command implementations for the flowmon CLI.
//!
//! Provides subcommands for turning flow monitor `.Dat` exports into
//! per-sample and windowed flow reports.

use clap::{Args, Subcommand};
use flowmon_core::config::{Bounds, FlowConfig};
use std::path::PathBuf;

pub mod check;
pub mod report;

/// Sensor bounds, pipe size and quality threshold shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Valid minimum velocity in feet/sec (exclusive)
    #[arg(long)]
    pub velocity_min: f64,

    /// Valid maximum velocity in feet/sec (exclusive)
    #[arg(long)]
    pub velocity_max: f64,

    /// Valid minimum level in inches (exclusive)
    #[arg(long)]
    pub level_min: f64,

    /// Valid maximum level in inches (exclusive)
    #[arg(long)]
    pub level_max: f64,

    /// Internal pipe diameter in inches
    #[arg(long)]
    pub pipe_diameter: f64,

    /// Minimum percentage of good data required to report an average
    #[arg(long)]
    pub min_quality: f64,
}

impl ConfigArgs {
    pub fn to_config(&self) -> anyhow::Result<FlowConfig> {
        let velocity = Bounds::new("velocity", self.velocity_min, self.velocity_max)?;
        let level = Bounds::new("level", self.level_min, self.level_max)?;
        Ok(FlowConfig::new(
            velocity,
            level,
            self.pipe_diameter,
            self.min_quality,
        )?)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute flows and 15 minute, hourly and daily averages, writing CSV reports
    Report {
        /// Directory holding the numbered exports 1.Dat, 2.Dat, ...
        #[arg(short = 'i', long, default_value = ".")]
        input_dir: PathBuf,

        /// Directory the reports are written to (created if missing)
        #[arg(short = 'o', long, default_value = "report")]
        output_dir: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Load and validate the exports and print a summary without writing reports
    Check {
        /// Directory holding the numbered exports 1.Dat, 2.Dat, ...
        #[arg(short = 'i', long, default_value = ".")]
        input_dir: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Report {
            input_dir,
            output_dir,
            config,
        } => report::run_report(&input_dir, &output_dir, &config.to_config()?),
        Command::Check { input_dir, config } => {
            check::run_check(&input_dir, &config.to_config()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    const BOUNDS: [&str; 12] = [
        "--velocity-min",
        "0.1",
        "--velocity-max",
        "15",
        "--level-min",
        "0.5",
        "--level-max",
        "11.5",
        "--pipe-diameter",
        "12",
        "--min-quality",
        "80",
    ];

    fn parse(args: &[&str]) -> Result<TestCli, clap::Error> {
        TestCli::try_parse_from(std::iter::once("flowmon").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_report() {
        let mut args = vec!["report", "-i", "data", "-o", "out"];
        args.extend(BOUNDS);
        let cli = parse(&args).unwrap();
        match cli.command {
            Command::Report {
                input_dir,
                output_dir,
                config,
            } => {
                assert_eq!(input_dir, PathBuf::from("data"));
                assert_eq!(output_dir, PathBuf::from("out"));
                let config = config.to_config().unwrap();
                assert_eq!(config.pipe_radius(), 6.0);
                assert_eq!(config.minimum_percentage(), 80.0);
                assert!(config.is_valid_reading(6.0, 2.0));
            }
            Command::Check { .. } => panic!("expected report"),
        }
    }

    #[test]
    fn test_non_numeric_bound_is_rejected() {
        let mut args = vec!["check"];
        args.extend(BOUNDS);
        args[10] = "twelve";
        assert!(parse(&args).is_err());
    }

    #[test]
    fn test_out_of_domain_config_is_rejected() {
        let mut args = vec!["check"];
        args.extend(BOUNDS);
        args[12] = "120";
        let cli = parse(&args).unwrap();
        match cli.command {
            Command::Check { config, .. } => assert!(config.to_config().is_err()),
            Command::Report { .. } => panic!("expected check"),
        }
    }
}
