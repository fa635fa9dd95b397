use crate::{config::FlowConfig, error::Result, estimator::flow_rate};
use chrono::NaiveDateTime;

/// One raw reading from the monitor, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    /// Liquid depth in inches
    pub level: f64,
    /// Velocity in feet/sec
    pub velocity: f64,
    pub temperature: f64,
}

/// A validated reading with its derived flow.
///
/// Validity and flow are fixed when the sample is built and never recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    reading: Reading,
    is_valid: bool,
    flow: Option<f64>,
}

impl Sample {
    /// Classify `reading` against the configured bounds and, if it is valid,
    /// compute its flow in US gallons/minute.
    pub fn new(reading: Reading, config: &FlowConfig) -> Result<Sample> {
        let is_valid = config.is_valid_reading(reading.level, reading.velocity);
        let flow = if is_valid {
            Some(flow_rate(
                reading.level,
                reading.velocity,
                config.pipe_radius(),
            )?)
        } else {
            None
        };
        Ok(Sample {
            reading,
            is_valid,
            flow,
        })
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.reading.timestamp
    }

    /// Level in inches
    pub fn level(&self) -> f64 {
        self.reading.level
    }

    /// Level in feet
    pub fn level_ft(&self) -> f64 {
        self.reading.level / 12.0
    }

    /// Velocity in feet/sec
    pub fn velocity(&self) -> f64 {
        self.reading.velocity
    }

    /// Velocity in feet/min
    pub fn velocity_per_min(&self) -> f64 {
        self.reading.velocity * 60.0
    }

    pub fn temperature(&self) -> f64 {
        self.reading.temperature
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Flow in US gallons/minute; `None` for invalid samples.
    pub fn flow(&self) -> Option<f64> {
        self.flow
    }
}
