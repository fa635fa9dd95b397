use crate::error::{FlowmonError, Result};
use log::warn;
use serde::Serialize;

/// An exclusive validity range for one sensor channel.
///
/// A reading is inside the range only if it is strictly greater than `min`
/// and strictly less than `max`; a reading equal to either bound is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(name: &str, min: f64, max: f64) -> Result<Bounds> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FlowmonError::Config(format!(
                "{name} bounds must be finite numbers (got {min} to {max})"
            )));
        }
        if min < 0.0 {
            return Err(FlowmonError::Config(format!(
                "{name} minimum must not be negative (got {min})"
            )));
        }
        if min >= max {
            return Err(FlowmonError::Config(format!(
                "{name} minimum {min} must be less than maximum {max}"
            )));
        }
        Ok(Bounds { min, max })
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min < value && value < self.max
    }
}

/// Process-wide settings for one report run. Built once, then only read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowConfig {
    /// Velocity bounds in feet/sec
    velocity: Bounds,
    /// Level bounds in inches
    level: Bounds,
    /// Internal pipe radius in inches
    pipe_radius: f64,
    /// Minimum percentage of valid samples a window needs to report an average
    minimum_percentage: f64,
}

impl FlowConfig {
    /// Validate and assemble a configuration. The pipe is given by its
    /// internal diameter in inches.
    pub fn new(
        velocity: Bounds,
        level: Bounds,
        pipe_diameter: f64,
        minimum_percentage: f64,
    ) -> Result<FlowConfig> {
        if !pipe_diameter.is_finite() || pipe_diameter <= 0.0 {
            return Err(FlowmonError::Config(format!(
                "pipe diameter must be a positive number of inches (got {pipe_diameter})"
            )));
        }
        if !minimum_percentage.is_finite() || !(0.0..=100.0).contains(&minimum_percentage) {
            return Err(FlowmonError::Config(format!(
                "minimum percentage must be between 0 and 100 (got {minimum_percentage})"
            )));
        }
        if level.max > pipe_diameter {
            warn!(
                "Level maximum {} exceeds the pipe diameter {}; valid levels above the diameter will abort the run",
                level.max, pipe_diameter
            );
        }
        Ok(FlowConfig {
            velocity,
            level,
            pipe_radius: pipe_diameter / 2.0,
            minimum_percentage,
        })
    }

    /// A reading is valid when both velocity and level lie strictly inside
    /// their configured bounds.
    pub fn is_valid_reading(&self, level: f64, velocity: f64) -> bool {
        self.velocity.contains(velocity) && self.level.contains(level)
    }

    pub fn velocity(&self) -> Bounds {
        self.velocity
    }

    pub fn level(&self) -> Bounds {
        self.level
    }

    pub fn pipe_radius(&self) -> f64 {
        self.pipe_radius
    }

    pub fn minimum_percentage(&self) -> f64 {
        self.minimum_percentage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FlowConfig {
        FlowConfig::new(
            Bounds::new("velocity", 0.1, 10.0).unwrap(),
            Bounds::new("level", 0.5, 11.0).unwrap(),
            12.0,
            80.0,
        )
        .unwrap()
    }

    #[test]
    fn test_strictly_inside_is_valid() {
        let config = config();
        assert!(config.is_valid_reading(6.0, 2.0));
    }

    #[test]
    fn test_bound_values_are_invalid() {
        let config = config();
        assert!(!config.is_valid_reading(0.5, 2.0));
        assert!(!config.is_valid_reading(11.0, 2.0));
        assert!(!config.is_valid_reading(6.0, 0.1));
        assert!(!config.is_valid_reading(6.0, 10.0));
    }

    #[test]
    fn test_outside_either_channel_is_invalid() {
        let config = config();
        assert!(!config.is_valid_reading(12.0, 2.0));
        assert!(!config.is_valid_reading(6.0, -1.0));
        assert!(!config.is_valid_reading(0.0, 0.0));
    }

    #[test]
    fn test_radius_is_half_diameter() {
        assert_eq!(config().pipe_radius(), 6.0);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        assert!(matches!(
            Bounds::new("level", 5.0, 5.0),
            Err(FlowmonError::Config(_))
        ));
        assert!(Bounds::new("level", 6.0, 5.0).is_err());
        assert!(Bounds::new("level", -1.0, 5.0).is_err());
        assert!(Bounds::new("level", 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_rejects_bad_diameter_and_percentage() {
        let v = Bounds::new("velocity", 0.0, 10.0).unwrap();
        let l = Bounds::new("level", 0.0, 10.0).unwrap();
        assert!(FlowConfig::new(v, l, 0.0, 50.0).is_err());
        assert!(FlowConfig::new(v, l, -4.0, 50.0).is_err());
        assert!(FlowConfig::new(v, l, 12.0, 100.5).is_err());
        assert!(FlowConfig::new(v, l, 12.0, -0.1).is_err());
        assert!(FlowConfig::new(v, l, 12.0, 100.0).is_ok());
    }
}
