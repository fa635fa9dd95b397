/// Error types for the flowmon core library
use std::fmt;
use thiserror::Error;

/// The reading column a parse failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timestamp,
    Level,
    Velocity,
    Temperature,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Timestamp => "timestamp",
            Field::Level => "level",
            Field::Velocity => "velocity",
            Field::Temperature => "temperature",
        };
        f.write_str(name)
    }
}

/// Main error type for flowmon operations
#[derive(Error, Debug)]
pub enum FlowmonError {
    /// A configuration value is outside its domain
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A reading field could not be parsed
    #[error("{file}: sample {sample}: cannot parse {field} from {value:?}: {reason}")]
    Parse {
        file: String,
        sample: usize,
        field: Field,
        value: String,
        reason: String,
    },

    /// A `.Dat` export is missing one of its data sections
    #[error("{file}: missing {section} section")]
    MissingSection { file: String, section: &'static str },

    /// The Level/Velocity/Temperature sections of a file do not line up
    #[error("{file}: {reason}")]
    SectionMismatch { file: String, reason: String },

    /// Samples must be in non-decreasing time order
    #[error("{file}: sample {sample} at {timestamp} is earlier than the sample before it")]
    OutOfOrder {
        file: String,
        sample: usize,
        timestamp: String,
    },

    /// Depth outside the pipe's cross-section
    #[error("Depth {depth} inches is outside the pipe (0 to {diameter} inches)")]
    Geometry { depth: f64, diameter: f64 },

    /// Wraps an error with the sample it was raised for
    #[error("{file}: sample {sample}: {source}")]
    AtSample {
        file: String,
        sample: usize,
        #[source]
        source: Box<FlowmonError>,
    },

    /// No `.Dat` exports were found
    #[error("No input files (1.Dat, 2.Dat, ...) found in {0}")]
    NoInput(String),

    /// Reading an input file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FlowmonError {
    /// Attach the file and sample position to this error.
    pub fn at(self, file: &str, sample: usize) -> FlowmonError {
        FlowmonError::AtSample {
            file: file.to_string(),
            sample,
            source: Box::new(self),
        }
    }
}

/// Type alias for Results using FlowmonError
pub type Result<T> = std::result::Result<T, FlowmonError>;
