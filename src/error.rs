//! Error types shared across the crate.

use thiserror::Error;

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures while loading or indexing environment time series.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("column \"{column}\" not found in \"{path}\"")]
    MissingColumn { column: String, path: String },

    #[error("invalid value \"{value}\" in column \"{column}\" of \"{path}\"")]
    InvalidValue {
        value: String,
        column: String,
        path: String,
    },

    #[error(
        "loaded data is of unequal length: energy_demand={demand}, solar_irradiance={irradiance}, \
         wind_speed={wind_speed}, rate_consumption_charge={price}"
    )]
    LengthMismatch {
        demand: usize,
        irradiance: usize,
        wind_speed: usize,
        price: usize,
    },

    #[error("household \"{path}\" has {found} samples, expected {expected}")]
    HouseholdLength {
        path: String,
        found: usize,
        expected: usize,
    },

    #[error("not enough household samples: requested {requested}, found {found}")]
    NotEnoughHouseholds { requested: usize, found: usize },

    #[error("environment series is empty")]
    Empty,

    #[error("a CSV data source requires {field}")]
    MissingPath { field: &'static str },

    #[error("step {step} is out of range for a series of length {len}")]
    StepOutOfRange { step: usize, len: usize },
}

/// Malformed actions, rejected before they reach the physics.
#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} must be within [0, 1], got {value}")]
    StatusOutOfRange { field: &'static str, value: f64 },

    #[error("{field} level {level} exceeds the action resolution of {steps} steps")]
    LevelOutOfRange {
        field: &'static str,
        level: usize,
        steps: usize,
    },

    #[error("flat action must have {expected} entries, got {found}")]
    FlatLength { expected: usize, found: usize },
}

/// Failures of a single microgrid transition.
#[derive(Debug, Error)]
pub enum MicrogridError {
    #[error("invalid action: {0}")]
    Action(#[from] ActionError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("episode is finished after {steps} steps; call reset() first")]
    EpisodeFinished { steps: usize },
}

/// Failures while turning a scenario into a runnable episode.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(
        "invalid scenario: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Invalid(Vec<ConfigError>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Microgrid(#[from] MicrogridError),
}
