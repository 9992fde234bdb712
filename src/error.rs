//! Error types shared by the models, the tariff engine, and the simulator.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = SimError> = std::result::Result<T, E>;

/// Failures that abort a model construction or a combination's run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Weather and load samples for the same simulated hour disagree.
    #[error(
        "weather/load timestamp mismatch at sample {index}: weather={weather}, load={load}"
    )]
    DataIntegrity {
        index: usize,
        weather: NaiveDateTime,
        load: NaiveDateTime,
    },

    /// A model parameter is out of range, or a billing period cannot be settled.
    #[error("configuration error: {field}: {message}")]
    Configuration { field: String, message: String },

    /// A failure inside one equipment combination's run.
    #[error("combination {key}: {source}")]
    Combination {
        key: String,
        #[source]
        source: Box<SimError>,
    },

    /// A malformed record in an input file.
    #[error("{}:{line}: {message}", path.display())]
    Ingest {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SimError {
    /// Shorthand for [`SimError::Configuration`].
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attaches the combination key to an error raised during its run.
    pub fn in_combination(self, key: impl Into<String>) -> Self {
        Self::Combination {
            key: key.into(),
            source: Box::new(self),
        }
    }
}
