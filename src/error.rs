use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the simulation, training and persistence layers
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    Config { message: String },

    #[error("failed to {operation} `{path}`: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed q-table snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt q-table snapshot: {message}")]
    Corrupt { message: String },

    #[error("unsupported q-table snapshot version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("failed to write score log: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
