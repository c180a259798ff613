use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendError;

/// Errors that stop a run (or a whole backend) rather than a single resource.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Configuration file not found: {}", path.display())]
    ConfigurationMissing { path: PathBuf },

    #[error("Failed to read configuration file '{}': {source}", path.display())]
    ConfigurationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in '{}': {message}", path.display())]
    ConfigurationInvalid { path: PathBuf, message: String },

    #[error("Environment '{environment}' is not listed in env.yaml (known: {})", known.join(", "))]
    InvalidEnvironment {
        environment: String,
        known: Vec<String>,
    },

    #[error("Unknown service '{0}' (expected one of: couchbase, redpanda)")]
    UnknownService(String),

    #[error("Failed to connect to {backend} after {attempts} attempts: {source}")]
    BackendUnavailable {
        backend: String,
        attempts: u32,
        #[source]
        source: BackendError,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, InitError>;
