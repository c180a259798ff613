//! Backend error types.

use thiserror::Error;

/// Errors surfaced by a resource backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be reached at all.
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The broker refused an admin request or could not be reached over the Kafka protocol.
    #[error("Kafka error: {0}")]
    Kafka(String),

    /// The backend answered but its state is not usable (e.g. no brokers).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BackendError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            BackendError::Connect(err.to_string())
        }
    }
}

impl From<rdkafka::error::KafkaError> for BackendError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        BackendError::Kafka(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
