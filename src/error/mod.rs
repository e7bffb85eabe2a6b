//! Error types for the search repository

use thiserror::Error;

/// Result type alias for search repository operations
pub type Result<T> = std::result::Result<T, SearchError>;

/// Main error type for the search repository
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Builder error: {0}")]
    Builder(#[from] BuilderError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Response error: {0}")]
    Response(#[from] ResponseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors raised while assembling a request
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Missing document id")]
    MissingId,

    #[error("Invalid condition for '{field}': {reason}")]
    InvalidCondition { field: String, reason: String },

    #[error("Invalid sort specification: {0}")]
    InvalidSort(String),
}

/// Errors raised by the transport client
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Engine returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No hosts configured for cluster: {0}")]
    NoHosts(String),

    #[error("Invalid host URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised while normalizing an engine response
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error("Unrecognized hits.total shape: {0}")]
    UnrecognizedTotal(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        SearchError::Config(err.to_string())
    }
}
