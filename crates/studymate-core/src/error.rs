//! Core error types for studymate-core.
//!
//! Validation and sharing errors are returned to the caller and shown to the
//! user. Collaborator errors (remote store, model, audio, notifications) are
//! caught where the call is made and degraded, so they rarely escape the
//! [`crate::Companion`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studymate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Preference store errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote subject store errors
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Sharing payload errors
    #[error("{0}")]
    Share(#[from] ShareError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Preference store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open preference store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Preference store is locked")]
    Locked,

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),
}

/// Remote subject store errors.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// No signed-in user
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The service rejected the request (bad credentials, RLS, ...)
    #[error("{service} rejected the request ({status}): {message}")]
    Rejected {
        service: String,
        status: u16,
        message: String,
    },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Credential storage failure
    #[error("Credential store error: {0}")]
    Credentials(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty
    #[error("'{0}' is required")]
    Required(String),

    /// No subject with the given identifier
    #[error("No subject with id {0}")]
    SubjectNotFound(String),

    /// No task with the given identifier on that day
    #[error("No task {id} on {day}")]
    TaskNotFound { id: String, day: String },

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failures decoding a sharing payload. Both are user-facing.
#[derive(Error, Debug)]
pub enum ShareError {
    /// Payload is not JSON at all
    #[error("Invalid code. Make sure you copied the whole code. ({0})")]
    Parse(#[from] serde_json::Error),

    /// Payload is JSON but not a subject
    #[error("The code does not contain a valid subject: {0}")]
    Invalid(String),
}

/// Failures from the hosted generative model.
#[derive(Error, Debug)]
pub enum QuizError {
    /// No API key configured
    #[error("No API key configured for the quiz model")]
    MissingApiKey,

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model answered with an error status
    #[error("Model returned HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The model answered without any text
    #[error("Model returned no text")]
    EmptyResponse,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) if e.code == rusqlite::ErrorCode::DatabaseLocked => {
                StoreError::Locked
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<keyring::Error> for RemoteError {
    fn from(err: keyring::Error) -> Self {
        RemoteError::Credentials(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
