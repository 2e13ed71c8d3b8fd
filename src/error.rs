//! Error types
//!
//! Core flattening operations never fail: walker contract violations surface as
//! [`Diagnostic`](crate::flatten::Diagnostic)s and unknown ids are no-ops. The
//! errors here cover the ambient surfaces around the engine.

use thiserror::Error;

/// Errors from configuration, logging setup, and scheduler construction
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Deferred builds need a Tokio runtime: {0}")]
    RuntimeUnavailable(String),
}

impl From<config::ConfigError> for TreeError {
    fn from(err: config::ConfigError) -> Self {
        TreeError::ConfigError(err.to_string())
    }
}
