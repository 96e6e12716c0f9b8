//! Error types for the Authguard service.

use thiserror::Error;

/// Main error type for Authguard operations.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A policy failed validation
    #[error("Invalid policy '{name}': {reason}")]
    InvalidPolicy { name: String, reason: String },

    /// No policy is registered under the requested name
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),

    /// gRPC server errors
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::transport::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for GuardError {
    fn from(e: config::ConfigError) -> Self {
        GuardError::Config(e.to_string())
    }
}

/// Result type alias for Authguard operations.
pub type Result<T> = std::result::Result<T, GuardError>;
