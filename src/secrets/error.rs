//! Error types for secret store access.

use thiserror::Error;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while reading from a secret store.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// Secret not found in the store.
    #[error("Secret not found: {key}")]
    NotFound { key: String },

    /// Failed to connect to the store.
    #[error("Backend connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The store rejected our credentials.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Store-specific error.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl SecretsError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }
}
