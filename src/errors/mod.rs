//! # Error Handling
//!
//! Error types for tlsmint, built with `thiserror`.
//!
//! The issuance engine reports one of three kinds ([`ValidationError`],
//! [`BackendError`], [`IssuanceError`]); [`Error`] is the crate-wide type that
//! the plugin transport, configuration and CLI layers return.

pub mod pki;
pub mod tls;

pub use pki::{Artifact, BackendError, CodecError, IssuanceError, ValidationError};
pub use tls::TlsError;

/// Custom result type for tlsmint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tlsmint
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request labels failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// CA material could not be loaded
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Certificate could not be issued
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    /// PEM bundle could not be decoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Bundle could not be loaded into a TLS identity
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// Network transport errors (plugin socket, Docker API)
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Validation failed: {}", message))
    }
}

impl From<crate::secrets::SecretsError> for Error {
    fn from(error: crate::secrets::SecretsError) -> Self {
        match error {
            crate::secrets::SecretsError::ConfigError { message } => Self::Config(message),
            other => Self::Transport(other.to_string()),
        }
    }
}
