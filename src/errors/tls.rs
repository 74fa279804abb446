use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::pki::CodecError;

/// Errors surfaced while loading an issued bundle into a TLS identity.
#[derive(Debug, Error)]
pub enum TlsError {
    /// The bundle file could not be read.
    #[error("Failed to read certificate bundle at {path}: {source}")]
    BundleReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bundle was not a well-formed PEM bundle.
    #[error("Certificate bundle {path} is not a valid bundle: {source}")]
    InvalidBundle {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The bundle held only CA certificates.
    #[error("Certificate bundle {path} does not contain a leaf certificate")]
    MissingLeafCertificate { path: PathBuf },

    /// The bundle held no CA certificates to verify peers with.
    #[error("Certificate bundle {path} does not contain any CA certificates")]
    MissingTrustAnchors { path: PathBuf },

    /// The private key could not be used by the TLS stack.
    #[error("Private key in {path} is not supported: {source}")]
    InvalidPrivateKey {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The leaf certificate is not yet valid.
    #[error("Certificate at {path} is not valid before {not_before}")]
    CertificateNotYetValid { path: PathBuf, not_before: DateTime<Utc> },

    /// The leaf certificate is expired.
    #[error("Certificate at {path} expired at {not_after}")]
    CertificateExpired { path: PathBuf, not_after: DateTime<Utc> },

    /// Generic metadata extraction failure.
    #[error("Failed to extract certificate metadata from {path}: {source}")]
    CertificateMetadata {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// rustls refused the assembled configuration.
    #[error("Failed to build TLS configuration: {source}")]
    ServerConfig {
        #[source]
        source: anyhow::Error,
    },
}
