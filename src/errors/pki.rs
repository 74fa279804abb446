use std::fmt;

use thiserror::Error;

use crate::pki::request::{LABEL_AUTHORITY, LABEL_COMMON_NAME, LABEL_USAGE};

/// A request label mapping could not be turned into a certificate request.
///
/// Variants are checked in a fixed order: authority, common name, usage,
/// IP addresses, lifetime. The first failure wins.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("label '{label}' is required to issue a certificate")]
    MissingLabel { label: &'static str },

    #[error("disallowed usage requested for certificate: {value}")]
    DisallowedUsage { value: String },

    #[error("error parsing IP address from: '{value}'")]
    InvalidIpAddress { value: String },

    #[error("error parsing requested certificate lifetime: {reason}")]
    InvalidLifetime { value: String, reason: String },
}

impl ValidationError {
    pub fn missing_authority() -> Self {
        Self::MissingLabel { label: LABEL_AUTHORITY }
    }

    pub fn missing_common_name() -> Self {
        Self::MissingLabel { label: LABEL_COMMON_NAME }
    }

    pub fn missing_usage() -> Self {
        Self::MissingLabel { label: LABEL_USAGE }
    }

    pub fn disallowed_usage(value: impl Into<String>) -> Self {
        Self::DisallowedUsage { value: value.into() }
    }

    pub fn invalid_ip_address(value: impl Into<String>) -> Self {
        Self::InvalidIpAddress { value: value.into() }
    }

    pub fn invalid_lifetime(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLifetime { value: value.into(), reason: reason.into() }
    }

    /// Name of the request label this error refers to.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingLabel { label } => label,
            Self::DisallowedUsage { .. } => LABEL_USAGE,
            Self::InvalidIpAddress { .. } => crate::pki::request::LABEL_IP_ADDRESSES,
            Self::InvalidLifetime { .. } => crate::pki::request::LABEL_LIFETIME,
        }
    }
}

/// Which half of the CA material an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Certificate,
    PrivateKey,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Certificate => f.write_str("CA certificate"),
            Self::PrivateKey => f.write_str("CA private key"),
        }
    }
}

/// CA material could not be located, fetched, or decoded.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("error fetching {artifact} for authority '{authority}': {message}")]
    Fetch { authority: String, artifact: Artifact, message: String },

    #[error("error decoding {artifact} for authority '{authority}': {source}")]
    Decode {
        authority: String,
        artifact: Artifact,
        #[source]
        source: CodecError,
    },

    #[error("no certificates found in CA material for authority '{authority}'")]
    EmptyChain { authority: String },

    #[error("invalid authority name '{authority}': {reason}")]
    InvalidAuthority { authority: String, reason: String },

    #[error("CA backend configuration error: {message}")]
    Config { message: String },
}

impl BackendError {
    pub fn fetch(
        authority: impl Into<String>,
        artifact: Artifact,
        message: impl Into<String>,
    ) -> Self {
        Self::Fetch { authority: authority.into(), artifact, message: message.into() }
    }

    pub fn decode(authority: impl Into<String>, artifact: Artifact, source: CodecError) -> Self {
        Self::Decode { authority: authority.into(), artifact, source }
    }

    pub fn empty_chain(authority: impl Into<String>) -> Self {
        Self::EmptyChain { authority: authority.into() }
    }

    pub fn invalid_authority(authority: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAuthority { authority: authority.into(), reason: reason.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// The artifact that failed, when the error is tied to one.
    pub fn artifact(&self) -> Option<Artifact> {
        match self {
            Self::Fetch { artifact, .. } | Self::Decode { artifact, .. } => Some(*artifact),
            Self::EmptyChain { .. } => Some(Artifact::Certificate),
            Self::InvalidAuthority { .. } | Self::Config { .. } => None,
        }
    }
}

/// Failure while turning a validated request into a signed bundle.
#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("error generating certificate serial number: {message}")]
    Serial { message: String },

    #[error("error loading CA bundle: {0}")]
    Backend(#[from] BackendError),

    #[error("error parsing CA certificate: {message}")]
    AuthorityCertificate { message: String },

    #[error("error generating private key: {message}")]
    KeyGeneration { message: String },

    #[error("invalid subject alternative name '{value}': {message}")]
    InvalidSubjectAltName { value: String, message: String },

    #[error("error signing certificate: {message}")]
    Signing { message: String },

    #[error("error encoding certificate bundle: {message}")]
    Encoding { message: String },

    #[error("internal fault during issuance: {message}")]
    Fault { message: String },
}

impl IssuanceError {
    pub fn serial(message: impl Into<String>) -> Self {
        Self::Serial { message: message.into() }
    }

    pub fn authority_certificate(message: impl Into<String>) -> Self {
        Self::AuthorityCertificate { message: message.into() }
    }

    pub fn key_generation(message: impl Into<String>) -> Self {
        Self::KeyGeneration { message: message.into() }
    }

    pub fn invalid_subject_alt_name(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSubjectAltName { value: value.into(), message: message.into() }
    }

    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing { message: message.into() }
    }

    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding { message: message.into() }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        Self::Fault { message: message.into() }
    }
}

/// PEM bundle decoding failures.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed PEM document: {0}")]
    Pem(#[from] pem::PemError),

    #[error("received unknown PEM type for private key: {label}")]
    UnsupportedKeyLabel { label: String },

    #[error("no private key block found")]
    MissingPrivateKey,

    #[error("more than one private key block found")]
    MultiplePrivateKeys,

    #[error("error parsing {label} block: {reason}")]
    InvalidPrivateKey { label: String, reason: String },
}

impl CodecError {
    pub fn unsupported_key_label(label: impl Into<String>) -> Self {
        Self::UnsupportedKeyLabel { label: label.into() }
    }

    pub fn invalid_private_key(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPrivateKey { label: label.into(), reason: reason.into() }
    }
}
