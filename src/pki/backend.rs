//! CA backend trait and the material it yields.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use rustls::pki_types::CertificateDer;
use serde::{Deserialize, Serialize};

use super::codec::{self, PrivateKey};
use crate::errors::{Artifact, BackendError};

/// Signing key and certificate chain of one certificate authority.
///
/// `chain[0]` is the certificate that signs new leaves; any further entries
/// are the authorities above it, in the order they were stored.
#[derive(Debug, Clone)]
pub struct CaMaterial {
    signing_key: PrivateKey,
    chain: Vec<CertificateDer<'static>>,
}

impl CaMaterial {
    pub fn new(
        authority: &str,
        signing_key: PrivateKey,
        chain: Vec<CertificateDer<'static>>,
    ) -> Result<Self, BackendError> {
        if chain.is_empty() {
            return Err(BackendError::empty_chain(authority));
        }
        Ok(Self { signing_key, chain })
    }

    /// Decode a certificate document and a key document.
    ///
    /// All `CERTIFICATE` blocks of the first document form the chain; the key
    /// document must hold exactly one key block with a recognized label.
    pub fn from_pem(
        authority: &str,
        certificate_pem: &[u8],
        private_key_pem: &[u8],
    ) -> Result<Self, BackendError> {
        let chain = codec::decode_certificates(certificate_pem)
            .map_err(|e| BackendError::decode(authority, Artifact::Certificate, e))?;
        let signing_key = codec::decode_private_key(private_key_pem)
            .map_err(|e| BackendError::decode(authority, Artifact::PrivateKey, e))?;
        Self::new(authority, signing_key, chain)
    }

    pub fn signing_key(&self) -> &PrivateKey {
        &self.signing_key
    }

    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    /// The certificate that signs new leaves.
    pub fn authority_certificate(&self) -> &CertificateDer<'static> {
        // non-empty, checked in new()
        &self.chain[0]
    }
}

/// Source of CA material.
///
/// Implementations own their transport and caching; the issuer only asks
/// for the material of a named authority.
#[async_trait]
pub trait CaBackend: Send + Sync + fmt::Debug {
    /// Load the signing key and chain for `authority`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when either document cannot be fetched or
    /// decoded, naming the authority and the artifact that failed.
    async fn load(&self, authority: &str) -> Result<CaMaterial, BackendError>;
}

/// Type of CA backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaBackendType {
    /// Documents stored in a HashiCorp Vault KV v2 mount
    Vault,
    /// Documents in `TLSMINT_SECRET_*` environment variables, for local work
    Env,
    /// Compiled-in test authority
    Static,
}

impl CaBackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vault => "vault",
            Self::Env => "env",
            Self::Static => "static",
        }
    }
}

impl FromStr for CaBackendType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "vault" | "secrethub" => Ok(Self::Vault),
            "env" => Ok(Self::Env),
            "static" | "test" => Ok(Self::Static),
            _ => Err(format!("Unknown CA backend type: {}", s)),
        }
    }
}

impl fmt::Display for CaBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
