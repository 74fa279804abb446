//! Compiled-in certificate authority for offline use.

use async_trait::async_trait;

use crate::errors::BackendError;
use crate::pki::backend::{CaBackend, CaMaterial};

/// Intermediate authority certificate followed by its self-signed root.
pub const CA_CERTIFICATE_PEM: &str = include_str!("fixtures/authority_chain.pem");

/// PKCS#1 key of the intermediate authority.
pub const CA_PRIVATE_KEY_PEM: &str = include_str!("fixtures/authority_key.pem");

/// Backend that hands out the same material for every authority name.
///
/// [`StaticCaBackend::new`] serves the compiled-in test authority;
/// [`StaticCaBackend::from_pem`] serves caller-supplied documents.
#[derive(Debug, Clone)]
pub struct StaticCaBackend {
    material: CaMaterial,
}

impl StaticCaBackend {
    pub fn new() -> Result<Self, BackendError> {
        Self::from_pem(CA_CERTIFICATE_PEM.as_bytes(), CA_PRIVATE_KEY_PEM.as_bytes())
    }

    pub fn from_pem(certificate_pem: &[u8], private_key_pem: &[u8]) -> Result<Self, BackendError> {
        let material = CaMaterial::from_pem("static", certificate_pem, private_key_pem)?;
        Ok(Self { material })
    }
}

#[async_trait]
impl CaBackend for StaticCaBackend {
    async fn load(&self, authority: &str) -> Result<CaMaterial, BackendError> {
        tracing::debug!(authority = %authority, "Serving static CA material");
        Ok(self.material.clone())
    }
}
