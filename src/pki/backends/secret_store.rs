//! CA material held in a remote secret store.
//!
//! Each authority owns two documents under its name: `<authority>/cert.pem`
//! with the certificate chain (signing certificate first) and
//! `<authority>/key.pem` with the signing key. An optional prefix places all
//! authorities below a common path.

use std::fmt;

use async_trait::async_trait;

use crate::errors::{Artifact, BackendError};
use crate::pki::backend::{CaBackend, CaMaterial};
use crate::secrets::{SecretString, SecretsClient};

pub const CERTIFICATE_DOCUMENT: &str = "cert.pem";
pub const PRIVATE_KEY_DOCUMENT: &str = "key.pem";

/// Backend that reads CA documents through a [`SecretsClient`].
pub struct SecretStoreCaBackend<C: SecretsClient> {
    client: C,
    prefix: String,
}

impl<C: SecretsClient> SecretStoreCaBackend<C> {
    pub fn new(client: C) -> Self {
        Self { client, prefix: String::new() }
    }

    /// Read documents below `prefix`. A trailing `/` is added when missing.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.prefix = prefix;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn document_path(&self, authority: &str, document: &str) -> String {
        format!("{}{}/{}", self.prefix, authority, document)
    }
}

/// Authority names become path segments, so they must not escape them.
fn validate_authority_name(authority: &str) -> Result<(), BackendError> {
    if authority.is_empty() {
        return Err(BackendError::invalid_authority(authority, "name cannot be empty"));
    }
    if authority.starts_with('/') || authority.ends_with('/') {
        return Err(BackendError::invalid_authority(
            authority,
            "name cannot start or end with '/'",
        ));
    }
    if authority.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(BackendError::invalid_authority(
            authority,
            "name cannot contain empty, '.' or '..' path segments",
        ));
    }
    Ok(())
}

impl<C: SecretsClient> fmt::Debug for SecretStoreCaBackend<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStoreCaBackend")
            .field("prefix", &self.prefix)
            .field("client", &"<SecretsClient>")
            .finish()
    }
}

#[async_trait]
impl<C: SecretsClient> CaBackend for SecretStoreCaBackend<C> {
    async fn load(&self, authority: &str) -> Result<CaMaterial, BackendError> {
        validate_authority_name(authority)?;

        let certificate_path = self.document_path(authority, CERTIFICATE_DOCUMENT);
        let certificate = self.client.get_secret(&certificate_path).await.map_err(|e| {
            tracing::error!(error = %e, authority = %authority, path = %certificate_path, "Failed to fetch CA certificate");
            BackendError::fetch(authority, Artifact::Certificate, e.to_string())
        })?;

        let key_path = self.document_path(authority, PRIVATE_KEY_DOCUMENT);
        let private_key =
            SecretString::new(self.client.get_secret(&key_path).await.map_err(|e| {
                tracing::error!(error = %e, authority = %authority, path = %key_path, "Failed to fetch CA private key");
                BackendError::fetch(authority, Artifact::PrivateKey, e.to_string())
            })?);

        let material = match CaMaterial::from_pem(
            authority,
            certificate.as_bytes(),
            private_key.expose_secret().as_bytes(),
        ) {
            Ok(material) => material,
            Err(e) => {
                // A caching client may hold one half of a rotation; read both
                // documents from the store on the next load.
                tracing::warn!(
                    error = %e,
                    authority = %authority,
                    "CA material failed to decode, invalidating cached documents"
                );
                self.client.invalidate(&certificate_path).await;
                self.client.invalidate(&key_path).await;
                return Err(e);
            }
        };

        tracing::debug!(
            authority = %authority,
            chain_length = material.chain().len(),
            "Loaded CA material from secret store"
        );
        Ok(material)
    }
}
