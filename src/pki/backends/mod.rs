//! CA backend implementations.

pub mod fixture;
pub mod secret_store;

pub use fixture::StaticCaBackend;
pub use secret_store::SecretStoreCaBackend;

use std::sync::Arc;

use crate::config::BackendConfig;
use crate::errors::Result;
use crate::pki::backend::{CaBackend, CaBackendType};
use crate::secrets::{CachedSecretsClient, EnvVarSecretsClient, VaultSecretsClient};

/// Build the backend selected by configuration.
///
/// The Vault backend checks server health before it is returned, so a
/// misconfigured address fails at startup instead of on the first request.
pub async fn build_backend(config: &BackendConfig) -> Result<Arc<dyn CaBackend>> {
    match config.kind {
        CaBackendType::Static => {
            tracing::warn!("Using the compiled-in test certificate authority");
            Ok(Arc::new(StaticCaBackend::new()?))
        }
        CaBackendType::Env => {
            tracing::warn!("Reading CA material from environment variables");
            Ok(Arc::new(
                SecretStoreCaBackend::new(EnvVarSecretsClient::new())
                    .with_prefix(config.path_prefix.clone()),
            ))
        }
        CaBackendType::Vault => {
            let client = VaultSecretsClient::new(config.vault.clone()).await?;
            client.health_check().await?;

            let backend: Arc<dyn CaBackend> = match config.cache_ttl {
                Some(ttl) => Arc::new(
                    SecretStoreCaBackend::new(CachedSecretsClient::new(client, ttl))
                        .with_prefix(config.path_prefix.clone()),
                ),
                None => Arc::new(
                    SecretStoreCaBackend::new(client).with_prefix(config.path_prefix.clone()),
                ),
            };

            tracing::info!(
                address = %config.vault.address,
                mount_path = %config.vault.mount_path,
                prefix = %config.path_prefix,
                cache_ttl_secs = config.cache_ttl.map(|ttl| ttl.as_secs()),
                "Vault CA backend ready"
            );
            Ok(backend)
        }
    }
}
