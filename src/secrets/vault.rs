//! HashiCorp Vault KV v2 secrets client.
//!
//! Each secret is a KV v2 entry whose `value` field holds the document, so an
//! authority named `corp` under mount `secret` is stored as
//!
//! ```text
//! vault kv put secret/corp/cert.pem value=@chain.pem
//! vault kv put secret/corp/key.pem  value=@key.pem
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

use super::client::SecretsClient;
use super::error::{Result, SecretsError};

/// Field of a KV v2 entry holding the secret document.
pub const VALUE_FIELD: &str = "value";

/// Configuration for the Vault client.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VaultConfig {
    /// Vault server address (e.g., "https://vault.example.com:8200")
    pub address: String,

    /// Authentication token. Never serialized.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Vault namespace (Enterprise multi-tenancy)
    pub namespace: Option<String>,

    /// KV v2 mount path (default: "secret")
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
}

fn default_mount_path() -> String {
    "secret".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:8200".to_string(),
            token: None,
            namespace: None,
            mount_path: default_mount_path(),
        }
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("namespace", &self.namespace)
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

impl VaultConfig {
    /// Read configuration from `VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_NAMESPACE`
    /// and `VAULT_MOUNT_PATH`.
    ///
    /// # Errors
    ///
    /// [`SecretsError::ConfigError`] if `VAULT_ADDR` is not set.
    pub fn from_env() -> Result<Self> {
        let address = std::env::var("VAULT_ADDR")
            .map_err(|_| SecretsError::config_error("VAULT_ADDR environment variable not set"))?;

        Ok(Self {
            address,
            token: std::env::var("VAULT_TOKEN").ok(),
            namespace: std::env::var("VAULT_NAMESPACE").ok(),
            mount_path: std::env::var("VAULT_MOUNT_PATH").unwrap_or_else(|_| default_mount_path()),
        })
    }
}

/// Read-only client for Vault's KV v2 engine.
///
/// `Send + Sync`; share it behind an `Arc` or a caching wrapper.
pub struct VaultSecretsClient {
    client: VaultClient,
    address: String,
    mount_path: String,
}

impl VaultSecretsClient {
    /// Build a client. No request is made; call [`Self::health_check`] to
    /// verify the server is reachable.
    ///
    /// # Errors
    ///
    /// [`SecretsError::ConfigError`] if the address is empty or the settings
    /// are rejected by the Vault client.
    pub async fn new(config: VaultConfig) -> Result<Self> {
        if config.address.is_empty() {
            return Err(SecretsError::config_error("Vault address cannot be empty"));
        }

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&config.address);

        if let Some(ref token) = config.token {
            settings_builder.token(token);
        }

        if let Some(namespace) = config.namespace {
            settings_builder.namespace(Some(namespace));
        }

        let settings = settings_builder.build().map_err(|e| {
            SecretsError::config_error(format!("Invalid Vault configuration: {}", e))
        })?;

        let client = VaultClient::new(settings).map_err(|e| {
            SecretsError::connection_failed(format!("Failed to create Vault client: {}", e))
        })?;

        Ok(Self { client, address: config.address, mount_path: config.mount_path })
    }

    /// Build a client from the `VAULT_*` environment variables.
    pub async fn from_env() -> Result<Self> {
        Self::new(VaultConfig::from_env()?).await
    }

    /// Check that the Vault server answers its health endpoint.
    pub async fn health_check(&self) -> Result<()> {
        match vaultrs::sys::health(&self.client).await {
            Ok(_) => {
                tracing::info!(address = %self.address, "Successfully connected to Vault");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, address = %self.address, "Failed to connect to Vault");
                Err(SecretsError::connection_failed(format!("Vault health check failed: {}", e)))
            }
        }
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }
}

fn map_read_error(key: &str, error: ClientError) -> SecretsError {
    match error {
        ClientError::APIError { code: 404, .. } => SecretsError::not_found(key),
        ClientError::APIError { code: 401 | 403, errors } => {
            SecretsError::authentication_failed(errors.join(", "))
        }
        other => SecretsError::backend_error(format!("Failed to read secret '{}': {}", key, other)),
    }
}

#[async_trait]
impl SecretsClient for VaultSecretsClient {
    async fn get_secret(&self, key: &str) -> Result<String> {
        let secret: HashMap<String, String> =
            kv2::read(&self.client, &self.mount_path, key).await.map_err(|e| {
                tracing::error!(error = %e, key = %key, "Failed to read secret from Vault");
                map_read_error(key, e)
            })?;

        secret.get(VALUE_FIELD).cloned().ok_or_else(|| {
            SecretsError::backend_error(format!("Secret '{}' has no '{}' field", key, VALUE_FIELD))
        })
    }
}
