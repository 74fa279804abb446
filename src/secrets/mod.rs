//! Remote secret stores holding CA documents.
//!
//! Everything here is read-only: the issuer fetches an authority's certificate
//! chain and signing key by path and never writes back.
//!
//! - [`VaultSecretsClient`] reads HashiCorp Vault KV v2 entries
//! - [`EnvVarSecretsClient`] reads `TLSMINT_SECRET_*` variables for local work
//! - [`CachedSecretsClient`] wraps either one with a TTL cache
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tlsmint::secrets::{CachedSecretsClient, SecretsClient, VaultConfig, VaultSecretsClient};
//!
//! let vault = VaultSecretsClient::new(VaultConfig::default()).await?;
//! vault.health_check().await?;
//!
//! let client = CachedSecretsClient::new(vault, Duration::from_secs(300));
//! let chain = client.get_secret("corp/cert.pem").await?;
//! ```

pub mod cached;
pub mod client;
pub mod env;
pub mod error;
pub mod types;
pub mod vault;

pub use cached::CachedSecretsClient;
pub use client::SecretsClient;
pub use env::EnvVarSecretsClient;
pub use error::{Result, SecretsError};
pub use types::SecretString;
pub use vault::{VaultConfig, VaultSecretsClient};
