//! Core secrets client trait.

use async_trait::async_trait;

use super::error::Result;

/// Read access to a secret store.
///
/// Implementations MUST NOT log secret values.
#[async_trait]
pub trait SecretsClient: Send + Sync {
    /// Retrieve a secret value by key.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::NotFound`] if the secret doesn't exist
    /// - [`SecretsError::ConnectionFailed`] if the store is unreachable
    /// - [`SecretsError::AuthenticationFailed`] if the store rejects the credentials
    async fn get_secret(&self, key: &str) -> Result<String>;

    /// Forget any local copy of `key` so the next read goes to the store.
    ///
    /// Clients without local state have nothing to drop.
    async fn invalidate(&self, _key: &str) {}
}

#[async_trait]
impl<T: SecretsClient + ?Sized> SecretsClient for std::sync::Arc<T> {
    async fn get_secret(&self, key: &str) -> Result<String> {
        (**self).get_secret(key).await
    }

    async fn invalidate(&self, key: &str) {
        (**self).invalidate(key).await
    }
}
