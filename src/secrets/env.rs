//! Secrets read from `TLSMINT_SECRET_*` environment variables.
//!
//! Intended for development and tests only. Environment variables show up in
//! process listings and are not encrypted.
//!
//! A secret key becomes a variable name by upper-casing it and replacing `/`,
//! `.` and `-` with `_`, so `corp/cert.pem` is read from
//! `TLSMINT_SECRET_CORP_CERT_PEM`.

use async_trait::async_trait;
use std::env;

use super::client::SecretsClient;
use super::error::{Result, SecretsError};

/// Environment variable prefix for secrets.
pub const SECRET_PREFIX: &str = "TLSMINT_SECRET_";

/// Read-only secrets client over the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvVarSecretsClient {}

impl EnvVarSecretsClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_to_env_var(key: &str) -> String {
        let name: String = key
            .chars()
            .map(|c| match c {
                '/' | '.' | '-' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();
        format!("{}{}", SECRET_PREFIX, name)
    }
}

#[async_trait]
impl SecretsClient for EnvVarSecretsClient {
    async fn get_secret(&self, key: &str) -> Result<String> {
        let env_var = Self::key_to_env_var(key);

        env::var(&env_var).map_err(|_| {
            SecretsError::not_found(format!(
                "Secret '{}' not found in environment (looking for {})",
                key, env_var
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_to_env_var() {
        assert_eq!(
            EnvVarSecretsClient::key_to_env_var("corp/cert.pem"),
            "TLSMINT_SECRET_CORP_CERT_PEM"
        );
        assert_eq!(
            EnvVarSecretsClient::key_to_env_var("pki/team-a/key.pem"),
            "TLSMINT_SECRET_PKI_TEAM_A_KEY_PEM"
        );
    }

    #[tokio::test]
    async fn test_get_secret_not_found() {
        let client = EnvVarSecretsClient::new();
        let result = client.get_secret("nonexistent/cert.pem").await;
        assert!(matches!(result.unwrap_err(), SecretsError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_secret_from_env() {
        env::set_var("TLSMINT_SECRET_ENVTEST_CERT_PEM", "chain");

        let client = EnvVarSecretsClient::new();
        assert_eq!(client.get_secret("envtest/cert.pem").await.unwrap(), "chain");
        assert!(client.get_secret("envtest/key.pem").await.is_err());

        env::remove_var("TLSMINT_SECRET_ENVTEST_CERT_PEM");
    }
}
