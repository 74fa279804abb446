//! # Configuration Settings

use crate::errors::{Error, Result};
use crate::pki::duration::parse_duration;
use crate::pki::CaBackendType;
use crate::secrets::VaultConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_PLUGIN_SOCKET: &str = "/run/docker/plugins/plugin.sock";
pub const DEFAULT_DOCKER_SOCKET: &str = "/docker.sock";
pub const DEFAULT_DOCKER_API_VERSION: &str = "1.35";

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    #[validate(nested)]
    pub backend: BackendConfig,

    #[validate(nested)]
    pub plugin: PluginConfig,

    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            backend: BackendConfig::from_lookup(&lookup)?,
            plugin: PluginConfig::from_lookup(&lookup),
            observability: ObservabilityConfig::from_lookup(&lookup)?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if self.backend.kind == CaBackendType::Vault && self.backend.vault.address.is_empty() {
            return Err(Error::config("VAULT_ADDR is required for the vault backend"));
        }

        let version_ok = self
            .plugin
            .docker_api_version
            .split_once('.')
            .map(|(major, minor)| {
                !major.is_empty()
                    && !minor.is_empty()
                    && major.chars().all(|c| c.is_ascii_digit())
                    && minor.chars().all(|c| c.is_ascii_digit())
            })
            .unwrap_or(false);
        if !version_ok {
            return Err(Error::config(format!(
                "Docker API version must look like '1.35', got '{}'",
                self.plugin.docker_api_version
            )));
        }

        Ok(())
    }
}

/// Where CA material comes from.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BackendConfig {
    pub kind: CaBackendType,

    /// Connection settings, used by the vault backend only.
    pub vault: VaultConfig,

    /// Prepended to `<authority>/cert.pem` and `<authority>/key.pem`.
    pub path_prefix: String,

    /// Cache CA documents for this long. `None` disables the cache.
    pub cache_ttl: Option<Duration>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: CaBackendType::Vault,
            vault: VaultConfig::default(),
            path_prefix: String::new(),
            cache_ttl: None,
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = lookup("TLSMINT_BACKEND")
            .or_else(|| lookup("BACKEND"))
            .ok_or_else(|| {
                Error::config(
                    "backend not configured, set TLSMINT_BACKEND to 'vault', 'env' or 'static'",
                )
            })?
            .parse::<CaBackendType>()
            .map_err(Error::config)?;

        let defaults = VaultConfig::default();
        let vault = VaultConfig {
            address: lookup("VAULT_ADDR").unwrap_or(defaults.address),
            token: lookup("VAULT_TOKEN"),
            namespace: lookup("VAULT_NAMESPACE"),
            mount_path: lookup("VAULT_MOUNT_PATH").unwrap_or(defaults.mount_path),
        };

        let cache_ttl = match lookup("TLSMINT_CA_CACHE_TTL") {
            Some(value) => {
                let ttl = parse_duration(&value).map_err(|e| {
                    Error::config(format!("Invalid TLSMINT_CA_CACHE_TTL '{}': {}", value, e))
                })?;
                (!ttl.is_zero()).then_some(ttl)
            }
            None => None,
        };

        Ok(Self {
            kind,
            vault,
            path_prefix: lookup("TLSMINT_CA_PATH_PREFIX").unwrap_or_default(),
            cache_ttl,
        })
    }
}

/// Secret-provider plugin transport settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PluginConfig {
    /// Unix socket the plugin server listens on
    #[validate(length(min = 1, message = "Plugin socket path cannot be empty"))]
    pub socket_path: String,

    /// Docker Engine socket used to inspect secrets
    #[validate(length(min = 1, message = "Docker socket path cannot be empty"))]
    pub docker_socket: String,

    /// Docker Engine API version used in request paths
    #[validate(length(min = 1, message = "Docker API version cannot be empty"))]
    pub docker_api_version: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            socket_path: DEFAULT_PLUGIN_SOCKET.to_string(),
            docker_socket: DEFAULT_DOCKER_SOCKET.to_string(),
            docker_api_version: DEFAULT_DOCKER_API_VERSION.to_string(),
        }
    }
}

impl PluginConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            socket_path: lookup("TLSMINT_PLUGIN_SOCKET").unwrap_or(defaults.socket_path),
            docker_socket: lookup("TLSMINT_DOCKER_SOCKET").unwrap_or(defaults.docker_socket),
            docker_api_version: lookup("TLSMINT_DOCKER_API_VERSION")
                .unwrap_or(defaults.docker_api_version),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Reported as the `service` field of every log line
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: crate::APP_NAME.to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let json_logging = match lookup("TLSMINT_LOG_JSON").as_deref() {
            None => defaults.json_logging,
            Some("1") | Some("true") | Some("TRUE") | Some("yes") => true,
            Some("0") | Some("false") | Some("FALSE") | Some("no") => false,
            Some(other) => {
                return Err(Error::config(format!("Invalid TLSMINT_LOG_JSON value: {}", other)))
            }
        };

        Ok(Self {
            log_level: lookup("TLSMINT_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging,
            ..defaults
        })
    }
}
