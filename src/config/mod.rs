//! # Configuration Management
//!
//! Configuration is read from the environment (after `.env` has been loaded by
//! the binary) into plain structs with defaults, then checked with
//! [`AppConfig::validate`].
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `TLSMINT_BACKEND` / `BACKEND` | `vault`, `env` or `static` | required |
//! | `VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_NAMESPACE` | Vault connection | |
//! | `VAULT_MOUNT_PATH` | KV v2 mount | `secret` |
//! | `TLSMINT_CA_PATH_PREFIX` | path prefix for CA documents | empty |
//! | `TLSMINT_CA_CACHE_TTL` | cache TTL for CA documents, e.g. `5m` | disabled |
//! | `TLSMINT_PLUGIN_SOCKET` | plugin listen socket | `/run/docker/plugins/plugin.sock` |
//! | `TLSMINT_DOCKER_SOCKET` | Docker Engine socket | `/docker.sock` |
//! | `TLSMINT_DOCKER_API_VERSION` | Engine API version | `1.35` |
//! | `TLSMINT_LOG_LEVEL` | log level, overridden by `RUST_LOG` | `info` |
//! | `TLSMINT_LOG_JSON` | JSON log lines | `false` |

pub mod settings;

pub use settings::{AppConfig, BackendConfig, ObservabilityConfig, PluginConfig};
