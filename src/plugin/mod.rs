//! # Docker secret-provider plugin
//!
//! The Docker daemon asks the plugin for a secret's value each time a task
//! that uses the secret starts. The plugin reads the secret's `pki.*` labels,
//! issues a certificate and returns the PEM bundle as the value, marked as
//! not reusable so every task gets its own certificate.

pub mod driver;
pub mod labels;
pub mod protocol;
pub mod server;

pub use driver::{DriverError, SecretDriver};
pub use labels::{
    DockerLabelResolver, FallbackLabelResolver, LabelError, LabelResolver, Labels, RequestLabels,
};
pub use protocol::{
    ErrorResponse, PluginManifest, SecretRequest, SecretResponse, PLUGIN_CONTENT_TYPE,
};
pub use server::{bind_plugin_socket, build_router, serve_plugin, start_plugin_server};
