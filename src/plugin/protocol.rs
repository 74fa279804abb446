//! Wire types of the Docker secret-provider plugin protocol.
//!
//! The daemon speaks JSON over HTTP on the plugin's Unix socket, with
//! PascalCase field names and byte slices encoded as base64 strings.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Interface name announced in the activation handshake.
pub const SECRET_PROVIDER_INTERFACE: &str = "secretprovider";

/// Content type of every plugin protocol response.
pub const PLUGIN_CONTENT_TYPE: &str = "application/vnd.docker.plugins.v1.1+json";

pub const ACTIVATE_PATH: &str = "/Plugin.Activate";
pub const GET_SECRET_PATH: &str = "/SecretProvider.GetSecret";

/// Reply to `/Plugin.Activate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginManifest {
    pub implements: Vec<String>,
}

impl PluginManifest {
    pub fn secret_provider() -> Self {
        Self { implements: vec![SECRET_PROVIDER_INTERFACE.to_string()] }
    }
}

/// Body of `/SecretProvider.GetSecret`. Fields the daemon sends that are not
/// listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecretRequest {
    pub secret_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub secret_labels: HashMap<String, String>,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    pub service_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub service_labels: HashMap<String, String>,
    #[serde(rename = "TaskID")]
    pub task_id: String,
    pub task_name: String,
    pub task_image: String,
}

impl SecretRequest {
    pub fn named(secret_name: impl Into<String>) -> Self {
        Self { secret_name: secret_name.into(), ..Default::default() }
    }

    pub fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.secret_labels = labels;
        self
    }
}

/// Reply to `/SecretProvider.GetSecret`.
///
/// A non-empty `err` means the request failed and `value` is empty.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretResponse {
    #[serde(with = "base64_bytes", default)]
    pub value: Vec<u8>,
    #[serde(default)]
    pub err: String,
    #[serde(default)]
    pub do_not_reuse: bool,
}

impl SecretResponse {
    /// A one-time secret: the daemon must ask again for every task.
    pub fn issued(value: Vec<u8>) -> Self {
        Self { value, err: String::new(), do_not_reuse: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { value: Vec::new(), err: message.into(), do_not_reuse: false }
    }

    pub fn is_error(&self) -> bool {
        !self.err.is_empty()
    }
}

impl std::fmt::Debug for SecretResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResponse")
            .field("value", &format_args!("[{} bytes]", self.value.len()))
            .field("err", &self.err)
            .field("do_not_reuse", &self.do_not_reuse)
            .finish()
    }
}

/// Error body for requests the plugin could not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    pub err: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD.decode(encoded).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}
