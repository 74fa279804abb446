//! Recovering `pki.*` labels for a secret request.
//!
//! The daemon does not always fill `SecretLabels` in the request, so labels
//! can also be read back from the secret object through the Engine API.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use thiserror::Error;
use tokio::net::UnixStream;

use super::protocol::SecretRequest;

pub type Labels = HashMap<String, String>;

/// Failure to recover labels for a secret.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("no such secret: {name}")]
    NotFound { name: String },

    #[error("Docker daemon returned {status}: {message}")]
    Daemon { status: StatusCode, message: String },

    #[error("error talking to Docker daemon at {socket}: {message}")]
    Transport { socket: String, message: String },

    #[error("unexpected Docker daemon response: {message}")]
    InvalidResponse { message: String },
}

/// Source of labels for a secret request.
#[async_trait]
pub trait LabelResolver: Send + Sync + fmt::Debug {
    async fn resolve(&self, request: &SecretRequest) -> Result<Labels, LabelError>;
}

/// Uses the labels carried on the request itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLabels;

#[async_trait]
impl LabelResolver for RequestLabels {
    async fn resolve(&self, request: &SecretRequest) -> Result<Labels, LabelError> {
        Ok(request.secret_labels.clone())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecretInspect {
    spec: SecretSpec,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SecretSpec {
    #[serde(default)]
    labels: Option<Labels>,
}

#[derive(Debug, Deserialize)]
struct DaemonError {
    message: String,
}

/// Inspects the secret on the Docker daemon over its Unix socket.
#[derive(Debug, Clone)]
pub struct DockerLabelResolver {
    socket_path: PathBuf,
    api_version: String,
}

impl DockerLabelResolver {
    pub fn new(socket_path: impl Into<PathBuf>, api_version: impl Into<String>) -> Self {
        Self { socket_path: socket_path.into(), api_version: api_version.into() }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn inspect_path(&self, name: &str) -> String {
        format!("/v{}/secrets/{}", self.api_version, encode_path_segment(name))
    }

    fn transport_error(&self, message: impl fmt::Display) -> LabelError {
        LabelError::Transport {
            socket: self.socket_path.display().to_string(),
            message: message.to_string(),
        }
    }

    async fn get(&self, path: &str) -> Result<(StatusCode, Bytes), LabelError> {
        let stream =
            UnixStream::connect(&self.socket_path).await.map_err(|e| self.transport_error(e))?;
        let (mut sender, connection) =
            http1::handshake(TokioIo::new(stream)).await.map_err(|e| self.transport_error(e))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(error = %e, "Docker daemon connection closed with error");
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::HOST, "docker")
            .body(Empty::<Bytes>::new())
            .map_err(|e| self.transport_error(e))?;

        let response = sender.send_request(request).await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| self.transport_error(e))?
            .to_bytes();
        Ok((status, body))
    }
}

#[async_trait]
impl LabelResolver for DockerLabelResolver {
    async fn resolve(&self, request: &SecretRequest) -> Result<Labels, LabelError> {
        let name = &request.secret_name;
        let (status, body) = self.get(&self.inspect_path(name)).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(LabelError::NotFound { name: name.clone() });
        }
        if !status.is_success() {
            let message = serde_json::from_slice::<DaemonError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(LabelError::Daemon { status, message });
        }

        let inspect: SecretInspect = serde_json::from_slice(&body)
            .map_err(|e| LabelError::InvalidResponse { message: e.to_string() })?;
        let labels = inspect.spec.labels.unwrap_or_default();

        tracing::debug!(secret = %name, label_count = labels.len(), "Inspected secret labels");
        Ok(labels)
    }
}

/// Request labels when present, otherwise the daemon's view of the secret.
#[derive(Debug, Clone)]
pub struct FallbackLabelResolver<R> {
    daemon: R,
}

impl<R: LabelResolver> FallbackLabelResolver<R> {
    pub fn new(daemon: R) -> Self {
        Self { daemon }
    }
}

#[async_trait]
impl<R: LabelResolver> LabelResolver for FallbackLabelResolver<R> {
    async fn resolve(&self, request: &SecretRequest) -> Result<Labels, LabelError> {
        if !request.secret_labels.is_empty() {
            return Ok(request.secret_labels.clone());
        }
        self.daemon.resolve(request).await
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
