use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use http::{header, Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tlsmint::pki::{Issuer, StaticCaBackend};
use tlsmint::plugin::{LabelResolver, RequestLabels, SecretDriver, SecretRequest};
use tokio::net::UnixStream;

/// Driver over the compiled-in authority and the given label source.
pub fn driver_with(labels: Arc<dyn LabelResolver>) -> SecretDriver {
    let backend = StaticCaBackend::new().expect("fixture authority");
    SecretDriver::new(Issuer::new(Arc::new(backend)), labels)
}

pub fn request_label_driver() -> SecretDriver {
    driver_with(Arc::new(RequestLabels))
}

pub fn secret_request(name: &str, pairs: &[(&str, &str)]) -> SecretRequest {
    let labels: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    SecretRequest::named(name).with_labels(labels)
}

/// Send one HTTP/1.1 request over a Unix socket.
pub async fn unix_request(
    socket: &Path,
    method: Method,
    path: &str,
    body: impl Into<Bytes>,
) -> anyhow::Result<(StatusCode, Bytes)> {
    let stream = UnixStream::connect(socket).await?;
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(connection);

    let request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::HOST, "plugin")
        .body(Full::new(body.into()))?;
    let response = sender.send_request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, body))
}
