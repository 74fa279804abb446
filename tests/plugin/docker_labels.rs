use std::path::Path;
use std::sync::Arc;

use axum::extract::Path as UrlPath;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tempfile::TempDir;
use tlsmint::plugin::{
    DockerLabelResolver, FallbackLabelResolver, LabelError, LabelResolver, SecretRequest,
};
use tokio::net::UnixListener;

use crate::plugin::support::{driver_with, secret_request};

async fn inspect_secret(UrlPath(name): UrlPath<String>) -> impl IntoResponse {
    match name.as_str() {
        "web-tls" => (
            StatusCode::OK,
            Json(json!({
                "ID": "ktnbjxoalbkvbvedmg1urrz8h",
                "Version": {"Index": 11},
                "Spec": {
                    "Name": "web-tls",
                    "Labels": {"pki.ca": "corp", "pki.cn": "web", "pki.usage": "server"},
                    "Driver": {"Name": "tlsmint"}
                }
            })),
        ),
        "unlabelled" => (StatusCode::OK, Json(json!({"Spec": {"Name": "unlabelled"}}))),
        "broken" => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "store unavailable"})))
        }
        _ => (StatusCode::NOT_FOUND, Json(json!({"message": "secret not found"}))),
    }
}

/// Serve a stand-in Engine API on a socket under `dir`.
fn fake_daemon(dir: &Path) -> DockerLabelResolver {
    let socket = dir.join("docker.sock");
    let listener = UnixListener::bind(&socket).unwrap();
    let app = Router::new().route("/v1.35/secrets/{name}", get(inspect_secret));
    tokio::spawn(async move { axum::serve(listener, app).await });
    DockerLabelResolver::new(socket, "1.35")
}

#[tokio::test]
async fn reads_labels_from_secret_spec() {
    let dir = TempDir::new().unwrap();
    let resolver = fake_daemon(dir.path());

    let labels = resolver.resolve(&SecretRequest::named("web-tls")).await.unwrap();
    assert_eq!(labels.get("pki.cn").map(String::as_str), Some("web"));
    assert_eq!(labels.len(), 3);

    let labels = resolver.resolve(&SecretRequest::named("unlabelled")).await.unwrap();
    assert!(labels.is_empty());
}

#[tokio::test]
async fn daemon_errors_are_classified() {
    let dir = TempDir::new().unwrap();
    let resolver = fake_daemon(dir.path());

    let err = resolver.resolve(&SecretRequest::named("missing")).await.unwrap_err();
    assert!(matches!(err, LabelError::NotFound { ref name } if name == "missing"));

    let err = resolver.resolve(&SecretRequest::named("broken")).await.unwrap_err();
    match err {
        LabelError::Daemon { status, message } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(message, "store unavailable");
        }
        other => panic!("expected daemon error, got {other:?}"),
    }
}

#[tokio::test]
async fn driver_falls_back_to_daemon_labels() {
    let dir = TempDir::new().unwrap();
    let driver = driver_with(Arc::new(FallbackLabelResolver::new(fake_daemon(dir.path()))));

    let response = driver.get(SecretRequest::named("web-tls")).await;
    assert!(!response.is_error(), "{}", response.err);

    // Labels on the request win over the daemon.
    let response = driver.get(secret_request("missing", &[("pki.ca", "corp")])).await;
    assert!(response.err.starts_with("pki: error parsing configuration from secret labels:"));

    let response = driver.get(SecretRequest::named("missing")).await;
    assert_eq!(response.err, "pki: error inspecting secret: no such secret: missing");
}
