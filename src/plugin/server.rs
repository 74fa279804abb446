//! HTTP surface of the plugin, served on a Unix socket.

use std::path::Path;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde::Serialize;
use tokio::net::UnixListener;
use tracing::{info, warn};

use super::driver::SecretDriver;
use super::protocol::{
    ErrorResponse, PluginManifest, SecretRequest, ACTIVATE_PATH, GET_SECRET_PATH,
    PLUGIN_CONTENT_TYPE,
};
use crate::errors::{Error, Result};

/// Routes for the activation handshake and secret requests.
pub fn build_router(driver: SecretDriver) -> Router {
    Router::new()
        .route(ACTIVATE_PATH, post(activate_handler))
        .route(GET_SECRET_PATH, post(get_secret_handler))
        .with_state(driver)
}

fn plugin_json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)], bytes).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode plugin response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn activate_handler() -> Response {
    info!("Plugin activated");
    plugin_json(StatusCode::OK, &PluginManifest::secret_provider())
}

// The daemon does not always send a JSON content type, so the body is decoded
// by hand instead of through the `Json` extractor.
async fn get_secret_handler(State(driver): State<SecretDriver>, body: Bytes) -> Response {
    let request: SecretRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected malformed secret request");
            return plugin_json(StatusCode::BAD_REQUEST, &ErrorResponse { err: e.to_string() });
        }
    };

    let response = driver.get(request).await;
    let status =
        if response.is_error() { StatusCode::INTERNAL_SERVER_ERROR } else { StatusCode::OK };
    plugin_json(status, &response)
}

/// Bind `socket_path`, replacing a stale socket file left by a previous run.
pub fn bind_plugin_socket(socket_path: &Path) -> Result<UnixListener> {
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match std::fs::remove_file(socket_path) {
        Ok(()) => info!(path = %socket_path.display(), "Removed stale plugin socket"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    UnixListener::bind(socket_path).map_err(|e| {
        Error::transport(format!(
            "Failed to bind plugin socket {}: {}",
            socket_path.display(),
            e
        ))
    })
}

/// Serve the plugin until `shutdown` resolves.
pub async fn serve_plugin<F>(listener: UnixListener, driver: SecretDriver, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(driver))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::transport(format!("Plugin server error: {}", e)))
}

/// Bind the socket and serve until Ctrl-C.
pub async fn start_plugin_server(socket_path: &Path, driver: SecretDriver) -> Result<()> {
    let listener = bind_plugin_socket(socket_path)?;
    info!(socket = %socket_path.display(), "Starting secret-provider plugin server");

    serve_plugin(listener, driver, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Plugin server shutdown listener failed");
        }
    })
    .await?;

    if let Err(e) = std::fs::remove_file(socket_path) {
        warn!(error = %e, socket = %socket_path.display(), "Failed to remove plugin socket");
    }
    info!("Plugin server shutdown completed");
    Ok(())
}
