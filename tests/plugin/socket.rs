use http::{Method, StatusCode};
use tempfile::TempDir;
use tlsmint::plugin::{bind_plugin_socket, serve_plugin, SecretResponse};
use tokio::sync::oneshot;

use crate::plugin::support::{request_label_driver, secret_request, unix_request};

#[tokio::test]
async fn serves_requests_on_unix_socket() {
    let dir = TempDir::new().unwrap();
    let socket = dir.path().join("run/plugins/tlsmint.sock");
    // A leftover file from an earlier run is replaced.
    std::fs::create_dir_all(socket.parent().unwrap()).unwrap();
    std::fs::write(&socket, b"stale").unwrap();

    let listener = bind_plugin_socket(&socket).unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_plugin(listener, request_label_driver(), async {
        let _ = stopped.await;
    }));

    let (status, body) =
        unix_request(&socket, Method::POST, "/Plugin.Activate", "").await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], br#"{"Implements":["secretprovider"]}"#);

    let request =
        secret_request("db-tls", &[("pki.ca", "corp"), ("pki.cn", "db"), ("pki.usage", "client")]);
    let (status, body) = unix_request(
        &socket,
        Method::POST,
        "/SecretProvider.GetSecret",
        serde_json::to_vec(&request).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::OK);
    let response: SecretResponse = serde_json::from_slice(&body).unwrap();
    assert!(response.do_not_reuse);

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
