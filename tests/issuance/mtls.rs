use std::fs;

use tempfile::TempDir;
use tlsmint::errors::TlsError;
use tlsmint::pki::backends::fixture;
use tlsmint::utils::certificates::{load_bundle, mtls_server_config, HTTP_1_1_ALPN};

use crate::issuance::support::issue_and_decode;

const REQUEST: &[(&str, &str)] =
    &[("pki.ca", "corp"), ("pki.cn", "api.internal"), ("pki.usage", "client-server")];

#[tokio::test]
async fn issued_bundle_loads_as_mtls_identity() {
    let (bundle, _) = issue_and_decode(REQUEST).await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bundle.pem");
    fs::write(&path, bundle.to_pem()).unwrap();

    let loaded = load_bundle(&path).unwrap();
    assert_eq!(loaded.chain.len(), 1);
    assert_eq!(loaded.trust_anchors.len(), 2);
    assert!(loaded.info.subject.contains("api.internal"));
    assert!(!loaded.info.is_ca);

    let config = mtls_server_config(&loaded).unwrap();
    assert_eq!(config.alpn_protocols, vec![HTTP_1_1_ALPN.to_vec()]);
}

#[tokio::test]
async fn authority_only_bundle_has_no_identity() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("authority.pem");
    fs::write(&path, format!("{}{}", fixture::CA_PRIVATE_KEY_PEM, fixture::CA_CERTIFICATE_PEM))
        .unwrap();

    let err = load_bundle(&path).unwrap_err();
    assert!(matches!(err, TlsError::MissingLeafCertificate { .. }));
}

#[tokio::test]
async fn missing_file_names_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.pem");

    let err = load_bundle(&path).unwrap_err();
    assert!(matches!(err, TlsError::BundleReadError { .. }));
    assert!(err.to_string().contains("absent.pem"));
}
