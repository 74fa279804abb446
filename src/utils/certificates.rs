//! Loading an issued bundle as a TLS identity.
//!
//! A bundle mixes the leaf, the authority chain and a root. Certificates that
//! are not CAs form the chain presented to peers; CA certificates form the
//! pool peers are verified against.

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};
use rustls::pki_types::CertificateDer;
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use serde::Serialize;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::*;

use crate::errors::TlsError;
use crate::pki::codec::{decode_bundle, PrivateKey};

/// ALPN protocol advertised by [`mtls_server_config`].
pub const HTTP_1_1_ALPN: &[u8] = b"http/1.1";

/// Metadata extracted from a certificate for display and validation.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    /// Lower-case hex, no separators.
    pub serial: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub is_ca: bool,
}

/// A decoded bundle split into what a TLS endpoint presents and what it trusts.
#[derive(Debug)]
pub struct LoadedBundle {
    pub path: PathBuf,
    /// Non-CA certificates, leaf first, in bundle order.
    pub chain: Vec<CertificateDer<'static>>,
    /// CA certificates, in bundle order.
    pub trust_anchors: Vec<CertificateDer<'static>>,
    pub private_key: PrivateKey,
    /// Metadata of the first certificate in `chain`.
    pub info: CertificateInfo,
}

/// Read and classify a bundle written by the issuer.
pub fn load_bundle(path: &Path) -> Result<LoadedBundle, TlsError> {
    let bytes = fs::read(path)
        .map_err(|e| TlsError::BundleReadError { path: path.to_path_buf(), source: e })?;
    parse_bundle(&bytes, path)
}

/// Like [`load_bundle`] for bytes already in memory; `path` is only used in errors.
pub fn parse_bundle(bytes: &[u8], path: &Path) -> Result<LoadedBundle, TlsError> {
    let decoded = decode_bundle(bytes)
        .map_err(|e| TlsError::InvalidBundle { path: path.to_path_buf(), source: e })?;

    let mut chain = Vec::new();
    let mut trust_anchors = Vec::new();
    let mut leaf_info = None;
    for certificate in decoded.chain {
        let info = inspect_certificate(&certificate, path)?;
        if info.is_ca {
            trust_anchors.push(certificate);
        } else {
            if leaf_info.is_none() {
                leaf_info = Some(info);
            }
            chain.push(certificate);
        }
    }

    let info =
        leaf_info.ok_or_else(|| TlsError::MissingLeafCertificate { path: path.to_path_buf() })?;

    tracing::debug!(
        path = %path.display(),
        subject = %info.subject,
        chain_length = chain.len(),
        trust_anchors = trust_anchors.len(),
        "Loaded certificate bundle"
    );

    Ok(LoadedBundle {
        path: path.to_path_buf(),
        chain,
        trust_anchors,
        private_key: decoded.private_key,
        info,
    })
}

/// Parse the fields of one certificate that callers display or check.
pub fn inspect_certificate(
    certificate: &CertificateDer<'_>,
    path: &Path,
) -> Result<CertificateInfo, TlsError> {
    let metadata_error =
        |err: anyhow::Error| TlsError::CertificateMetadata { path: path.to_path_buf(), source: err };

    let (_, cert) =
        X509Certificate::from_der(certificate.as_ref()).map_err(|e| metadata_error(anyhow!(e)))?;

    let is_ca = cert
        .basic_constraints()
        .map_err(|e| metadata_error(anyhow!(e)))?
        .map(|ext| ext.value.ca)
        .unwrap_or(false);

    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    if let Some(san) = cert.subject_alternative_name().map_err(|e| metadata_error(anyhow!(e)))? {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = ip_from_bytes(bytes) {
                        ip_addresses.push(ip);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: cert.tbs_certificate.serial.to_str_radix(16),
        not_before: timestamp(cert.validity().not_before.timestamp(), path)?,
        not_after: timestamp(cert.validity().not_after.timestamp(), path)?,
        dns_names,
        ip_addresses,
        is_ca,
    })
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

fn timestamp(seconds: i64, path: &Path) -> Result<DateTime<Utc>, TlsError> {
    Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| TlsError::CertificateMetadata {
        path: path.to_path_buf(),
        source: anyhow!("timestamp {} is out of range", seconds),
    })
}

/// Reject a certificate outside its validity window.
pub fn validate_certificate_dates(info: &CertificateInfo, path: &Path) -> Result<(), TlsError> {
    let now = Utc::now();
    if info.not_before > now {
        return Err(TlsError::CertificateNotYetValid {
            path: path.to_path_buf(),
            not_before: info.not_before,
        });
    }
    if info.not_after <= now {
        return Err(TlsError::CertificateExpired {
            path: path.to_path_buf(),
            not_after: info.not_after,
        });
    }
    Ok(())
}

/// Server configuration that presents the bundle's chain and requires client
/// certificates issued under the bundle's CA pool.
pub fn mtls_server_config(bundle: &LoadedBundle) -> Result<ServerConfig, TlsError> {
    validate_certificate_dates(&bundle.info, &bundle.path)?;

    if bundle.trust_anchors.is_empty() {
        return Err(TlsError::MissingTrustAnchors { path: bundle.path.clone() });
    }

    let mut roots = RootCertStore::empty();
    for anchor in &bundle.trust_anchors {
        roots
            .add(anchor.clone())
            .map_err(|e| TlsError::ServerConfig { source: anyhow!(e) })?;
    }

    let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
        .build()
        .map_err(|e| TlsError::ServerConfig { source: anyhow!(e) })?;

    let mut config = ServerConfig::builder()
        .with_client_cert_verifier(verifier)
        .with_single_cert(bundle.chain.clone(), bundle.private_key.to_rustls())
        .map_err(|e| TlsError::InvalidPrivateKey { path: bundle.path.clone(), source: anyhow!(e) })?;
    config.alpn_protocols = vec![HTTP_1_1_ALPN.to_vec()];

    Ok(config)
}
