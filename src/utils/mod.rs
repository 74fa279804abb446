//! Helpers for consumers of issued bundles.

pub mod certificates;

pub use certificates::{
    inspect_certificate, load_bundle, mtls_server_config, parse_bundle, CertificateInfo,
    LoadedBundle,
};
