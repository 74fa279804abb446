//! # Certificate issuance
//!
//! Short-lived leaf certificates signed by a named certificate authority.
//!
//! - [`request`] turns `pki.*` labels into a validated [`CertificateRequest`]
//! - [`backend`] and [`backends`] load an authority's key and chain
//! - [`issuer`] signs a leaf for a request and returns a PEM bundle
//! - [`codec`] reads and writes the PEM bundle format

pub mod backend;
pub mod backends;
pub mod codec;
pub mod duration;
pub mod issuer;
pub mod request;

pub use backend::{CaBackend, CaBackendType, CaMaterial};
pub use backends::{build_backend, SecretStoreCaBackend, StaticCaBackend};
pub use codec::{decode_bundle, encode_bundle, DecodedBundle, KeyEncoding, PrivateKey};
pub use duration::{format_duration, parse_duration};
pub use issuer::{issue, issue_isolated, IssuedBundle, Issuer, Serial};
pub use request::{CertificateRequest, ExtendedKeyUsage};
