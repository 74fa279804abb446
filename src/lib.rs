//! # tlsmint
//!
//! tlsmint issues short-lived TLS certificates on demand. A request names a
//! certificate authority, a common name and the intended key usage; tlsmint
//! loads the authority's key and chain from a backend, signs a fresh RSA leaf
//! and returns a single PEM bundle holding the leaf key, the leaf and the
//! authority chain.
//!
//! ## Architecture
//!
//! ```text
//! Docker secret request → label resolution → CertificateRequest
//!                                                 ↓
//!                     CaBackend (Vault / static) → Issuer → PEM bundle
//! ```
//!
//! ## Core Components
//!
//! - **pki**: request model, CA backends, the issuer and the bundle codec
//! - **plugin**: Docker secret-provider protocol served over a Unix socket
//! - **secrets**: secret store clients used by the Vault CA backend
//! - **utils**: loading an issued bundle into a rustls mTLS server identity
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use tlsmint::pki::{CertificateRequest, Issuer, StaticCaBackend};
//!
//! # async fn run() -> tlsmint::Result<()> {
//! let labels = HashMap::from([
//!     ("pki.ca".to_string(), "corp".to_string()),
//!     ("pki.cn".to_string(), "web.internal".to_string()),
//!     ("pki.usage".to_string(), "server".to_string()),
//! ]);
//! let request = CertificateRequest::from_labels(&labels)?;
//! let issuer = Issuer::new(Arc::new(StaticCaBackend::new()?));
//! let bundle = issuer.issue(&request).await?;
//! println!("{}", bundle.to_pem());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod pki;
pub mod plugin;
pub mod secrets;
pub mod utils;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
