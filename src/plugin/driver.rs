//! Secret-provider driver: labels in, certificate bundle out.

use std::sync::Arc;

use thiserror::Error;
use tracing::Instrument;

use super::labels::{LabelError, LabelResolver};
use super::protocol::{SecretRequest, SecretResponse};
use crate::errors::{IssuanceError, ValidationError};
use crate::pki::{CertificateRequest, IssuedBundle, Issuer};

/// Why a secret request produced no bundle. The messages are what the daemon
/// shows to the operator.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("pki: error inspecting secret: {0}")]
    Labels(#[from] LabelError),

    #[error("pki: error parsing configuration from secret labels: {0}")]
    Request(#[from] ValidationError),

    #[error("pki: error issuing certificate: {0}")]
    Issuance(#[from] IssuanceError),
}

/// Answers `GetSecret` calls by issuing a fresh certificate for each one.
#[derive(Debug, Clone)]
pub struct SecretDriver {
    issuer: Issuer,
    labels: Arc<dyn LabelResolver>,
}

impl SecretDriver {
    pub fn new(issuer: Issuer, labels: Arc<dyn LabelResolver>) -> Self {
        Self { issuer, labels }
    }

    /// Handle one request. Every failure is reported in the response.
    pub async fn get(&self, request: SecretRequest) -> SecretResponse {
        let span = crate::plugin_span!("get_secret", request.secret_name);
        async move {
            match self.try_get(&request).await {
                Ok(bundle) => {
                    tracing::info!(serial = %bundle.serial(), "Issued certificate for secret");
                    SecretResponse::issued(bundle.into_pem_bytes())
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Secret request failed");
                    SecretResponse::error(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Resolve labels, validate them and issue on an isolated task.
    pub async fn try_get(&self, request: &SecretRequest) -> Result<IssuedBundle, DriverError> {
        tracing::debug!(
            service = %request.service_name,
            task = %request.task_name,
            "Got request for certificate"
        );

        let labels = self.labels.resolve(request).await?;
        let certificate_request = CertificateRequest::from_labels(&labels)?;
        Ok(self.issuer.issue_isolated(certificate_request).await?)
    }
}
