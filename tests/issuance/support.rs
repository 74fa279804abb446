use std::collections::HashMap;
use std::sync::Arc;

use tlsmint::pki::{
    decode_bundle, CertificateRequest, DecodedBundle, IssuedBundle, Issuer, StaticCaBackend,
};

/// Build a label map from literal pairs.
pub fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// Issuer over the compiled-in test authority.
pub fn static_issuer() -> Issuer {
    Issuer::new(Arc::new(StaticCaBackend::new().expect("fixture authority")))
}

/// Issuer over an authority whose subject repeats OU and carries a BMPString locality.
pub fn multi_ou_issuer() -> Issuer {
    let backend = StaticCaBackend::from_pem(
        include_bytes!("../fixtures/multi_ou_authority/cert.pem"),
        include_bytes!("../fixtures/multi_ou_authority/key.pem"),
    )
    .expect("multi OU authority");
    Issuer::new(Arc::new(backend))
}

/// Issue a bundle for `pairs` and decode it again.
pub async fn issue_and_decode(pairs: &[(&str, &str)]) -> (IssuedBundle, DecodedBundle) {
    let request = CertificateRequest::from_labels(&labels(pairs)).expect("valid labels");
    let bundle = static_issuer().issue(&request).await.expect("issue certificate");
    let decoded = decode_bundle(bundle.to_pem().as_bytes()).expect("decode bundle");
    (bundle, decoded)
}
