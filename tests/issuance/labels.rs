use std::net::IpAddr;
use std::time::Duration;

use proptest::prelude::*;
use tlsmint::errors::ValidationError;
use tlsmint::pki::{CertificateRequest, ExtendedKeyUsage};

use crate::issuance::support::labels;

fn usage_sets() -> impl Strategy<Value = Vec<ExtendedKeyUsage>> {
    prop_oneof![
        Just(vec![ExtendedKeyUsage::ServerAuth]),
        Just(vec![ExtendedKeyUsage::ClientAuth]),
        Just(vec![ExtendedKeyUsage::ClientAuth, ExtendedKeyUsage::ServerAuth]),
    ]
}

proptest! {
    #[test]
    fn requests_survive_label_round_trip(
        authority in "[a-z][a-z0-9-]{0,15}",
        common_name in "[a-z][a-z0-9.-]{0,30}",
        usage in usage_sets(),
        dns_names in proptest::collection::vec("[a-z][a-z0-9.-]{0,20}", 0..4),
        ips in proptest::collection::vec(any::<IpAddr>(), 0..4),
        lifetime_secs in 1u64..(400 * 24 * 3600),
    ) {
        let request = CertificateRequest::new(authority, common_name, usage)
            .unwrap()
            .with_dns_names(dns_names)
            .with_ip_addresses(ips)
            .with_lifetime(Duration::from_secs(lifetime_secs))
            .unwrap();

        let rebuilt = CertificateRequest::from_labels(&request.to_labels()).unwrap();
        prop_assert_eq!(rebuilt, request);
    }
}

#[test]
fn first_violation_wins() {
    let err = CertificateRequest::from_labels(&labels(&[("pki.usage", "bogus")])).unwrap_err();
    assert_eq!(err, ValidationError::missing_authority());

    let err = CertificateRequest::from_labels(&labels(&[
        ("pki.ca", "corp"),
        ("pki.cn", "web"),
        ("pki.usage", "server"),
        ("pki.ip_addrs", "10.0.0.1,not-an-ip"),
        ("pki.lifetime", "forever"),
    ]))
    .unwrap_err();
    assert_eq!(err, ValidationError::invalid_ip_address("not-an-ip"));
}
