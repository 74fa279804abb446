//! Leaf certificate issuance.
//!
//! One call loads the authority's material, generates a fresh 2048-bit RSA key,
//! signs a leaf for it with the authority's key and returns the key, the leaf
//! and the authority chain as one PEM bundle. Nothing is kept between calls.

use std::any::Any as StdAny;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs1v15::{Signature, SigningKey};
use rsa::sha2::Sha256;
use rsa::{RsaPrivateKey, RsaPublicKey};
use rustls::pki_types::CertificateDer;
use time::OffsetDateTime;
use tracing::Instrument;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::der::asn1::{Any, GeneralizedTime, Ia5String, OctetString, SetOfVec, UtcTime};
use x509_cert::der::oid::ObjectIdentifier;
use x509_cert::der::{Decode, Encode, Tag};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{
    AuthorityKeyIdentifier, ExtendedKeyUsage as ExtendedKeyUsageExt, KeyUsage, KeyUsages,
    SubjectAltName,
};
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::{Time, Validity};
use x509_parser::prelude::{FromDer, ParsedExtension, X509Certificate};

use super::backend::CaBackend;
use super::codec::{self, PrivateKey};
use super::request::{CertificateRequest, ExtendedKeyUsage};
use crate::errors::IssuanceError;

/// Size of every generated leaf key.
pub const LEAF_KEY_BITS: usize = 2048;

const OID_COMMON_NAME: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.3");
const OID_COUNTRY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.6");
const OID_LOCALITY: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.7");
const OID_PROVINCE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.8");
const OID_STREET_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.9");
const OID_ORGANIZATION: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.10");
const OID_ORGANIZATIONAL_UNIT: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.11");
const OID_POSTAL_CODE: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.4.17");

const OID_KP_SERVER_AUTH: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.1");
const OID_KP_CLIENT_AUTH: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.3.2");

/// Subject attributes copied from the authority into every leaf.
const INHERITED_ATTRIBUTES: [ObjectIdentifier; 7] = [
    OID_COUNTRY,
    OID_PROVINCE,
    OID_LOCALITY,
    OID_STREET_ADDRESS,
    OID_POSTAL_CODE,
    OID_ORGANIZATION,
    OID_ORGANIZATIONAL_UNIT,
];

/// Certificate serial number drawn uniformly from `[0, 2^128)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Serial(u128);

impl Serial {
    /// Draw a serial from the operating system CSPRNG.
    ///
    /// Serials are not recorded, so a repeat is not detected; at 128 bits the
    /// chance is negligible.
    pub fn generate() -> Result<Self, IssuanceError> {
        let mut bytes = [0u8; 16];
        OsRng.try_fill_bytes(&mut bytes).map_err(|e| IssuanceError::serial(e.to_string()))?;
        Ok(Self(u128::from_be_bytes(bytes)))
    }

    pub fn value(&self) -> u128 {
        self.0
    }

    /// Big-endian bytes without leading zeros; zero keeps one byte.
    fn to_minimal_bytes(self) -> Vec<u8> {
        let bytes = self.0.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
        bytes[first..].to_vec()
    }

    fn to_serial_number(self) -> Result<SerialNumber, IssuanceError> {
        SerialNumber::new(&self.to_minimal_bytes())
            .map_err(|e| IssuanceError::serial(e.to_string()))
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

/// Result of one issuance.
#[derive(Debug, Clone)]
pub struct IssuedBundle {
    private_key: PrivateKey,
    certificate: CertificateDer<'static>,
    chain: Vec<CertificateDer<'static>>,
    serial: Serial,
    not_after: OffsetDateTime,
}

impl IssuedBundle {
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn certificate(&self) -> &CertificateDer<'static> {
        &self.certificate
    }

    /// The authority chain, as loaded from the backend.
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.chain
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }

    /// Key, leaf certificate, then every chain certificate.
    pub fn to_pem(&self) -> String {
        codec::encode_bundle(
            &self.private_key,
            std::iter::once(&self.certificate).chain(self.chain.iter()),
        )
    }

    pub fn into_pem_bytes(self) -> Vec<u8> {
        self.to_pem().into_bytes()
    }
}

/// Issues leaf certificates against a shared CA backend.
///
/// Cloning is cheap; clones share the backend.
#[derive(Debug, Clone)]
pub struct Issuer {
    backend: Arc<dyn CaBackend>,
}

impl Issuer {
    pub fn new(backend: Arc<dyn CaBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn CaBackend> {
        &self.backend
    }

    pub async fn issue(&self, request: &CertificateRequest) -> Result<IssuedBundle, IssuanceError> {
        issue(request, self.backend.as_ref()).await
    }

    /// Issue on a separate task so that a panic anywhere in the call is
    /// reported as [`IssuanceError::Fault`] for this request only.
    pub async fn issue_isolated(
        &self,
        request: CertificateRequest,
    ) -> Result<IssuedBundle, IssuanceError> {
        let issuer = self.clone();
        let authority = request.authority().to_string();
        let handle = tokio::spawn(async move { issuer.issue(&request).await });

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                tracing::error!(authority = %authority, error = %message, "Certificate issuance panicked");
                Err(IssuanceError::fault(message))
            }
            Err(e) => {
                tracing::error!(authority = %authority, error = %e, "Certificate issuance task failed");
                Err(IssuanceError::fault(e.to_string()))
            }
        }
    }
}

/// Free-function form of [`Issuer::issue_isolated`] for callers holding a shared issuer.
pub async fn issue_isolated(
    issuer: Arc<Issuer>,
    request: CertificateRequest,
) -> Result<IssuedBundle, IssuanceError> {
    issuer.issue_isolated(request).await
}

fn panic_message(payload: Box<dyn StdAny + Send + 'static>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Issue one leaf certificate for `request`, signed by the authority it names.
///
/// # Errors
///
/// Returns the first failure among serial generation, loading CA material,
/// parsing the authority certificate, key generation, and signing.
pub async fn issue(
    request: &CertificateRequest,
    backend: &dyn CaBackend,
) -> Result<IssuedBundle, IssuanceError> {
    let span = crate::issuance_span!(request.authority(), request.common_name());
    issue_inner(request, backend).instrument(span).await
}

async fn issue_inner(
    request: &CertificateRequest,
    backend: &dyn CaBackend,
) -> Result<IssuedBundle, IssuanceError> {
    let serial = Serial::generate()?;

    let material = backend.load(request.authority()).await?;
    let authority = AuthorityProfile::parse(material.authority_certificate())?;

    let not_before = OffsetDateTime::now_utc();
    let not_after = not_before + request.lifetime();
    let validity = Validity {
        not_before: x509_time(not_before)?,
        not_after: x509_time(not_after)?,
    };

    let (leaf_key, leaf_public_key) = tokio::task::spawn_blocking(generate_leaf_key)
        .await
        .map_err(|e| IssuanceError::key_generation(e.to_string()))??;
    let spki = SubjectPublicKeyInfoOwned::from_key(leaf_public_key)
        .map_err(|e| IssuanceError::encoding(e.to_string()))?;

    let signing_key = material
        .signing_key()
        .to_rsa()
        .map(SigningKey::<Sha256>::new)
        .map_err(|e| IssuanceError::signing(e.to_string()))?;

    let signing = |e: x509_cert::builder::Error| IssuanceError::signing(e.to_string());
    let mut builder = CertificateBuilder::new(
        Profile::Manual { issuer: Some(authority.subject.clone()) },
        serial.to_serial_number()?,
        validity,
        authority.leaf_subject(request.common_name())?,
        spki,
        &signing_key,
    )
    .map_err(signing)?;

    builder.add_extension(&KeyUsage(KeyUsages::DigitalSignature.into())).map_err(signing)?;
    let purposes = request.usage().iter().copied().map(purpose).collect();
    builder.add_extension(&ExtendedKeyUsageExt(purposes)).map_err(signing)?;
    let names = subject_alt_names(request)?;
    if !names.is_empty() {
        builder.add_extension(&SubjectAltName(names)).map_err(signing)?;
    }
    if let Some(id) = &authority.subject_key_id {
        let key_identifier =
            OctetString::new(id.clone()).map_err(|e| IssuanceError::encoding(e.to_string()))?;
        builder
            .add_extension(&AuthorityKeyIdentifier {
                key_identifier: Some(key_identifier),
                authority_cert_issuer: None,
                authority_cert_serial_number: None,
            })
            .map_err(signing)?;
    }

    let certificate = builder.build::<Signature>().map_err(signing)?;
    let certificate = certificate.to_der().map_err(|e| IssuanceError::encoding(e.to_string()))?;

    tracing::info!(
        serial = %serial,
        not_after = %not_after,
        chain_length = material.chain().len(),
        "Issued certificate"
    );

    Ok(IssuedBundle {
        private_key: leaf_key,
        certificate: CertificateDer::from(certificate),
        chain: material.chain().to_vec(),
        serial,
        not_after,
    })
}

fn purpose(usage: ExtendedKeyUsage) -> ObjectIdentifier {
    match usage {
        ExtendedKeyUsage::ServerAuth => OID_KP_SERVER_AUTH,
        ExtendedKeyUsage::ClientAuth => OID_KP_CLIENT_AUTH,
    }
}

/// Validity bound at whole-second precision; UTCTime before 2050, GeneralizedTime after.
fn x509_time(at: OffsetDateTime) -> Result<Time, IssuanceError> {
    let seconds = u64::try_from(at.unix_timestamp())
        .map_err(|_| IssuanceError::encoding(format!("validity bound {at} precedes the epoch")))?;
    let since_epoch = Duration::from_secs(seconds);
    match UtcTime::from_unix_duration(since_epoch) {
        Ok(time) => Ok(Time::UtcTime(time)),
        Err(_) => GeneralizedTime::from_unix_duration(since_epoch)
            .map(Time::GeneralTime)
            .map_err(|e| IssuanceError::encoding(e.to_string())),
    }
}

fn subject_alt_names(request: &CertificateRequest) -> Result<Vec<GeneralName>, IssuanceError> {
    let mut names = Vec::with_capacity(request.dns_names().len() + request.ip_addresses().len());
    for name in request.dns_names() {
        let value = Ia5String::new(name)
            .map_err(|e| IssuanceError::invalid_subject_alt_name(name, e.to_string()))?;
        names.push(GeneralName::DnsName(value));
    }
    for address in request.ip_addresses() {
        let octets = match address {
            IpAddr::V4(v4) => v4.octets().to_vec(),
            IpAddr::V6(v6) => v6.octets().to_vec(),
        };
        let value = OctetString::new(octets).map_err(|e| {
            IssuanceError::invalid_subject_alt_name(address.to_string(), e.to_string())
        })?;
        names.push(GeneralName::IpAddress(value));
    }
    Ok(names)
}

fn generate_leaf_key() -> Result<(PrivateKey, RsaPublicKey), IssuanceError> {
    let key = RsaPrivateKey::new(&mut OsRng, LEAF_KEY_BITS)
        .map_err(|e| IssuanceError::key_generation(e.to_string()))?;

    let pkcs1 = key.to_pkcs1_der().map_err(|e| IssuanceError::encoding(e.to_string()))?;
    let private_key = PrivateKey::from_pkcs1_der(pkcs1.as_bytes().to_vec())
        .map_err(|e| IssuanceError::encoding(e.to_string()))?;

    Ok((private_key, key.to_public_key()))
}

/// What the issuer needs to know about the authority certificate.
struct AuthorityProfile {
    /// Subject exactly as encoded in the authority certificate.
    subject: Name,
    subject_key_id: Option<Vec<u8>>,
}

impl AuthorityProfile {
    fn parse(der: &CertificateDer<'_>) -> Result<Self, IssuanceError> {
        let (_, certificate) = X509Certificate::from_der(der.as_ref())
            .map_err(|e| IssuanceError::authority_certificate(e.to_string()))?;

        let raw_subject = certificate.subject().as_raw();
        let subject = Name::from_der(raw_subject)
            .map_err(|e| IssuanceError::authority_certificate(e.to_string()))?;
        // Leaves name this as their issuer, so it must encode to the same bytes.
        let encoded =
            subject.to_der().map_err(|e| IssuanceError::authority_certificate(e.to_string()))?;
        if encoded != raw_subject {
            return Err(IssuanceError::authority_certificate(
                "authority subject is not in canonical DER form",
            ));
        }

        let subject_key_id =
            certificate.extensions().iter().find_map(|ext| match ext.parsed_extension() {
                ParsedExtension::SubjectKeyIdentifier(id) => Some(id.0.to_vec()),
                _ => None,
            });

        Ok(Self { subject, subject_key_id })
    }

    /// Subject for a new leaf: every inherited attribute value in authority
    /// order with its original string type, then the requested common name.
    fn leaf_subject(&self, common_name: &str) -> Result<Name, IssuanceError> {
        let invalid =
            |e: x509_cert::der::Error| IssuanceError::authority_certificate(e.to_string());

        let mut rdns = Vec::with_capacity(self.subject.0.len() + 1);
        for rdn in self.subject.0.iter() {
            let inherited: Vec<AttributeTypeAndValue> = rdn
                .0
                .iter()
                .filter(|attr| INHERITED_ATTRIBUTES.contains(&attr.oid))
                .cloned()
                .collect();
            if !inherited.is_empty() {
                let set = SetOfVec::try_from(inherited).map_err(invalid)?;
                rdns.push(RelativeDistinguishedName(set));
            }
        }

        let common_name = AttributeTypeAndValue {
            oid: OID_COMMON_NAME,
            value: Any::new(Tag::Utf8String, common_name.as_bytes()).map_err(invalid)?,
        };
        let set = SetOfVec::try_from(vec![common_name]).map_err(invalid)?;
        rdns.push(RelativeDistinguishedName(set));

        Ok(RdnSequence(rdns))
    }
}
