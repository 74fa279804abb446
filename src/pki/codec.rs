//! PEM bundle encoding and decoding.
//!
//! Blocks are scanned in document order. Every `CERTIFICATE` block is kept in
//! the order it appears. A block whose label ends in `PRIVATE KEY` is a key
//! block and is decoded by its label: `RSA PRIVATE KEY` is PKCS#1, `PRIVATE KEY`
//! is PKCS#8, anything else is rejected. Other blocks are ignored.

use std::fmt;

use pem::{EncodeConfig, LineEnding, Pem};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::RsaPrivateKey;
use rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer,
};
use zeroize::Zeroizing;

use crate::errors::CodecError;

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

const KEY_LABEL_SUFFIX: &str = "PRIVATE KEY";

/// Encoding of a private key block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// RSA-specific encoding (`RSA PRIVATE KEY`).
    Pkcs1,
    /// Algorithm-agnostic encoding (`PRIVATE KEY`).
    Pkcs8,
}

impl KeyEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pkcs1 => RSA_PRIVATE_KEY_LABEL,
            Self::Pkcs8 => PRIVATE_KEY_LABEL,
        }
    }

    /// Resolve a PEM label to an encoding; unknown labels are an error.
    pub fn from_label(label: &str) -> Result<Self, CodecError> {
        match label {
            RSA_PRIVATE_KEY_LABEL => Ok(Self::Pkcs1),
            PRIVATE_KEY_LABEL => Ok(Self::Pkcs8),
            other => Err(CodecError::unsupported_key_label(other)),
        }
    }
}

/// A parsed private key together with the encoding it arrived in.
///
/// The DER bytes are zeroized on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    encoding: KeyEncoding,
    der: Zeroizing<Vec<u8>>,
}

impl PrivateKey {
    /// Decode a key block according to its PEM label.
    pub fn from_pem_block(label: &str, der: Vec<u8>) -> Result<Self, CodecError> {
        match KeyEncoding::from_label(label)? {
            KeyEncoding::Pkcs1 => Self::from_pkcs1_der(der),
            KeyEncoding::Pkcs8 => Self::from_pkcs8_der(der),
        }
    }

    pub fn from_pkcs1_der(der: Vec<u8>) -> Result<Self, CodecError> {
        let der = Zeroizing::new(der);
        RsaPrivateKey::from_pkcs1_der(&der).map_err(|e| {
            CodecError::invalid_private_key(RSA_PRIVATE_KEY_LABEL, e.to_string())
        })?;
        Ok(Self { encoding: KeyEncoding::Pkcs1, der })
    }

    pub fn from_pkcs8_der(der: Vec<u8>) -> Result<Self, CodecError> {
        let der = Zeroizing::new(der);
        rcgen::KeyPair::try_from(der.as_slice())
            .map_err(|e| CodecError::invalid_private_key(PRIVATE_KEY_LABEL, e.to_string()))?;
        Ok(Self { encoding: KeyEncoding::Pkcs8, der })
    }

    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    pub fn secret_der(&self) -> &[u8] {
        &self.der
    }

    /// The key as PKCS#8 DER, converting from PKCS#1 when needed.
    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>, CodecError> {
        match self.encoding {
            KeyEncoding::Pkcs8 => Ok(self.der.clone()),
            KeyEncoding::Pkcs1 => {
                let invalid =
                    |e: String| CodecError::invalid_private_key(RSA_PRIVATE_KEY_LABEL, e);
                let key = RsaPrivateKey::from_pkcs1_der(&self.der)
                    .map_err(|e| invalid(e.to_string()))?;
                let document = key.to_pkcs8_der().map_err(|e| invalid(e.to_string()))?;
                Ok(Zeroizing::new(document.as_bytes().to_vec()))
            }
        }
    }

    /// Load the key for signing. Only RSA keys can sign leaves.
    pub fn to_rsa(&self) -> Result<RsaPrivateKey, CodecError> {
        let key = match self.encoding {
            KeyEncoding::Pkcs1 => RsaPrivateKey::from_pkcs1_der(&self.der).map_err(|e| e.to_string()),
            KeyEncoding::Pkcs8 => {
                RsaPrivateKey::from_pkcs8_der(&self.der).map_err(|e| e.to_string())
            }
        };
        key.map_err(|reason| CodecError::invalid_private_key(self.encoding.label(), reason))
    }

    pub fn to_rustls(&self) -> PrivateKeyDer<'static> {
        match self.encoding {
            KeyEncoding::Pkcs1 => PrivatePkcs1KeyDer::from(self.der.to_vec()).into(),
            KeyEncoding::Pkcs8 => PrivatePkcs8KeyDer::from(self.der.to_vec()).into(),
        }
    }

    fn to_pem(&self) -> Pem {
        Pem::new(self.encoding.label(), self.der.to_vec())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("encoding", &self.encoding)
            .field("der", &"[REDACTED]")
            .finish()
    }
}

/// Certificates and key recovered from a PEM bundle.
#[derive(Debug, Clone)]
pub struct DecodedBundle {
    /// Every certificate block, in document order.
    pub chain: Vec<CertificateDer<'static>>,
    pub private_key: PrivateKey,
}

/// Decode a bundle holding certificates and exactly one private key.
pub fn decode_bundle(input: &[u8]) -> Result<DecodedBundle, CodecError> {
    let mut chain = Vec::new();
    let mut private_key = None;

    for block in pem::parse_many(input)? {
        if block.tag() == CERTIFICATE_LABEL {
            chain.push(CertificateDer::from(block.into_contents()));
        } else if block.tag().ends_with(KEY_LABEL_SUFFIX) {
            if private_key.is_some() {
                return Err(CodecError::MultiplePrivateKeys);
            }
            let label = block.tag().to_string();
            private_key = Some(PrivateKey::from_pem_block(&label, block.into_contents())?);
        }
    }

    let private_key = private_key.ok_or(CodecError::MissingPrivateKey)?;
    Ok(DecodedBundle { chain, private_key })
}

/// Decode every certificate block in a document, ignoring all other blocks.
pub fn decode_certificates(input: &[u8]) -> Result<Vec<CertificateDer<'static>>, CodecError> {
    Ok(pem::parse_many(input)?
        .into_iter()
        .filter(|block| block.tag() == CERTIFICATE_LABEL)
        .map(|block| CertificateDer::from(block.into_contents()))
        .collect())
}

/// Decode the single private key held in a document.
pub fn decode_private_key(input: &[u8]) -> Result<PrivateKey, CodecError> {
    let mut keys = pem::parse_many(input)?
        .into_iter()
        .filter(|block| block.tag().ends_with(KEY_LABEL_SUFFIX));

    let block = keys.next().ok_or(CodecError::MissingPrivateKey)?;
    if keys.next().is_some() {
        return Err(CodecError::MultiplePrivateKeys);
    }
    let label = block.tag().to_string();
    PrivateKey::from_pem_block(&label, block.into_contents())
}

/// Encode a key followed by certificates, in the order given, as one PEM document.
pub fn encode_bundle<'a, I>(private_key: &PrivateKey, certificates: I) -> String
where
    I: IntoIterator<Item = &'a CertificateDer<'a>>,
{
    let config = EncodeConfig::new().set_line_ending(LineEnding::LF);
    let mut blocks = vec![private_key.to_pem()];
    blocks.extend(
        certificates.into_iter().map(|cert| Pem::new(CERTIFICATE_LABEL, cert.as_ref().to_vec())),
    );
    blocks.iter().map(|block| pem::encode_config(block, config)).collect()
}
