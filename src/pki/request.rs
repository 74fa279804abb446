//! Certificate requests built from flat `pki.*` labels.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::duration::{format_duration, parse_duration};
use crate::errors::ValidationError;

pub const LABEL_AUTHORITY: &str = "pki.ca";
pub const LABEL_COMMON_NAME: &str = "pki.cn";
pub const LABEL_USAGE: &str = "pki.usage";
pub const LABEL_DNS_NAMES: &str = "pki.dns_names";
pub const LABEL_IP_ADDRESSES: &str = "pki.ip_addrs";
pub const LABEL_LIFETIME: &str = "pki.lifetime";

/// Lifetime applied when `pki.lifetime` is absent.
pub const DEFAULT_CERT_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Extended key usage purposes a leaf certificate can be issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExtendedKeyUsage {
    ClientAuth,
    ServerAuth,
}

impl fmt::Display for ExtendedKeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientAuth => f.write_str("client_auth"),
            Self::ServerAuth => f.write_str("server_auth"),
        }
    }
}

/// Map a `pki.usage` token to its set of purposes.
pub fn parse_usage(token: &str) -> Result<BTreeSet<ExtendedKeyUsage>, ValidationError> {
    let usage = match token {
        "server" => BTreeSet::from([ExtendedKeyUsage::ServerAuth]),
        "client" => BTreeSet::from([ExtendedKeyUsage::ClientAuth]),
        "client-server" | "server-client" => {
            BTreeSet::from([ExtendedKeyUsage::ClientAuth, ExtendedKeyUsage::ServerAuth])
        }
        other => return Err(ValidationError::disallowed_usage(other)),
    };
    Ok(usage)
}

fn usage_token(usage: &BTreeSet<ExtendedKeyUsage>) -> &'static str {
    let server = usage.contains(&ExtendedKeyUsage::ServerAuth);
    let client = usage.contains(&ExtendedKeyUsage::ClientAuth);
    match (server, client) {
        (true, true) => "client-server",
        (false, true) => "client",
        _ => "server",
    }
}

/// A validated request for one leaf certificate.
///
/// Construction goes through [`CertificateRequest::from_labels`] or
/// [`CertificateRequest::new`], so every instance has an authority, a common
/// name, at least one usage and a positive lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    authority: String,
    common_name: String,
    usage: BTreeSet<ExtendedKeyUsage>,
    dns_names: Vec<String>,
    ip_addresses: Vec<IpAddr>,
    lifetime: Duration,
}

impl CertificateRequest {
    pub fn new(
        authority: impl Into<String>,
        common_name: impl Into<String>,
        usage: impl IntoIterator<Item = ExtendedKeyUsage>,
    ) -> Result<Self, ValidationError> {
        let authority = authority.into();
        if authority.is_empty() {
            return Err(ValidationError::missing_authority());
        }
        let common_name = common_name.into();
        if common_name.is_empty() {
            return Err(ValidationError::missing_common_name());
        }
        let usage: BTreeSet<_> = usage.into_iter().collect();
        if usage.is_empty() {
            return Err(ValidationError::missing_usage());
        }

        Ok(Self {
            authority,
            common_name,
            usage,
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            lifetime: DEFAULT_CERT_LIFETIME,
        })
    }

    pub fn with_dns_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dns_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ip_addresses(mut self, addresses: impl IntoIterator<Item = IpAddr>) -> Self {
        self.ip_addresses = addresses.into_iter().collect();
        self
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Result<Self, ValidationError> {
        if lifetime.is_zero() {
            return Err(ValidationError::invalid_lifetime(
                format_duration(lifetime),
                "lifetime must be greater than zero",
            ));
        }
        self.lifetime = lifetime;
        Ok(self)
    }

    /// Build a request from a label mapping.
    ///
    /// Rules are checked in order (authority, common name, usage, IP addresses,
    /// lifetime) and the first violation is returned. An empty value for a
    /// required label counts as missing. Empty `pki.dns_names` entries are
    /// dropped; every `pki.ip_addrs` entry must parse.
    pub fn from_labels(labels: &HashMap<String, String>) -> Result<Self, ValidationError> {
        let authority =
            required(labels, LABEL_AUTHORITY).ok_or_else(ValidationError::missing_authority)?;
        let common_name =
            required(labels, LABEL_COMMON_NAME).ok_or_else(ValidationError::missing_common_name)?;
        let usage = parse_usage(
            required(labels, LABEL_USAGE).ok_or_else(ValidationError::missing_usage)?,
        )?;

        let dns_names = labels
            .get(LABEL_DNS_NAMES)
            .map(|value| {
                value.split(',').filter(|name| !name.is_empty()).map(String::from).collect()
            })
            .unwrap_or_default();

        let ip_addresses = match labels.get(LABEL_IP_ADDRESSES) {
            Some(value) => value
                .split(',')
                .map(|literal| {
                    literal.parse::<IpAddr>().map_err(|_| ValidationError::invalid_ip_address(literal))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let lifetime = match labels.get(LABEL_LIFETIME) {
            Some(value) => {
                let lifetime = parse_duration(value)
                    .map_err(|e| ValidationError::invalid_lifetime(value, e.to_string()))?;
                if lifetime.is_zero() {
                    return Err(ValidationError::invalid_lifetime(
                        value,
                        "lifetime must be greater than zero",
                    ));
                }
                lifetime
            }
            None => DEFAULT_CERT_LIFETIME,
        };

        Ok(Self {
            authority: authority.to_string(),
            common_name: common_name.to_string(),
            usage,
            dns_names,
            ip_addresses,
            lifetime,
        })
    }

    /// Render the request back into labels that [`Self::from_labels`] accepts.
    pub fn to_labels(&self) -> HashMap<String, String> {
        let mut labels = HashMap::new();
        labels.insert(LABEL_AUTHORITY.to_string(), self.authority.clone());
        labels.insert(LABEL_COMMON_NAME.to_string(), self.common_name.clone());
        labels.insert(LABEL_USAGE.to_string(), usage_token(&self.usage).to_string());
        if !self.dns_names.is_empty() {
            labels.insert(LABEL_DNS_NAMES.to_string(), self.dns_names.join(","));
        }
        if !self.ip_addresses.is_empty() {
            let joined =
                self.ip_addresses.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
            labels.insert(LABEL_IP_ADDRESSES.to_string(), joined);
        }
        labels.insert(LABEL_LIFETIME.to_string(), format_duration(self.lifetime));
        labels
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    pub fn usage(&self) -> &BTreeSet<ExtendedKeyUsage> {
        &self.usage
    }

    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    pub fn ip_addresses(&self) -> &[IpAddr] {
        &self.ip_addresses
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

fn required<'a>(labels: &'a HashMap<String, String>, label: &str) -> Option<&'a str> {
    labels.get(label).map(String::as_str).filter(|value| !value.is_empty())
}
