//! Extraction of the reported fields from a leaf certificate.

use chrono::{DateTime, Utc};
use openssl::x509::X509Ref;
use serde::Serialize;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::warn;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::oid_registry::OID_X509_EXT_SUBJECT_ALT_NAME;
use x509_parser::prelude::FromDer;
use x509_parser::time::ASN1Time;

use crate::dn::{self, CommonName};
use crate::fingerprint::Fingerprint;
use crate::InspectError;

/// GeneralName type discriminators from RFC 5280.
const OTHER_NAME: u8 = 0;
const RFC822_NAME: u8 = 1;
const X400_ADDRESS: u8 = 3;
const DIRECTORY_NAME: u8 = 4;
const EDI_PARTY_NAME: u8 = 5;
const URI: u8 = 6;
const REGISTERED_ID: u8 = 8;

/// Kind of a Subject Alternative Name entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SanKind {
    /// dNSName, type 2
    Dns,
    /// iPAddress, type 7
    Ip,
    /// Any other GeneralName type, by its discriminator
    Other(u8),
}

impl SanKind {
    pub fn type_id(&self) -> u8 {
        match self {
            SanKind::Dns => 2,
            SanKind::Ip => 7,
            SanKind::Other(id) => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectAltName {
    pub kind: SanKind,
    pub value: String,
}

impl SubjectAltName {
    pub fn dns(value: impl Into<String>) -> Self {
        SubjectAltName {
            kind: SanKind::Dns,
            value: value.into(),
        }
    }

    pub fn ip(value: impl Into<String>) -> Self {
        SubjectAltName {
            kind: SanKind::Ip,
            value: value.into(),
        }
    }

    pub fn other(type_id: u8, value: impl Into<String>) -> Self {
        SubjectAltName {
            kind: SanKind::Other(type_id),
            value: value.into(),
        }
    }
}

impl fmt::Display for SubjectAltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SanKind::Dns => write!(f, "DNS: {}", self.value),
            SanKind::Ip => write!(f, "IP: {}", self.value),
            SanKind::Other(id) => write!(f, "Type {}: {}", id, self.value),
        }
    }
}

/// The SAN extension of a certificate.
///
/// `Absent` and an empty `Present` list are reported the same way but kept
/// apart here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "entries", rename_all = "lowercase")]
pub enum SubjectAltNames {
    Absent,
    Present(Vec<SubjectAltName>),
}

impl SubjectAltNames {
    pub fn entries(&self) -> &[SubjectAltName] {
        match self {
            SubjectAltNames::Absent => &[],
            SubjectAltNames::Present(entries) => entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// A SAN entry that was skipped because it could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanDiagnostic {
    /// Index of the entry within the extension
    pub position: usize,
    pub message: String,
}

/// Validity window of a certificate. `not_before <= not_after` is not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Validity {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

/// Read-only snapshot of the reported fields of one certificate.
#[derive(Debug, Clone, Serialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub common_name: CommonName,
    pub issuer_common_name: CommonName,
    pub validity: Validity,
    pub fingerprint: Fingerprint,
    pub serial_number: String,
    pub signature_algorithm: String,
    pub sans: SubjectAltNames,
    pub san_diagnostics: Vec<SanDiagnostic>,
}

impl CertificateInfo {
    /// Extracts the reported fields of `cert`.
    ///
    /// A CN that cannot be found or decoded and SAN entries that cannot be
    /// decoded degrade to sentinels and diagnostics. Only a certificate that
    /// cannot be decoded at all, or whose validity times cannot be
    /// represented, is an error.
    pub fn from_x509(cert: &X509Ref) -> Result<CertificateInfo, InspectError> {
        let der = cert.to_der()?;
        let (_, parsed) = X509Certificate::from_der(&der)?;
        let (sans, san_diagnostics) = subject_alt_names(&parsed);

        Ok(CertificateInfo {
            subject: dn::render(parsed.subject()),
            issuer: dn::render(parsed.issuer()),
            common_name: CommonName::from_name(parsed.subject()),
            issuer_common_name: CommonName::from_name(parsed.issuer()),
            validity: Validity {
                not_before: to_utc(&parsed.validity().not_before)?,
                not_after: to_utc(&parsed.validity().not_after)?,
            },
            fingerprint: Fingerprint::from_der(&der),
            serial_number: serial_number(cert),
            signature_algorithm: signature_algorithm(cert),
            sans,
            san_diagnostics,
        })
    }
}

fn subject_alt_names(cert: &X509Certificate<'_>) -> (SubjectAltNames, Vec<SanDiagnostic>) {
    let extension = match cert
        .extensions()
        .iter()
        .find(|extension| extension.oid == OID_X509_EXT_SUBJECT_ALT_NAME)
    {
        Some(extension) => extension,
        None => return (SubjectAltNames::Absent, Vec::new()),
    };

    let names = match extension.parsed_extension() {
        ParsedExtension::SubjectAlternativeName(san) => &san.general_names,
        ParsedExtension::ParseError { error } => {
            let message = format!("extension could not be decoded: {}", error);
            warn!(%message, "skipping subject alternative names");
            return (
                SubjectAltNames::Present(Vec::new()),
                vec![SanDiagnostic {
                    position: 0,
                    message,
                }],
            );
        }
        _ => return (SubjectAltNames::Absent, Vec::new()),
    };

    let mut entries = Vec::with_capacity(names.len());
    let mut diagnostics = Vec::new();
    for (position, name) in names.iter().enumerate() {
        match classify(name) {
            Ok(san) => entries.push(san),
            Err(message) => {
                warn!(position, %message, "skipping malformed subject alternative name");
                diagnostics.push(SanDiagnostic { position, message });
            }
        }
    }

    (SubjectAltNames::Present(entries), diagnostics)
}

fn classify(name: &GeneralName<'_>) -> Result<SubjectAltName, String> {
    match name {
        GeneralName::DNSName(dns) => Ok(SubjectAltName::dns(*dns)),
        GeneralName::IPAddress(bytes) => ip_address(bytes).map(SubjectAltName::ip),
        GeneralName::OtherName(oid, value) => Ok(SubjectAltName::other(
            OTHER_NAME,
            format!("{}={}", oid.to_id_string(), dn::hex_value(value)),
        )),
        GeneralName::RFC822Name(email) => Ok(SubjectAltName::other(RFC822_NAME, *email)),
        GeneralName::X400Address(address) => Ok(SubjectAltName::other(
            X400_ADDRESS,
            dn::hex_value(address.as_bytes()),
        )),
        GeneralName::DirectoryName(directory) => {
            Ok(SubjectAltName::other(DIRECTORY_NAME, dn::render(directory)))
        }
        GeneralName::EDIPartyName(party) => Ok(SubjectAltName::other(
            EDI_PARTY_NAME,
            dn::hex_value(party.as_bytes()),
        )),
        GeneralName::URI(uri) => Ok(SubjectAltName::other(URI, *uri)),
        GeneralName::RegisteredID(oid) => {
            Ok(SubjectAltName::other(REGISTERED_ID, oid.to_id_string()))
        }
        #[allow(unreachable_patterns)]
        _ => Err("undecodable general name".to_string()),
    }
}

fn ip_address(bytes: &[u8]) -> Result<String, String> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        return Ok(Ipv4Addr::from(octets).to_string());
    }
    if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        return Ok(Ipv6Addr::from(octets).to_string());
    }
    Err(format!(
        "IP address is {} bytes long, expected 4 or 16",
        bytes.len()
    ))
}

pub(crate) fn to_utc(time: &ASN1Time) -> Result<DateTime<Utc>, InspectError> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| InspectError::certificate(format!("validity time {} is out of range", time)))
}

fn serial_number(cert: &X509Ref) -> String {
    cert.serial_number()
        .to_bn()
        .and_then(|bn| bn.to_hex_str().map(|hex| hex.to_string()))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn signature_algorithm(cert: &X509Ref) -> String {
    let object = cert.signature_algorithm().object();
    match object.nid().long_name() {
        Ok(name) => name.to_string(),
        Err(_) => object.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{malformed_ip_then_dns, registered_id_then_dns, CertSpec, SanSpec};

    #[test]
    fn test_extracts_identity_fields() {
        let cert = CertSpec::new("example.com").dns("www.example.com").build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(info.subject, "CN=example.com,O=Example Org,C=US");
        assert_eq!(info.issuer, info.subject);
        assert_eq!(
            info.common_name,
            CommonName::Found("example.com".to_string())
        );
        assert_eq!(info.issuer_common_name, info.common_name);
        assert_eq!(info.serial_number, "1000");
        assert_eq!(info.signature_algorithm, "ecdsa-with-SHA256");
    }

    #[test]
    fn test_validity_window() {
        let cert = CertSpec::new("example.com")
            .valid_between(1_600_000_000, 1_700_000_000)
            .build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(info.validity.not_before.timestamp(), 1_600_000_000);
        assert_eq!(info.validity.not_after.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_inverted_validity_window_is_kept() {
        let cert = CertSpec::new("example.com")
            .valid_between(1_700_000_000, 1_600_000_000)
            .build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert!(info.validity.not_before > info.validity.not_after);
    }

    #[test]
    fn test_fingerprint_is_digest_of_der() {
        let cert = CertSpec::new("example.com").build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(
            info.fingerprint,
            Fingerprint::from_der(&cert.to_der().unwrap())
        );
    }

    #[test]
    fn test_san_kinds_in_order() {
        let cert = CertSpec::new("example.com")
            .dns("example.com")
            .san(SanSpec::Ip("192.0.2.7"))
            .san(SanSpec::Ip("2001:db8::1"))
            .san(SanSpec::Email("admin@example.com"))
            .san(SanSpec::Uri("https://example.com/"))
            .dns("*.example.com")
            .build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(
            info.sans,
            SubjectAltNames::Present(vec![
                SubjectAltName::dns("example.com"),
                SubjectAltName::ip("192.0.2.7"),
                SubjectAltName::ip("2001:db8::1"),
                SubjectAltName::other(1, "admin@example.com"),
                SubjectAltName::other(6, "https://example.com/"),
                SubjectAltName::dns("*.example.com"),
            ])
        );
        assert!(info.san_diagnostics.is_empty());
    }

    #[test]
    fn test_absent_san_extension() {
        let cert = CertSpec::new("example.com").build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(info.sans, SubjectAltNames::Absent);
        assert!(info.sans.is_empty());
    }

    #[test]
    fn test_malformed_san_entry_is_skipped() {
        let cert = CertSpec::new("example.com")
            .raw_sans(&malformed_ip_then_dns("api.example.com"))
            .build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(
            info.sans,
            SubjectAltNames::Present(vec![SubjectAltName::dns("api.example.com")])
        );
        assert_eq!(info.san_diagnostics.len(), 1);
        assert_eq!(info.san_diagnostics[0].position, 0);
        assert!(info.san_diagnostics[0].message.contains("5 bytes"));
    }

    #[test]
    fn test_registered_id_is_kept_with_its_type() {
        let cert = CertSpec::new("example.com")
            .raw_sans(&registered_id_then_dns("api.example.com"))
            .build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(
            info.sans,
            SubjectAltNames::Present(vec![
                SubjectAltName::other(8, "1.2.3.4"),
                SubjectAltName::dns("api.example.com"),
            ])
        );
        assert!(info.san_diagnostics.is_empty());
        assert_eq!(info.sans.entries()[0].to_string(), "Type 8: 1.2.3.4");
    }

    #[test]
    fn test_undecodable_san_extension_is_reported() {
        let cert = CertSpec::new("example.com")
            .raw_sans(&[0x30, 0x03, 0x82, 0x05, 0x61])
            .build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(info.sans, SubjectAltNames::Present(Vec::new()));
        assert_eq!(info.san_diagnostics.len(), 1);
        assert!(info.san_diagnostics[0]
            .message
            .starts_with("extension could not be decoded"));
    }

    #[test]
    fn test_missing_common_name() {
        let cert = CertSpec::without_common_name().build();
        let info = CertificateInfo::from_x509(&cert).unwrap();

        assert_eq!(info.common_name, CommonName::NotFound);
        assert_eq!(info.subject, "O=Example Org,C=US");
    }

    #[test]
    fn test_san_display_labels() {
        assert_eq!(SubjectAltName::dns("a.example").to_string(), "DNS: a.example");
        assert_eq!(SubjectAltName::ip("10.0.0.1").to_string(), "IP: 10.0.0.1");
        assert_eq!(
            SubjectAltName::other(1, "root@example").to_string(),
            "Type 1: root@example"
        );
        assert_eq!(SanKind::Other(6).type_id(), 6);
        assert_eq!(SanKind::Dns.type_id(), 2);
        assert_eq!(SanKind::Ip.type_id(), 7);
    }

    #[test]
    fn test_ip_address_lengths() {
        assert_eq!(ip_address(&[127, 0, 0, 1]).unwrap(), "127.0.0.1");
        let mut v6 = [0u8; 16];
        v6[15] = 1;
        assert_eq!(ip_address(&v6).unwrap(), "::1");
        assert!(ip_address(&[1, 2, 3]).is_err());
    }
}
