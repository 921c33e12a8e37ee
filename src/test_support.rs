//! Certificates minted in-process for tests, and a loopback TLS server.
//!
//! Compiled into the unit tests and included by the integration tests under
//! `tests/`.
#![allow(dead_code)]

use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509Builder, X509Extension, X509NameBuilder, X509};
use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

const DAY: i64 = 86_400;

pub enum SanSpec {
    Dns(&'static str),
    Ip(&'static str),
    Email(&'static str),
    Uri(&'static str),
}

pub struct CertSpec {
    common_name: Option<String>,
    sans: Vec<SanSpec>,
    raw_sans: Option<Vec<u8>>,
    not_before: i64,
    not_after: i64,
}

impl CertSpec {
    /// Self-signed certificate valid from yesterday for 90 days.
    pub fn new(common_name: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        CertSpec {
            common_name: Some(common_name.to_string()),
            sans: Vec::new(),
            raw_sans: None,
            not_before: now - DAY,
            not_after: now + 90 * DAY,
        }
    }

    pub fn without_common_name() -> Self {
        CertSpec {
            common_name: None,
            ..CertSpec::new("")
        }
    }

    pub fn dns(self, name: &'static str) -> Self {
        self.san(SanSpec::Dns(name))
    }

    pub fn san(mut self, san: SanSpec) -> Self {
        self.sans.push(san);
        self
    }

    /// DER of a GeneralNames SEQUENCE, used as the SAN extension verbatim.
    pub fn raw_sans(mut self, der: &[u8]) -> Self {
        self.raw_sans = Some(der.to_vec());
        self
    }

    pub fn valid_between(mut self, not_before: i64, not_after: i64) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn build(&self) -> X509 {
        self.build_with_key().0
    }

    pub fn build_with_key(&self) -> (X509, PKey<Private>) {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_nid(Nid::COUNTRYNAME, "US").unwrap();
        name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Example Org")
            .unwrap();
        if let Some(cn) = &self.common_name {
            name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
        }
        let name = name.build();

        let mut builder = X509Builder::new().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(4096).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(&key).unwrap();
        builder
            .set_not_before(&Asn1Time::from_unix(self.not_before as _).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::from_unix(self.not_after as _).unwrap())
            .unwrap();

        if !self.sans.is_empty() {
            let mut san = SubjectAlternativeName::new();
            for entry in &self.sans {
                match entry {
                    SanSpec::Dns(value) => san.dns(value),
                    SanSpec::Ip(value) => san.ip(value),
                    SanSpec::Email(value) => san.email(value),
                    SanSpec::Uri(value) => san.uri(value),
                };
            }
            let extension = san.build(&builder.x509v3_context(None, None)).unwrap();
            builder.append_extension(extension).unwrap();
        }

        if let Some(der) = &self.raw_sans {
            let oid = Asn1Object::from_str("2.5.29.17").unwrap();
            let contents = Asn1OctetString::new_from_bytes(der).unwrap();
            let extension = X509Extension::new_from_der(&oid, false, &contents).unwrap();
            builder.append_extension(extension).unwrap();
        }

        builder.sign(&key, MessageDigest::sha256()).unwrap();
        (builder.build(), key)
    }
}

/// GeneralNames holding a 5-byte iPAddress followed by a dNSName for `host`.
pub fn malformed_ip_then_dns(host: &str) -> Vec<u8> {
    assert!(host.len() < 100);
    let mut names = vec![0x87, 0x05, 10, 0, 0, 1, 2];
    names.push(0x82);
    names.push(host.len() as u8);
    names.extend_from_slice(host.as_bytes());

    let mut der = vec![0x30, names.len() as u8];
    der.extend(names);
    der
}

/// GeneralNames holding registeredID 1.2.3.4 followed by a dNSName for `host`.
pub fn registered_id_then_dns(host: &str) -> Vec<u8> {
    assert!(host.len() < 100);
    let mut names = vec![0x88, 0x03, 0x2a, 0x03, 0x04];
    names.push(0x82);
    names.push(host.len() as u8);
    names.extend_from_slice(host.as_bytes());

    let mut der = vec![0x30, names.len() as u8];
    der.extend(names);
    der
}

/// Accepts one TLS connection on a loopback port, presenting `cert`.
pub fn spawn_tls_server(cert: X509, key: PKey<Private>) -> (SocketAddr, JoinHandle<()>) {
    let mut acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&key).unwrap();
    acceptor.set_certificate(&cert).unwrap();
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            if let Ok(mut tls) = acceptor.accept(stream) {
                let mut buf = [0u8; 1];
                let _ = tls.read(&mut buf);
            }
        }
    });

    (address, handle)
}
