//! Certificate viewer library.
//!
//! Connects to a TLS server, takes the leaf certificate it presents and
//! reports its identity, validity window, SHA-256 fingerprint and Subject
//! Alternative Names, together with whether it is currently valid and covers
//! the requested hostname.
//!
//! Trust decisions made by the TLS stack only gate the handshake; validity
//! and hostname checks here are independent of them.
//!
//! # Example
//!
//! ```no_run
//! use certviewer::{Inspector, OpenSslConnector, Target};
//!
//! let inspector = Inspector::new(OpenSslConnector::default());
//! let inspection = inspector.inspect(&Target::parse("github.com", 443)?)?;
//! println!("{}", certviewer::report::render_text(&inspection, false));
//! # Ok::<(), certviewer::InspectError>(())
//! ```

use chrono::{DateTime, Utc};
use openssl::x509::X509Ref;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};
use x509_parser::certificate::X509Certificate;
use x509_parser::prelude::FromDer;

pub mod config;
pub mod connector;
pub mod dn;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod report;
pub mod target;
pub mod verify;

#[cfg(test)]
mod test_support;

pub use connector::{CertificateChain, CertificateSource, OpenSslConnector, TrustConfig};
pub use dn::CommonName;
pub use error::{ErrorCategory, InspectError};
pub use extract::{CertificateInfo, SanKind, SubjectAltName, SubjectAltNames, Validity};
pub use fingerprint::Fingerprint;
pub use target::{Target, DEFAULT_PORT};
pub use verify::{matches, ValidationResult, ValidityStatus, WildcardPolicy};

/// Subject, issuer and expiry of one certificate of the presented chain.
///
/// A certificate that cannot be decoded is still listed, with
/// [`ChainEntry::UNREADABLE`] in place of its names and no expiry.
#[derive(Debug, Clone, Serialize)]
pub struct ChainEntry {
    pub subject: String,
    pub issuer: String,
    pub not_after: Option<DateTime<Utc>>,
}

impl ChainEntry {
    pub const UNREADABLE: &'static str = "Error parsing certificate";

    fn from_x509(position: usize, cert: &X509Ref) -> ChainEntry {
        match cert.to_der() {
            Ok(der) => ChainEntry::from_der(position, &der),
            Err(e) => ChainEntry::unreadable(position, e),
        }
    }

    fn from_der(position: usize, der: &[u8]) -> ChainEntry {
        match X509Certificate::from_der(der) {
            Ok((_, parsed)) => ChainEntry {
                subject: dn::render(parsed.subject()),
                issuer: dn::render(parsed.issuer()),
                not_after: extract::to_utc(&parsed.validity().not_after).ok(),
            },
            Err(e) => ChainEntry::unreadable(position, e),
        }
    }

    fn unreadable(position: usize, error: impl fmt::Display) -> ChainEntry {
        warn!(position, %error, "could not decode chain certificate");
        ChainEntry {
            subject: ChainEntry::UNREADABLE.to_string(),
            issuer: ChainEntry::UNREADABLE.to_string(),
            not_after: None,
        }
    }
}

/// Everything reported about one target.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub target: Target,
    pub chain: Vec<ChainEntry>,
    pub certificate: CertificateInfo,
    pub validation: ValidationResult,
}

/// Fetches a target's chain and checks its leaf certificate.
pub struct Inspector<S> {
    source: S,
    policy: WildcardPolicy,
}

impl<S: CertificateSource> Inspector<S> {
    pub fn new(source: S) -> Self {
        Inspector {
            source,
            policy: WildcardPolicy::default(),
        }
    }

    pub fn with_wildcard_policy(mut self, policy: WildcardPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn inspect(&self, target: &Target) -> Result<Inspection, InspectError> {
        self.inspect_at(target, Utc::now())
    }

    /// Same as [`Inspector::inspect`], judging validity at `now`.
    pub fn inspect_at(
        &self,
        target: &Target,
        now: DateTime<Utc>,
    ) -> Result<Inspection, InspectError> {
        let chain = self.source.fetch(&target.host, target.port)?;
        debug!(%target, certificates = chain.len(), "retrieved certificate chain");

        let certificate = CertificateInfo::from_x509(chain.leaf())?;
        let validation = ValidationResult::evaluate(&certificate, &target.host, now, self.policy);
        let chain = chain
            .iter()
            .enumerate()
            .map(|(position, cert)| ChainEntry::from_x509(position, cert))
            .collect();

        Ok(Inspection {
            target: target.clone(),
            chain,
            certificate,
            validation,
        })
    }
}
