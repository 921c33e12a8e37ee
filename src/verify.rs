//! Hostname matching and validity checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

use crate::extract::{CertificateInfo, SanKind, SubjectAltName, Validity};

/// How a name starting with `*` is matched against a hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WildcardPolicy {
    /// Strip the leading `*` and accept any hostname ending with the rest.
    /// `*.example.com` matches `a.b.example.com`, and `*example.com` matches
    /// `notexample.com`.
    #[default]
    Suffix,
    /// `*.` followed by a base domain matches exactly one non-empty leftmost
    /// label in front of that domain.
    SingleLabel,
}

/// Reports whether `hostname` is covered by the CN or a DNS SAN, using
/// [`WildcardPolicy::Suffix`].
///
/// The CN is tried first, then DNS SANs in order. IP and other SAN kinds
/// never match.
///
/// # Examples
///
/// ```
/// # use certviewer::verify::matches;
/// assert!(matches("api.example.com", "*.example.com", &[]));
/// assert!(!matches("example.com", "*.example.com", &[]));
/// ```
pub fn matches(hostname: &str, common_name: &str, sans: &[SubjectAltName]) -> bool {
    matches_with(WildcardPolicy::Suffix, hostname, common_name, sans)
}

pub fn matches_with(
    policy: WildcardPolicy,
    hostname: &str,
    common_name: &str,
    sans: &[SubjectAltName],
) -> bool {
    if name_matches(policy, hostname, common_name) {
        return true;
    }

    sans.iter()
        .filter(|san| san.kind == SanKind::Dns)
        .any(|san| name_matches(policy, hostname, &san.value))
}

fn name_matches(policy: WildcardPolicy, hostname: &str, pattern: &str) -> bool {
    if pattern == hostname {
        return true;
    }

    match policy {
        WildcardPolicy::Suffix => match pattern.strip_prefix('*') {
            Some(suffix) => hostname.ends_with(suffix),
            None => false,
        },
        WildcardPolicy::SingleLabel => {
            match (pattern.strip_prefix("*."), hostname.split_once('.')) {
                (Some(base), Some((label, rest))) => {
                    !label.is_empty() && !base.is_empty() && rest == base
                }
                _ => false,
            }
        }
    }
}

/// Whether the validity window covers a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityStatus {
    Valid,
    Expired,
    NotYetValid,
}

impl fmt::Display for ValidityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidityStatus::Valid => write!(f, "Valid"),
            ValidityStatus::Expired => write!(f, "Expired"),
            ValidityStatus::NotYetValid => write!(f, "Not yet valid"),
        }
    }
}

const SECONDS_PER_DAY: i64 = 86_400;

/// Outcome of checking a certificate against a hostname at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub expired: bool,
    pub not_yet_valid: bool,
    pub hostname_matches: bool,
    /// Whole days until `not_after`, rounded down; negative once expired.
    pub days_remaining: i64,
}

impl ValidationResult {
    pub fn evaluate(
        info: &CertificateInfo,
        hostname: &str,
        now: DateTime<Utc>,
        policy: WildcardPolicy,
    ) -> ValidationResult {
        let (expired, not_yet_valid) = check_window(&info.validity, now);
        ValidationResult {
            expired,
            not_yet_valid,
            hostname_matches: matches_with(
                policy,
                hostname,
                info.common_name.as_str(),
                info.sans.entries(),
            ),
            days_remaining: (info.validity.not_after - now)
                .num_seconds()
                .div_euclid(SECONDS_PER_DAY),
        }
    }

    /// `Expired` wins when an inverted window makes both flags true.
    pub fn status(&self) -> ValidityStatus {
        if self.expired {
            ValidityStatus::Expired
        } else if self.not_yet_valid {
            ValidityStatus::NotYetValid
        } else {
            ValidityStatus::Valid
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status() == ValidityStatus::Valid && self.hostname_matches
    }
}

/// Returns `(expired, not_yet_valid)`. Both bounds are inclusive.
fn check_window(validity: &Validity, now: DateTime<Utc>) -> (bool, bool) {
    (now > validity.not_after, now < validity.not_before)
}
