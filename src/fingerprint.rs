//! SHA-256 certificate fingerprints.

use openssl::sha::sha256;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::InspectError;

/// SHA-256 digest of a DER-encoded certificate.
///
/// Displays as colon-separated uppercase hex pairs, `AB:CD:...:EF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn from_der(der: &[u8]) -> Fingerprint {
        Fingerprint(sha256(der))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.0.iter().map(|b| format!("{:02X}", b)).collect();
        f.write_str(&pairs.join(":"))
    }
}

/// Accepts the displayed form, with or without separators, in either case.
impl FromStr for Fingerprint {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s.chars().filter(|c| *c != ':').collect();
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(InspectError::invalid_input(
                "fingerprint",
                format!("expected 32 hex byte pairs, got '{}'", s),
            ));
        }

        let mut digest = [0u8; 32];
        for (i, byte) in digest.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| {
                InspectError::invalid_input("fingerprint", format!("'{}' is not hex", s))
            })?;
        }
        Ok(Fingerprint(digest))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
