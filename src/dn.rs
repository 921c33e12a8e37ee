//! Distinguished names: RFC 4514 rendering and CN lookup.

use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;
use x509_parser::x509::{AttributeTypeAndValue, X509Name};

/// RFC 4514 section 3 keywords by OID. Other types render as the dotted OID.
const KEYWORDS: [(&str, &str); 9] = [
    ("2.5.4.3", "CN"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("2.5.4.6", "C"),
    ("2.5.4.9", "STREET"),
    ("0.9.2342.19200300.100.1.25", "DC"),
    ("0.9.2342.19200300.100.1.1", "UID"),
];

/// Renders an X.509 name as an RFC 4514 string.
///
/// RFC 4514 lists the most significant RDN last, so the output is the
/// reverse of the encoded order: `CN=example.com,O=Example,C=US`. The
/// attributes of a multi-valued RDN are joined with `+`.
pub fn render(name: &X509Name<'_>) -> String {
    let mut rdns: Vec<String> = name
        .iter_rdn()
        .map(|rdn| {
            rdn.iter()
                .map(render_attribute)
                .collect::<Vec<_>>()
                .join("+")
        })
        .collect();
    rdns.reverse();
    rdns.join(",")
}

fn render_attribute(attribute: &AttributeTypeAndValue<'_>) -> String {
    let value = match attribute.as_str() {
        Ok(value) => escape_value(value),
        Err(_) => hex_value(attribute.attr_value().as_bytes()),
    };
    format!("{}={}", attribute_key(attribute), value)
}

fn attribute_key(attribute: &AttributeTypeAndValue<'_>) -> String {
    let oid = attribute.attr_type().to_id_string();
    match KEYWORDS.iter().find(|(known, _)| *known == oid) {
        Some((_, keyword)) => keyword.to_string(),
        None => oid,
    }
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '#' if i == 0 => escaped.push_str("\\#"),
            ' ' if i == 0 || i == last => escaped.push_str("\\ "),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `#` followed by lowercase hex, the RFC 4514 form for non-string values.
pub(crate) fn hex_value(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("#{}", hex)
}

/// Common Name of a certificate subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonName {
    Found(String),
    NotFound,
    ParseError,
}

impl CommonName {
    /// Finds the CN of `name`.
    ///
    /// RDNs are scanned in encoded order and the first `CN` attribute wins.
    /// A CN whose value is not a string type gives `ParseError`.
    pub fn from_name(name: &X509Name<'_>) -> CommonName {
        match name.iter_common_name().next() {
            None => CommonName::NotFound,
            Some(attribute) => match attribute.as_str() {
                Ok(value) => CommonName::Found(value.to_string()),
                Err(e) => {
                    debug!(name = %render(name), error = %e, "could not decode common name");
                    CommonName::ParseError
                }
            },
        }
    }

    /// The CN, or the sentinel text shown in its place.
    pub fn as_str(&self) -> &str {
        match self {
            CommonName::Found(value) => value,
            CommonName::NotFound => "Not Found",
            CommonName::ParseError => "Error parsing CN",
        }
    }
}

impl fmt::Display for CommonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CommonName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
