//! Error types for certificate inspection.
//!
//! This module defines the errors that can stop an inspection run: bad input,
//! connection and handshake failures, and certificates that cannot be read at
//! all. Problems with a single certificate field (an unparsable CN, a broken SAN
//! entry) are not errors; they degrade that field and the report goes on.

use std::fmt;
use std::io;

/// Error type for certificate inspection failures.
///
/// Returned when the target cannot be parsed, the server cannot be reached,
/// the TLS handshake fails, or the presented certificate cannot be decoded.
#[derive(Debug)]
pub enum InspectError {
    /// DNS resolution failed for the given hostname
    DnsResolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TCP connection failed to the target address
    ConnectionFailed {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TLS handshake failed
    HandshakeFailed {
        /// Details about why the handshake failed
        details: String,
    },

    /// The presented certificate could not be used
    CertificateError {
        /// Description of what went wrong
        reason: String,
    },

    /// Network operation timeout
    Timeout {
        /// Description of which operation timed out
        operation: String,
    },

    /// Invalid input provided on the command line or prompt
    InvalidInput {
        /// Which field/parameter was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },

    /// OpenSSL error occurred
    OpenSSLError {
        /// The underlying OpenSSL error
        details: String,
    },

    /// Generic I/O error
    IoError {
        /// The underlying I/O error
        source: io::Error,
    },

    /// A generic error with a custom message
    Other {
        /// Error message
        message: String,
    },
}

/// Coarse grouping of errors, used to prefix messages in interactive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UnknownHost,
    Tls,
    Certificate,
    Unexpected,
}

impl ErrorCategory {
    pub fn prefix(&self) -> &'static str {
        match self {
            ErrorCategory::UnknownHost => "❌ Unknown host",
            ErrorCategory::Tls => "❌ SSL error",
            ErrorCategory::Certificate => "❌ Certificate error",
            ErrorCategory::Unexpected => "❌ Unexpected error",
        }
    }
}

impl InspectError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn certificate(reason: impl Into<String>) -> Self {
        Self::CertificateError {
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DnsResolution { .. } => ErrorCategory::UnknownHost,
            Self::HandshakeFailed { .. } | Self::OpenSSLError { .. } => ErrorCategory::Tls,
            Self::CertificateError { .. } => ErrorCategory::Certificate,
            Self::ConnectionFailed { .. }
            | Self::Timeout { .. }
            | Self::InvalidInput { .. }
            | Self::IoError { .. }
            | Self::Other { .. } => ErrorCategory::Unexpected,
        }
    }
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsResolution { hostname, .. } => {
                write!(
                    f,
                    "Failed to resolve hostname: {}. Check that the hostname is spelled \
                     correctly and your DNS configuration is working.",
                    hostname
                )
            }
            Self::ConnectionFailed { address, source } => {
                write!(f, "Connection failed to {}: {}", address, source)
            }
            Self::HandshakeFailed { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::CertificateError { reason } => {
                write!(f, "Certificate error: {}", reason)
            }
            Self::Timeout { operation } => {
                write!(f, "Operation timed out: {}", operation)
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::OpenSSLError { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::IoError { source } => {
                write!(f, "I/O error: {}", source)
            }
            Self::Other { message } => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for InspectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DnsResolution { source, .. } => Some(source),
            Self::ConnectionFailed { source, .. } => Some(source),
            Self::IoError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for InspectError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock {
            return Self::Timeout {
                operation: e.to_string(),
            };
        }

        Self::IoError { source: e }
    }
}

impl From<&str> for InspectError {
    fn from(s: &str) -> Self {
        Self::Other {
            message: s.to_string(),
        }
    }
}

impl From<String> for InspectError {
    fn from(s: String) -> Self {
        Self::Other { message: s }
    }
}

impl From<openssl::error::ErrorStack> for InspectError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSLError {
            details: e.to_string(),
        }
    }
}

impl<S: fmt::Debug> From<openssl::ssl::HandshakeError<S>> for InspectError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        Self::HandshakeFailed {
            details: format!("{}", e),
        }
    }
}

impl From<x509_parser::nom::Err<x509_parser::error::X509Error>> for InspectError {
    fn from(e: x509_parser::nom::Err<x509_parser::error::X509Error>) -> Self {
        Self::CertificateError {
            reason: format!("could not decode certificate: {}", e),
        }
    }
}

impl From<crate::config::ConfigError> for InspectError {
    fn from(e: crate::config::ConfigError) -> Self {
        Self::InvalidInput {
            field: "configuration".to_string(),
            reason: e.to_string(),
        }
    }
}
