//! Parsing of the host to inspect.
//!
//! Two input styles are supported. The command line takes `host`,
//! `host:port` or a URL such as `https://host:8443/path`. The interactive
//! prompt takes a domain name with an optional scheme, path or port, and
//! always connects on [`DEFAULT_PORT`].

use serde::Serialize;
use std::fmt;
use url::Url;

use crate::InspectError;

/// Port used when the input names none.
pub const DEFAULT_PORT: u16 = 443;

/// A host and port to connect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Target {
            host: host.into(),
            port,
        }
    }

    /// Parses command-line input, using `default_port` when none is given.
    ///
    /// # Examples
    ///
    /// ```
    /// # use certviewer::Target;
    /// let target = Target::parse("github.com:8443", 443)?;
    /// assert_eq!(target.host, "github.com");
    /// assert_eq!(target.port, 8443);
    /// # Ok::<(), certviewer::InspectError>(())
    /// ```
    pub fn parse(input: &str, default_port: u16) -> Result<Target, InspectError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(InspectError::invalid_input("host", "cannot be empty"));
        }

        if input.contains("://") {
            return Self::parse_url(input, default_port);
        }

        let (host, port) = match input.split_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (input, default_port),
        };
        if host.is_empty() {
            return Err(InspectError::invalid_input("host", "cannot be empty"));
        }

        Ok(Target::new(host, port))
    }

    /// Normalizes a domain typed at the interactive prompt.
    ///
    /// The scheme, any path and any `:port` suffix are dropped; the port is
    /// always [`DEFAULT_PORT`].
    pub fn from_prompt(input: &str) -> Result<Target, InspectError> {
        let mut host = input.trim();
        for scheme in ["https://", "http://"] {
            if let Some(rest) = host.strip_prefix(scheme) {
                host = rest;
                break;
            }
        }
        let host = host.split('/').next().unwrap_or_default();
        let host = host.split(':').next().unwrap_or_default();

        if host.is_empty() {
            return Err(InspectError::invalid_input("host", "cannot be empty"));
        }

        Ok(Target::new(host, DEFAULT_PORT))
    }

    fn parse_url(input: &str, default_port: u16) -> Result<Target, InspectError> {
        let url = Url::parse(input).map_err(|e| InspectError::invalid_input("URL", e.to_string()))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| InspectError::invalid_input("URL", format!("{} has no host", input)))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');

        // url drops an explicit :443 on https URLs, so fall back to the scheme
        let port = match (url.port(), url.scheme()) {
            (Some(port), _) => port,
            (None, "https") => DEFAULT_PORT,
            (None, _) => default_port,
        };

        Ok(Target::new(host, port))
    }
}

/// `host:port`, bracketing IPv6 literals.
impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(port: &str) -> Result<u16, InspectError> {
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(InspectError::invalid_input("port number", port)),
        Ok(port) => Ok(port),
    }
}
