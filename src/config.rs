//! Configuration file management for certviewer.
//!
//! This module handles loading, parsing, and merging configuration from TOML files
//! and command-line arguments.
//!
//! # Configuration Precedence
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (certviewer.toml or specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! # Example Configuration File
//!
//! ```toml
//! port = 443
//! output = "text"
//! timeout = 30
//! exit_code = 2
//! show_chain = false
//! strict_wildcards = false
//!
//! [trust]
//! insecure = false
//! ca_file = "/etc/ssl/certs/internal-ca.pem"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::connector::{TrustConfig, DEFAULT_TIMEOUT};
use crate::report::OutputFormat;
use crate::target::DEFAULT_PORT;
use crate::verify::WildcardPolicy;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "certviewer.toml";

/// Main configuration structure.
///
/// All fields are optional to support partial configuration and merging.
/// Missing values will be filled in by defaults or overridden by CLI arguments.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Port used when the target names none
    pub port: Option<u16>,
    /// Output format: text, json, summary
    pub output: Option<OutputFormat>,
    /// Connect, read and write timeout in seconds
    pub timeout: Option<u64>,
    /// Exit code to use when the certificate is invalid for the host
    pub exit_code: Option<i32>,
    /// Append the presented chain to text reports
    pub show_chain: Option<bool>,
    /// Restrict wildcards to a single leftmost label
    pub strict_wildcards: Option<bool>,
    /// Trust anchors for the handshake
    pub trust: Option<TrustSettings>,
}

/// Which certificates the handshake accepts.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TrustSettings {
    /// Skip trust verification entirely
    pub insecure: Option<bool>,
    /// PEM bundle to trust instead of the system store
    pub ca_file: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully parsed configuration
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads `path` when given, otherwise [`DEFAULT_CONFIG_FILE`] if it
    /// exists, otherwise an empty configuration.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Config::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Config::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Config::default()),
        }
    }

    /// Configuration holding every default value.
    ///
    /// # Default Values
    ///
    /// - `port`: 443
    /// - `output`: "text"
    /// - `timeout`: 30 seconds
    /// - `exit_code`: 0 (don't fail on invalid certificates)
    /// - `show_chain`: false
    /// - `strict_wildcards`: false
    /// - `trust`: system store
    pub fn defaults() -> Self {
        Config {
            port: Some(DEFAULT_PORT),
            output: Some(OutputFormat::Text),
            timeout: Some(DEFAULT_TIMEOUT.as_secs()),
            exit_code: Some(0),
            show_chain: Some(false),
            strict_wildcards: Some(false),
            trust: Some(TrustSettings {
                insecure: Some(false),
                ca_file: None,
            }),
        }
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// For each field, if the `other` config has a value (Some), it overrides
    /// this config's value. If the `other` value is None, keeps the current value.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.exit_code.is_some() {
            self.exit_code = other.exit_code;
        }
        if other.show_chain.is_some() {
            self.show_chain = other.show_chain;
        }
        if other.strict_wildcards.is_some() {
            self.strict_wildcards = other.strict_wildcards;
        }
        if let Some(other_trust) = other.trust {
            if let Some(ref mut self_trust) = self.trust {
                if other_trust.insecure.is_some() {
                    self_trust.insecure = other_trust.insecure;
                }
                if other_trust.ca_file.is_some() {
                    self_trust.ca_file = other_trust.ca_file;
                }
            } else {
                self.trust = Some(other_trust);
            }
        }
        self
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Flags that were not given should be passed as `None` (or `false` for
    /// switches) so they do not override the file.
    pub fn from_cli_args(
        output: Option<OutputFormat>,
        timeout: Option<u64>,
        exit_code: Option<i32>,
        show_chain: bool,
        strict_wildcards: bool,
        insecure: bool,
        ca_file: Option<PathBuf>,
    ) -> Self {
        Config {
            port: None,
            output,
            timeout,
            exit_code,
            show_chain: show_chain.then_some(true),
            strict_wildcards: strict_wildcards.then_some(true),
            trust: Some(TrustSettings {
                insecure: insecure.then_some(true),
                ca_file,
            }),
        }
    }

    pub fn default_port(&self) -> Result<u16, ConfigError> {
        match self.port.unwrap_or(DEFAULT_PORT) {
            0 => Err(ConfigError::Validation("port must be between 1 and 65535".to_string())),
            port => Ok(port),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }

    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        match self.timeout {
            Some(0) => Err(ConfigError::Validation(
                "timeout must be at least 1 second".to_string(),
            )),
            Some(secs) => Ok(Duration::from_secs(secs)),
            None => Ok(DEFAULT_TIMEOUT),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.unwrap_or(0)
    }

    pub fn show_chain(&self) -> bool {
        self.show_chain.unwrap_or(false)
    }

    pub fn wildcard_policy(&self) -> WildcardPolicy {
        if self.strict_wildcards.unwrap_or(false) {
            WildcardPolicy::SingleLabel
        } else {
            WildcardPolicy::Suffix
        }
    }

    pub fn trust_config(&self) -> Result<TrustConfig, ConfigError> {
        let trust = self.trust.clone().unwrap_or_default();
        match (trust.insecure.unwrap_or(false), trust.ca_file) {
            (true, Some(_)) => Err(ConfigError::Validation(
                "insecure and ca_file cannot be used together".to_string(),
            )),
            (true, None) => Ok(TrustConfig::AcceptAny),
            (false, Some(path)) => Ok(TrustConfig::CaFile(path)),
            (false, None) => Ok(TrustConfig::System),
        }
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            port: Some(443),
            output: Some(OutputFormat::Summary),
            timeout: Some(10),
            exit_code: Some(2),
            show_chain: Some(true),
            strict_wildcards: Some(false),
            trust: Some(TrustSettings {
                insecure: Some(false),
                ca_file: Some(PathBuf::from("/etc/ssl/certs/internal-ca.pem")),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    Parse(String),
    /// Validation error (conflicting or out-of-range values)
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
            ConfigError::Validation(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
