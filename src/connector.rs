//! Retrieval of the certificate chain a server presents.
//!
//! [`CertificateSource`] is the seam between inspection and the network:
//! [`OpenSslConnector`] performs a real TLS handshake, while tests can hand
//! back a prepared chain.

use openssl::ssl::{SslConnector, SslMethod, SslRef, SslVerifyMode};
use openssl::x509::{X509Ref, X509};
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::InspectError;

/// Default connect, read and write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Certificates as presented by the peer; the first one is the leaf.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    certificates: Vec<X509>,
}

impl CertificateChain {
    pub fn new(certificates: Vec<X509>) -> Result<CertificateChain, InspectError> {
        if certificates.is_empty() {
            return Err(InspectError::certificate("server presented no certificates"));
        }
        Ok(CertificateChain { certificates })
    }

    pub fn leaf(&self) -> &X509Ref {
        &self.certificates[0]
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &X509Ref> {
        self.certificates.iter().map(|cert| &**cert)
    }
}

/// Anything that can produce the certificate chain for `host:port`.
pub trait CertificateSource {
    fn fetch(&self, host: &str, port: u16) -> Result<CertificateChain, InspectError>;
}

/// Trust anchors used to complete the handshake.
///
/// Whatever is chosen here only decides whether the handshake succeeds;
/// validity and hostname are always checked separately.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrustConfig {
    /// The platform's default trust store. OpenSSL also rejects expired and
    /// not yet valid certificates here, so those servers fail the handshake.
    #[default]
    System,
    /// A PEM bundle of trusted certificates
    CaFile(PathBuf),
    /// No verification at all; needed to report on expired certificates
    AcceptAny,
}

/// Fetches certificate chains over TLS with OpenSSL.
#[derive(Debug, Clone)]
pub struct OpenSslConnector {
    trust: TrustConfig,
    timeout: Duration,
}

impl Default for OpenSslConnector {
    fn default() -> Self {
        OpenSslConnector::new(TrustConfig::System, DEFAULT_TIMEOUT)
    }
}

impl OpenSslConnector {
    pub fn new(trust: TrustConfig, timeout: Duration) -> Self {
        OpenSslConnector { trust, timeout }
    }

    fn build_connector(&self) -> Result<SslConnector, InspectError> {
        let mut builder = SslConnector::builder(SslMethod::tls_client())?;
        match &self.trust {
            TrustConfig::System => {}
            TrustConfig::CaFile(path) => builder.set_ca_file(path)?,
            TrustConfig::AcceptAny => builder.set_verify(SslVerifyMode::NONE),
        }
        Ok(builder.build())
    }

    fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr, InspectError> {
        let dns_error = |source: io::Error| InspectError::DnsResolution {
            hostname: host.to_string(),
            source,
        };

        (host, port)
            .to_socket_addrs()
            .map_err(dns_error)?
            .next()
            .ok_or_else(|| {
                dns_error(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no addresses returned",
                ))
            })
    }

    fn open(&self, address: &SocketAddr) -> Result<TcpStream, InspectError> {
        let tcp_stream = TcpStream::connect_timeout(address, self.timeout).map_err(|source| {
            if source.kind() == io::ErrorKind::TimedOut {
                InspectError::Timeout {
                    operation: format!("connecting to {} after {:?}", address, self.timeout),
                }
            } else {
                InspectError::ConnectionFailed {
                    address: address.to_string(),
                    source,
                }
            }
        })?;
        tcp_stream.set_read_timeout(Some(self.timeout))?;
        tcp_stream.set_write_timeout(Some(self.timeout))?;
        Ok(tcp_stream)
    }
}

impl CertificateSource for OpenSslConnector {
    /// Connects, completes the handshake and returns the peer's chain.
    ///
    /// The socket belongs to the TLS stream (or to the handshake error) and
    /// is closed when that value drops, on success and failure alike.
    fn fetch(&self, host: &str, port: u16) -> Result<CertificateChain, InspectError> {
        let connector = self.build_connector()?;
        let address = self.resolve(host, port)?;
        debug!(host, %address, trust = ?self.trust, "connecting");

        let tcp_stream = self.open(&address)?;
        let mut stream = connector
            .configure()?
            .verify_hostname(false)
            .connect(host, tcp_stream)?;
        debug!(
            version = stream.ssl().version_str(),
            cipher = stream.ssl().current_cipher().map(|c| c.name()).unwrap_or("unknown"),
            "handshake complete"
        );

        let chain = peer_chain(stream.ssl());
        if let Err(e) = stream.shutdown() {
            debug!(error = %e, "TLS shutdown was not clean");
        }
        CertificateChain::new(chain)
    }
}

fn peer_chain(ssl: &SslRef) -> Vec<X509> {
    let chain: Vec<X509> = ssl
        .peer_cert_chain()
        .map(|stack| stack.iter().map(|cert| cert.to_owned()).collect())
        .unwrap_or_default();
    if !chain.is_empty() {
        return chain;
    }
    ssl.peer_certificate().into_iter().collect()
}
