//! Byte-stream transports for the session
//!
//! The session only needs something it can split into a line reader and a
//! writer; tests plug in an in-memory duplex pipe.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::BotError;

/// Opens a fresh stream to the chat server
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    fn connect(&self) -> impl Future<Output = io::Result<Self::Stream>> + Send;

    /// Human-readable endpoint (for logging)
    fn endpoint(&self) -> String;
}

/// Plain TCP
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self) -> io::Result<TcpStream> {
        TcpStream::connect((self.host.as_str(), self.port)).await
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TCP wrapped in TLS, verified against the bundled web PKI roots
#[derive(Clone)]
pub struct TlsConnector {
    host: String,
    port: u16,
    server_name: ServerName<'static>,
    inner: tokio_rustls::TlsConnector,
}

impl std::fmt::Debug for TlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl TlsConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, BotError> {
        let host = host.into();
        let server_name = ServerName::try_from(host.clone())
            .map_err(|e| BotError::Tls(format!("invalid server name {}: {}", host, e)))?;

        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            host,
            port,
            server_name,
            inner: tokio_rustls::TlsConnector::from(Arc::new(config)),
        })
    }
}

impl Connector for TlsConnector {
    type Stream = TlsStream<TcpStream>;

    async fn connect(&self) -> io::Result<TlsStream<TcpStream>> {
        let tcp = TcpStream::connect((self.host.as_str(), self.port)).await?;
        self.inner.connect(self.server_name.clone(), tcp).await
    }

    fn endpoint(&self) -> String {
        format!("{}:{} (tls)", self.host, self.port)
    }
}
