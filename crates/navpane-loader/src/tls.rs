//! HTTPS support backed by rustls + ring.
//!
//! Enabled by the `tls-rustls` feature.

use std::net::TcpStream;
use std::sync::Arc;

use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use rustls_pki_types::ServerName;

use crate::http::{HttpError, HttpResult};

/// Shared TLS client configuration trusting Mozilla's root CA bundle.
pub struct TlsConnector {
    config: Arc<ClientConfig>,
}

impl TlsConnector {
    pub fn new() -> Self {
        let root_store = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();
        Self {
            config: Arc::new(config),
        }
    }

    /// Wrap a connected socket. The handshake runs on first I/O.
    pub fn connect(
        &self,
        tcp: TcpStream,
        host: &str,
    ) -> HttpResult<StreamOwned<ClientConnection, TcpStream>> {
        let bare = host.trim_start_matches('[').trim_end_matches(']');
        let sni = ServerName::try_from(bare.to_owned())
            .map_err(|e| HttpError::Tls(format!("invalid server name `{host}`: {e}")))?;
        let conn = ClientConnection::new(Arc::clone(&self.config), sni)
            .map_err(|e| HttpError::Tls(format!("TLS init: {e}")))?;
        Ok(StreamOwned::new(conn, tcp))
    }
}

impl Default for TlsConnector {
    fn default() -> Self {
        Self::new()
    }
}
