//! Client transport credentials
//!
//! Two modes, selected by `TlsConfig`:
//! - verify: the remote chain is validated against the configured CA bundle
//! - enable only: any remote certificate is accepted (handshake signatures are
//!   still checked)
//!
//! Both modes present the client certificate and key.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::ResolvesClientCert;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::debug;

use crate::application::ConnectionError;
use crate::config::TlsConfig;

/// How the remote certificate is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerVerification {
    Verify,
    Skip,
}

/// Certificate material securing the channel to the remote service.
#[derive(Debug, Clone)]
pub struct TransportCredential {
    config: Arc<ClientConfig>,
    verification: ServerVerification,
}

impl TransportCredential {
    /// Build a credential from TLS settings whose paths are already expanded.
    ///
    /// Fails with `TlsConfigInvalid` naming the first file that cannot be used.
    pub fn build(tls: &TlsConfig) -> Result<Self, ConnectionError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| invalid(&tls.cert, e))?;

        let (builder, verification) = if tls.verify {
            let roots = load_roots(&tls.ca_cert)?;
            debug!("TLS: verifying remote against {}", tls.ca_cert.display());
            (builder.with_root_certificates(roots), ServerVerification::Verify)
        } else {
            debug!("TLS: remote certificate will not be verified");
            let verifier = Arc::new(SkipServerVerification(provider));
            (
                builder.dangerous().with_custom_certificate_verifier(verifier),
                ServerVerification::Skip,
            )
        };

        let certs = load_certs(&tls.cert)?;
        let key = load_key(&tls.key)?;
        let config = builder
            .with_client_auth_cert(certs, key)
            .map_err(|e| invalid(&tls.key, e))?;

        Ok(Self {
            config: Arc::new(config),
            verification,
        })
    }

    pub fn verification(&self) -> ServerVerification {
        self.verification
    }

    pub fn verifies_server(&self) -> bool {
        self.verification == ServerVerification::Verify
    }

    /// Whether a client certificate is presented on handshake.
    pub fn presents_client_cert(&self) -> bool {
        self.config.client_auth_cert_resolver.has_certs()
    }

    pub fn client_config(&self) -> Arc<ClientConfig> {
        Arc::clone(&self.config)
    }
}

fn invalid(path: &Path, err: impl std::fmt::Display) -> ConnectionError {
    ConnectionError::TlsConfigInvalid {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn open(path: &Path) -> Result<BufReader<File>, ConnectionError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| invalid(path, e))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, ConnectionError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid(path, e))?;
    if certs.is_empty() {
        return Err(invalid(path, "no PEM certificates found"));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, ConnectionError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| invalid(path, e))?
        .ok_or_else(|| invalid(path, "no PEM private key found"))
}

fn load_roots(path: &Path) -> Result<RootCertStore, ConnectionError> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(path)? {
        roots.add(cert).map_err(|e| invalid(path, e))?;
    }
    Ok(roots)
}

/// Accepts any server certificate; signatures are still verified.
#[derive(Debug)]
struct SkipServerVerification(Arc<CryptoProvider>);

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
