//! QUIC transport.
//!
//! Maps the two call shapes onto QUIC bidirectional streams: a unary call
//! is one stream carrying one request frame and one reply frame; a
//! subscription is one stream carrying the request frame and then
//! server-pushed frames until the server finishes it.
//!
//! Certificate verification is disabled: this client targets development
//! servers with self-signed certificates.

use std::{
    net::{Ipv4Addr, Ipv6Addr, SocketAddr},
    sync::Arc,
};

use banter_proto::{Frame, FrameHeader};
use quinn::{ClientConfig, Endpoint, IdleTimeout, RecvStream, SendStream, VarInt};
use rustls::{
    DigitallySignedStruct, SignatureScheme,
    client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier},
    pki_types::{CertificateDer, ServerName, UnixTime},
};
use thiserror::Error;
use tracing::debug;

use crate::{
    error::{RemoteError, StreamError},
    transport::{FrameSource, Transport},
};

/// ALPN protocol id; must match the server.
const ALPN: &[u8] = b"banter";

/// Connections idle longer than this are dropped by QUIC.
const IDLE_TIMEOUT_MS: u32 = 30_000;

/// Failures while establishing the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint or TLS configuration could not be built.
    #[error("transport setup failed: {0}")]
    Setup(String),

    /// The server could not be reached or refused the handshake.
    #[error("connect failed: {0}")]
    Connect(String),
}

/// Open QUIC connection implementing [`Transport`].
///
/// Cheap to clone; every call and subscription opens its own stream on the
/// shared connection.
#[derive(Clone)]
pub struct Connection {
    connection: quinn::Connection,
    // Keeps the endpoint driver alive as long as any clone exists.
    _endpoint: Endpoint,
}

impl Connection {
    /// Address of the server this connection talks to.
    #[must_use]
    pub fn remote_address(&self) -> SocketAddr {
        self.connection.remote_address()
    }

    /// Close the connection. Both subscription streams end with a
    /// transport error shortly after.
    pub fn close(&self) {
        self.connection.close(VarInt::from_u32(0), b"client closed");
    }
}

impl Transport for Connection {
    type Source = FrameStream;

    async fn call(&self, request: Frame) -> Result<Frame, RemoteError> {
        let (send, mut recv) = self
            .connection
            .open_bi()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        write_request(send, &request).await.map_err(stream_to_remote)?;

        match read_frame(&mut recv).await.map_err(stream_to_remote)? {
            Some(reply) => Ok(reply),
            None => Err(RemoteError::Transport("stream closed before reply".to_owned())),
        }
    }

    async fn subscribe(&self, request: Frame) -> Result<FrameStream, StreamError> {
        let (send, recv) = self
            .connection
            .open_bi()
            .await
            .map_err(|e| StreamError::Transport(e.to_string()))?;

        write_request(send, &request).await?;
        Ok(FrameStream { recv })
    }
}

/// Server-push side of one subscription stream.
pub struct FrameStream {
    recv: RecvStream,
}

impl FrameSource for FrameStream {
    async fn next_frame(&mut self) -> Result<Option<Frame>, StreamError> {
        read_frame(&mut self.recv).await
    }
}

/// Connect to a chat server.
///
/// # Errors
///
/// Returns [`TransportError`] if the local endpoint cannot be configured
/// or the server refuses the connection.
pub async fn connect(addr: SocketAddr) -> Result<Connection, TransportError> {
    let bind: SocketAddr = match addr {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };

    let mut endpoint =
        Endpoint::client(bind).map_err(|e| TransportError::Setup(e.to_string()))?;
    endpoint.set_default_client_config(insecure_client_config()?);

    debug!(%addr, "connecting");
    let connection = endpoint
        .connect(addr, "localhost")
        .map_err(|e| TransportError::Connect(e.to_string()))?
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;
    debug!(%addr, "connected");

    Ok(Connection { connection, _endpoint: endpoint })
}

/// Write one request frame and half-close the stream.
///
/// The half-close tells the server the request is complete.
async fn write_request(mut send: SendStream, request: &Frame) -> Result<(), StreamError> {
    let mut wire = Vec::with_capacity(FrameHeader::SIZE + request.payload.len());
    request.encode(&mut wire)?;

    send.write_all(&wire).await.map_err(|e| StreamError::Transport(e.to_string()))?;
    send.finish().map_err(|e| StreamError::Transport(e.to_string()))?;
    Ok(())
}

/// Read one frame: exact header, then exactly the payload it announces.
///
/// `Ok(None)` when the server finished the stream on a frame boundary.
async fn read_frame(recv: &mut RecvStream) -> Result<Option<Frame>, StreamError> {
    let mut header_buf = [0u8; FrameHeader::SIZE];
    match recv.read_exact(&mut header_buf).await {
        Ok(()) => {},
        Err(quinn::ReadExactError::FinishedEarly(0)) => return Ok(None),
        Err(err) => return Err(StreamError::Transport(err.to_string())),
    }

    let header = *FrameHeader::from_bytes(&header_buf)?;

    let mut payload = vec![0u8; header.payload_size() as usize];
    recv.read_exact(&mut payload)
        .await
        .map_err(|err| StreamError::Transport(err.to_string()))?;

    Ok(Some(Frame::new(header, payload)))
}

fn stream_to_remote(err: StreamError) -> RemoteError {
    match err {
        StreamError::Protocol(err) => RemoteError::Protocol(err),
        StreamError::Transport(msg) => RemoteError::Transport(msg),
        other => RemoteError::Transport(other.to_string()),
    }
}

fn insecure_client_config() -> Result<ClientConfig, TransportError> {
    let mut crypto = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(InsecureCertVerifier))
        .with_no_client_auth();

    // Must match the server's ALPN protocol.
    crypto.alpn_protocols = vec![ALPN.to_vec()];

    let crypto = quinn::crypto::rustls::QuicClientConfig::try_from(crypto)
        .map_err(|e| TransportError::Setup(e.to_string()))?;
    let mut config = ClientConfig::new(Arc::new(crypto));

    let mut transport = quinn::TransportConfig::default();
    transport.max_idle_timeout(Some(IdleTimeout::from(VarInt::from_u32(IDLE_TIMEOUT_MS))));
    config.transport_config(Arc::new(transport));

    Ok(config)
}

/// Accepts any server certificate. Development wiring only.
#[derive(Debug)]
struct InsecureCertVerifier;

impl ServerCertVerifier for InsecureCertVerifier {
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
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}
