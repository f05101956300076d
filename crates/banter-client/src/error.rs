//! Error types for client operations.

use banter_proto::{ErrorPayload, ProtocolError};
use thiserror::Error;

/// Errors surfaced by unary command calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The transport failed before a reply arrived.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server rejected the command.
    #[error("rejected by server (code {code:#06x}): {message}")]
    Rejected {
        /// Machine-readable error code from the reply.
        code: u16,
        /// Human-readable description from the reply.
        message: String,
    },

    /// The server replied with a payload the command does not accept.
    #[error("unexpected reply: wanted {expected}, got opcode {opcode:#06x}")]
    UnexpectedReply {
        /// What the command was waiting for.
        expected: &'static str,
        /// Opcode of the frame that arrived instead.
        opcode: u16,
    },

    /// The reply echoes a request id other than the one sent.
    #[error("mismatched reply: request {sent} answered with id {received}")]
    MismatchedReply {
        /// Id stamped into the request header.
        sent: u32,
        /// Id echoed back in the reply header.
        received: u32,
    },
}

impl From<ErrorPayload> for RemoteError {
    fn from(err: ErrorPayload) -> Self {
        Self::Rejected {
            code: err.code,
            message: err.message,
        }
    }
}

/// Errors surfaced by authentication and registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The server did not accept the supplied credentials.
    #[error("invalid username or password")]
    BadCredentials,

    /// The operation requires a session token but none is held.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A token is already held and cannot be replaced.
    #[error("session is already authenticated")]
    AlreadyAuthenticated,

    /// The call failed for a reason other than credentials.
    #[error(transparent)]
    Remote(RemoteError),
}

impl AuthError {
    /// Maps a failed login call onto the auth taxonomy.
    ///
    /// Credential rejections become [`AuthError::BadCredentials`] and
    /// missing-token rejections [`AuthError::NotAuthenticated`]; every other
    /// failure is passed through unchanged.
    pub(crate) fn from_remote(err: RemoteError) -> Self {
        match err {
            RemoteError::Rejected { code, .. } if code == ErrorPayload::INVALID_CREDENTIALS => {
                Self::BadCredentials
            }
            RemoteError::Rejected { code, .. } if code == ErrorPayload::AUTH_REQUIRED => {
                Self::NotAuthenticated
            }
            other => Self::Remote(other),
        }
    }
}

/// Errors surfaced by subscription streams.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The underlying connection failed mid-stream.
    #[error("stream transport failure: {0}")]
    Transport(String),

    /// A frame on the stream could not be decoded.
    #[error("stream protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server terminated the stream with an error frame.
    #[error("stream closed by server (code {code:#06x}): {message}")]
    Remote {
        /// Machine-readable error code from the terminating frame.
        code: u16,
        /// Human-readable description from the terminating frame.
        message: String,
    },

    /// A well-formed frame of the wrong kind arrived on the stream.
    #[error("unexpected stream frame: wanted {expected}, got opcode {opcode:#06x}")]
    UnexpectedFrame {
        /// What the stream carries.
        expected: &'static str,
        /// Opcode of the frame that arrived instead.
        opcode: u16,
    },

    /// The synchronizer was already started once.
    #[error("synchronizer already started")]
    AlreadyStarted,
}

impl From<ErrorPayload> for StreamError {
    fn from(err: ErrorPayload) -> Self {
        Self::Remote {
            code: err.code,
            message: err.message,
        }
    }
}
