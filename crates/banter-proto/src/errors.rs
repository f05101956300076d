//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
///
/// Derives `Clone` and `PartialEq` so callers can store and compare decode
/// failures (stream synchronizers retain the terminal error for display).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Buffer is shorter than a frame header.
    #[error("frame too short: expected {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required.
        expected: usize,
        /// Number of bytes available.
        actual: usize,
    },

    /// Magic number does not identify a Banter frame.
    #[error("invalid magic number")]
    InvalidMagic,

    /// Protocol version is not supported by this implementation.
    #[error("unsupported protocol version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// Payload exceeds the protocol size limit.
    #[error("payload too large: {size} bytes exceeds maximum {max}")]
    PayloadTooLarge {
        /// Claimed or actual payload size.
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },

    /// Buffer ends before the payload the header claims.
    #[error("frame truncated: header claims {expected} payload bytes, got {actual}")]
    FrameTruncated {
        /// Payload size claimed by the header.
        expected: usize,
        /// Payload bytes actually present.
        actual: usize,
    },

    /// CBOR serialization failed.
    #[error("CBOR encode error: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed or the opcode is unrecognized.
    #[error("CBOR decode error: {0}")]
    CborDecode(String),
}
