//! Banter wire protocol.
//!
//! Defines the frame format shared by the client and the chat server: a
//! fixed 32-byte binary header ([`FrameHeader`]) followed by a CBOR-encoded
//! payload ([`Payload`]). The header carries the opcode, a request id for
//! reply correlation, and the session token as out-of-band call metadata.
//!
//! # Components
//!
//! - [`FrameHeader`]: fixed-size header with zero-copy parsing
//! - [`Frame`]: header plus raw payload bytes (transport unit)
//! - [`Opcode`]: operation codes routing payload decoding
//! - [`Payload`]: typed payloads, CBOR on the wire
//! - [`ErrorPayload`]: error frames with stable error codes

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod frame;
mod header;
mod opcode;

pub mod errors;
pub mod payloads;

pub use errors::ProtocolError;
pub use frame::Frame;
pub use header::FrameHeader;
pub use opcode::Opcode;
pub use payloads::{ErrorPayload, Payload};
