//! Typed protocol messages and their CBOR wire form.
//!
//! Frame headers are raw binary for cheap framing, but payloads use CBOR for
//! type safety and forward compatibility. The `Payload` enum covers all
//! message types: session management (login, registration), chat, and the
//! friends/presence operations.
//!
//! CBOR was chosen because it is self-describing (field names embedded),
//! compact, and needs no code generation.
//!
//! # Invariants
//!
//! The variant-to-opcode mapping is bijective. `encode`, `decode`, and
//! `opcode()` all match exhaustively, so a new variant that is not wired
//! through every path fails to compile. Round trips must reproduce the
//! value exactly.

pub mod chat;
pub mod friends;
pub mod session;

use bytes::BufMut;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Frame, FrameHeader, Opcode,
    errors::{ProtocolError, Result},
};

/// All possible frame payloads.
///
/// The payload type is determined by the `Opcode` in the frame header, so we
/// serialize only the inner struct content (no variant tag in CBOR). Unlike
/// typical Rust enum serialization, the variant discriminator never travels
/// on the wire; this prevents mismatched opcode/payload pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    // Session
    /// Credentials login request.
    Login(session::Login),
    /// Login response carrying the session token.
    LoginReply(session::LoginReply),
    /// Account registration request.
    Register(session::Register),

    // Generic replies
    /// Success acknowledgement.
    Ack,

    // Chat
    /// Send a chat message.
    SendMessage(chat::OutboundMessage),
    /// Subscribe to the incoming message feed.
    SubscribeMessages,
    /// Server-pushed incoming message.
    InboundMessage(chat::InboundMessage),

    // Friends and presence
    /// Add a friend.
    AddFriend(friends::FriendRef),
    /// Remove a friend.
    RemoveFriend(friends::FriendRef),
    /// Request the full friends list.
    ListFriends,
    /// Full friends list response.
    FriendList(friends::FriendList),
    /// Subscribe to the presence feed.
    SubscribePresence,
    /// Server-pushed presence change.
    PresenceUpdate(friends::PresenceUpdate),

    // Failure reporting
    /// Error response.
    Error(ErrorPayload),
}

/// Body of a failure reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Machine-readable code, one of the constants on this type.
    pub code: u16,
    /// Operator-facing description of what was rejected.
    pub message: String,
}

impl ErrorPayload {
    /// Username/password pair was rejected.
    pub const INVALID_CREDENTIALS: u16 = 0x0001;
    /// The call requires a session token and none (or a stale one) was sent.
    pub const AUTH_REQUIRED: u16 = 0x0002;
    /// Referenced username does not exist.
    pub const UNKNOWN_USER: u16 = 0x0003;
    /// Username or email already taken, or friend already present.
    pub const ALREADY_EXISTS: u16 = 0x0004;
    /// Payload failed to decode or failed validation.
    pub const INVALID_PAYLOAD: u16 = 0x0005;
    /// Unspecified server-side failure.
    pub const INTERNAL: u16 = 0x0006;

    /// Create an invalid credentials error.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self { code: Self::INVALID_CREDENTIALS, message: "invalid credentials".to_string() }
    }

    /// Create an authentication required error.
    #[must_use]
    pub fn auth_required() -> Self {
        Self { code: Self::AUTH_REQUIRED, message: "authentication required".to_string() }
    }

    /// Create an unknown user error.
    pub fn unknown_user(username: impl Into<String>) -> Self {
        Self { code: Self::UNKNOWN_USER, message: format!("unknown user: {}", username.into()) }
    }

    /// Create an already exists error.
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self { code: Self::ALREADY_EXISTS, message: msg.into() }
    }

    /// Create an invalid payload error.
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self { code: Self::INVALID_PAYLOAD, message: msg.into() }
    }

    /// Create an internal server error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self { code: Self::INTERNAL, message: msg.into() }
    }
}

impl Payload {
    /// The opcode a frame carrying this payload must use.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Login(_) => Opcode::Login,
            Self::LoginReply(_) => Opcode::LoginReply,
            Self::Register(_) => Opcode::Register,
            Self::Ack => Opcode::Ack,
            Self::SendMessage(_) => Opcode::SendMessage,
            Self::SubscribeMessages => Opcode::SubscribeMessages,
            Self::InboundMessage(_) => Opcode::InboundMessage,
            Self::AddFriend(_) => Opcode::AddFriend,
            Self::RemoveFriend(_) => Opcode::RemoveFriend,
            Self::ListFriends => Opcode::ListFriends,
            Self::FriendList(_) => Opcode::FriendList,
            Self::SubscribePresence => Opcode::SubscribePresence,
            Self::PresenceUpdate(_) => Opcode::PresenceUpdate,
            Self::Error(_) => Opcode::Error,
        }
    }

    /// Encode payload to buffer.
    ///
    /// Serializes only the inner struct, NOT the variant tag; the frame
    /// header's opcode already identifies the payload type. Size limits are
    /// enforced later in [`Frame::encode`], not here.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::CborEncode`] when the inner struct cannot be
    ///   written as CBOR
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let mut writer = dst.writer();

        match self {
            Self::Login(inner) => write_cbor(inner, &mut writer),
            Self::LoginReply(inner) => write_cbor(inner, &mut writer),
            Self::Register(inner) => write_cbor(inner, &mut writer),
            Self::SendMessage(inner) => write_cbor(inner, &mut writer),
            Self::InboundMessage(inner) => write_cbor(inner, &mut writer),
            Self::AddFriend(inner) | Self::RemoveFriend(inner) => {
                write_cbor(inner, &mut writer)
            },
            Self::FriendList(inner) => write_cbor(inner, &mut writer),
            Self::PresenceUpdate(inner) => write_cbor(inner, &mut writer),
            Self::Error(inner) => write_cbor(inner, &mut writer),
            // Zero-byte payloads
            Self::Ack | Self::SubscribeMessages | Self::ListFriends | Self::SubscribePresence => {
                Ok(())
            },
        }
    }

    /// Decode payload from bytes based on opcode.
    ///
    /// The size check happens BEFORE CBOR parsing begins, so the parser
    /// never processes oversized input.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::PayloadTooLarge`] when `bytes` is longer than the
    ///   64 KiB limit
    /// - [`ProtocolError::CborDecode`] when the bytes are not the CBOR shape
    ///   the opcode demands
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        if bytes.len() > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size: bytes.len(),
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        let payload = match opcode {
            Opcode::Login => Self::Login(read_cbor(bytes)?),
            Opcode::LoginReply => Self::LoginReply(read_cbor(bytes)?),
            Opcode::Register => Self::Register(read_cbor(bytes)?),
            Opcode::Ack => Self::Ack,
            Opcode::SendMessage => Self::SendMessage(read_cbor(bytes)?),
            Opcode::SubscribeMessages => Self::SubscribeMessages,
            Opcode::InboundMessage => Self::InboundMessage(read_cbor(bytes)?),
            Opcode::AddFriend => Self::AddFriend(read_cbor(bytes)?),
            Opcode::RemoveFriend => Self::RemoveFriend(read_cbor(bytes)?),
            Opcode::ListFriends => Self::ListFriends,
            Opcode::FriendList => Self::FriendList(read_cbor(bytes)?),
            Opcode::SubscribePresence => Self::SubscribePresence,
            Opcode::PresenceUpdate => Self::PresenceUpdate(read_cbor(bytes)?),
            Opcode::Error => Self::Error(read_cbor(bytes)?),
        };

        Ok(payload)
    }

    /// Convert payload into a transport frame.
    ///
    /// Encodes the payload to CBOR bytes, sets the matching opcode in the
    /// header, and creates a Frame with automatic `payload_size`
    /// calculation. Token and request id already present in the header are
    /// preserved.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::CborEncode`] when the payload cannot be written as
    ///   CBOR
    pub fn into_frame(self, mut header: FrameHeader) -> Result<Frame> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        header.opcode = self.opcode().to_u16().to_be_bytes();
        Ok(Frame::new(header, buf))
    }

    /// Parse payload from a raw transport frame.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::CborDecode`] for an unassigned opcode or malformed
    ///   CBOR
    /// - [`ProtocolError::PayloadTooLarge`] when the payload exceeds the
    ///   64 KiB limit
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode = frame.header.opcode_enum().ok_or_else(|| {
            ProtocolError::CborDecode(format!("unassigned opcode {:#06x}", frame.header.opcode()))
        })?;
        Self::decode(opcode, &frame.payload)
    }
}

/// Serialize one payload struct as CBOR into `writer`.
fn write_cbor<T: Serialize, W: std::io::Write>(value: &T, writer: W) -> Result<()> {
    ciborium::ser::into_writer(value, writer).map_err(|e| ProtocolError::CborEncode(e.to_string()))
}

/// Deserialize one payload struct from CBOR bytes.
fn read_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_ack_round_trip() {
        let payload = Payload::Ack;

        let frame = payload.clone().into_frame(FrameHeader::new(Opcode::Ack)).expect("frame");
        assert_eq!(frame.payload.len(), 0);

        let decoded = Payload::from_frame(&frame).expect("decode");
        assert_eq!(payload, decoded);
    }

    #[test]
    fn error_reply_round_trip() {
        let payload = Payload::Error(ErrorPayload::unknown_user("mallory"));

        let frame = payload.clone().into_frame(FrameHeader::new(Opcode::Error)).expect("frame");
        let decoded = Payload::from_frame(&frame).expect("decode");
        assert_eq!(payload, decoded);
    }

    #[test]
    fn into_frame_sets_opcode() {
        let payload = Payload::SendMessage(chat::OutboundMessage {
            to: "bob".to_string(),
            data: "hi".to_string(),
        });

        // Header starts with a different opcode; into_frame must correct it
        let frame = payload.into_frame(FrameHeader::new(Opcode::Ack)).expect("frame");
        assert_eq!(frame.header.opcode_enum(), Some(Opcode::SendMessage));
    }

    #[test]
    fn into_frame_preserves_token() {
        let mut header = FrameHeader::new(Opcode::ListFriends);
        header.set_token([9u8; 16]);
        header.set_request_id(42);

        let frame = Payload::ListFriends.into_frame(header).expect("frame");
        assert_eq!(frame.header.token(), Some([9u8; 16]));
        assert_eq!(frame.header.request_id(), 42);
    }

    #[test]
    fn mismatched_payload_rejected() {
        // FriendList bytes decoded as Login must fail, not alias
        let list = friends::FriendList { friends: vec![] };
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&list, &mut bytes).expect("encode");

        let result = Payload::decode(Opcode::Login, &bytes);
        assert!(matches!(result, Err(ProtocolError::CborDecode(_))));
    }
}
