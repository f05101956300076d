//! Fixed-size frame header, parsed in place.
//!
//! Every frame starts with this 32-byte big-endian structure. A reader
//! pulls exactly one header off the stream, learns the payload length from
//! it, then reads exactly that many payload bytes.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    Opcode,
    errors::{ProtocolError, Result},
};

/// Fixed 32-byte frame header (big-endian network byte order).
///
/// Multi-byte fields are stored as raw byte arrays rather than integers,
/// which keeps the packed layout free of alignment hazards.
///
/// The session token travels here rather than inside any payload: it is call
/// metadata, stamped by the client's session layer into every outgoing
/// header. An all-zero token field means the call is anonymous.
///
/// # Security
///
/// `#[repr(C, packed)]` plus the zerocopy derives make casting from
/// untrusted network bytes safe: every 32-byte pattern is a structurally
/// valid header, so parsing cannot hit undefined behavior. The `Debug`
/// impl reports token presence, never token bytes.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    // Protocol identification (bytes 0-5)
    magic: [u8; 4], // 0x424E5452 ("BNTR" in ASCII)
    version: u8,    // 0x01
    _reserved: u8,  // zero

    // Request metadata (bytes 6-15)
    pub(crate) opcode: [u8; 2],       // u16 operation code
    request_id: [u8; 4],              // u32 client nonce for reply correlation
    pub(crate) payload_size: [u8; 4], // u32 payload length

    // Call credentials (bytes 16-31)
    token: [u8; 16], // session token, all zeroes = anonymous
}

impl FrameHeader {
    /// Size of the serialized header (32 bytes).
    pub const SIZE: usize = 32;

    /// Magic number: "BNTR" in ASCII (0x424E5452).
    pub const MAGIC: u32 = 0x424E_5452;

    /// Current protocol version.
    pub const VERSION: u8 = 0x01;

    /// Maximum payload size (64 KiB). Chat payloads are small; anything
    /// larger is malformed or hostile.
    pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024;

    /// Size of the session token field in bytes.
    pub const TOKEN_SIZE: usize = 16;

    /// Fresh anonymous header for the given opcode.
    ///
    /// Request id and payload size start at zero; [`crate::Frame::new`]
    /// fills in the size and the command layer stamps the rest.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        Self {
            magic: Self::MAGIC.to_be_bytes(),
            version: Self::VERSION,
            _reserved: 0,
            opcode: opcode.to_u16().to_be_bytes(),
            request_id: [0; 4],
            payload_size: [0; 4],
            token: [0; 16],
        }
    }

    /// Parse a header from the front of `bytes` without copying.
    ///
    /// The prefix is cast to a `FrameHeader` reference via `zerocopy`, then
    /// validated cheapest-check-first so garbage input fails early.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::FrameTooShort`] when fewer than 32 bytes arrive
    /// - [`ProtocolError::InvalidMagic`] when the magic does not match
    /// - [`ProtocolError::UnsupportedVersion`] for any version other than
    ///   0x01
    /// - [`ProtocolError::PayloadTooLarge`] when the announced payload
    ///   exceeds the 64 KiB limit
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let (header, _rest) =
            Self::ref_from_prefix(bytes).map_err(|_| ProtocolError::FrameTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?;

        if header.magic != Self::MAGIC.to_be_bytes() {
            return Err(ProtocolError::InvalidMagic);
        }

        if header.version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header.version));
        }

        let announced = u32::from_be_bytes(header.payload_size);
        if announced > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: announced as usize,
                max: Self::MAX_PAYLOAD_SIZE as usize,
            });
        }

        Ok(header)
    }

    /// The header in its 32-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out.copy_from_slice(self.as_bytes());
        out
    }

    /// Protocol magic number (0x424E5452 = "BNTR").
    #[must_use]
    pub fn magic(&self) -> u32 {
        u32::from_be_bytes(self.magic)
    }

    /// Wire format version this header announces.
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Raw operation code, exactly as carried on the wire.
    #[must_use]
    pub fn opcode(&self) -> u16 {
        u16::from_be_bytes(self.opcode)
    }

    /// Operation code mapped into [`Opcode`], or `None` for values this
    /// build does not know.
    #[must_use]
    pub fn opcode_enum(&self) -> Option<Opcode> {
        Opcode::from_u16(self.opcode())
    }

    /// Correlation nonce chosen by the caller; the matching reply echoes it.
    #[must_use]
    pub fn request_id(&self) -> u32 {
        u32::from_be_bytes(self.request_id)
    }

    /// Payload size in bytes (max 64 KiB).
    #[must_use]
    pub fn payload_size(&self) -> u32 {
        u32::from_be_bytes(self.payload_size)
    }

    /// Session token carried by this frame. `None` if anonymous.
    #[must_use]
    pub fn token(&self) -> Option<[u8; 16]> {
        if self.has_token() { Some(self.token) } else { None }
    }

    /// Whether this frame carries a session token.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token != [0u8; 16]
    }

    /// Stamp the correlation nonce the reply must echo.
    pub fn set_request_id(&mut self, request_id: u32) {
        self.request_id = request_id.to_be_bytes();
    }

    /// Set payload size.
    pub fn set_payload_size(&mut self, size: u32) {
        self.payload_size = size.to_be_bytes();
    }

    /// Stamp a session token into the header.
    ///
    /// An all-zero token is indistinguishable from anonymous; the server
    /// never issues one.
    pub fn set_token(&mut self, token: [u8; 16]) {
        self.token = token;
    }

    /// Clear the token field, making the frame anonymous.
    pub fn clear_token(&mut self) {
        self.token = [0u8; 16];
    }
}

// Debug is hand-written: the packed repr rules out the derive, and the
// token must render as presence only.
impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("magic", &format_args!("{:#010x}", self.magic()))
            .field("version", &self.version())
            .field("opcode", &format_args!("{:#06x}", self.opcode()))
            .field("request_id", &self.request_id())
            .field("payload_size", &self.payload_size())
            .field("token", &if self.has_token() { "<redacted>" } else { "<anonymous>" })
            .finish()
    }
}

// Equality over the wire form; the packed repr rules out the derive here
// too.
impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for FrameHeader {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            (
                any::<[u8; 2]>(),
                any::<u32>(),
                0u32..=Self::MAX_PAYLOAD_SIZE,
                any::<[u8; 16]>(),
            )
                .prop_map(|(opcode, request_id, payload_size, token)| Self {
                    magic: Self::MAGIC.to_be_bytes(),
                    version: Self::VERSION,
                    _reserved: 0,
                    opcode,
                    request_id: request_id.to_be_bytes(),
                    payload_size: payload_size.to_be_bytes(),
                    token,
                })
                .boxed()
        }
    }

    /// 32 zeroed bytes with valid magic and version stamped in.
    fn wire_bytes() -> [u8; FrameHeader::SIZE] {
        let mut buf = [0u8; FrameHeader::SIZE];
        buf[0..4].copy_from_slice(&FrameHeader::MAGIC.to_be_bytes());
        buf[4] = FrameHeader::VERSION;
        buf
    }

    #[test]
    fn layout_is_exactly_32_bytes() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
    }

    proptest! {
        #[test]
        fn parse_inverts_serialize(header in any::<FrameHeader>()) {
            let bytes = header.to_bytes();
            let parsed = FrameHeader::from_bytes(&bytes).expect("parse");
            prop_assert_eq!(&header, parsed);
        }

        #[test]
        fn parsed_headers_satisfy_protocol_bounds(header in any::<FrameHeader>()) {
            prop_assert_eq!(header.magic(), FrameHeader::MAGIC);
            prop_assert_eq!(header.version(), FrameHeader::VERSION);
            prop_assert!(header.payload_size() <= FrameHeader::MAX_PAYLOAD_SIZE);
        }
    }

    #[test]
    fn new_header_is_anonymous() {
        let header = FrameHeader::new(Opcode::Login);
        assert!(!header.has_token());
        assert_eq!(header.token(), None);
        assert_eq!(header.opcode_enum(), Some(Opcode::Login));
        assert_eq!(header.payload_size(), 0);
    }

    #[test]
    fn token_set_and_clear() {
        let mut header = FrameHeader::new(Opcode::SendMessage);
        let token = [7u8; FrameHeader::TOKEN_SIZE];

        header.set_token(token);
        assert!(header.has_token());
        assert_eq!(header.token(), Some(token));

        header.clear_token();
        assert!(!header.has_token());
    }

    #[test]
    fn debug_never_shows_token_bytes() {
        let mut header = FrameHeader::new(Opcode::SendMessage);
        header.set_token([0xAB; FrameHeader::TOKEN_SIZE]);

        let rendered = format!("{header:?}");
        assert!(rendered.contains("<redacted>"));
        // 0xAB = 171; the byte value must not leak in any rendering
        assert!(!rendered.contains("171"));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let bytes = wire_bytes();
        let result = FrameHeader::from_bytes(&bytes[..20]);
        assert_eq!(result, Err(ProtocolError::FrameTooShort { expected: 32, actual: 20 }));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut buf = wire_bytes();
        buf[0] ^= 0xFF;

        assert_eq!(FrameHeader::from_bytes(&buf), Err(ProtocolError::InvalidMagic));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut buf = wire_bytes();
        buf[4] = 0x7E;

        assert_eq!(
            FrameHeader::from_bytes(&buf),
            Err(ProtocolError::UnsupportedVersion(0x7E))
        );
    }

    #[test]
    fn announced_payload_over_limit_is_rejected() {
        let mut buf = wire_bytes();
        buf[12..16].copy_from_slice(&(FrameHeader::MAX_PAYLOAD_SIZE + 1).to_be_bytes());

        let result = FrameHeader::from_bytes(&buf);
        assert!(matches!(result, Err(ProtocolError::PayloadTooLarge { .. })));
    }
}
