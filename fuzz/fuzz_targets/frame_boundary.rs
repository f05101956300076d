//! Structured fuzzing of frame header edge values.
//!
//! Instead of raw bytes, `arbitrary` picks one case per header field so the
//! corpus concentrates on the boundaries that matter: corrupted magic,
//! unknown versions, announced payload sizes straddling the 64 KiB limit,
//! and zeroed versus populated tokens.
//!
//! Decode must never panic. When it accepts a buffer, the magic and version
//! must have been the real ones, the announced size must be within the
//! limit, and every header accessor must read back what was written. A
//! header built through the public API must also survive an encode/decode
//! round trip.

#![no_main]

use arbitrary::Arbitrary;
use banter_proto::{Frame, FrameHeader, Opcode};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct HeaderCase {
    magic: Magic,
    version: Version,
    opcode: u16,
    announced: Announced,
    request_id: u32,
    token: Token,
}

#[derive(Debug, Clone, Arbitrary)]
enum Magic {
    Good,
    BitFlip(u8),
    Zeroed,
    Ones,
    Other([u8; 4]),
}

impl Magic {
    fn bytes(self) -> [u8; 4] {
        let good = FrameHeader::MAGIC.to_be_bytes();
        match self {
            Self::Good => good,
            Self::BitFlip(i) => {
                let mut out = good;
                out[usize::from(i) % 4] ^= 0x01;
                out
            },
            Self::Zeroed => [0u8; 4],
            Self::Ones => [0xFF; 4],
            Self::Other(bytes) => bytes,
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Version {
    Current,
    Zero,
    Max,
    Other(u8),
}

impl Version {
    fn byte(self) -> u8 {
        match self {
            Self::Current => FrameHeader::VERSION,
            Self::Zero => 0,
            Self::Max => u8::MAX,
            Self::Other(v) => v,
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Announced {
    Empty,
    Short(u8),
    Limit,
    PastLimit,
    FarPastLimit,
    Max,
    Other(u32),
}

impl Announced {
    fn value(self) -> u32 {
        match self {
            Self::Empty => 0,
            Self::Short(n) => u32::from(n),
            Self::Limit => FrameHeader::MAX_PAYLOAD_SIZE,
            Self::PastLimit => FrameHeader::MAX_PAYLOAD_SIZE.saturating_add(1),
            Self::FarPastLimit => FrameHeader::MAX_PAYLOAD_SIZE.saturating_add(1 << 20),
            Self::Max => u32::MAX,
            Self::Other(n) => n,
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum Token {
    Absent,
    Ones,
    Other([u8; 16]),
}

impl Token {
    fn bytes(self) -> [u8; 16] {
        match self {
            Self::Absent => [0u8; 16],
            Self::Ones => [0xFF; 16],
            Self::Other(bytes) => bytes,
        }
    }
}

fuzz_target!(|case: HeaderCase| {
    let magic = case.magic.bytes();
    let version = case.version.byte();
    let announced = case.announced.value();
    let token = case.token.bytes();

    // Supply at most the protocol limit of trailing bytes; oversized
    // announcements must be rejected before the body is ever consulted.
    let supplied = announced.min(FrameHeader::MAX_PAYLOAD_SIZE) as usize;

    let mut buffer = vec![0u8; FrameHeader::SIZE + supplied];
    buffer[0..4].copy_from_slice(&magic);
    buffer[4] = version;
    buffer[6..8].copy_from_slice(&case.opcode.to_be_bytes());
    buffer[8..12].copy_from_slice(&case.request_id.to_be_bytes());
    buffer[12..16].copy_from_slice(&announced.to_be_bytes());
    buffer[16..32].copy_from_slice(&token);

    match Frame::decode(&buffer) {
        Ok(frame) => {
            assert_eq!(magic, FrameHeader::MAGIC.to_be_bytes());
            assert_eq!(version, FrameHeader::VERSION);
            assert!(announced <= FrameHeader::MAX_PAYLOAD_SIZE);

            let _ = frame.header.opcode_enum();
            assert_eq!(frame.header.request_id(), case.request_id);
            assert_eq!(frame.header.payload_size(), announced);
            match frame.header.token() {
                Some(read) => assert_eq!(read, token),
                None => assert_eq!(token, [0u8; 16]),
            }
        },
        Err(_) => {},
    }

    // Same field values fed through the construction API instead of raw
    // bytes must produce a frame that round-trips.
    let Some(opcode) = Opcode::from_u16(case.opcode) else {
        return;
    };
    let mut header = FrameHeader::new(opcode);
    header.set_request_id(case.request_id);
    header.set_token(token);

    let frame = Frame::new(header, vec![0xC3; supplied.min(512)]);
    let mut encoded = Vec::new();
    if frame.encode(&mut encoded).is_err() {
        return;
    }
    assert_eq!(encoded.len(), FrameHeader::SIZE + frame.payload.len());

    if let Ok(decoded) = Frame::decode(&encoded) {
        assert_eq!(decoded.header.request_id(), case.request_id);
        assert_eq!(decoded.header.token(), frame.header.token());
        assert_eq!(decoded.payload, frame.payload);
    }
});
