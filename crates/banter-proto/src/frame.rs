//! Wire frame: header plus raw payload bytes.
//!
//! A `Frame` pairs the fixed 32-byte header with the variable payload it
//! announces. The payload stays raw (already CBOR-encoded) here so frames
//! can be buffered or forwarded without touching their contents; the typed
//! view lives in `Payload::into_frame()` / `Payload::from_frame()`.

use bytes::{BufMut, Bytes};

use crate::{
    FrameHeader,
    errors::{ProtocolError, Result},
};

/// Complete protocol frame as it travels on a stream.
///
/// Wire layout: 32 header bytes followed by exactly
/// `header.payload_size()` payload bytes.
///
/// # Invariants
///
/// - `payload.len()` always matches `header.payload_size()`. [`Frame::new`]
///   establishes this and [`Frame::decode`] only produces such pairs.
/// - Payloads larger than [`FrameHeader::MAX_PAYLOAD_SIZE`] (64 KiB) are
///   refused on both the encode and decode path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame header (32 bytes)
    pub header: FrameHeader,

    /// Payload bytes as they travel on the wire, CBOR for most opcodes.
    pub payload: Bytes,
}

impl Frame {
    /// Build a frame, stamping the payload length into the header.
    ///
    /// Because the length field is overwritten here, a mismatched
    /// header/payload pair cannot be constructed through this path.
    ///
    /// # Panics
    ///
    /// Panics if `payload.len()` exceeds `u32::MAX`, which `Bytes` cannot
    /// reach on any supported target.
    #[must_use]
    pub fn new(mut header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();

        // INVARIANT: a Bytes length is bounded by isize::MAX and the
        // protocol caps payloads at 64 KiB, far below u32::MAX.
        #[allow(clippy::expect_used)]
        let payload_len = u32::try_from(payload.len())
            .expect("invariant: payload length fits in u32 (bounded by protocol limit)");
        header.payload_size = payload_len.to_be_bytes();

        Self { header, payload }
    }

    /// Write the frame to `dst` in wire order (header, then payload).
    ///
    /// The 64 KiB payload limit is enforced here so an oversized frame is
    /// rejected rather than put on the wire.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::PayloadTooLarge`] when the payload exceeds
    ///   [`FrameHeader::MAX_PAYLOAD_SIZE`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let size = self.payload.len();
        debug_assert_eq!(size, self.header.payload_size() as usize);

        if size > FrameHeader::MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::PayloadTooLarge {
                size,
                max: FrameHeader::MAX_PAYLOAD_SIZE as usize,
            });
        }

        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Parse one frame from the start of `bytes`.
    ///
    /// Header validation runs first; the payload is then copied out only if
    /// the buffer holds as many bytes as the header announces. Exactly
    /// `payload_size` bytes are consumed, so trailing data after the frame
    /// is ignored.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError`] variants from header validation (magic, version,
    ///   size limit)
    /// - [`ProtocolError::FrameTruncated`] when the buffer ends before the
    ///   announced payload does
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;

        // payload_size passed header validation, so the end offset cannot
        // overflow in practice; saturating keeps the arithmetic total.
        let payload_size = header.payload_size() as usize;
        let end = FrameHeader::SIZE.saturating_add(payload_size);

        let payload =
            bytes.get(FrameHeader::SIZE..end).ok_or(ProtocolError::FrameTruncated {
                expected: payload_size,
                actual: bytes.len().saturating_sub(FrameHeader::SIZE),
            })?;

        Ok(Self { header: *header, payload: Bytes::copy_from_slice(payload) })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::Opcode;

    impl Arbitrary for Frame {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with((): Self::Parameters) -> Self::Strategy {
            (any::<FrameHeader>(), prop::collection::vec(any::<u8>(), 0..1024))
                .prop_map(|(header, payload)| Self::new(header, payload))
                .boxed()
        }
    }

    proptest! {
        #[test]
        fn wire_round_trip(frame in any::<Frame>()) {
            let mut wire = Vec::new();
            frame.encode(&mut wire).expect("encode");

            let parsed = Frame::decode(&wire).expect("decode");
            prop_assert_eq!(frame.header, parsed.header);
            prop_assert_eq!(frame.payload, parsed.payload);
        }
    }

    #[test]
    fn new_stamps_payload_size() {
        let body = vec![1, 2, 3, 4];
        let frame = Frame::new(FrameHeader::new(Opcode::SendMessage), body.clone());

        assert_eq!(frame.header.payload_size(), 4);
        assert_eq!(frame.payload, body);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut header = FrameHeader::new(Opcode::FriendList);
        header.payload_size = 100u32.to_be_bytes();

        // Only the header bytes: 100 announced, 0 present.
        let result = Frame::decode(&header.to_bytes());
        assert_eq!(result, Err(ProtocolError::FrameTruncated { expected: 100, actual: 0 }));
    }

    #[test]
    fn oversized_payload_refused_on_encode() {
        let too_big = vec![0u8; FrameHeader::MAX_PAYLOAD_SIZE as usize + 1];
        let frame = Frame::new(FrameHeader::new(Opcode::SendMessage), too_big);

        let mut wire = Vec::new();
        assert!(matches!(frame.encode(&mut wire), Err(ProtocolError::PayloadTooLarge { .. })));
    }

    #[test]
    fn trailing_bytes_after_frame_are_ignored() {
        let frame = Frame::new(FrameHeader::new(Opcode::Ack), Bytes::new());

        let mut wire = Vec::new();
        frame.encode(&mut wire).expect("encode");
        wire.extend_from_slice(b"junk after the frame");

        let parsed = Frame::decode(&wire).expect("decode");
        assert!(parsed.payload.is_empty());
    }
}
