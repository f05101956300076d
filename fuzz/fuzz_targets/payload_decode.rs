//! Fuzzing of CBOR payload deserialization.
//!
//! Runs the same arbitrary bytes through every assigned opcode, so each
//! payload struct gets parsed against input shaped for all the others as
//! well as plain garbage. Exercises both entry points: `Payload::decode` on
//! bare bytes and `Payload::from_frame` on a framed copy. Either returns a
//! structured error for bad input; panics and unbounded recursion are
//! findings.

#![no_main]

use banter_proto::{Frame, FrameHeader, Opcode, Payload};
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

const OPCODES: [Opcode; 14] = [
    Opcode::Login,
    Opcode::LoginReply,
    Opcode::Register,
    Opcode::Ack,
    Opcode::SendMessage,
    Opcode::SubscribeMessages,
    Opcode::InboundMessage,
    Opcode::AddFriend,
    Opcode::RemoveFriend,
    Opcode::ListFriends,
    Opcode::FriendList,
    Opcode::SubscribePresence,
    Opcode::PresenceUpdate,
    Opcode::Error,
];

fuzz_target!(|data: &[u8]| {
    for opcode in OPCODES {
        let _ = Payload::decode(opcode, data);

        let mut header = FrameHeader::new(opcode);
        header.set_request_id(1);
        header.set_token([1u8; 16]);
        let frame = Frame::new(header, Bytes::copy_from_slice(data));
        let _ = Payload::from_frame(&frame);
    }
});
