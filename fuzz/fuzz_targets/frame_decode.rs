//! Raw-byte fuzzing of `Frame::decode`.
//!
//! The decoder sees whatever the network hands it, so it gets the bluntest
//! possible corpus here: unstructured bytes of any length. Every input must
//! come back as `Ok` or a structured error; a panic, overflow, or
//! out-of-bounds read is a finding.

#![no_main]

use banter_proto::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = Frame::decode(data);
});
