#![no_main]
use libfuzzer_sys::fuzz_target;

use boundcopy::{config::OverflowPolicy, copy::logical_len, fixed::Frame, Destination};

/// Fuzz the frame-buffer copy with arbitrary bytes under both policies.
///
/// The copy must never panic, must keep at most 63 bytes, and a rejected
/// copy must leave the frame exactly as it was.
fuzz_target!(|data: &[u8]| {
    let len = logical_len(data);

    let mut frame = Frame::new();
    let before = *frame.raw();
    match frame.copy_from(data, OverflowPolicy::Reject) {
        Ok(c) => {
            assert!(len < 64);
            assert_eq!(c.len, len);
            assert_eq!(frame.as_bytes(), &data[..len]);
        }
        Err(_) => {
            assert!(len >= 64);
            assert_eq!(frame.raw(), &before);
        }
    }

    let mut frame = Frame::new();
    let c = frame
        .copy_from(data, OverflowPolicy::Truncate)
        .expect("truncate never fails on a non-empty frame");
    assert_eq!(c.len, len.min(63));
    assert_eq!(frame.raw()[c.len], 0);
});
