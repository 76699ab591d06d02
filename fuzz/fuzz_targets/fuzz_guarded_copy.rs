#![no_main]
use libfuzzer_sys::fuzz_target;

use boundcopy::{config::OverflowPolicy, guarded::GuardedBuf, Destination};

/// Fuzz the guarded copy with an input-chosen capacity.
///
/// The first byte picks the capacity (1..=256); the rest is the source. Any
/// write past the region hits the guard page and crashes the target.
fuzz_target!(|data: &[u8]| {
    let Some((&cap, src)) = data.split_first() else {
        return;
    };
    let capacity = cap as usize + 1;

    let mut dst = match GuardedBuf::new(capacity) {
        Ok(d) => d,
        Err(_) => return,
    };

    let _ = dst.copy_from(src, OverflowPolicy::Reject);
    if let Ok(c) = dst.copy_from(src, OverflowPolicy::Truncate) {
        assert!(c.len < capacity);
    }
});
