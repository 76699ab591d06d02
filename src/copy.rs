//! The bounds-checked copy.
//!
//! Capacity is never looked up separately from the destination: it is the
//! length of the `&mut [u8]` handed in. One byte of it is always reserved for
//! the terminator, so a destination of capacity `N` holds at most `N - 1`
//! content bytes.

use log::{debug, warn};
use thiserror::Error;

use crate::config::OverflowPolicy;

/// Marks the logical end of a source and terminates every copied result.
pub const SENTINEL: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CopyError {
    #[error("input of {len} bytes does not fit a {capacity}-byte buffer (capacity exceeded)")]
    CapacityExceeded { len: usize, capacity: usize },
}

/// Result of a successful copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Copied {
    /// Content bytes now in the destination, terminator excluded.
    pub len: usize,
    /// Source bytes left behind by the truncate policy.
    pub dropped: usize,
}

impl Copied {
    pub fn truncated(&self) -> bool {
        self.dropped > 0
    }
}

/// Number of bytes before the first sentinel, or the whole slice if there is none.
pub fn logical_len(src: &[u8]) -> usize {
    src.iter().position(|&b| b == SENTINEL).unwrap_or(src.len())
}

/// How many content bytes a copy of `len` bytes into `capacity` keeps, or the
/// error the policy demands.
pub fn plan(len: usize, capacity: usize, policy: OverflowPolicy) -> Result<usize, CopyError> {
    if len < capacity {
        return Ok(len);
    }
    match policy {
        OverflowPolicy::Truncate if capacity > 0 => Ok(capacity - 1),
        _ => Err(CopyError::CapacityExceeded { len, capacity }),
    }
}

/// Copy the logical content of `src` into `dst` and terminate it.
///
/// On error nothing has been written. On success exactly `len + 1` bytes of
/// `dst` were written and the rest is untouched.
pub fn bounded_copy(dst: &mut [u8], src: &[u8], policy: OverflowPolicy) -> Result<Copied, CopyError> {
    let capacity = dst.len();
    let len = logical_len(src);
    let keep = plan(len, capacity, policy)?;

    dst[..keep].copy_from_slice(&src[..keep]);
    dst[keep] = SENTINEL;

    debug!(
        "copied {keep} of {len} bytes into {capacity}-byte buffer (policy={})",
        policy.as_str()
    );
    if keep < len {
        warn!(
            "input truncated: kept {keep} bytes, dropped {} (capacity {capacity})",
            len - keep
        );
    }

    Ok(Copied {
        len: keep,
        dropped: len - keep,
    })
}
