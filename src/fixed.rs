//! Fixed-capacity buffer with a const-generic, queryable capacity.

use std::ops::Deref;

use zeroize::Zeroize;

use crate::config::{OverflowPolicy, DEFAULT_CAPACITY};
use crate::copy::{bounded_copy, CopyError, Copied};
use crate::Destination;

/// An `N`-byte buffer holding at most `N - 1` content bytes plus a terminator.
///
/// Lives wherever its owner puts it; `run` keeps one on its own stack frame.
#[derive(Debug, Clone)]
pub struct FixedBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

/// The 64-byte frame buffer of the demonstration program.
pub type Frame = FixedBuf<DEFAULT_CAPACITY>;

impl<const N: usize> FixedBuf<N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self {
            bytes: [0u8; N],
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The whole backing array, terminator and stale tail included.
    pub fn raw(&self) -> &[u8; N] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.zeroize();
        self.len = 0;
    }
}

impl<const N: usize> Default for FixedBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Destination for FixedBuf<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn copy_from(&mut self, src: &[u8], policy: OverflowPolicy) -> Result<Copied, CopyError> {
        let copied = bounded_copy(&mut self.bytes, src, policy)?;
        self.len = copied.len;
        Ok(copied)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

impl<const N: usize> Deref for FixedBuf<N> {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        self.as_bytes()
    }
}

impl<const N: usize> Zeroize for FixedBuf<N> {
    fn zeroize(&mut self) {
        self.clear();
    }
}
