//! boundcopy core library.
//!
//! A safe rendition of the classic CWE-120 example: one argument is copied
//! into a fixed 64-byte buffer and printed. This crate provides:
//! - A bounds-checked copy whose capacity always travels with the destination
//! - An explicit overflow policy (reject or truncate), decided before any write
//! - A const-generic frame buffer and a guard-page backed buffer
//! - A sandboxed fixture that reproduces the unchecked copy in a child process
//!   so the guard page can be shown to flag it (Unix only)

pub mod config;
pub mod copy;
pub mod fixed;
pub mod guarded;

#[cfg(unix)]
pub mod fixture;

use std::io::Write;

use anyhow::{Context, Result};
use log::debug;

use config::{CopyOptions, OverflowPolicy};
use copy::{CopyError, Copied};
use fixed::Frame;
use guarded::GuardedBuf;

/// Process status for every successful path, including "no input".
pub const EXIT_OK: u8 = 0;
/// Process status for failures other than an oversized input.
pub const EXIT_FAILURE: u8 = 1;
/// Process status when the input does not fit and the policy is `reject`.
pub const EXIT_CAPACITY_EXCEEDED: u8 = 3;

/// A buffer that knows its own capacity and only accepts bounds-checked copies.
pub trait Destination {
    fn capacity(&self) -> usize;

    /// Copy the logical content of `src`. On error the buffer is unchanged.
    fn copy_from(&mut self, src: &[u8], policy: OverflowPolicy) -> Result<Copied, CopyError>;

    /// Current content, terminator excluded.
    fn as_bytes(&self) -> &[u8];
}

/// What a run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No argument was supplied; nothing was copied or printed.
    NoInput,
    Copied { len: usize },
    Truncated { len: usize, dropped: usize },
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        EXIT_OK
    }
}

impl From<Copied> for Outcome {
    fn from(c: Copied) -> Self {
        if c.truncated() {
            Outcome::Truncated {
                len: c.len,
                dropped: c.dropped,
            }
        } else {
            Outcome::Copied { len: c.len }
        }
    }
}

/// Map a failed run to its process status.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<CopyError>() {
        Some(CopyError::CapacityExceeded { .. }) => EXIT_CAPACITY_EXCEEDED,
        None => EXIT_FAILURE,
    }
}

/// Buffer content followed by a newline.
pub fn render_line(content: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(content.len() + 1);
    line.extend_from_slice(content);
    line.push(b'\n');
    line
}

/// Copy `input` into `dst` and write the result line to `out`.
///
/// Nothing reaches `out` unless the copy succeeded.
pub fn run_with<D, W>(dst: &mut D, input: Option<&[u8]>, policy: OverflowPolicy, out: &mut W) -> Result<Outcome>
where
    D: Destination + ?Sized,
    W: Write + ?Sized,
{
    let Some(input) = input else {
        debug!("no input supplied; nothing to copy");
        return Ok(Outcome::NoInput);
    };

    let copied = dst.copy_from(input, policy)?;

    out.write_all(&render_line(dst.as_bytes()))
        .context("write buffer to output")?;
    out.flush().context("flush output")?;

    Ok(copied.into())
}

/// Entry-point logic: validate `opts`, pick the destination, copy, print.
///
/// The default destination is a `Frame` on this function's own stack frame.
pub fn run<W: Write + ?Sized>(input: Option<&[u8]>, opts: &CopyOptions, out: &mut W) -> Result<Outcome> {
    opts.validate()?;

    if opts.guarded {
        let mut dst = GuardedBuf::new(opts.capacity).context("allocate guarded buffer")?;
        run_with(&mut dst, input, opts.policy, out)
    } else {
        let mut dst = Frame::new();
        run_with(&mut dst, input, opts.policy, out)
    }
}
