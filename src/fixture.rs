//! Sandboxed reproduction of the unchecked copy.
//!
//! `unchecked_copy` behaves like the original `strcpy` into a 64-byte frame
//! buffer: it copies until the sentinel and never looks at the capacity. It
//! only ever writes into a `GuardedBuf`, and only ever runs inside a child
//! process started by `run_probe`, so an oversized input ends in a fault on
//! the guard page rather than in corrupted memory of the caller.

use std::path::Path;
use std::process::Command;
use std::ptr;

use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::copy::SENTINEL;
use crate::guarded::GuardedBuf;

/// Hidden command-line flag that makes the binary act as a probe child.
pub const PROBE_FLAG: &str = "--overflow-probe";

/// Byte used to fill probe inputs; anything but the sentinel.
pub const PROBE_FILL: u8 = b'A';

/// Printed as JSON by a probe child that survived its copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub requested: usize,
    pub capacity: usize,
    pub copied: usize,
    pub content_ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The input fit; the child ran to completion.
    Survived(ProbeReport),
    /// The guard page caught a write past the capacity.
    Flagged { signal: i32 },
}

impl ProbeOutcome {
    pub fn is_flagged(&self) -> bool {
        matches!(self, ProbeOutcome::Flagged { .. })
    }
}

/// Copy `src` up to its sentinel, then the sentinel, with no bounds check.
///
/// # Safety
/// Only the guard page stands between an oversized `src` and the memory
/// after the region. The caller must be prepared for the process to be
/// killed by SIGSEGV/SIGBUS; never call this outside a probe child.
pub unsafe fn unchecked_copy(dst: &mut GuardedBuf, src: &[u8]) {
    let base = dst.region_ptr();
    let mut i = 0usize;
    for &b in src.iter().take_while(|&&b| b != SENTINEL) {
        ptr::write_volatile(base.add(i), b);
        i += 1;
    }
    ptr::write_volatile(base.add(i), SENTINEL);
    dst.set_len(i);
}

/// Body of a probe child: copy `len` fill bytes into a `capacity`-byte
/// guarded buffer without checking, and report if still alive.
pub fn probe_in_process(len: usize, capacity: usize) -> Result<ProbeReport> {
    let input = vec![PROBE_FILL; len];
    let mut dst = GuardedBuf::new(capacity).context("allocate probe buffer")?;

    unsafe { unchecked_copy(&mut dst, &input) };

    let copied = dst.len();
    let content_ok = copied == len && dst.content().iter().all(|&b| b == PROBE_FILL);
    Ok(ProbeReport {
        requested: len,
        capacity,
        copied,
        content_ok,
    })
}

/// Start `exe` as a probe child and classify how it ended.
pub fn run_probe(exe: &Path, len: usize, capacity: usize) -> Result<ProbeOutcome> {
    use std::os::unix::process::ExitStatusExt;

    let output = Command::new(exe)
        .arg(PROBE_FLAG)
        .arg(len.to_string())
        .arg("--capacity")
        .arg(capacity.to_string())
        .arg("--guarded")
        .env("RUST_LOG", "off")
        .output()
        .with_context(|| format!("spawn probe child: {}", exe.display()))?;

    if let Some(signal) = output.status.signal() {
        if signal == libc::SIGSEGV || signal == libc::SIGBUS {
            info!("probe len={len} capacity={capacity}: flagged by signal {signal}");
            return Ok(ProbeOutcome::Flagged { signal });
        }
        bail!("Probe child killed by unexpected signal {signal}.");
    }

    if !output.status.success() {
        bail!(
            "Probe child failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let report: ProbeReport =
        serde_json::from_slice(&output.stdout).context("parse probe report")?;
    info!(
        "probe len={len} capacity={capacity}: survived, copied {} bytes",
        report.copied
    );
    Ok(ProbeOutcome::Survived(report))
}
