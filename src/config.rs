use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Capacity of the original frame buffer, terminator included.
pub const DEFAULT_CAPACITY: usize = 64;

/// Largest capacity a guarded destination may be asked for.
pub const MAX_CAPACITY: usize = 4096;

/// What to do when the input does not fit the destination.
///
/// The check happens before any byte is written, whichever policy is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail with `CopyError::CapacityExceeded` and leave the destination untouched.
    #[default]
    Reject,
    /// Keep the first `capacity - 1` bytes and terminate.
    Truncate,
}

impl OverflowPolicy {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "strict" | "fail" => Ok(Self::Reject),
            "truncate" | "trunc" | "clip" => Ok(Self::Truncate),
            _ => bail!("Unknown overflow policy: {s}. Expected: reject | truncate"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::Reject => "reject",
            OverflowPolicy::Truncate => "truncate",
        }
    }
}

/// Options controlling a single copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyOptions {
    /// Destination capacity in bytes, terminator included.
    pub capacity: usize,

    pub policy: OverflowPolicy,

    /// Copy into a guard-page backed buffer instead of the stack frame.
    /// Required for any capacity other than `DEFAULT_CAPACITY`.
    pub guarded: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            policy: OverflowPolicy::Reject,
            guarded: false,
        }
    }
}

impl CopyOptions {
    pub fn with_policy(policy: OverflowPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            bail!(
                "Capacity must be between 1 and {MAX_CAPACITY} bytes (got {}).",
                self.capacity
            );
        }
        if !self.guarded && self.capacity != DEFAULT_CAPACITY {
            bail!(
                "The frame buffer is fixed at {DEFAULT_CAPACITY} bytes; use --guarded for a capacity of {}.",
                self.capacity
            );
        }
        Ok(())
    }
}
