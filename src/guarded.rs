//! Guard-page backed destination.
//!
//! On Unix: the usable region is placed so that its last byte is the last
//! byte before a `PROT_NONE` page. A write one byte past the declared
//! capacity faults the process instead of corrupting a neighbour.
//! Elsewhere: falls back to a zeroize-on-drop Vec without the guard.

use crate::config::OverflowPolicy;
use crate::copy::{bounded_copy, CopyError, Copied};
use crate::Destination;

// ── Unix implementation ───────────────────────────────────────────────────

#[cfg(unix)]
mod inner {
    use anyhow::{anyhow, bail, Result};
    use std::ffi::c_void;
    use std::ptr;
    use zeroize::Zeroize;

    #[derive(Debug)]
    pub struct GuardedBuf {
        mem: *mut u8,
        total_alloc: usize,
        data_len: usize,
        offset: usize,
        capacity: usize,
        len: usize,
    }

    unsafe impl Send for GuardedBuf {}
    unsafe impl Sync for GuardedBuf {}

    fn page_size() -> usize {
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size <= 0 {
            0
        } else {
            size as usize
        }
    }

    impl GuardedBuf {
        pub fn new(capacity: usize) -> Result<Self> {
            if capacity == 0 {
                bail!("A guarded buffer needs a capacity of at least 1 byte.");
            }
            let page_size = page_size();
            if page_size == 0 {
                return Err(anyhow!("Failed to determine system page size"));
            }

            let data_len = capacity.div_ceil(page_size) * page_size;
            let total_alloc = data_len + page_size;

            let mem = unsafe {
                let mut ptr: *mut c_void = ptr::null_mut();
                let ret = libc::posix_memalign(&mut ptr, page_size, total_alloc);
                if ret != 0 {
                    return Err(anyhow!("posix_memalign failed with code {}", ret));
                }
                ptr as *mut u8
            };

            unsafe { ptr::write_bytes(mem, 0, data_len) };

            let guard_page_ptr = unsafe { mem.add(data_len) };
            unsafe {
                if libc::mprotect(guard_page_ptr as *mut c_void, page_size, libc::PROT_NONE) != 0 {
                    let err = std::io::Error::last_os_error();
                    libc::free(mem as *mut c_void);
                    return Err(anyhow!("mprotect guard page failed: {}", err));
                }
            }

            log::trace!("guarded buffer: capacity={capacity} data_len={data_len} page={page_size}");

            Ok(Self {
                mem,
                total_alloc,
                data_len,
                offset: data_len - capacity,
                capacity,
                len: 0,
            })
        }

        pub fn capacity(&self) -> usize {
            self.capacity
        }

        pub fn len(&self) -> usize {
            self.len
        }

        pub fn is_empty(&self) -> bool {
            self.len == 0
        }

        /// Exactly `capacity` bytes; the byte after the last one is the guard page.
        pub fn region(&self) -> &[u8] {
            unsafe { std::slice::from_raw_parts(self.mem.add(self.offset), self.capacity) }
        }

        pub fn region_mut(&mut self) -> &mut [u8] {
            unsafe { std::slice::from_raw_parts_mut(self.mem.add(self.offset), self.capacity) }
        }

        pub fn content(&self) -> &[u8] {
            &self.region()[..self.len]
        }

        pub fn reset(&mut self) {
            self.region_mut().fill(0);
            self.len = 0;
        }

        pub(crate) fn region_ptr(&mut self) -> *mut u8 {
            unsafe { self.mem.add(self.offset) }
        }

        pub(crate) fn set_len(&mut self, len: usize) {
            self.len = len.min(self.capacity);
        }

        #[cfg(test)]
        pub(crate) fn total_alloc(&self) -> usize {
            self.total_alloc
        }
    }

    impl Zeroize for GuardedBuf {
        fn zeroize(&mut self) {
            if !self.mem.is_null() {
                unsafe {
                    ptr::write_bytes(self.mem, 0, self.data_len);
                }
                self.len = 0;
            }
        }
    }

    impl Drop for GuardedBuf {
        fn drop(&mut self) {
            if !self.mem.is_null() {
                self.zeroize();
                unsafe {
                    let guard_page_ptr = self.mem.add(self.data_len);
                    libc::mprotect(
                        guard_page_ptr as *mut c_void,
                        self.total_alloc - self.data_len,
                        libc::PROT_READ | libc::PROT_WRITE,
                    );
                    libc::free(self.mem as *mut c_void);
                }
                self.mem = ptr::null_mut();
            }
        }
    }
}

// ── Fallback (no mprotect) ────────────────────────────────────────────────

#[cfg(not(unix))]
mod inner {
    use anyhow::{bail, Result};
    use zeroize::Zeroize;

    /// Without mprotect, GuardedBuf is a zeroize-on-drop boxed slice and
    /// relies on slice bounds checks alone.
    #[derive(Debug)]
    pub struct GuardedBuf {
        buf: Box<[u8]>,
        len: usize,
    }

    impl GuardedBuf {
        pub fn new(capacity: usize) -> Result<Self> {
            if capacity == 0 {
                bail!("A guarded buffer needs a capacity of at least 1 byte.");
            }
            Ok(Self {
                buf: vec![0u8; capacity].into_boxed_slice(),
                len: 0,
            })
        }

        pub fn capacity(&self) -> usize {
            self.buf.len()
        }

        pub fn len(&self) -> usize {
            self.len
        }

        pub fn is_empty(&self) -> bool {
            self.len == 0
        }

        pub fn region(&self) -> &[u8] {
            &self.buf
        }

        pub fn region_mut(&mut self) -> &mut [u8] {
            &mut self.buf
        }

        pub fn content(&self) -> &[u8] {
            &self.buf[..self.len]
        }

        pub fn reset(&mut self) {
            self.buf.fill(0);
            self.len = 0;
        }

        pub(crate) fn set_len(&mut self, len: usize) {
            self.len = len.min(self.buf.len());
        }
    }

    impl Zeroize for GuardedBuf {
        fn zeroize(&mut self) {
            self.buf.zeroize();
            self.len = 0;
        }
    }

    impl Drop for GuardedBuf {
        fn drop(&mut self) {
            self.zeroize();
        }
    }
}

// Re-export so callers just use `guarded::GuardedBuf`
pub use inner::GuardedBuf;

impl Destination for GuardedBuf {
    fn capacity(&self) -> usize {
        GuardedBuf::capacity(self)
    }

    fn copy_from(&mut self, src: &[u8], policy: OverflowPolicy) -> Result<Copied, CopyError> {
        let copied = bounded_copy(self.region_mut(), src, policy)?;
        self.set_len(copied.len);
        Ok(copied)
    }

    fn as_bytes(&self) -> &[u8] {
        self.content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_refused() {
        assert!(GuardedBuf::new(0).is_err());
    }

    #[test]
    fn region_matches_capacity() {
        for capacity in [1, 63, 64, 65, 4096] {
            let mut buf = GuardedBuf::new(capacity).unwrap();
            assert_eq!(buf.capacity(), capacity);
            assert_eq!(buf.region().len(), capacity);
            assert_eq!(buf.region_mut().len(), capacity);
            assert!(buf.region().iter().all(|&b| b == 0));
        }
    }

    #[cfg(unix)]
    #[test]
    fn region_ends_at_guard_page() {
        let mut buf = GuardedBuf::new(64).unwrap();
        let end = buf.region_ptr() as usize + 64;
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        assert_eq!(end % page, 0, "region must end on a page boundary");
        assert_eq!(buf.total_alloc(), 2 * page);
    }

    #[test]
    fn copy_fills_region_from_start() {
        let mut buf = GuardedBuf::new(8).unwrap();
        let copied = buf.copy_from(b"1234567", OverflowPolicy::Reject).unwrap();
        assert_eq!(copied.len, 7);
        assert_eq!(buf.region(), b"1234567\0");
        assert_eq!(buf.as_bytes(), b"1234567");
        assert!(buf.copy_from(b"12345678", OverflowPolicy::Reject).is_err());
        assert_eq!(buf.as_bytes(), b"1234567");
    }

    #[test]
    fn reset_clears_content() {
        let mut buf = GuardedBuf::new(16).unwrap();
        buf.copy_from(b"secret", OverflowPolicy::Reject).unwrap();
        buf.reset();
        assert!(buf.is_empty());
        assert!(buf.region().iter().all(|&b| b == 0));
    }
}
