//! Growable byte buffer and the work-buffer pool built on top of it.
//!
//! Mirrors the historical library's `hoedown_buffer`: a byte vector with a
//! growth unit and a hard allocation cap, plus the two LIFO pools
//! (block-granularity and span-granularity) the parser borrows scratch
//! space from while recursing.

use crate::error::{RenderError, Result};
use std::fmt;

/// Allocation beyond this many bytes fails with [`RenderError::OutOfMemory`].
/// Bounds the cost of adversarial input (§8 fuzz properties).
pub const MAX_CAPACITY: usize = 16 * 1024 * 1024;

/// A growable byte buffer.
///
/// `unit == 0` produces a *volatile* buffer: writes past the buffer's
/// current capacity are silently dropped rather than growing it. This
/// matches the historical library's `bufnew(0)` idiom for borrowed,
/// read-only views.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    data: Vec<u8>,
    unit: usize,
}

impl Buffer {
    /// Creates an empty buffer that grows in increments of at least `unit`
    /// bytes. `unit == 0` makes the buffer volatile (see struct docs).
    pub fn new(unit: usize) -> Self {
        Buffer {
            data: Vec::new(),
            unit,
        }
    }

    /// Creates a non-growable buffer already holding `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Buffer {
            data: bytes.to_vec(),
            unit: 0,
        }
    }

    pub fn is_volatile(&self) -> bool {
        self.unit == 0
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Ensures the buffer can hold at least `size` bytes without
    /// reallocating, respecting the growth unit and the 16 MiB cap.
    pub fn grow(&mut self, size: usize) -> Result<()> {
        if size > MAX_CAPACITY {
            return Err(RenderError::OutOfMemory {
                requested: size,
                cap: MAX_CAPACITY,
            });
        }
        if self.data.capacity() < size {
            let unit = self.unit.max(1);
            let mut target = self.data.capacity().max(unit);
            while target < size {
                target += unit;
            }
            self.data.reserve(target - self.data.len());
        }
        Ok(())
    }

    /// Appends `bytes`, growing the buffer first unless it is volatile (in
    /// which case bytes that don't fit in the current capacity are
    /// dropped).
    pub fn put(&mut self, bytes: &[u8]) -> Result<()> {
        if self.is_volatile() {
            let room = self.data.capacity().saturating_sub(self.data.len());
            let take = room.min(bytes.len());
            self.data.extend_from_slice(&bytes[..take]);
            return Ok(());
        }
        self.grow(self.data.len() + bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    pub fn put_str(&mut self, s: &str) -> Result<()> {
        self.put(s.as_bytes())
    }

    pub fn put_char(&mut self, c: char) -> Result<()> {
        let mut tmp = [0u8; 4];
        self.put(c.encode_utf8(&mut tmp).as_bytes())
    }

    /// Returns true if `self`'s contents start with `prefix`, case
    /// sensitively.
    pub fn prefix_compare(&self, prefix: &[u8]) -> bool {
        self.data.starts_with(prefix)
    }

    /// Removes `n` bytes from the front of the buffer, shifting the rest
    /// down. Used by the reference scanner to consume already-processed
    /// lines from the work document.
    pub fn slurp(&mut self, n: usize) {
        let n = n.min(self.data.len());
        self.data.drain(..n);
    }

    /// Removes the last `n` bytes. Used to rewind the output buffer when a
    /// bare autolink match subsumes text already emitted as plain text.
    pub fn truncate_last(&mut self, n: usize) {
        let new_len = self.data.len().saturating_sub(n);
        self.data.truncate(new_len);
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    pub fn clone_boxed(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.put_str(s).map_err(|_| fmt::Error)
    }
}

impl From<&str> for Buffer {
    fn from(s: &str) -> Self {
        let mut b = Buffer::new(128);
        let _ = b.put_str(s);
        b
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Buffer { data, unit: 128 }
    }
}

/// A LIFO pool of scratch buffers at one granularity (block or span).
///
/// `acquire` pops a recycled buffer (resetting its size) or allocates a
/// fresh one; `release` returns it to the free list. `depth` tracks how
/// many buffers are currently checked out, which is what the parser's
/// `max_nesting` guard actually measures (§4.5) -- recycling the
/// allocations themselves is a performance detail, not a semantic
/// requirement (§9).
#[derive(Debug, Default)]
pub struct WorkPool {
    free: Vec<Buffer>,
    depth: usize,
    unit: usize,
}

impl WorkPool {
    pub fn new(unit: usize) -> Self {
        WorkPool {
            free: Vec::new(),
            depth: 0,
            unit,
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn acquire(&mut self) -> Buffer {
        self.depth += 1;
        match self.free.pop() {
            Some(mut buf) => {
                buf.reset();
                buf
            }
            None => Buffer::new(self.unit),
        }
    }

    pub fn release(&mut self, buf: Buffer) {
        debug_assert!(self.depth > 0, "WorkPool::release without a matching acquire");
        self.depth = self.depth.saturating_sub(1);
        self.free.push(buf);
    }
}

/// The two work-buffer pools the parser draws scratch space from: one for
/// recursive block parsing, one for recursive inline (span) parsing.
#[derive(Debug, Default)]
pub struct BufferPools {
    pub block: WorkPool,
    pub span: WorkPool,
}

impl BufferPools {
    pub fn new() -> Self {
        BufferPools {
            block: WorkPool::new(128),
            span: WorkPool::new(64),
        }
    }

    /// Combined recursion depth, the quantity `max_nesting` bounds.
    pub fn depth(&self) -> usize {
        self.block.depth() + self.span.depth()
    }

    /// Both stacks must be empty at the end of a render (§8 invariant 1).
    pub fn is_empty(&self) -> bool {
        self.block.depth() == 0 && self.span.depth() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_test_buffer_grows_and_appends() {
        let mut buf = Buffer::new(16);
        buf.put(b"hello").unwrap();
        buf.put(b" world").unwrap();
        assert_eq!(buf.as_slice(), b"hello world");
    }

    #[test]
    fn smoke_test_volatile_buffer_drops_overflow() {
        let mut buf = Buffer::new(0);
        // no reserved capacity, so every write is a no-op
        buf.put(b"abc").unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn smoke_test_grow_past_cap_errors() {
        let mut buf = Buffer::new(1024);
        let err = buf.grow(MAX_CAPACITY + 1).unwrap_err();
        assert_eq!(
            err,
            RenderError::OutOfMemory {
                requested: MAX_CAPACITY + 1,
                cap: MAX_CAPACITY
            }
        );
    }

    #[test]
    fn smoke_test_slurp_removes_from_front() {
        let mut buf = Buffer::from("hello world");
        buf.slurp(6);
        assert_eq!(buf.as_slice(), b"world");
    }

    #[test]
    fn smoke_test_truncate_last_removes_from_back() {
        let mut buf = Buffer::from("hello world");
        buf.truncate_last(6);
        assert_eq!(buf.as_slice(), b"hello");
    }

    #[test]
    fn smoke_test_prefix_compare() {
        let buf = Buffer::from("http://example.com");
        assert!(buf.prefix_compare(b"http://"));
        assert!(!buf.prefix_compare(b"https://"));
    }

    #[test]
    fn smoke_test_work_pool_recycles_and_tracks_depth() {
        let mut pool = WorkPool::new(32);
        assert_eq!(pool.depth(), 0);

        let mut a = pool.acquire();
        assert_eq!(pool.depth(), 1);
        a.put(b"scratch").unwrap();
        pool.release(a);
        assert_eq!(pool.depth(), 0);

        // the freed allocation comes back empty
        let b = pool.acquire();
        assert!(b.is_empty());
        pool.release(b);
    }

    #[test]
    fn smoke_test_buffer_pools_combined_depth() {
        let mut pools = BufferPools::new();
        let block_buf = pools.block.acquire();
        let span_buf = pools.span.acquire();
        assert_eq!(pools.depth(), 2);
        assert!(!pools.is_empty());
        pools.block.release(block_buf);
        pools.span.release(span_buf);
        assert!(pools.is_empty());
    }
}
