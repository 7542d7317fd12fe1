use std::collections::VecDeque;
use std::io::{self, Read};

/// Sliding window over a byte channel, backed by a ring capacity large
/// enough to always satisfy a two-block view on demand.
///
/// The backing capacity is `16 * block_size` bytes by convention, which
/// comfortably covers the matcher's widest view (two blocks) while still
/// refilling in reasonably large chunks.
pub struct RollingBuffer<R> {
    inner: R,
    block_size: usize,
    capacity: usize,
    backing: VecDeque<u8>,
    inner_done: bool,
    consumed: u64,
}

impl<R: Read> RollingBuffer<R> {
    /// Wraps `inner` with a window of `block_size` bytes and fills the
    /// initial backing buffer.
    pub fn new(inner: R, block_size: usize) -> io::Result<Self> {
        let capacity = block_size.saturating_mul(16).max(block_size * 2);
        let mut buffer = Self {
            inner,
            block_size,
            capacity,
            backing: VecDeque::with_capacity(capacity),
            inner_done: false,
            consumed: 0,
        };
        buffer.fill()?;
        Ok(buffer)
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = vec![0u8; 4096];
        while !self.inner_done && self.backing.len() < self.capacity {
            let want = (self.capacity - self.backing.len()).min(chunk.len());
            let n = self.inner.read(&mut chunk[..want])?;
            if n == 0 {
                self.inner_done = true;
                break;
            }
            self.backing.extend(&chunk[..n]);
        }
        Ok(())
    }

    /// Returns a contiguous read-only view of `len` bytes from the front of
    /// the window, or `None` if fewer than `len` bytes remain.
    pub fn window_view(&mut self, len: usize) -> Option<&[u8]> {
        if self.backing.len() < len {
            return None;
        }
        let (front, _) = self.backing.as_slices();
        if front.len() >= len {
            return Some(&front[..len]);
        }
        self.backing.make_contiguous();
        let (front, _) = self.backing.as_slices();
        Some(&front[..len])
    }

    /// Returns the first byte of the current window, if any bytes remain.
    #[must_use]
    pub fn first_byte(&self) -> Option<u8> {
        self.backing.front().copied()
    }

    /// Returns the byte `block_size - 1` positions into the window, i.e.
    /// the last byte of a one-block window, if available.
    #[must_use]
    pub fn last_byte(&self) -> Option<u8> {
        self.backing.get(self.block_size.saturating_sub(1)).copied()
    }

    /// Slides the window forward by `n` bytes, refilling from the
    /// underlying channel as needed.
    ///
    /// Returns `true` if a full one-block window remains available after
    /// advancing, `false` once the stream is exhausted and fewer than
    /// `block_size` bytes are left.
    pub fn advance(&mut self, n: usize) -> io::Result<bool> {
        let drop = n.min(self.backing.len());
        self.backing.drain(..drop);
        self.consumed += drop as u64;
        self.fill()?;
        Ok(self.backing.len() >= self.block_size)
    }

    /// Returns the configured window (block) size.
    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the total number of bytes the window has advanced past so
    /// far, for progress reporting.
    #[must_use]
    pub const fn bytes_consumed(&self) -> u64 {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zero_pad::ZeroPadded;

    #[test]
    fn window_view_returns_leading_bytes() {
        let data = ZeroPadded::new(&b"abcdefgh"[..], 4);
        let mut buffer = RollingBuffer::new(data, 4).unwrap();
        assert_eq!(buffer.window_view(4), Some(&b"abcd"[..]));
        assert_eq!(buffer.window_view(8), Some(&b"abcdefgh"[..]));
    }

    #[test]
    fn advance_slides_and_refills() {
        let data = ZeroPadded::new(&b"abcdefgh"[..], 4);
        let mut buffer = RollingBuffer::new(data, 4).unwrap();
        assert!(buffer.advance(4).unwrap());
        assert_eq!(buffer.window_view(4), Some(&b"efgh"[..]));
    }

    #[test]
    fn advance_past_end_reports_incomplete() {
        let data = ZeroPadded::new(&b"abcd"[..], 4);
        let mut buffer = RollingBuffer::new(data, 4).unwrap();
        assert!(!buffer.advance(4).unwrap());
        assert_eq!(buffer.window_view(4), None);
    }

    #[test]
    fn bytes_consumed_tracks_total_advance() {
        let data = ZeroPadded::new(&b"abcdefgh"[..], 4);
        let mut buffer = RollingBuffer::new(data, 4).unwrap();
        assert_eq!(buffer.bytes_consumed(), 0);
        buffer.advance(4).unwrap();
        buffer.advance(2).unwrap();
        assert_eq!(buffer.bytes_consumed(), 6);
    }

    #[test]
    fn first_and_last_byte_track_window_edges() {
        let data = ZeroPadded::new(&b"abcdefgh"[..], 4);
        let buffer = RollingBuffer::new(data, 4).unwrap();
        assert_eq!(buffer.first_byte(), Some(b'a'));
        assert_eq!(buffer.last_byte(), Some(b'd'));
    }
}
