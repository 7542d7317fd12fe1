use std::io::{self, Read};

/// Wraps a byte source so the bytes read from it always total a multiple of
/// `block_size`, and never fewer than `block_size`, by appending zero bytes
/// once the underlying source is exhausted.
///
/// This matches the zsync seed contract: a seed shorter than one block, or
/// whose length isn't block-aligned, is conceptually padded with trailing
/// zeros rather than rejected.
pub struct ZeroPadded<R> {
    inner: R,
    block_size: usize,
    total_read: u64,
    inner_exhausted: bool,
}

impl<R: Read> ZeroPadded<R> {
    /// Wraps `inner`, padding reads to a multiple of `block_size`.
    #[must_use]
    pub fn new(inner: R, block_size: usize) -> Self {
        Self {
            inner,
            block_size,
            total_read: 0,
            inner_exhausted: false,
        }
    }

    fn padded_target(&self) -> u64 {
        let block_size = self.block_size as u64;
        if self.total_read == 0 {
            block_size
        } else {
            self.total_read.div_ceil(block_size) * block_size
        }
    }
}

impl<R: Read> Read for ZeroPadded<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if !self.inner_exhausted {
            let n = self.inner.read(buf)?;
            if n > 0 {
                self.total_read += n as u64;
                return Ok(n);
            }
            self.inner_exhausted = true;
        }

        let target = self.padded_target();
        if self.total_read >= target {
            return Ok(0);
        }

        let remaining = (target - self.total_read) as usize;
        let n = remaining.min(buf.len());
        buf[..n].fill(0);
        self.total_read += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all<R: Read>(mut reader: R) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn pads_short_input_up_to_one_block() {
        let data = ZeroPadded::new(&b"ab"[..], 8);
        let out = read_all(data);
        assert_eq!(out, vec![b'a', b'b', 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn pads_to_next_block_boundary() {
        let data = ZeroPadded::new(&b"0123456789"[..], 4);
        let out = read_all(data);
        assert_eq!(out.len(), 12);
        assert_eq!(&out[..10], b"0123456789");
        assert_eq!(&out[10..], &[0, 0]);
    }

    #[test]
    fn leaves_already_aligned_input_untouched() {
        let data = ZeroPadded::new(&b"abcd"[..], 4);
        let out = read_all(data);
        assert_eq!(out, b"abcd");
    }

    #[test]
    fn empty_input_still_yields_one_block() {
        let data = ZeroPadded::new(&b""[..], 4);
        let out = read_all(data);
        assert_eq!(out, vec![0u8; 4]);
    }
}
