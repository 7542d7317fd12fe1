use super::Md4;

/// Minimum strong-sum width, in bytes, a control file may request.
pub const MIN_LEN: usize = 3;

/// Maximum strong-sum width, in bytes, a control file may request (the full
/// MD4 digest).
pub const MAX_LEN: usize = 16;

/// MD4 digest truncated to the strong-sum width `S` recorded in a control
/// file's `Hash-Lengths` header.
///
/// zsync always hashes the full block with MD4 and keeps only the leading
/// `S` bytes of the 128-bit digest, trading collision resistance for a
/// smaller block-sum table. `S` is clamped to `[3, 16]` to match the range
/// the control file format allows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TruncatedMd4 {
    len: usize,
}

impl TruncatedMd4 {
    /// Creates a truncator that keeps `len` bytes of the MD4 digest.
    ///
    /// `len` is clamped to `[MIN_LEN, MAX_LEN]`.
    #[must_use]
    pub const fn new(len: usize) -> Self {
        let len = if len < MIN_LEN { MIN_LEN } else { len };
        let len = if len > MAX_LEN { MAX_LEN } else { len };
        Self { len }
    }

    /// Returns the configured strong-sum width in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the configured width equals zero (never true; kept
    /// for API symmetry with the other digest types).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Hashes `data` with MD4 and returns the leading [`Self::len`] bytes.
    #[must_use]
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let full = Md4::digest(data);
        full[..self.len].to_vec()
    }

    /// Truncates an already-computed full MD4 digest to this width.
    #[must_use]
    pub fn truncate(&self, full: [u8; 16]) -> Vec<u8> {
        full[..self.len].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_keeps_requested_prefix_of_full_md4() {
        let full = Md4::digest(b"block contents");
        let truncated = TruncatedMd4::new(8).digest(b"block contents");
        assert_eq!(truncated.as_slice(), &full[..8]);
    }

    #[test]
    fn new_clamps_below_minimum() {
        assert_eq!(TruncatedMd4::new(0).len(), MIN_LEN);
        assert_eq!(TruncatedMd4::new(1).len(), MIN_LEN);
    }

    #[test]
    fn new_clamps_above_maximum() {
        assert_eq!(TruncatedMd4::new(64).len(), MAX_LEN);
    }

    #[test]
    fn truncate_matches_digest_for_same_input() {
        let full = Md4::digest(b"seed block");
        let truncator = TruncatedMd4::new(6);
        assert_eq!(truncator.truncate(full), truncator.digest(b"seed block"));
    }
}
