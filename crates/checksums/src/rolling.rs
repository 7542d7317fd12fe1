use core::fmt;

/// Errors that can occur while updating the rolling checksum state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RollingError {
    /// The checksum window is empty, preventing the rolling update from making progress.
    EmptyWindow,
    /// The checksum window length exceeds what can be represented in 32 bits.
    WindowTooLarge {
        /// Number of bytes present in the rolling window when the error was raised.
        len: usize,
    },
    /// The number of outgoing bytes does not match the number of incoming bytes.
    MismatchedSliceLength {
        /// Number of bytes being removed from the rolling window.
        outgoing: usize,
        /// Number of bytes being appended to the rolling window.
        incoming: usize,
    },
}

impl fmt::Display for RollingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyWindow => write!(f, "rolling checksum requires a non-empty window"),
            Self::WindowTooLarge { len } => write!(
                f,
                "rolling checksum window of {len} bytes exceeds 32-bit limit"
            ),
            Self::MismatchedSliceLength { outgoing, incoming } => write!(
                f,
                "rolling checksum requires outgoing ({outgoing}) and incoming ({incoming}) slices to have the same length"
            ),
        }
    }
}

impl std::error::Error for RollingError {}

/// Error returned when reconstructing a rolling checksum digest from a byte slice of the wrong length.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RollingSliceError {
    len: usize,
}

impl RollingSliceError {
    /// Number of bytes the caller supplied when the error was raised.
    #[must_use]
    pub const fn len(self) -> usize {
        self.len
    }

    /// Reports whether the provided slice was empty when the error occurred.
    ///
    /// # Examples
    ///
    /// ```
    /// use checksums::{RollingDigest, RollingSliceError};
    ///
    /// let err = RollingDigest::from_le_slice(&[], 0).unwrap_err();
    /// assert!(err.is_empty());
    /// ```
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Number of bytes required to decode a rolling checksum digest.
    pub const EXPECTED_LEN: usize = 4;
}

impl fmt::Display for RollingSliceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rolling checksum digest requires {} bytes, received {}",
            Self::EXPECTED_LEN,
            self.len
        )
    }
}

impl std::error::Error for RollingSliceError {}

/// Rolling checksum used by rsync for weak block matching (often called `rsum`).
///
/// The checksum mirrors upstream rsync's Adler-32 variant where the first component
/// (`s1`) accumulates the byte sum and the second component (`s2`) tracks the sum of
/// the running prefix sums. Both components are truncated to 16 bits after every
/// update to match the canonical algorithm used during delta transfer.
#[doc(alias = "rsum")]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    s1: u32,
    s2: u32,
    len: usize,
}

impl RollingChecksum {
    /// Creates a new rolling checksum with zeroed state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            s1: 0,
            s2: 0,
            len: 0,
        }
    }

    /// Reconstructs a rolling checksum from a previously captured digest.
    ///
    /// The helper mirrors the restoration logic used by upstream rsync when a receiver
    /// rehydrates the checksum state from the `sum1`/`sum2` pair transmitted over the
    /// wire. Providing a dedicated constructor avoids repeating the field mapping in
    /// higher layers and keeps the internal truncation rules encapsulated within the
    /// type. The returned checksum is immediately ready for further rolling updates.
    ///
    /// # Examples
    ///
    /// ```
    /// use checksums::{RollingChecksum, RollingDigest};
    ///
    /// let mut checksum = RollingChecksum::new();
    /// checksum.update(b"delta state");
    /// let digest = checksum.digest();
    ///
    /// let restored = RollingChecksum::from_digest(digest);
    /// assert_eq!(restored.digest(), digest);
    /// ```
    #[must_use]
    pub const fn from_digest(digest: RollingDigest) -> Self {
        Self {
            s1: digest.sum1() as u32,
            s2: digest.sum2() as u32,
            len: digest.len(),
        }
    }

    /// Resets the checksum back to its initial state.
    pub fn reset(&mut self) {
        self.s1 = 0;
        self.s2 = 0;
        self.len = 0;
    }

    /// Returns the number of bytes that contributed to the current state.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bytes have been observed yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Updates the checksum with an additional slice of bytes.
    pub fn update(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }

        let mut s1 = self.s1;
        let mut s2 = self.s2;

        let mut iter = chunk.chunks_exact(4);
        for block in &mut iter {
            s1 = s1.wrapping_add(u32::from(block[0]));
            s2 = s2.wrapping_add(s1);

            s1 = s1.wrapping_add(u32::from(block[1]));
            s2 = s2.wrapping_add(s1);

            s1 = s1.wrapping_add(u32::from(block[2]));
            s2 = s2.wrapping_add(s1);

            s1 = s1.wrapping_add(u32::from(block[3]));
            s2 = s2.wrapping_add(s1);
        }

        for &byte in iter.remainder() {
            s1 = s1.wrapping_add(u32::from(byte));
            s2 = s2.wrapping_add(s1);
        }

        self.s1 = s1 & 0xffff;
        self.s2 = s2 & 0xffff;
        self.len = self.len.saturating_add(chunk.len());
    }

    /// Updates the checksum by recomputing the state for a fresh block.
    ///
    /// This helper clears the internal state before delegating to [`update`](Self::update),
    /// making it convenient to compute the checksum of a block without manually calling
    /// [`reset`](Self::reset).
    pub fn update_from_block(&mut self, block: &[u8]) {
        self.reset();
        self.update(block);
    }

    /// Returns the current window length as a 32-bit value while validating invariants.
    fn window_len_u32(&self) -> Result<u32, RollingError> {
        if self.len == 0 {
            return Err(RollingError::EmptyWindow);
        }

        u32::try_from(self.len).map_err(|_| RollingError::WindowTooLarge { len: self.len })
    }

    /// Performs the rolling checksum update by removing `outgoing` and appending `incoming`.
    ///
    /// # Errors
    ///
    /// Returns [`RollingError::EmptyWindow`] if the checksum has not been initialised with a
    /// block and [`RollingError::WindowTooLarge`] when the window length exceeds what the
    /// upstream algorithm supports (32 bits).
    pub fn roll(&mut self, outgoing: u8, incoming: u8) -> Result<(), RollingError> {
        let window_len = self.window_len_u32()?;

        let out = u32::from(outgoing);
        let inn = u32::from(incoming);

        let new_s1 = self.s1.wrapping_sub(out).wrapping_add(inn) & 0xffff;
        let new_s2 = self
            .s2
            .wrapping_sub(window_len.wrapping_mul(out))
            .wrapping_add(new_s1)
            & 0xffff;

        self.s1 = new_s1;
        self.s2 = new_s2;
        Ok(())
    }

    /// Rolls the checksum forward by replacing multiple bytes at once.
    ///
    /// The method behaves as if [`roll`](Self::roll) were called repeatedly for each pair of
    /// outgoing and incoming bytes. Providing slices of different lengths is rejected to avoid
    /// ambiguous state. Passing empty slices is allowed and leaves the checksum unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RollingError::MismatchedSliceLength`] when the outgoing and incoming slices
    /// differ in length, [`RollingError::EmptyWindow`] if the checksum has not been seeded with a
    /// block yet, and [`RollingError::WindowTooLarge`] if the internal window length exceeds the
    /// upstream limit.
    pub fn roll_many(&mut self, outgoing: &[u8], incoming: &[u8]) -> Result<(), RollingError> {
        if outgoing.len() != incoming.len() {
            return Err(RollingError::MismatchedSliceLength {
                outgoing: outgoing.len(),
                incoming: incoming.len(),
            });
        }

        if outgoing.is_empty() {
            return Ok(());
        }

        let window_len = self.window_len_u32()?;

        let mut s1 = self.s1;
        let mut s2 = self.s2;

        for (&out, &inn) in outgoing.iter().zip(incoming.iter()) {
            let out = u32::from(out);
            let inn = u32::from(inn);

            s1 = s1.wrapping_sub(out).wrapping_add(inn) & 0xffff;
            s2 = s2
                .wrapping_sub(window_len.wrapping_mul(out))
                .wrapping_add(s1)
                & 0xffff;
        }

        self.s1 = s1;
        self.s2 = s2;

        Ok(())
    }

    /// Returns the rolling checksum value in rsync's packed 32-bit representation.
    #[must_use]
    pub const fn value(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }

    /// Returns the current state as a structured digest.
    #[must_use]
    pub fn digest(&self) -> RollingDigest {
        RollingDigest {
            s1: self.s1 as u16,
            s2: self.s2 as u16,
            len: self.len,
        }
    }

    /// Returns the packed checksum truncated to the control file's weak-sum
    /// width `W` (between 2 and 4 bytes).
    ///
    /// A control file may request a narrower weak sum than the full 32-bit
    /// value to keep the block-sum table small; the low `w` bytes of
    /// [`Self::value`] are kept and the rest discarded, matching how zsync
    /// masks `rsum` when writing and matching against the block table.
    #[must_use]
    pub const fn masked(&self, w: u8) -> u32 {
        self.digest().masked(w)
    }
}

impl From<RollingDigest> for RollingChecksum {
    /// Converts a [`RollingDigest`] back into a [`RollingChecksum`] state.
    fn from(digest: RollingDigest) -> Self {
        Self::from_digest(digest)
    }
}

/// Digest produced by the rolling checksum.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RollingDigest {
    s1: u16,
    s2: u16,
    len: usize,
}

impl RollingDigest {
    /// Creates a digest from individual components.
    #[must_use]
    pub const fn new(sum1: u16, sum2: u16, len: usize) -> Self {
        Self {
            s1: sum1,
            s2: sum2,
            len,
        }
    }

    /// Constructs a digest from the packed 32-bit representation used on the wire.
    ///
    /// Upstream rsync transmits the rolling checksum as two 16-bit components (`s1`
    /// and `s2`) packed into a 32-bit integer. Higher layers often know the block
    /// length separately, so the caller provides it explicitly to avoid guessing.
    /// The helper mirrors [`Self::value`], making it cheap to round-trip digests
    /// through their network encoding without manually extracting bit fields.
    #[must_use]
    pub const fn from_value(value: u32, len: usize) -> Self {
        Self {
            s1: value as u16,
            s2: (value >> 16) as u16,
            len,
        }
    }

    /// Constructs a digest from the little-endian byte representation used by upstream rsync.
    ///
    /// Upstream serialises the rolling checksum with the `SIVAL` macro, which stores the packed
    /// value as little-endian bytes on the wire. Parsing the checksum therefore requires decoding
    /// the payload in the same order before recovering the logical components. This helper mirrors
    /// [`Self::from_value`] while avoiding an intermediate [`u32`].
    ///
    /// # Examples
    ///
    /// ```
    /// use checksums::RollingDigest;
    ///
    /// let digest = RollingDigest::new(0x1357, 0x2468, 4096);
    /// let bytes = digest.to_le_bytes();
    /// let parsed = RollingDigest::from_le_bytes(bytes, digest.len());
    ///
    /// assert_eq!(parsed, digest);
    /// assert_eq!(parsed.sum1(), 0x1357);
    /// assert_eq!(parsed.sum2(), 0x2468);
    /// ```
    #[doc(alias = "SIVAL")]
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; 4], len: usize) -> Self {
        Self::from_value(u32::from_le_bytes(bytes), len)
    }

    /// Constructs a digest from a little-endian byte slice, validating the input length.
    ///
    /// This helper complements [`Self::from_le_bytes`] by accepting arbitrary byte slices, making
    /// it convenient to decode digests from network buffers without first converting them into an
    /// array. When the slice does not contain exactly four bytes, the function returns
    /// [`RollingSliceError`], mirroring upstream rsync which treats truncated digests as fatal
    /// protocol violations.
    ///
    /// # Errors
    ///
    /// Returns [`RollingSliceError`] if `bytes` does not contain exactly four elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use checksums::{RollingDigest, RollingSliceError};
    ///
    /// let digest = RollingDigest::new(0x1357, 0x2468, 4096);
    /// let parsed = RollingDigest::from_le_slice(&digest.to_le_bytes(), digest.len())?;
    /// assert_eq!(parsed.sum1(), 0x1357);
    /// assert_eq!(parsed.sum2(), 0x2468);
    /// # Ok::<(), RollingSliceError>(())
    /// ```
    pub fn from_le_slice(bytes: &[u8], len: usize) -> Result<Self, RollingSliceError> {
        if bytes.len() != RollingSliceError::EXPECTED_LEN {
            return Err(RollingSliceError { len: bytes.len() });
        }

        let mut array = [0u8; RollingSliceError::EXPECTED_LEN];
        array.copy_from_slice(bytes);
        Ok(Self::from_le_bytes(array, len))
    }

    /// Returns the first checksum component (sum of bytes).
    #[doc(alias = "s1")]
    #[must_use]
    pub const fn sum1(&self) -> u16 {
        self.s1
    }

    /// Returns the second checksum component (sum of prefix sums).
    #[doc(alias = "s2")]
    #[must_use]
    pub const fn sum2(&self) -> u16 {
        self.s2
    }

    /// Returns the number of bytes that contributed to the digest.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the digest was computed from zero bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the checksum in rsync's packed 32-bit representation.
    #[must_use]
    pub const fn value(&self) -> u32 {
        ((self.s2 as u32) << 16) | (self.s1 as u32)
    }

    /// Returns the checksum encoded as the little-endian byte sequence used on the wire.
    #[doc(alias = "SIVAL")]
    #[must_use]
    pub const fn to_le_bytes(&self) -> [u8; 4] {
        self.value().to_le_bytes()
    }

    /// Returns the packed checksum truncated to a control file's weak-sum
    /// width `w` bytes (1 to 4 inclusive; values outside that range behave as
    /// a no-op clamp to 4).
    #[must_use]
    pub const fn masked(&self, w: u8) -> u32 {
        let value = self.value();
        match w {
            1 => value & 0xff,
            2 => value & 0xffff,
            3 => value & 0x00ff_ffff,
            _ => value,
        }
    }
}
