//! Strong checksum implementation backed by MD4.
//!
//! zsync control files record block checksums as a truncated MD4 digest
//! (the `Hash-Lengths` header names the strong-sum width `S`, between 3 and
//! 16 bytes). This module exposes a streaming MD4 wrapper plus
//! [`TruncatedMd4`], which applies that configurable truncation.

mod md4;
mod truncated;

pub use md4::Md4;
pub use truncated::TruncatedMd4;

/// Trait implemented by strong checksum algorithms.
///
/// Implementors provide a streaming interface: callers feed data
/// incrementally via [`Self::update`] and then obtain the final digest
/// through [`Self::finalize`]. The associated
/// [`DIGEST_LEN`](Self::DIGEST_LEN) constant exposes the byte width of the
/// resulting hash so higher layers can size buffers without hard-coding
/// algorithm-specific knowledge.
///
/// # Examples
///
/// Compute an MD4 digest through the trait without depending on the concrete
/// hasher type.
///
/// ```
/// use checksums::strong::{Md4, StrongDigest};
///
/// let mut hasher = Md4::new();
/// hasher.update(b"example");
/// let digest = hasher.finalize();
/// assert_eq!(digest.as_ref().len(), Md4::DIGEST_LEN);
/// ```
pub trait StrongDigest: Sized {
    /// Type used to parameterise a new digest instance.
    type Seed: Default;

    /// Type returned when finalising the digest.
    type Digest: AsRef<[u8]> + Copy;

    /// Length of the final digest in bytes.
    const DIGEST_LEN: usize;

    /// Creates a new hasher with an empty state.
    fn new() -> Self {
        Self::with_seed(Default::default())
    }

    /// Creates a new hasher using the provided seed value.
    fn with_seed(seed: Self::Seed) -> Self;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Finalises the digest and returns the resulting hash.
    fn finalize(self) -> Self::Digest;

    /// Convenience helper that hashes `data` in a single call.
    fn digest(data: &[u8]) -> Self::Digest {
        Self::digest_with_seed(Default::default(), data)
    }

    /// Convenience helper that hashes `data` using an explicit seed value.
    fn digest_with_seed(seed: Self::Seed, data: &[u8]) -> Self::Digest {
        let mut hasher = Self::with_seed(seed);
        hasher.update(data);
        hasher.finalize()
    }
}
