#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the rolling and strong checksum primitives used by the
//! zsync delta reconstruction engine. The algorithms are bit-exact with the
//! zsync/rsync family so control files produced by the reference `zsyncmake`
//! remain consumable.
//!
//! # Design
//!
//! The crate offers two modules:
//!
//! - [`rolling`] implements the Adler-32-style weak checksum (`rsum`) used to
//!   find candidate block offsets while scanning a seed file.
//! - [`strong`] exposes a streaming MD4 digest through the
//!   [`strong::StrongDigest`] trait, plus [`strong::TruncatedMd4`] which
//!   applies the control file's configurable strong-sum length `S`.
//!
//! # Invariants
//!
//! - [`RollingChecksum`] truncates both state components to 16 bits after
//!   every update.
//! - Rolling updates reject mismatched slice lengths and empty windows so the
//!   caller never observes silent state corruption.
//! - [`RollingChecksum::masked`] discards the high `4 - W` bytes of the packed
//!   32-bit value, matching the control file's `Hash-Lengths` weak-sum width.
//!
//! # Errors
//!
//! [`RollingError`] reports invalid rolling operations (empty windows, window
//! lengths that overflow `u32`, or mismatched slice lengths).
//! [`RollingSliceError`] signals that a digest could not be reconstructed from
//! a byte slice because the input length differed from the expected four
//! bytes.
//!
//! # Examples
//!
//! Compute a rolling checksum for a block and then advance the window.
//!
//! ```
//! use checksums::RollingChecksum;
//!
//! let mut rolling = RollingChecksum::new();
//! rolling.update(b"abcd");
//! assert_eq!(rolling.len(), 4);
//!
//! // Replace the first byte with `e` and observe that the helper succeeds.
//! rolling.roll(b'a', b'e').unwrap();
//! assert_eq!(rolling.len(), 4);
//! ```
//!
//! Truncate an MD4 digest to the strong-sum length a control file requests.
//!
//! ```
//! use checksums::strong::TruncatedMd4;
//!
//! let strong = TruncatedMd4::new(16).digest(b"block contents");
//! assert_eq!(strong.len(), 16);
//! ```

mod rolling;
pub mod strong;

pub use rolling::{RollingChecksum, RollingDigest, RollingError, RollingSliceError};
