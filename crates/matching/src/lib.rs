#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `matching` scans a seed byte stream against a zsync control file's
//! block-sum table, recovering target blocks without re-downloading them.
//!
//! # Design
//!
//! - [`ZeroPadded`] pads a seed's tail so its length is always a multiple
//!   of the block size.
//! - [`RollingBuffer`] provides a sliding window over the padded seed with
//!   enough backing capacity (`16 * block_size`) to serve a two-block view
//!   on demand.
//! - [`HashIndex`] maps weak sums (or, under the paired sequence-match
//!   parameter, weak-sum pairs) to candidate block indices.
//! - [`BlockMatcher`] drives the scan: probe, verify with the strong sum,
//!   deliver to a [`BlockSink`].

mod buffer;
mod error;
mod index;
mod matcher;
mod sink;
mod zero_pad;

pub use buffer::RollingBuffer;
pub use error::MatchError;
pub use index::HashIndex;
pub use matcher::BlockMatcher;
pub use sink::BlockSink;
pub use zero_pad::ZeroPadded;
