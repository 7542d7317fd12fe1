#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `control` parses the zsync control file format: a text header followed
//! by a fixed-width binary block-sum table. The parser is bit-exact with
//! the reference `zsyncmake` output so control files produced by it remain
//! consumable.
//!
//! # Design
//!
//! [`ControlFile::parse`] reads the header line-by-line until an empty
//! line, then reads exactly `N * (W + S)` bytes for the block table, where
//! `N = ceil(Length / Blocksize)`.
//!
//! # Errors
//!
//! [`ControlFileError::Header`] reports a missing or malformed header key.
//! [`ControlFileError::Malformed`] reports a block-table length mismatch or
//! a header geometry that cannot describe a valid control file (zero block
//! size, block count disagreeing with `Length`/`Blocksize`).

mod digest;
mod error;

use std::collections::HashMap;
use std::io::{BufRead, Read};

pub use digest::WholeFileDigest;
pub use error::ControlFileError;

/// Number of consecutive blocks that must match simultaneously for the
/// matcher to accept a hit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SequenceMatch {
    /// A single block match is sufficient.
    Single,
    /// Two consecutive blocks must match.
    Pair,
}

impl SequenceMatch {
    /// Returns the parameter as its numeric value (1 or 2).
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Single => 1,
            Self::Pair => 2,
        }
    }
}

/// One record of the control file's block-sum table.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockEntry {
    /// Weak (rolling) checksum, masked to the header's `W` width.
    pub weak: u32,
    /// Strong (MD4) checksum, truncated to the header's `S` width.
    pub strong: Vec<u8>,
}

/// A parsed zsync control file: immutable header metadata plus the full
/// block-sum table.
#[derive(Clone, Debug)]
pub struct ControlFile {
    /// Value of the `zsync` header key (format version string).
    pub zsync_version: String,
    /// Optional `producer` header value.
    pub producer: Option<String>,
    /// Target filename hint from the `Filename` header.
    pub filename: String,
    /// Target URL, possibly relative to the control file's own location.
    pub url: String,
    /// Target length in bytes.
    pub length: u64,
    /// Block size in bytes (a power of two in practice, not enforced here).
    pub blocksize: u32,
    /// Sequence-match parameter from `Hash-Lengths`.
    pub sequence_match: SequenceMatch,
    /// Weak-sum width in bytes, `W`, from `Hash-Lengths`.
    pub weak_len: u8,
    /// Strong-sum width in bytes, `S`, from `Hash-Lengths`.
    pub strong_len: u8,
    /// Whole-file digest, whichever of MD4/SHA-1 the header carried.
    pub whole_file_digest: WholeFileDigest,
    /// Optional `MTime` header value, kept as the raw header string.
    pub mtime: Option<String>,
    /// Block-sum table, one entry per target block in ascending order.
    pub blocks: Vec<BlockEntry>,
}

impl ControlFile {
    /// Parses a control file from a byte stream: the text header followed
    /// by the binary block-sum table.
    ///
    /// # Errors
    ///
    /// Returns [`ControlFileError::Header`] if a required key is missing or
    /// cannot be parsed, and [`ControlFileError::Malformed`] if the header's
    /// declared geometry does not match the body length actually present.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(reader)))]
    pub fn parse<R: Read>(mut reader: R) -> Result<Self, ControlFileError> {
        let mut buffered = std::io::BufReader::new(&mut reader);
        let header = parse_header(&mut buffered)?;

        let blocksize = header.get_u32("Blocksize")?;
        if blocksize == 0 {
            return Err(ControlFileError::Malformed {
                reason: "Blocksize must be a positive integer".to_string(),
            });
        }
        let length = header.get_u64("Length")?;
        let block_count = header.block_count(length, blocksize)?;

        let (sequence_match, weak_len, strong_len) = header.hash_lengths()?;

        let whole_file_digest = header.whole_file_digest()?;

        let mut body = Vec::new();
        buffered.read_to_end(&mut body)?;

        let record_len = usize::from(weak_len) + usize::from(strong_len);
        let expected_len = record_len * block_count;
        if body.len() != expected_len {
            return Err(ControlFileError::Malformed {
                reason: format!(
                    "block table has {} bytes, expected {expected_len} ({block_count} records of {record_len} bytes)",
                    body.len()
                ),
            });
        }

        let mut blocks = Vec::with_capacity(block_count);
        for record in body.chunks_exact(record_len) {
            let (weak_bytes, strong_bytes) = record.split_at(usize::from(weak_len));
            let mut weak = 0u32;
            for &byte in weak_bytes {
                weak = (weak << 8) | u32::from(byte);
            }
            blocks.push(BlockEntry {
                weak,
                strong: strong_bytes.to_vec(),
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(blocks = blocks.len(), length, blocksize, "control file parsed");

        Ok(Self {
            zsync_version: header.require("zsync")?,
            producer: header.get("producer"),
            filename: header.require("Filename")?,
            url: header.require("URL")?,
            length,
            blocksize,
            sequence_match,
            weak_len,
            strong_len,
            whole_file_digest,
            mtime: header.get("MTime"),
            blocks,
        })
    }

    /// Number of target blocks described by the block-sum table.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

struct Header(HashMap<String, String>);

impl Header {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn require(&self, key: &str) -> Result<String, ControlFileError> {
        self.get(key).ok_or_else(|| ControlFileError::Header {
            reason: format!("missing required key `{key}`"),
        })
    }

    fn get_u64(&self, key: &str) -> Result<u64, ControlFileError> {
        self.require(key)?
            .trim()
            .parse()
            .map_err(|_| ControlFileError::Header {
                reason: format!("key `{key}` is not a valid unsigned integer"),
            })
    }

    fn get_u32(&self, key: &str) -> Result<u32, ControlFileError> {
        self.require(key)?
            .trim()
            .parse()
            .map_err(|_| ControlFileError::Header {
                reason: format!("key `{key}` is not a valid unsigned integer"),
            })
    }

    fn block_count(&self, length: u64, blocksize: u32) -> Result<usize, ControlFileError> {
        let blocksize = u64::from(blocksize);
        let count = length.div_ceil(blocksize);
        usize::try_from(count).map_err(|_| ControlFileError::Malformed {
            reason: "block count overflows usize".to_string(),
        })
    }

    fn hash_lengths(&self) -> Result<(SequenceMatch, u8, u8), ControlFileError> {
        let raw = self.require("Hash-Lengths")?;
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ControlFileError::Header {
                reason: format!("Hash-Lengths must have 3 comma-separated fields, got `{raw}`"),
            });
        }

        let parse_field = |field: &str| -> Result<u8, ControlFileError> {
            field.parse().map_err(|_| ControlFileError::Header {
                reason: format!("Hash-Lengths field `{field}` is not a valid integer"),
            })
        };

        let q = parse_field(parts[0])?;
        let w = parse_field(parts[1])?;
        let s = parse_field(parts[2])?;

        let sequence_match = match q {
            1 => SequenceMatch::Single,
            2 => SequenceMatch::Pair,
            other => {
                return Err(ControlFileError::Header {
                    reason: format!("Hash-Lengths sequence-match parameter must be 1 or 2, got {other}"),
                });
            }
        };

        if !(2..=4).contains(&w) {
            return Err(ControlFileError::Header {
                reason: format!("Hash-Lengths weak-sum width must be in 2..=4, got {w}"),
            });
        }
        if !(3..=16).contains(&s) {
            return Err(ControlFileError::Header {
                reason: format!("Hash-Lengths strong-sum width must be in 3..=16, got {s}"),
            });
        }

        Ok((sequence_match, w, s))
    }

    fn whole_file_digest(&self) -> Result<WholeFileDigest, ControlFileError> {
        if let Some(hex) = self.get("MD4") {
            return WholeFileDigest::parse_md4(&hex);
        }
        if let Some(hex) = self.get("SHA-1") {
            return WholeFileDigest::parse_sha1(&hex);
        }
        Err(ControlFileError::Header {
            reason: "neither MD4 nor SHA-1 whole-file digest key present".to_string(),
        })
    }
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<Header, ControlFileError> {
    let mut map = HashMap::new();

    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            return Err(ControlFileError::Header {
                reason: "unexpected end of stream while reading header".to_string(),
            });
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }

        let (key, value) = trimmed.split_once(':').ok_or_else(|| ControlFileError::Header {
            reason: format!("header line `{trimmed}` is not in `Key: value` form"),
        })?;

        map.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(Header(map))
}
