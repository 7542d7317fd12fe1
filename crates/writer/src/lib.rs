#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `writer` owns the sparse on-disk image of the target file while it is
//! being reconstructed: it accepts verified blocks from the matcher and
//! byte ranges from the HTTP fetcher, tracks which target blocks are
//! written, folds the whole-file digest in strict ascending order, and
//! atomically publishes the result.
//!
//! # Invariants
//!
//! - A block is written at most once; later writes to an already-written
//!   block are silently ignored.
//! - The whole-file digest is folded only in strict ascending block order
//!   (tracked by an internal cursor), independent of the order blocks
//!   actually arrive in.

mod error;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use control::{BlockEntry, ControlFile, WholeFileDigest};
use digest::Digest as _;
use matching::BlockSink;

pub use error::WriterError;

enum WholeFileHasher {
    Md4(checksums::strong::Md4),
    Sha1(sha1::Sha1),
}

impl WholeFileHasher {
    fn new(expected: &WholeFileDigest) -> Self {
        match expected {
            WholeFileDigest::Md4(_) => Self::Md4(checksums::strong::Md4::new()),
            WholeFileDigest::Sha1(_) => Self::Sha1(sha1::Sha1::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md4(hasher) => hasher.update(data),
            Self::Sha1(hasher) => hasher.update(data),
        }
    }

    fn matches(self, expected: &WholeFileDigest) -> bool {
        match (self, expected) {
            (Self::Md4(hasher), WholeFileDigest::Md4(want)) => &hasher.finalize() == want,
            (Self::Sha1(hasher), WholeFileDigest::Sha1(want)) => {
                hasher.finalize().as_slice() == want.as_slice()
            }
            _ => false,
        }
    }
}

/// Maintains the sparse output file, the per-block `written` bitset, and
/// the ascending-order whole-file digest fold.
pub struct OutputFileWriter {
    blocks: Vec<BlockEntry>,
    whole_file_digest: WholeFileDigest,
    block_size: u64,
    target_length: u64,
    final_path: PathBuf,
    temp: Option<tempfile::NamedTempFile>,
    written: Vec<bool>,
    cursor: usize,
    hasher: WholeFileHasher,
    io_error: Option<WriterError>,
    strong_len: usize,
}

impl OutputFileWriter {
    /// Creates a new writer targeting `final_path`, with a temp file
    /// truncated to the control file's target length in the same
    /// directory (so the final rename can be atomic).
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::Io`] if the temp file cannot be created or
    /// sized.
    pub fn create(control: &ControlFile, final_path: impl Into<PathBuf>) -> Result<Self, WriterError> {
        let final_path = final_path.into();
        let dir = final_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let temp = tempfile::NamedTempFile::new_in(dir).map_err(|source| WriterError::Io {
            action: "create temp file",
            source,
        })?;
        temp.as_file()
            .set_len(control.length)
            .map_err(|source| WriterError::Io {
                action: "truncate temp file",
                source,
            })?;

        let n_blocks = control.block_count();
        Ok(Self {
            blocks: control.blocks.clone(),
            whole_file_digest: control.whole_file_digest,
            block_size: u64::from(control.blocksize),
            target_length: control.length,
            final_path,
            temp: Some(temp),
            written: vec![false; n_blocks],
            cursor: 0,
            hasher: WholeFileHasher::new(&control.whole_file_digest),
            io_error: None,
            strong_len: usize::from(control.strong_len),
        })
    }

    fn file_mut(&mut self) -> &mut File {
        self.temp.as_mut().expect("writer used after close").as_file_mut()
    }

    fn block_range(&self, k: usize) -> (u64, u64) {
        let lo = k as u64 * self.block_size;
        let hi = (lo + self.block_size).min(self.target_length);
        (lo, hi)
    }

    fn fold_ready_blocks(&mut self) -> Result<(), WriterError> {
        while self.cursor < self.written.len() && self.written[self.cursor] {
            let (lo, hi) = self.block_range(self.cursor);
            let len = (hi - lo) as usize;
            let mut buf = vec![0u8; len];
            {
                let file = self.file_mut();
                file.seek(SeekFrom::Start(lo)).map_err(|source| WriterError::Io {
                    action: "seek for digest fold",
                    source,
                })?;
                file.read_exact(&mut buf).map_err(|source| WriterError::Io {
                    action: "read for digest fold",
                    source,
                })?;
            }
            self.hasher.update(&buf);
            self.cursor += 1;
        }

        if self.cursor == self.written.len() {
            self.finalize_whole_file_digest()?;
        }

        Ok(())
    }

    fn finalize_whole_file_digest(&mut self) -> Result<(), WriterError> {
        let hasher = std::mem::replace(&mut self.hasher, WholeFileHasher::new(&self.whole_file_digest));
        if !hasher.matches(&self.whole_file_digest) {
            return Err(WriterError::WholeFileChecksumMismatch);
        }
        Ok(())
    }

    fn write_block_at(&mut self, k: usize, bytes: &[u8]) -> Result<(), WriterError> {
        let (lo, hi) = self.block_range(k);
        let file = self.file_mut();
        file.seek(SeekFrom::Start(lo)).map_err(|source| WriterError::Io {
            action: "seek for block write",
            source,
        })?;
        file.write_all(&bytes[..(hi - lo) as usize])
            .map_err(|source| WriterError::Io {
                action: "write block",
                source,
            })?;
        self.written[k] = true;
        Ok(())
    }

    /// Accepts a byte range originating from the HTTP range fetcher.
    ///
    /// Writes the bytes at `offset`, then checks every not-yet-written
    /// block whose full byte span now lies within `[offset, offset +
    /// bytes.len())`; each such block is strong-sum verified and marked
    /// written on success.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::BlockChecksumMismatch`] if a newly-covered
    /// block fails its strong-sum check, or [`WriterError::Io`] on a
    /// filesystem failure.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, bytes)))]
    pub fn write_range(&mut self, offset: u64, bytes: &[u8]) -> Result<(), WriterError> {
        let end = offset + bytes.len() as u64;

        {
            let file = self.file_mut();
            file.seek(SeekFrom::Start(offset)).map_err(|source| WriterError::Io {
                action: "seek for range write",
                source,
            })?;
            file.write_all(bytes).map_err(|source| WriterError::Io {
                action: "write range",
                source,
            })?;
        }

        let truncator = checksums::strong::TruncatedMd4::new(self.strong_len);
        for k in 0..self.written.len() {
            if self.written[k] {
                continue;
            }
            let (lo, hi) = self.block_range(k);
            if lo >= offset && hi <= end {
                let len = (hi - lo) as usize;
                let mut block = vec![0u8; len];
                block.copy_from_slice(&bytes[(lo - offset) as usize..(lo - offset) as usize + len]);

                let mut padded = block.clone();
                padded.resize(self.block_size as usize, 0);
                let strong = truncator.digest(&padded);

                if strong != self.blocks[k].strong {
                    return Err(WriterError::BlockChecksumMismatch { block: k });
                }
                self.written[k] = true;
                #[cfg(feature = "tracing")]
                tracing::debug!(block = k, "range write verified block");
            }
        }

        self.fold_ready_blocks()
    }

    /// Returns the maximal contiguous byte ranges of the target that are
    /// not yet recovered, clipped to the target length, in ascending order.
    #[must_use]
    pub fn missing_ranges(&self) -> Vec<(u64, u64)> {
        let mut ranges = Vec::new();
        let mut run_start: Option<u64> = None;

        for k in 0..self.written.len() {
            let (lo, hi) = self.block_range(k);
            if self.written[k] {
                if let Some(start) = run_start.take() {
                    ranges.push((start, lo));
                }
            } else if run_start.is_none() {
                run_start = Some(lo);
            }
            if k + 1 == self.written.len() {
                if let Some(start) = run_start.take() {
                    ranges.push((start, hi));
                }
            }
        }

        ranges
    }

    /// Takes and clears any I/O error observed by [`BlockSink::write_block`]
    /// while this writer was driven as a matcher sink.
    pub fn take_io_error(&mut self) -> Option<WriterError> {
        self.io_error.take()
    }

    /// Finalizes the output: on success, atomically renames the temp file
    /// over the final path (falling back to copy when the rename crosses
    /// filesystems); on incompleteness, the temp file is simply dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WriterError::WholeFileChecksumMismatch`] if called while
    /// blocks remain unwritten (the digest fold never reached the end), or
    /// [`WriterError::Io`] if the final publish step fails.
    pub fn close(mut self) -> Result<PathBuf, WriterError> {
        if let Some(err) = self.io_error.take() {
            return Err(err);
        }
        if !self.is_complete() {
            return Err(WriterError::WholeFileChecksumMismatch);
        }

        let temp = self.temp.take().expect("writer used after close");
        match temp.persist(&self.final_path) {
            Ok(_) => Ok(self.final_path),
            Err(err) => {
                let tmp_path = err.file.path().to_path_buf();
                std::fs::copy(&tmp_path, &self.final_path).map_err(|source| WriterError::Io {
                    action: "copy",
                    source,
                })?;
                drop(err.file);
                Ok(self.final_path)
            }
        }
    }
}

impl BlockSink for OutputFileWriter {
    fn write_block(&mut self, index: usize, bytes: &[u8]) {
        if self.io_error.is_some() || self.written[index] {
            return;
        }
        if let Err(err) = self.write_block_at(index, bytes) {
            self.io_error = Some(err);
            return;
        }
        if let Err(err) = self.fold_ready_blocks() {
            self.io_error = Some(err);
        }
    }

    fn is_complete(&self) -> bool {
        self.written.iter().all(|&w| w)
    }
}
