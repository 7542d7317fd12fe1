use std::io;

/// Errors raised while writing and finalizing the output file.
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// A block delivered via [`crate::OutputFileWriter::write_range`] failed
    /// its strong-sum check against the control file's block table.
    #[error("block {block} failed its strong-sum check")]
    BlockChecksumMismatch {
        /// Index of the offending block.
        block: usize,
    },

    /// The whole-file MD4 digest did not match the control file's header
    /// digest once every block was folded in.
    #[error("whole-file checksum mismatch")]
    WholeFileChecksumMismatch,

    /// An I/O operation against the temp file or final path failed.
    #[error("output writer I/O error during {action}")]
    Io {
        /// Short description of the operation that failed (`"write"`,
        /// `"rename"`, `"copy"`, ...).
        action: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
