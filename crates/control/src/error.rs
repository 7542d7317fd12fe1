use std::io;

/// Errors reported while parsing a zsync control file.
#[derive(Debug, thiserror::Error)]
pub enum ControlFileError {
    /// A required header key was missing, or a present key could not be
    /// parsed into its expected type.
    #[error("control file header: {reason}")]
    Header {
        /// Human-readable description of the offending key/value.
        reason: String,
    },

    /// The block-sum body did not match the length the header implies, or
    /// the header described a nonsensical geometry (zero block size,
    /// mismatched block count).
    #[error("control file malformed: {reason}")]
    Malformed {
        /// Human-readable description of the mismatch.
        reason: String,
    },

    /// Reading the underlying byte stream failed.
    #[error("control file I/O error")]
    Io(#[from] io::Error),
}
