use std::io;

/// Top-level error returned by [`crate::run`], aggregating every nested
/// component error type.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The control file could not be located: a remote fetch returned 404,
    /// or a local path did not exist.
    #[error("control file not found: {uri}")]
    ControlFileNotFound {
        /// The URI or path that was requested.
        uri: String,
    },

    /// The control file's header or block table failed to parse.
    #[error(transparent)]
    Control(#[from] control::ControlFileError),

    /// The control file's target URL is relative and no base URI is known
    /// to resolve it against.
    #[error("target URL is relative and no base URI is available to resolve it")]
    RelativeUrlWithNoBase,

    /// The target URL (once resolved) failed to parse.
    #[error("invalid target URL")]
    InvalidUrl(#[from] url::ParseError),

    /// Writing the output file failed.
    #[error(transparent)]
    Writer(#[from] writer::WriterError),

    /// The ranged HTTP fetch for the remaining bytes failed.
    #[error(transparent)]
    Fetch(#[from] fetch::FetchError),

    /// Reading or writing a non-seed file (the control file itself, or a
    /// save-copy path) failed.
    #[error("I/O error")]
    Io(#[from] io::Error),
}
