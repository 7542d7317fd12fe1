use std::io;

/// Errors raised while scanning a seed against the block-sum index.
///
/// These are always per-seed and non-fatal: the orchestrator abandons the
/// offending seed and continues with the next one.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// Reading the seed's underlying byte channel failed.
    #[error("seed read error")]
    Io(#[from] io::Error),
}
