use std::path::PathBuf;

use rustc_hash::FxHashMap;

use fetch::Credentials;

/// Caller-supplied configuration for a single reconstruction run.
///
/// The orchestrator snapshots this by value at the start of [`crate::run`]
/// so later mutation by the caller cannot affect an in-progress run; the
/// orchestrator itself may augment its own copy (pushing the pre-existing
/// output file into the seed list, recording the base URI discovered from
/// a remote control-file fetch).
#[derive(Clone, Debug, Default)]
pub struct ZsyncOptions {
    /// Seed files to scan, in the order they should be tried.
    pub seeds: Vec<PathBuf>,
    /// Overrides the header-supplied filename as the output path.
    pub output_override: Option<PathBuf>,
    /// If set, a remotely-fetched control file's raw bytes are saved here
    /// before being parsed.
    pub save_zsync_copy: Option<PathBuf>,
    /// Basic-auth credentials, keyed by host.
    pub credentials: FxHashMap<String, Credentials>,
    /// Base URI to resolve a relative target URL against, when the zsync
    /// file itself was opened from a local path (a remote fetch records
    /// its own URI as the base automatically).
    pub zsync_source_uri: Option<String>,
}

impl ZsyncOptions {
    /// Creates an empty options set: no seeds, no overrides, no
    /// credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a seed path to scan.
    #[must_use]
    pub fn with_seed(mut self, path: impl Into<PathBuf>) -> Self {
        self.seeds.push(path.into());
        self
    }

    /// Overrides the output path.
    #[must_use]
    pub fn with_output_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_override = Some(path.into());
        self
    }
}
