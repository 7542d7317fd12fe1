/// Errors surfaced by argument handling before the engine ever runs.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A `--auth` value was not in `host=user:pass` form.
    #[error("invalid --auth value `{spec}`, expected host=user:pass")]
    InvalidAuth {
        /// The raw value that failed to parse.
        spec: String,
    },

    /// The orchestrator itself failed.
    #[error(transparent)]
    Engine(#[from] engine::EngineError),
}
