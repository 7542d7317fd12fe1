#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `cli` is the thin command-line front-end: it parses arguments, installs a
//! `tracing-subscriber` filter driven by `-v`/`-q`, wires a blocking HTTP
//! transport into [`engine::run`], and renders lifecycle events as terminal
//! progress.
//!
//! # Design
//!
//! [`run`] mirrors the teacher binary's testable entry point: it takes an
//! argument iterator plus stdout/stderr handles rather than touching the
//! process's real streams directly, so the exit-code contract can be
//! exercised from tests. Progress lines go to the real process stdout
//! regardless, since [`events::Dispatcher`] requires `'static` observers.

mod error;
mod progress;

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use engine::ZsyncOptions;
use events::Dispatcher;
use fetch::{Credentials, ReqwestTransport};
use rustc_hash::FxHashMap;

pub use error::CliError;
pub use progress::TerminalProgress;

#[derive(Parser, Debug)]
#[command(name = "zsync", about = "Reconstruct a file from a zsync control file")]
struct Args {
    /// Path or URL of the .zsync control file.
    zsync_file: String,

    /// Local seed file to scan for reusable blocks (repeatable).
    #[arg(short = 'i', long = "input")]
    seeds: Vec<PathBuf>,

    /// Overrides the header-supplied output filename.
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Saves a copy of a remotely-fetched control file to this path.
    #[arg(short = 'k', long = "save-zsync")]
    save_zsync: Option<PathBuf>,

    /// Basic-auth credentials for a host, as `host=user:pass` (repeatable).
    #[arg(short = 'A', long = "auth")]
    auth: Vec<String>,

    /// Increases log verbosity; stackable (-v, -vv, -vvv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppresses progress output and all but error-level logging.
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn parse_auth(spec: &str) -> Result<(String, Credentials), CliError> {
    let (host, creds) = spec.split_once('=').ok_or_else(|| CliError::InvalidAuth {
        spec: spec.to_string(),
    })?;
    let (username, password) = creds.split_once(':').ok_or_else(|| CliError::InvalidAuth {
        spec: spec.to_string(),
    })?;
    Ok((
        host.to_string(),
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        },
    ))
}

fn filter_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn install_tracing(verbose: u8, quiet: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter_for(verbose, quiet)));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn build_options(args: &Args) -> Result<ZsyncOptions, CliError> {
    let mut credentials: FxHashMap<String, Credentials> = FxHashMap::default();
    for spec in &args.auth {
        let (host, creds) = parse_auth(spec)?;
        credentials.insert(host, creds);
    }

    let mut options = ZsyncOptions::new();
    for seed in &args.seeds {
        options = options.with_seed(seed);
    }
    if let Some(output) = &args.output {
        options = options.with_output_override(output);
    }
    options.save_zsync_copy = args.save_zsync.clone();
    options.credentials = credentials;
    Ok(options)
}

fn run_parsed(args: &Args) -> Result<PathBuf, CliError> {
    let options = build_options(args)?;

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(Box::new(TerminalProgress::new(
        Box::new(io::stdout()),
        args.quiet,
    )));

    let transport = ReqwestTransport::default();
    let path = engine::run(&args.zsync_file, options, transport, &mut dispatcher)?;
    Ok(path)
}

/// Parses `args` and drives a full zsync run.
///
/// Writes the final outcome to `stdout` on success and to `stderr` on
/// failure, returning the process exit code the binary should use.
pub fn run<I, Out, Err>(args: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    let args = match Args::try_parse_from(args) {
        Ok(args) => args,
        Err(err) => {
            let _ = write!(stderr, "{err}");
            return ExitCode::from(2);
        }
    };

    install_tracing(args.verbose, args.quiet);

    match run_parsed(&args) {
        Ok(path) => {
            let _ = writeln!(stdout, "zsync: wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = writeln!(stderr, "zsync: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_auth_without_equals() {
        let err = parse_auth("example.com:user:pass").unwrap_err();
        assert!(matches!(err, CliError::InvalidAuth { .. }));
    }

    #[test]
    fn rejects_auth_without_colon() {
        let err = parse_auth("example.com=userpass").unwrap_err();
        assert!(matches!(err, CliError::InvalidAuth { .. }));
    }

    #[test]
    fn parses_well_formed_auth() {
        let (host, creds) = parse_auth("example.com=alice:secret").unwrap();
        assert_eq!(host, "example.com");
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn missing_control_file_argument_is_a_usage_error() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run(["zsync"], &mut stdout, &mut stderr);
        assert_eq!(exit, ExitCode::from(2));
    }

    #[test]
    fn nonexistent_control_file_reports_failure() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let exit = run(
            ["zsync", "/nonexistent/path.zsync"],
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(exit, ExitCode::FAILURE);
        assert!(!stderr.is_empty());
    }
}
