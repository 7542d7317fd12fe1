#![deny(unsafe_code)]

use std::io;
use std::{env, process::ExitCode};

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    cli::run(env::args_os(), &mut stdout, &mut stderr)
}
