//! Entry point for the redsocks daemon.
//!
//! Standard streams are passed unlocked because the tracing subscriber also
//! writes to stderr while the daemon runs.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    redsocksd::run(std::env::args_os(), &mut stdout, &mut stderr)
}
