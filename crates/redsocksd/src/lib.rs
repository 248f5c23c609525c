//! Process supervisor and event kernel of the redsocks transparent relay.
//!
//! The daemon loads one configuration file through every subsystem's grammar
//! section, brings the subsystems up in registry order on a single shared
//! [`Reactor`], and then dispatches events until `SIGTERM` or `SIGINT` asks it
//! to stop. Teardown is the exact reverse of bring-up, and any startup failure
//! rolls back only the subsystems that actually started. `SIGUSR1` asks every
//! subsystem to dump its state without interrupting the loop.
//!
//! Relay subsystems plug in by implementing [`Subsystem`] and being appended
//! to a [`SubsystemRegistry`] after the leading `base` subsystem.

mod cli;
mod gate;
pub mod lifecycle;
mod network;
mod pidfile;
mod reactor;
mod registry;
mod reporter;
pub mod signals;
mod subsystem;
pub mod subsystems;
pub mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser as _;

pub use gate::ConfigurationGate;
pub use lifecycle::{LaunchError, LaunchOutcome, RuntimeOptions, run_daemon};
pub use network::{NetworkGate, Resolver, SystemResolver};
pub use pidfile::{PidFile, PidFileError};
pub use reactor::{LoopBreaker, REACTOR_BACKEND, Reactor, ReactorError, ReactorFactory};
pub use registry::{RegistryBuilder, SubsystemRegistry};
pub use reporter::{LifecycleReporter, StructuredLifecycleReporter};
pub use subsystem::{Subsystem, SubsystemError};
pub use telemetry::{TelemetryError, TelemetryHandle};

use cli::Cli;

/// Name used to prefix fatal diagnostics.
pub const DAEMON_NAME: &str = "redsocksd";

/// Runs the daemon with explicit argument and output streams.
///
/// Usage and version text go to `stdout`; a one-line diagnostic goes to
/// `stderr` when startup fails.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let program = args
        .first()
        .map_or_else(|| DAEMON_NAME.to_owned(), |arg| arg.to_string_lossy().into_owned());

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = writeln!(stderr, "{DAEMON_NAME}: {}", error.kind());
            let _ = cli::write_usage(stdout, &program);
            return ExitCode::FAILURE;
        }
    };
    if cli.help {
        return report_output(cli::write_usage(stdout, &program), stderr);
    }
    if cli.version {
        return report_output(cli::write_version(stdout), stderr);
    }

    let telemetry = match telemetry::initialise() {
        Ok(handle) => handle,
        Err(error) => {
            let _ = writeln!(stderr, "{DAEMON_NAME}: {error}");
            return ExitCode::FAILURE;
        }
    };
    match run_daemon(cli.into_options(), telemetry) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{DAEMON_NAME}: {error}");
            ExitCode::FAILURE
        }
    }
}

fn report_output<E: Write>(result: std::io::Result<()>, stderr: &mut E) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{DAEMON_NAME}: {error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
