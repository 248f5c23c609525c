//! Command-line flags of the daemon.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;

use crate::lifecycle::{DEFAULT_CONFIG_PATH, RuntimeOptions};
use crate::reactor::REACTOR_BACKEND;

/// Flags accepted by `redsocksd`.
///
/// Help and version are handled by hand so their output matches the classic
/// single-screen usage text.
#[derive(Parser, Debug)]
#[command(
    name = "redsocksd",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub(crate) struct Cli {
    /// Configuration file.
    #[arg(short = 'c', value_name = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub(crate) config: PathBuf,
    /// PID file written once running.
    #[arg(short = 'p', value_name = "pidfile")]
    pub(crate) pidfile: Option<PathBuf>,
    /// Validate the configuration and exit.
    #[arg(short = 't')]
    pub(crate) test_config: bool,
    /// Wait until the network is ready before starting.
    #[arg(short = 'w')]
    pub(crate) wait_for_network: bool,
    /// Print the version and exit.
    #[arg(short = 'v')]
    pub(crate) version: bool,
    /// Print usage and exit.
    #[arg(short = 'h', short_alias = '?')]
    pub(crate) help: bool,
}

impl Cli {
    /// Snapshot consumed by the launcher.
    pub(crate) fn into_options(self) -> RuntimeOptions {
        RuntimeOptions {
            config_path: self.config,
            pid_file: self.pidfile,
            check_only: self.test_config,
            wait_for_network: self.wait_for_network,
        }
    }
}

pub(crate) fn write_usage<W: Write>(out: &mut W, program: &str) -> io::Result<()> {
    writeln!(out, "Usage: {program} [-?hwvt] [-c config] [-p pidfile]")?;
    writeln!(out, "  -h, -?       this message")?;
    writeln!(out, "  -w           wait until network ready")?;
    writeln!(out, "  -v           print version")?;
    writeln!(out, "  -t           test config syntax")?;
    writeln!(out, "  -c           config file (default: {DEFAULT_CONFIG_PATH})")?;
    writeln!(out, "  -p           write pid to pidfile")
}

pub(crate) fn write_version<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "redsocksd {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "Runs with {REACTOR_BACKEND} reactor")
}
