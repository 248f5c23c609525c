//! Startup sequencing from command-line options to a stopped daemon.

use std::path::PathBuf;
use std::sync::Arc;

use redsocks_config::ParseSummary;

use crate::gate::ConfigurationGate;
use crate::network::{NetworkGate, Resolver, SystemResolver};
use crate::pidfile::PidFile;
use crate::reactor::{Reactor, ReactorFactory};
use crate::registry::SubsystemRegistry;
use crate::reporter::{LifecycleReporter, StructuredLifecycleReporter};
use crate::signals::{self, DispatchOutcome, OsSignalSource, SignalSource};
use crate::subsystems;
use crate::telemetry::TelemetryHandle;

use super::errors::LaunchError;
use super::manager::LifecycleManager;

/// Configuration file used when `-c` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "redsocks.conf";

/// Immutable snapshot of the command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Configuration file to load.
    pub config_path: PathBuf,
    /// PID file to write once running.
    pub pid_file: Option<PathBuf>,
    /// Stop after validating the configuration.
    pub check_only: bool,
    /// Block until name resolution works before loading the configuration.
    pub wait_for_network: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            pid_file: None,
            check_only: false,
            wait_for_network: false,
        }
    }
}

/// How a successful launch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// `-t` mode: the configuration was accepted and nothing was started.
    ConfigChecked(ParseSummary),
    /// The daemon ran and shut down cleanly.
    Stopped(DispatchOutcome),
}

/// Collaborators required to launch the daemon.
pub struct LaunchPlan<S, R> {
    /// Command-line flags.
    pub options: RuntimeOptions,
    /// Subsystems to run, in order.
    pub registry: SubsystemRegistry,
    /// Signal binding mechanism.
    pub signals: S,
    /// Gate consulted when `wait_for_network` is set.
    pub network: NetworkGate<R>,
    /// Constructor for the shared reactor.
    pub reactor: ReactorFactory,
    /// Lifecycle observer.
    pub reporter: Arc<dyn LifecycleReporter>,
}

/// Runs the daemon using the production collaborators.
///
/// # Errors
///
/// Returns the [`LaunchError`] that aborted startup.
pub fn run_daemon(
    options: RuntimeOptions,
    telemetry: TelemetryHandle,
) -> Result<LaunchOutcome, LaunchError> {
    let plan = LaunchPlan {
        options,
        registry: subsystems::builtin(telemetry),
        signals: OsSignalSource::new(),
        network: NetworkGate::new(SystemResolver),
        reactor: Reactor::new,
        reporter: Arc::new(StructuredLifecycleReporter::new()),
    };
    run_daemon_with(plan)
}

/// Runs the daemon with injected collaborators.
///
/// # Errors
///
/// Returns the [`LaunchError`] that aborted startup. Every subsystem that was
/// initialised has been finalised by the time it is returned.
pub fn run_daemon_with<S, R>(plan: LaunchPlan<S, R>) -> Result<LaunchOutcome, LaunchError>
where
    S: SignalSource,
    R: Resolver,
{
    let reporter = plan.reporter.clone();
    let result = launch(plan);
    if let Err(error) = &result {
        reporter.startup_failed(error);
    }
    result
}

fn launch<S, R>(plan: LaunchPlan<S, R>) -> Result<LaunchOutcome, LaunchError>
where
    S: SignalSource,
    R: Resolver,
{
    let LaunchPlan {
        options,
        mut registry,
        signals: source,
        network,
        reactor,
        reporter,
    } = plan;

    if options.wait_for_network {
        network.wait_until_ready();
    }
    let summary =
        ConfigurationGate::new(&options.config_path).check(&mut registry, reporter.as_ref())?;
    if options.check_only {
        return Ok(LaunchOutcome::ConfigChecked(summary));
    }
    signals::ignore_broken_pipe()?;

    let mut manager = LifecycleManager::new(registry, reporter).with_reactor_factory(reactor);
    manager.start(&source)?;
    let pidfile = options.pid_file.map(PidFile::new);
    let outcome = manager.run(pidfile.as_ref())?;
    manager.shutdown();
    Ok(LaunchOutcome::Stopped(outcome))
}
