//! BDD test world: a scripted registry, recording collaborators and the
//! outcome of one daemon launch.

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use nix::errno::Errno;
use tempfile::TempDir;

use crate::lifecycle::{LaunchError, LaunchOutcome, LaunchPlan, RuntimeOptions, run_daemon_with};
use crate::network::{NetworkGate, SystemResolver};
use crate::reactor::{Reactor, ReactorError, ReactorFactory};
use crate::registry::SubsystemRegistry;
use crate::signals::ControlSignal;

use super::reporter::{LifecycleEvent, RecordingReporter};
use super::signals::ManualSignals;
use super::subsystem::{Journal, ScriptedSubsystem};

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    dir: TempDir,
    names: Vec<String>,
    failing: Option<String>,
    check_only: bool,
    pid_file: Option<PathBuf>,
    reactor: ReactorFactory,
    pub journal: Journal,
    pub reporter: Arc<RecordingReporter>,
    pub signals: ManualSignals,
    outcome: Option<Result<LaunchOutcome, LaunchError>>,
}

impl TestWorld {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
            names: Vec::new(),
            failing: None,
            check_only: false,
            pid_file: None,
            reactor: Reactor::new,
            journal: Journal::default(),
            reporter: Arc::new(RecordingReporter::default()),
            signals: ManualSignals::default(),
            outcome: None,
        }
    }

    pub fn set_registry(&mut self, names: Vec<String>) {
        self.names = names;
    }

    pub fn fail_init(&mut self, name: &str) {
        self.failing = Some(name.to_owned());
    }

    pub fn check_only(&mut self) {
        self.check_only = true;
    }

    /// Makes every reactor construction fail.
    pub fn fail_reactor(&mut self) {
        self.reactor = failing_reactor;
    }

    /// Requests a PID file inside the scenario directory.
    pub fn request_pid_file(&mut self) {
        self.pid_file = Some(self.dir.path().join("redsocks.pid"));
    }

    /// Requests a PID file whose parent directory does not exist.
    pub fn request_unwritable_pid_file(&mut self) {
        self.pid_file = Some(self.dir.path().join("missing").join("redsocks.pid"));
    }

    #[must_use]
    pub fn pid_file(&self) -> Option<&PathBuf> {
        self.pid_file.as_ref()
    }

    /// Launches the daemon once with the scripted collaborators.
    pub fn launch(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let config_path = self.dir.path().join("redsocks.conf");
        fs::write(&config_path, "// scripted subsystems carry no sections\n")
            .expect("write config");

        let registry = self.names.iter().fold(
            SubsystemRegistry::builder(),
            |builder, name| {
                let subsystem = ScriptedSubsystem::new(name.clone(), &self.journal);
                if self.failing.as_deref() == Some(name.as_str()) {
                    builder.with(subsystem.failing())
                } else {
                    builder.with(subsystem)
                }
            },
        );
        let plan = LaunchPlan {
            options: RuntimeOptions {
                config_path,
                pid_file: self.pid_file.clone(),
                check_only: self.check_only,
                wait_for_network: false,
            },
            registry: registry.build(),
            signals: self.signals.clone(),
            network: NetworkGate::new(SystemResolver).with_backoff(Duration::ZERO),
            reactor: self.reactor,
            reporter: self.reporter.clone(),
        };
        self.outcome = Some(run_daemon_with(plan));
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&Result<LaunchOutcome, LaunchError>> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn reactors_created(&self) -> usize {
        self.reporter.count(&LifecycleEvent::ReactorCreated)
    }
}

/// Reactor constructor that always reports exhausted descriptors.
pub fn failing_reactor() -> Result<Reactor, ReactorError> {
    Err(ReactorError::new(Errno::EMFILE.into()))
}

#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}

/// Parses a comma-separated list of names, treating `nothing` as empty.
#[must_use]
pub fn parse_names(list: &str) -> Vec<String> {
    if list.trim() == "nothing" {
        return Vec::new();
    }
    list.split(',')
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Parses a comma-separated list of signal names.
pub fn parse_signals(list: &str) -> Result<Vec<ControlSignal>, String> {
    list.split(',')
        .map(str::trim)
        .map(|name| {
            ControlSignal::ALL
                .into_iter()
                .find(|signal| signal.to_string() == name)
                .ok_or_else(|| format!("unknown signal '{name}'"))
        })
        .collect()
}
