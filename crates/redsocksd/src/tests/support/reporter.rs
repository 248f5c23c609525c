//! Test double for [`LifecycleReporter`] that records events for assertions.

use std::path::Path;
use std::sync::Mutex;

use redsocks_config::ParseSummary;

use crate::lifecycle::LaunchError;
use crate::reporter::LifecycleReporter;
use crate::signals::ControlSignal;
use crate::subsystem::SubsystemError;

/// Lifecycle events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    ConfigAccepted(ParseSummary),
    SubsystemStarting(String),
    SubsystemReady(String),
    SubsystemFailed { name: String, message: String },
    ReactorCreated,
    Running,
    TerminationRequested(ControlSignal),
    DumpCompleted(usize),
    SubsystemStopping(String),
    StartupFailed(String),
    Stopped,
}

/// Records lifecycle events in arrival order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events
            .lock()
            .expect("lifecycle reporter mutex poisoned")
            .clone()
    }

    /// Counts events equal to `expected`.
    #[must_use]
    pub fn count(&self, expected: &LifecycleEvent) -> usize {
        self.events()
            .iter()
            .filter(|event| *event == expected)
            .count()
    }

    fn record(&self, event: LifecycleEvent) {
        self.events
            .lock()
            .expect("lifecycle reporter mutex poisoned")
            .push(event);
    }
}

impl LifecycleReporter for RecordingReporter {
    fn config_accepted(&self, _path: &Path, summary: &ParseSummary) {
        self.record(LifecycleEvent::ConfigAccepted(*summary));
    }

    fn subsystem_starting(&self, name: &str) {
        self.record(LifecycleEvent::SubsystemStarting(name.to_owned()));
    }

    fn subsystem_ready(&self, name: &str) {
        self.record(LifecycleEvent::SubsystemReady(name.to_owned()));
    }

    fn subsystem_failed(&self, name: &str, error: &SubsystemError) {
        self.record(LifecycleEvent::SubsystemFailed {
            name: name.to_owned(),
            message: error.message().to_owned(),
        });
    }

    fn reactor_created(&self, _backend: &str) {
        self.record(LifecycleEvent::ReactorCreated);
    }

    fn running(&self, _pid: u32) {
        self.record(LifecycleEvent::Running);
    }

    fn termination_requested(&self, signal: ControlSignal) {
        self.record(LifecycleEvent::TerminationRequested(signal));
    }

    fn dump_completed(&self, visited: usize) {
        self.record(LifecycleEvent::DumpCompleted(visited));
    }

    fn subsystem_stopping(&self, name: &str) {
        self.record(LifecycleEvent::SubsystemStopping(name.to_owned()));
    }

    fn startup_failed(&self, error: &LaunchError) {
        self.record(LifecycleEvent::StartupFailed(error.to_string()));
    }

    fn stopped(&self) {
        self.record(LifecycleEvent::Stopped);
    }
}
