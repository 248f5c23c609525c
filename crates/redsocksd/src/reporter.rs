//! Structured reporting of supervisor lifecycle events.

use std::path::Path;
use std::sync::Arc;

use redsocks_config::ParseSummary;

use crate::lifecycle::LaunchError;
use crate::signals::ControlSignal;
use crate::subsystem::SubsystemError;

const LIFECYCLE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::lifecycle");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait LifecycleReporter: Send + Sync {
    /// Invoked once the configuration file passed every grammar section.
    fn config_accepted(&self, path: &Path, summary: &ParseSummary);

    /// Invoked before a subsystem's init hook runs.
    fn subsystem_starting(&self, name: &str);

    /// Invoked after a subsystem's init hook succeeded.
    fn subsystem_ready(&self, name: &str);

    /// Invoked when a subsystem's init hook failed.
    fn subsystem_failed(&self, name: &str, error: &SubsystemError);

    /// Invoked when the shared reactor has been created.
    fn reactor_created(&self, backend: &str);

    /// Invoked when every subsystem runs and the loop is about to dispatch.
    fn running(&self, pid: u32);

    /// Invoked when a termination signal asked the loop to stop.
    fn termination_requested(&self, signal: ControlSignal);

    /// Invoked after a diagnostic dump fan-out.
    fn dump_completed(&self, visited: usize);

    /// Invoked before a subsystem's fini hook runs.
    fn subsystem_stopping(&self, name: &str);

    /// Invoked when startup aborted.
    fn startup_failed(&self, error: &LaunchError);

    /// Invoked once shutdown completed.
    fn stopped(&self);
}

impl<T> LifecycleReporter for Arc<T>
where
    T: LifecycleReporter + ?Sized,
{
    fn config_accepted(&self, path: &Path, summary: &ParseSummary) {
        (**self).config_accepted(path, summary);
    }

    fn subsystem_starting(&self, name: &str) {
        (**self).subsystem_starting(name);
    }

    fn subsystem_ready(&self, name: &str) {
        (**self).subsystem_ready(name);
    }

    fn subsystem_failed(&self, name: &str, error: &SubsystemError) {
        (**self).subsystem_failed(name, error);
    }

    fn reactor_created(&self, backend: &str) {
        (**self).reactor_created(backend);
    }

    fn running(&self, pid: u32) {
        (**self).running(pid);
    }

    fn termination_requested(&self, signal: ControlSignal) {
        (**self).termination_requested(signal);
    }

    fn dump_completed(&self, visited: usize) {
        (**self).dump_completed(visited);
    }

    fn subsystem_stopping(&self, name: &str) {
        (**self).subsystem_stopping(name);
    }

    fn startup_failed(&self, error: &LaunchError) {
        (**self).startup_failed(error);
    }

    fn stopped(&self) {
        (**self).stopped();
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredLifecycleReporter;

impl StructuredLifecycleReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleReporter for StructuredLifecycleReporter {
    fn config_accepted(&self, path: &Path, summary: &ParseSummary) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "config_accepted",
            file = %path.display(),
            blocks = summary.blocks,
            entries = summary.entries,
            "configuration accepted"
        );
    }

    fn subsystem_starting(&self, name: &str) {
        tracing::debug!(
            target: LIFECYCLE_TARGET,
            event = "subsystem_starting",
            subsystem = name,
            "initialising subsystem"
        );
    }

    fn subsystem_ready(&self, name: &str) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "subsystem_ready",
            subsystem = name,
            "subsystem ready"
        );
    }

    fn subsystem_failed(&self, name: &str, error: &SubsystemError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "subsystem_failed",
            subsystem = name,
            error = %error,
            "subsystem failed to initialise"
        );
    }

    fn reactor_created(&self, backend: &str) {
        tracing::debug!(
            target: LIFECYCLE_TARGET,
            event = "reactor_created",
            backend,
            "event reactor created"
        );
    }

    fn running(&self, pid: u32) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "running",
            pid,
            "redsocks started"
        );
    }

    fn termination_requested(&self, signal: ControlSignal) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "termination_requested",
            signal = %signal,
            "redsocks goes down"
        );
    }

    fn dump_completed(&self, visited: usize) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "dump_completed",
            visited,
            "diagnostic dump completed"
        );
    }

    fn subsystem_stopping(&self, name: &str) {
        tracing::debug!(
            target: LIFECYCLE_TARGET,
            event = "subsystem_stopping",
            subsystem = name,
            "finalising subsystem"
        );
    }

    fn startup_failed(&self, error: &LaunchError) {
        tracing::error!(
            target: LIFECYCLE_TARGET,
            event = "startup_failed",
            error = %error,
            "startup aborted"
        );
    }

    fn stopped(&self) {
        tracing::info!(
            target: LIFECYCLE_TARGET,
            event = "stopped",
            "shutdown sequence completed"
        );
    }
}
