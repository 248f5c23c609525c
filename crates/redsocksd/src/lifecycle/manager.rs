//! Ordered bring-up and reverse teardown of the subsystem registry.

use std::process;
use std::sync::Arc;

use crate::pidfile::PidFile;
use crate::reactor::{Reactor, ReactorFactory};
use crate::registry::SubsystemRegistry;
use crate::reporter::LifecycleReporter;
use crate::signals::{ControlSignal, DispatchOutcome, SignalController, SignalSource};

use super::errors::LaunchError;

/// Where the daemon is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Nothing has been initialised yet.
    NotStarted,
    /// The first `k` subsystems are initialised.
    Initializing(usize),
    /// Every subsystem runs and signals are bound.
    Running,
    /// Teardown is in progress.
    ShuttingDown,
    /// Teardown finished; the manager is inert.
    Stopped,
}

/// Drives subsystem hooks, the shared reactor and signal bindings.
///
/// A failure at any point tears down exactly the subsystems whose `init`
/// succeeded, newest first. Teardown runs at most once, including from
/// `Drop`.
pub struct LifecycleManager {
    registry: SubsystemRegistry,
    reporter: Arc<dyn LifecycleReporter>,
    state: LifecycleState,
    initialized: usize,
    reactor: Option<Reactor>,
    reactor_factory: ReactorFactory,
    signals: SignalController,
}

impl LifecycleManager {
    /// Wraps a registry whose configuration was already accepted.
    #[must_use]
    pub fn new(registry: SubsystemRegistry, reporter: Arc<dyn LifecycleReporter>) -> Self {
        Self {
            registry,
            reporter,
            state: LifecycleState::NotStarted,
            initialized: 0,
            reactor: None,
            reactor_factory: Reactor::new,
            signals: SignalController::new(),
        }
    }

    /// Replaces the constructor used for the shared reactor.
    #[must_use]
    pub fn with_reactor_factory(mut self, factory: ReactorFactory) -> Self {
        self.reactor_factory = factory;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Number of subsystems whose `init` succeeded and that await `fini`.
    #[must_use]
    pub const fn initialized(&self) -> usize {
        self.initialized
    }

    /// Whether the shared reactor currently exists.
    #[must_use]
    pub const fn has_reactor(&self) -> bool {
        self.reactor.is_some()
    }

    /// Signals currently bound to the reactor.
    #[must_use]
    pub fn bound_signals(&self) -> Vec<ControlSignal> {
        self.signals.bound()
    }

    /// Initialises every subsystem in registry order, then binds the control
    /// signals.
    ///
    /// The reactor is created right after the first successful `init`, or
    /// after the loop when the registry is empty.
    ///
    /// # Errors
    ///
    /// Returns the first init, reactor or signal failure, after rolling back
    /// every subsystem initialised so far. A reactor failure right after the
    /// leading subsystem's `init` still finalises that subsystem.
    pub fn start(&mut self, signals: &dyn SignalSource) -> Result<(), LaunchError> {
        self.state = LifecycleState::Initializing(0);
        for index in 0..self.registry.len() {
            if let Err(error) = self.init_one(index) {
                self.shutdown();
                return Err(error);
            }
        }
        if let Err(error) = self
            .ensure_reactor()
            .and_then(|()| self.bind_signals(signals))
        {
            self.shutdown();
            return Err(error);
        }
        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Writes the PID file when requested, then dispatches until a
    /// termination signal or another loop-break stops the reactor.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::PidfileIo`] after rolling back every subsystem
    /// when the PID file cannot be written.
    pub fn run(&mut self, pidfile: Option<&PidFile>) -> Result<DispatchOutcome, LaunchError> {
        let pid = process::id();
        if let Some(pidfile) = pidfile {
            if let Err(error) = pidfile.write(pid) {
                self.shutdown();
                return Err(error.into());
            }
        }
        self.reporter.running(pid);
        Ok(self.dispatch())
    }

    /// Dispatches the reactor without touching the PID file.
    ///
    /// Returns immediately with an empty outcome unless the manager is
    /// running.
    pub fn dispatch(&mut self) -> DispatchOutcome {
        match (&self.state, &self.reactor) {
            (LifecycleState::Running, Some(reactor)) => {
                self.signals
                    .run(reactor, &self.registry, self.reporter.as_ref())
            }
            _ => DispatchOutcome::default(),
        }
    }

    /// Releases signals, finalises initialised subsystems newest first and
    /// destroys the reactor. Later calls do nothing.
    pub fn shutdown(&mut self) {
        match self.state {
            LifecycleState::Stopped | LifecycleState::ShuttingDown => return,
            LifecycleState::NotStarted => {
                self.state = LifecycleState::Stopped;
                return;
            }
            LifecycleState::Initializing(_) | LifecycleState::Running => {}
        }
        self.state = LifecycleState::ShuttingDown;
        self.signals.release_all();
        while self.initialized > 0 {
            self.initialized -= 1;
            if let Some(subsystem) = self.registry.subsystem_mut(self.initialized) {
                self.reporter.subsystem_stopping(subsystem.name());
                subsystem.fini();
            }
        }
        self.reactor = None;
        self.state = LifecycleState::Stopped;
        self.reporter.stopped();
    }

    fn init_one(&mut self, index: usize) -> Result<(), LaunchError> {
        let Some(subsystem) = self.registry.subsystem_mut(index) else {
            return Ok(());
        };
        let name = subsystem.name().to_owned();
        self.reporter.subsystem_starting(&name);
        if let Err(source) = subsystem.init(self.reactor.as_ref()) {
            self.reporter.subsystem_failed(&name, &source);
            return Err(LaunchError::SubsystemInit { name, source });
        }
        self.initialized = index + 1;
        self.state = LifecycleState::Initializing(self.initialized);
        self.reporter.subsystem_ready(&name);
        self.ensure_reactor()
    }

    fn ensure_reactor(&mut self) -> Result<(), LaunchError> {
        if self.reactor.is_none() {
            let reactor = (self.reactor_factory)()?;
            self.reporter.reactor_created(reactor.backend());
            self.reactor = Some(reactor);
        }
        Ok(())
    }

    fn bind_signals(&mut self, signals: &dyn SignalSource) -> Result<(), LaunchError> {
        if let Some(reactor) = &self.reactor {
            self.signals.bind_all(signals, reactor)?;
        }
        Ok(())
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
