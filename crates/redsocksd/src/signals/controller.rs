use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use super::source::{SignalBinding, SignalSink, SignalSource};
use super::{ControlSignal, SIGNALS_TARGET, SignalAction, SignalBindError};
use crate::reactor::Reactor;
use crate::registry::SubsystemRegistry;
use crate::reporter::LifecycleReporter;

/// How a dispatch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOutcome {
    /// Termination signal that stopped the loop, if any.
    pub stop: Option<ControlSignal>,
    /// Number of dump fan-outs performed while running.
    pub dumps: usize,
}

/// Owns the signal bindings and turns queued deliveries into actions.
pub struct SignalController {
    bindings: Vec<Box<dyn SignalBinding>>,
    sender: UnboundedSender<ControlSignal>,
    events: UnboundedReceiver<ControlSignal>,
}

impl Default for SignalController {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalController {
    /// Builds a controller with no bindings.
    #[must_use]
    pub fn new() -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        Self {
            bindings: Vec::with_capacity(ControlSignal::ALL.len()),
            sender,
            events,
        }
    }

    /// Binds every [`ControlSignal`] in [`ControlSignal::ALL`] order.
    ///
    /// Stops at the first failure; bindings made before it stay held so that
    /// [`SignalController::release_all`] can undo them.
    ///
    /// # Errors
    ///
    /// Returns the first [`SignalBindError`] raised by `source`.
    pub fn bind_all(
        &mut self,
        source: &dyn SignalSource,
        reactor: &Reactor,
    ) -> Result<(), SignalBindError> {
        for signal in ControlSignal::ALL {
            let sink = SignalSink::new(signal, self.sender.clone());
            let binding = source.bind(reactor, sink)?;
            self.bindings.push(binding);
        }
        Ok(())
    }

    /// Signals currently bound, in binding order.
    #[must_use]
    pub fn bound(&self) -> Vec<ControlSignal> {
        self.bindings.iter().map(|binding| binding.signal()).collect()
    }

    /// Releases every binding in reverse binding order.
    ///
    /// Release failures are logged and skipped. Returns how many failed.
    pub fn release_all(&mut self) -> usize {
        let mut failures = 0;
        while let Some(binding) = self.bindings.pop() {
            if let Err(error) = binding.release() {
                failures += 1;
                warn!(target: SIGNALS_TARGET, %error, "signal release failed");
            }
        }
        failures
    }

    /// Dispatches the reactor until a termination signal arrives or another
    /// party breaks the loop.
    ///
    /// Dump signals fan out to every subsystem in registry order. The first
    /// termination signal requests a loop-break; any signal queued behind it
    /// is left undelivered.
    pub fn run(
        &mut self,
        reactor: &Reactor,
        registry: &SubsystemRegistry,
        reporter: &dyn LifecycleReporter,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let breaker = reactor.loop_breaker();
        let events = &mut self.events;
        let state = &mut outcome;
        reactor.dispatch(async move {
            while let Some(signal) = events.recv().await {
                debug!(target: SIGNALS_TARGET, signal = %signal, "signal received");
                match signal.action() {
                    SignalAction::Dump => {
                        let visited = registry.dump_all();
                        state.dumps += 1;
                        reporter.dump_completed(visited);
                    }
                    SignalAction::Shutdown => {
                        reporter.termination_requested(signal);
                        state.stop = Some(signal);
                        breaker.request();
                        return;
                    }
                }
            }
        });
        outcome
    }
}
