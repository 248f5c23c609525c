//! In-process [`SignalSource`] that lets tests raise signals by hand.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::reactor::Reactor;
use crate::signals::{
    ControlSignal, SignalBindError, SignalBinding, SignalReleaseError, SignalSink, SignalSource,
};

#[derive(Default)]
struct ManualState {
    sinks: HashMap<ControlSignal, SignalSink>,
    fail_bind: Option<ControlSignal>,
    fail_release: Option<ControlSignal>,
    released: Vec<ControlSignal>,
    script: Vec<ControlSignal>,
}

/// Signal source backed by a shared table of sinks.
#[derive(Clone, Default)]
pub struct ManualSignals {
    state: Arc<Mutex<ManualState>>,
}

impl ManualSignals {
    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().expect("manual signals mutex poisoned")
    }

    /// Makes binding `signal` fail.
    pub fn fail_bind(&self, signal: ControlSignal) {
        self.state().fail_bind = Some(signal);
    }

    /// Makes releasing `signal` fail.
    pub fn fail_release(&self, signal: ControlSignal) {
        self.state().fail_release = Some(signal);
    }

    /// Queues signals raised as soon as every control signal is bound.
    pub fn script(&self, signals: &[ControlSignal]) {
        self.state().script.extend_from_slice(signals);
    }

    /// Delivers `signal` now. Returns `false` when it is not bound.
    pub fn raise(&self, signal: ControlSignal) -> bool {
        self.state()
            .sinks
            .get(&signal)
            .is_some_and(SignalSink::deliver)
    }

    /// Signals currently bound.
    #[must_use]
    pub fn bound(&self) -> Vec<ControlSignal> {
        let state = self.state();
        ControlSignal::ALL
            .into_iter()
            .filter(|signal| state.sinks.contains_key(signal))
            .collect()
    }

    /// Signals released so far, in release order.
    #[must_use]
    pub fn released(&self) -> Vec<ControlSignal> {
        self.state().released.clone()
    }
}

impl SignalSource for ManualSignals {
    fn bind(
        &self,
        _reactor: &Reactor,
        sink: SignalSink,
    ) -> Result<Box<dyn SignalBinding>, SignalBindError> {
        let signal = sink.signal();
        let mut state = self.state();
        if state.fail_bind == Some(signal) {
            return Err(SignalBindError::new(
                signal.os_signal(),
                io::Error::other("scripted bind failure"),
            ));
        }
        state.sinks.insert(signal, sink);
        if state.sinks.len() == ControlSignal::ALL.len() {
            let script = std::mem::take(&mut state.script);
            for raised in script {
                if let Some(sink) = state.sinks.get(&raised) {
                    sink.deliver();
                }
            }
        }
        Ok(Box::new(ManualBinding {
            signal,
            signals: self.clone(),
        }))
    }
}

struct ManualBinding {
    signal: ControlSignal,
    signals: ManualSignals,
}

impl SignalBinding for ManualBinding {
    fn signal(&self) -> ControlSignal {
        self.signal
    }

    fn release(self: Box<Self>) -> Result<(), SignalReleaseError> {
        let mut state = self.signals.state();
        state.sinks.remove(&self.signal);
        state.released.push(self.signal);
        if state.fail_release == Some(self.signal) {
            return Err(SignalReleaseError::new(self.signal, "scripted release failure"));
        }
        Ok(())
    }
}
