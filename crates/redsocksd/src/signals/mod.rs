//! Translation of OS process-control signals into reactor actions.
//!
//! Termination signals request a loop-break; the diagnostic signal fans a
//! dump request out to every subsystem. Delivery is always funnelled through
//! the reactor thread so neither action ever runs concurrently with
//! subsystem callbacks.

mod controller;
mod os;
mod source;

use std::fmt;
use std::io;

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
use thiserror::Error;

pub use controller::{DispatchOutcome, SignalController};
pub use os::OsSignalSource;
pub use source::{SignalBinding, SignalSink, SignalSource};

pub(crate) const SIGNALS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::signals");

/// What the kernel does when a signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalAction {
    /// Stop dispatching and tear every subsystem down.
    Shutdown,
    /// Ask every subsystem to dump its state.
    Dump,
}

/// Signals the kernel binds on the reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSignal {
    /// `SIGTERM`.
    Terminate,
    /// `SIGINT`.
    Interrupt,
    /// `SIGUSR1`.
    Dump,
}

impl ControlSignal {
    /// Binding order: both termination signals, then the diagnostic one.
    pub const ALL: [Self; 3] = [Self::Terminate, Self::Interrupt, Self::Dump];

    /// The OS signal behind this control signal.
    #[must_use]
    pub const fn os_signal(self) -> Signal {
        match self {
            Self::Terminate => Signal::SIGTERM,
            Self::Interrupt => Signal::SIGINT,
            Self::Dump => Signal::SIGUSR1,
        }
    }

    /// Action bound to the signal.
    #[must_use]
    pub const fn action(self) -> SignalAction {
        match self {
            Self::Terminate | Self::Interrupt => SignalAction::Shutdown,
            Self::Dump => SignalAction::Dump,
        }
    }
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.os_signal().as_str())
    }
}

/// Failure to attach a signal to the reactor.
#[derive(Debug, Error)]
#[error("failed to bind {signal} handler: {source}")]
pub struct SignalBindError {
    /// Signal that could not be bound.
    pub signal: Signal,
    #[source]
    source: io::Error,
}

impl SignalBindError {
    /// Wraps an OS error raised while binding `signal`.
    #[must_use]
    pub const fn new(signal: Signal, source: io::Error) -> Self {
        Self { signal, source }
    }
}

/// Failure to detach a signal from the reactor.
#[derive(Debug, Error)]
#[error("failed to release {signal} handler: {reason}")]
pub struct SignalReleaseError {
    /// Signal whose handler could not be released.
    pub signal: ControlSignal,
    reason: String,
}

impl SignalReleaseError {
    /// Builds a release failure with a reason.
    #[must_use]
    pub fn new(signal: ControlSignal, reason: impl Into<String>) -> Self {
        Self {
            signal,
            reason: reason.into(),
        }
    }
}

/// Ignores `SIGPIPE` process-wide so peer resets surface as `EPIPE` on the
/// failing write instead of killing the daemon.
///
/// # Errors
///
/// Returns [`SignalBindError`] when the disposition cannot be changed.
pub fn ignore_broken_pipe() -> Result<(), SignalBindError> {
    let action = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    // SAFETY: installing SIG_IGN runs no user code in signal context.
    unsafe { sigaction(Signal::SIGPIPE, &action) }
        .map(|_| ())
        .map_err(|errno| SignalBindError::new(Signal::SIGPIPE, io::Error::from(errno)))
}
