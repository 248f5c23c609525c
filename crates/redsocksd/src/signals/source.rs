use tokio::sync::mpsc::UnboundedSender;

use super::{ControlSignal, SignalBindError, SignalReleaseError};
use crate::reactor::Reactor;

/// Delivery endpoint handed to a binding; each call queues one occurrence of
/// the signal for the controller.
#[derive(Debug, Clone)]
pub struct SignalSink {
    signal: ControlSignal,
    sender: UnboundedSender<ControlSignal>,
}

impl SignalSink {
    pub(crate) const fn new(signal: ControlSignal, sender: UnboundedSender<ControlSignal>) -> Self {
        Self { signal, sender }
    }

    /// Signal this sink reports.
    #[must_use]
    pub const fn signal(&self) -> ControlSignal {
        self.signal
    }

    /// Queues one occurrence. Returns `false` once the controller is gone.
    pub fn deliver(&self) -> bool {
        self.sender.send(self.signal).is_ok()
    }
}

/// Mechanism that attaches signals to the reactor.
pub trait SignalSource {
    /// Starts delivering `sink.signal()` occurrences into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalBindError`] when the handler cannot be installed.
    fn bind(
        &self,
        reactor: &Reactor,
        sink: SignalSink,
    ) -> Result<Box<dyn SignalBinding>, SignalBindError>;
}

/// A live signal attachment.
pub trait SignalBinding {
    /// Signal delivered by this binding.
    fn signal(&self) -> ControlSignal;

    /// Detaches the handler. After this returns the binding delivers nothing,
    /// whether or not the OS-level release succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`SignalReleaseError`] when the OS-level handler could not be
    /// removed.
    fn release(self: Box<Self>) -> Result<(), SignalReleaseError>;
}
