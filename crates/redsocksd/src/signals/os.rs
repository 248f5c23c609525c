//! Signal delivery through `signal-hook` self-pipes read on the reactor.

use std::io::{self, ErrorKind};
use std::os::unix::net::UnixStream as StdUnixStream;

use signal_hook::SigId;
use signal_hook::low_level::{pipe, unregister};
use tokio::net::UnixStream;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::source::{SignalBinding, SignalSink, SignalSource};
use super::{ControlSignal, SIGNALS_TARGET, SignalBindError, SignalReleaseError};
use crate::reactor::Reactor;

/// Binds real process signals.
///
/// The async-signal-safe handler only writes a byte into a socket pair; the
/// reading half lives on the reactor and turns each byte into one delivery.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSignalSource;

impl OsSignalSource {
    /// Builds the source.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SignalSource for OsSignalSource {
    fn bind(
        &self,
        reactor: &Reactor,
        sink: SignalSink,
    ) -> Result<Box<dyn SignalBinding>, SignalBindError> {
        let signal = sink.signal();
        let os_signal = signal.os_signal();
        let bind_error = |source: io::Error| SignalBindError::new(os_signal, source);

        let (reader, writer) = StdUnixStream::pair().map_err(bind_error)?;
        reader.set_nonblocking(true).map_err(bind_error)?;
        writer.set_nonblocking(true).map_err(bind_error)?;
        let reader = {
            let _context = reactor.enter();
            UnixStream::from_std(reader).map_err(bind_error)?
        };
        let id = pipe::register(os_signal as i32, writer).map_err(bind_error)?;
        let task = reactor.spawn_local(forward(reader, sink));
        debug!(target: SIGNALS_TARGET, signal = %signal, "signal handler bound");
        Ok(Box::new(OsSignalBinding {
            signal,
            id: Some(id),
            task,
        }))
    }
}

async fn forward(reader: UnixStream, sink: SignalSink) {
    let mut buffer = [0_u8; 32];
    loop {
        if let Err(error) = reader.readable().await {
            warn!(target: SIGNALS_TARGET, signal = %sink.signal(), %error, "signal pipe failed");
            return;
        }
        match reader.try_read(&mut buffer) {
            Ok(0) => return,
            Ok(count) => {
                for _ in 0..count {
                    if !sink.deliver() {
                        return;
                    }
                }
            }
            Err(error) if error.kind() == ErrorKind::WouldBlock => {}
            Err(error) => {
                warn!(target: SIGNALS_TARGET, signal = %sink.signal(), %error, "signal pipe failed");
                return;
            }
        }
    }
}

struct OsSignalBinding {
    signal: ControlSignal,
    id: Option<SigId>,
    task: JoinHandle<()>,
}

impl OsSignalBinding {
    fn detach(&mut self) -> bool {
        self.task.abort();
        self.id.take().is_none_or(unregister)
    }
}

impl SignalBinding for OsSignalBinding {
    fn signal(&self) -> ControlSignal {
        self.signal
    }

    fn release(mut self: Box<Self>) -> Result<(), SignalReleaseError> {
        if self.detach() {
            debug!(target: SIGNALS_TARGET, signal = %self.signal, "signal handler released");
            Ok(())
        } else {
            Err(SignalReleaseError::new(
                self.signal,
                "handler was no longer registered",
            ))
        }
    }
}

impl Drop for OsSignalBinding {
    fn drop(&mut self) {
        self.detach();
    }
}
