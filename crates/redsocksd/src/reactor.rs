//! The single cooperative event loop shared by every subsystem.
//!
//! The reactor is a Tokio current-thread runtime driving a [`LocalSet`], so
//! subsystem tasks, timers and signal forwarding all run on the thread that
//! calls [`Reactor::dispatch`]. Tasks may hold `!Send` state; nothing here
//! needs a lock.

use std::cell::Cell;
use std::future::Future;
use std::io;
use std::rc::Rc;

use thiserror::Error;
use tokio::runtime::{Builder, EnterGuard, Runtime};
use tokio::sync::Notify;
use tokio::task::{JoinHandle, LocalSet};

/// Human-readable name of the event backend.
pub const REACTOR_BACKEND: &str = "tokio current-thread";

/// Failure to build the reactor.
#[derive(Debug, Error)]
#[error("failed to create {REACTOR_BACKEND} reactor: {source}")]
pub struct ReactorError {
    #[source]
    source: io::Error,
}

impl ReactorError {
    /// Wraps the OS error that prevented the runtime from starting.
    #[must_use]
    pub const fn new(source: io::Error) -> Self {
        Self { source }
    }
}

/// Constructor used by the lifecycle manager to build the shared reactor.
pub type ReactorFactory = fn() -> Result<Reactor, ReactorError>;

/// Shared single-threaded event dispatcher.
pub struct Reactor {
    // Dropped before the runtime so pending tasks release their resources
    // while the drivers still exist.
    local: LocalSet,
    runtime: Runtime,
    breaker: LoopBreaker,
}

impl Reactor {
    /// Builds the reactor with I/O and timer drivers enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError`] when the runtime cannot be created.
    pub fn new() -> Result<Self, ReactorError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ReactorError::new)?;
        Ok(Self {
            local: LocalSet::new(),
            runtime,
            breaker: LoopBreaker::default(),
        })
    }

    /// Name of the event backend, for diagnostics.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        REACTOR_BACKEND
    }

    /// Schedules a task on the reactor thread.
    ///
    /// The task starts running once [`Reactor::dispatch`] is entered.
    pub fn spawn_local<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.local.spawn_local(future)
    }

    /// Enters the runtime context so I/O resources can be registered outside
    /// of a running task.
    #[must_use]
    pub fn enter(&self) -> EnterGuard<'_> {
        self.runtime.enter()
    }

    /// Handle that asks a running dispatch to return.
    #[must_use]
    pub fn loop_breaker(&self) -> LoopBreaker {
        self.breaker.clone()
    }

    /// Runs the loop until `driver` completes or a loop-break is requested.
    ///
    /// Spawned tasks make progress only while this call is active. A pending
    /// break request is consumed on return.
    pub fn dispatch<F>(&self, driver: F)
    where
        F: Future<Output = ()>,
    {
        let breaker = self.breaker.clone();
        self.local.block_on(&self.runtime, async move {
            tokio::select! {
                biased;
                () = breaker.wait() => {}
                () = driver => {}
            }
        });
        self.breaker.reset();
    }
}

/// Cloneable request to break out of [`Reactor::dispatch`].
///
/// Requests are idempotent and take effect at the next loop iteration.
#[derive(Clone, Default)]
pub struct LoopBreaker {
    state: Rc<BreakState>,
}

#[derive(Default)]
struct BreakState {
    requested: Cell<bool>,
    notify: Notify,
}

impl LoopBreaker {
    /// Requests loop-break. Returns `false` when a request was already pending.
    pub fn request(&self) -> bool {
        if self.state.requested.replace(true) {
            return false;
        }
        self.state.notify.notify_one();
        true
    }

    /// Whether a request is pending.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.state.requested.get()
    }

    async fn wait(&self) {
        while !self.state.requested.get() {
            self.state.notify.notified().await;
        }
    }

    fn reset(&self) {
        self.state.requested.set(false);
    }
}
