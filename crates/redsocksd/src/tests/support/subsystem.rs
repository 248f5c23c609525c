//! Scripted subsystem that journals every hook call.

use std::cell::RefCell;
use std::rc::Rc;

use crate::reactor::Reactor;
use crate::subsystem::{Subsystem, SubsystemError};

/// One observed hook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    /// `init` ran; records whether the reactor was handed over.
    Init { name: String, with_reactor: bool },
    Fini(String),
    Dump(String),
    /// A task spawned during `init` ran on the reactor.
    Tick(String),
}

/// Shared, ordered record of hook calls across subsystems.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Rc<RefCell<Vec<HookCall>>>,
}

impl Journal {
    pub fn record(&self, call: HookCall) {
        self.calls.borrow_mut().push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.borrow().clone()
    }

    /// Names of subsystems whose `init` ran, in call order.
    #[must_use]
    pub fn initialised(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HookCall::Init { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Names of subsystems whose `fini` ran, in call order.
    #[must_use]
    pub fn finalised(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HookCall::Fini(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Names of subsystems whose `dump` ran, in call order.
    #[must_use]
    pub fn dumped(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HookCall::Dump(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

/// Subsystem whose hooks succeed or fail on demand.
pub struct ScriptedSubsystem {
    name: String,
    journal: Journal,
    fail_init: bool,
    spawn_tick: bool,
    break_loop: bool,
}

impl ScriptedSubsystem {
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            fail_init: false,
            spawn_tick: false,
            break_loop: false,
        }
    }

    /// Makes `init` fail.
    #[must_use]
    pub const fn failing(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Spawns a reactor task during `init` that journals a tick.
    #[must_use]
    pub const fn ticking(mut self) -> Self {
        self.spawn_tick = true;
        self
    }

    /// Spawns a reactor task during `init` that breaks the loop once it runs.
    #[must_use]
    pub const fn breaking_loop(mut self) -> Self {
        self.break_loop = true;
        self
    }
}

impl Subsystem for ScriptedSubsystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, reactor: Option<&Reactor>) -> Result<(), SubsystemError> {
        self.journal.record(HookCall::Init {
            name: self.name.clone(),
            with_reactor: reactor.is_some(),
        });
        if self.fail_init {
            return Err(SubsystemError::new(format!("{} refused to start", self.name)));
        }
        let Some(reactor) = reactor else {
            return Ok(());
        };
        if self.spawn_tick {
            let journal = self.journal.clone();
            let name = self.name.clone();
            reactor.spawn_local(async move { journal.record(HookCall::Tick(name)) });
        }
        if self.break_loop {
            let breaker = reactor.loop_breaker();
            reactor.spawn_local(async move {
                tokio::task::yield_now().await;
                breaker.request();
            });
        }
        Ok(())
    }

    fn fini(&mut self) {
        self.journal.record(HookCall::Fini(self.name.clone()));
    }

    fn dump(&self) {
        self.journal.record(HookCall::Dump(self.name.clone()));
    }
}
