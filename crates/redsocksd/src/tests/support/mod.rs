//! Test harness utilities for the lifecycle suites.

mod reporter;
mod signals;
mod subsystem;
mod world;

pub use reporter::{LifecycleEvent, RecordingReporter};
pub use signals::ManualSignals;
pub use subsystem::{HookCall, Journal, ScriptedSubsystem};
pub use world::{TestWorld, failing_reactor, parse_names, parse_signals, world};
