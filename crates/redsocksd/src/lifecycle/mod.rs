//! Daemon lifecycle: startup gates, ordered bring-up and reverse teardown.

mod errors;
mod launch;
mod manager;

pub use errors::LaunchError;
pub use launch::{
    DEFAULT_CONFIG_PATH, LaunchOutcome, LaunchPlan, RuntimeOptions, run_daemon, run_daemon_with,
};
pub use manager::{LifecycleManager, LifecycleState};
