//! Subsystems shipped with the daemon binary.

mod base;

pub use base::{BaseSettings, BaseSubsystem, Redirector, STDERR_LOG};

use crate::registry::SubsystemRegistry;
use crate::telemetry::TelemetryHandle;

/// Registry run by the `redsocksd` binary.
///
/// `base` leads; relay subsystems are appended after it.
#[must_use]
pub fn builtin(telemetry: TelemetryHandle) -> SubsystemRegistry {
    SubsystemRegistry::builder()
        .with(BaseSubsystem::new(telemetry))
        .build()
}
