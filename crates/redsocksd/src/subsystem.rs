//! Hook contract every pluggable subsystem implements.

use redsocks_config::ConfigSection;
use thiserror::Error;

use crate::reactor::Reactor;

/// A subsystem as seen by the supervisor kernel.
///
/// Every hook except [`Subsystem::name`] is optional; the defaults do
/// nothing. Hooks run on the reactor thread, strictly one at a time.
pub trait Subsystem {
    /// Short identifier used in logs and diagnostics.
    fn name(&self) -> &str;

    /// Grammar section this subsystem contributes to the configuration file.
    fn config_section(&mut self) -> Option<&mut dyn ConfigSection> {
        None
    }

    /// Brings the subsystem up.
    ///
    /// `reactor` is `None` only for the leading subsystem of a registry: the
    /// shared reactor is created right after that first init succeeds, and
    /// every later subsystem receives it.
    fn init(&mut self, reactor: Option<&Reactor>) -> Result<(), SubsystemError> {
        let _ = reactor;
        Ok(())
    }

    /// Releases everything `init` acquired. Only called after a successful
    /// `init`.
    fn fini(&mut self) {}

    /// Emits internal state for operators. Must not change that state.
    fn dump(&self) {}
}

/// Failure reported by a subsystem's `init` hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SubsystemError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SubsystemError {
    /// Builds an error without an underlying cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}
