//! Structured telemetry initialisation for the daemon.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

/// Environment variable holding extra filter directives.
pub const LOG_ENV_VAR: &str = "REDSOCKS_LOG";

/// Level used until the configuration says otherwise.
pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::INFO;

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static TELEMETRY_GUARD: OnceCell<FilterHandle> = OnceCell::new();

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(#[source] TryInitError),
    /// Failed to swap the active filter.
    #[error("failed to update log filter: {0}")]
    Reload(#[source] reload::Error),
}

/// Handle used to retune verbosity after startup.
#[derive(Debug, Clone)]
pub struct TelemetryHandle {
    filter: Option<FilterHandle>,
}

impl TelemetryHandle {
    /// Handle not attached to any subscriber; verbosity changes are ignored.
    #[must_use]
    pub const fn detached() -> Self {
        Self { filter: None }
    }

    /// Replaces the base level. Directives from [`LOG_ENV_VAR`] still apply
    /// on top of it.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Reload`] when the subscriber is gone.
    pub fn set_verbosity(&self, level: LevelFilter) -> Result<(), TelemetryError> {
        match &self.filter {
            Some(handle) => handle
                .reload(build_filter(level))
                .map_err(TelemetryError::Reload),
            None => Ok(()),
        }
    }
}

/// Installs the global subscriber on first call.
///
/// Later calls return a handle to the subscriber installed by the first one.
///
/// # Errors
///
/// Returns [`TelemetryError::Subscriber`] when another global subscriber is
/// already installed.
pub fn initialise() -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(install_subscriber)
        .map(|handle| TelemetryHandle {
            filter: Some(handle.clone()),
        })
}

fn install_subscriber() -> Result<FilterHandle, TelemetryError> {
    let (filter, handle) = reload::Layer::new(build_filter(DEFAULT_LEVEL));
    let output = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());
    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .map_err(TelemetryError::Subscriber)?;
    Ok(handle)
}

fn build_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn detached_handle_ignores_verbosity_changes() {
        let handle = TelemetryHandle::detached();
        handle
            .set_verbosity(LevelFilter::DEBUG)
            .expect("detached handle accepts any level");
    }
}
