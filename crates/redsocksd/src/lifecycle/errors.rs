//! Unified error surface for daemon startup and supervision.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

use nix::sys::signal::Signal;
use redsocks_config::{ParseError, ParserBuildError};
use thiserror::Error;

use crate::pidfile::PidFileError;
use crate::reactor::ReactorError;
use crate::signals::SignalBindError;
use crate::subsystem::SubsystemError;

/// Errors surfaced while starting or supervising the daemon.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The configuration file could not be opened or read.
    #[error("failed to read config file '{}': {source}", path.display())]
    ConfigIo {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Buffers for the configuration text or parser could not be reserved.
    #[error("out of memory while preparing configuration: {source}")]
    OutOfMemory {
        /// Underlying allocation failure.
        #[source]
        source: TryReserveError,
    },
    /// Two subsystems contributed a grammar section with the same name.
    #[error("duplicate config section '{section}' registered")]
    ConfigGrammar {
        /// Section name registered twice.
        section: &'static str,
    },
    /// The configuration text was rejected by the parser.
    #[error("invalid config file '{}': {source}", path.display())]
    ConfigParse {
        /// Configuration file path.
        path: PathBuf,
        /// First parse error.
        #[source]
        source: ParseError,
    },
    /// A subsystem's init hook failed.
    #[error("subsystem '{name}' failed to initialise: {source}")]
    SubsystemInit {
        /// Name of the failing subsystem.
        name: String,
        /// Error reported by the subsystem.
        #[source]
        source: SubsystemError,
    },
    /// The shared event reactor could not be created.
    #[error(transparent)]
    ReactorInit(#[from] ReactorError),
    /// A process-control signal could not be bound to the reactor.
    #[error(transparent)]
    SignalBind(SignalBindError),
    /// `SIGPIPE` could not be ignored.
    #[error("failed to ignore SIGPIPE: {source}")]
    BrokenPipeMask {
        /// Underlying bind error.
        #[source]
        source: SignalBindError,
    },
    /// Writing the PID file failed.
    #[error(transparent)]
    PidfileIo(#[from] PidFileError),
}

impl LaunchError {
    /// Whether the error was raised by the configuration gate, before any
    /// subsystem was initialised.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigIo { .. }
                | Self::OutOfMemory { .. }
                | Self::ConfigGrammar { .. }
                | Self::ConfigParse { .. }
        )
    }
}

impl From<ParserBuildError> for LaunchError {
    fn from(source: ParserBuildError) -> Self {
        match source {
            ParserBuildError::OutOfMemory { source } => Self::OutOfMemory { source },
            ParserBuildError::DuplicateSection(section) => Self::ConfigGrammar { section },
        }
    }
}

impl From<TryReserveError> for LaunchError {
    fn from(source: TryReserveError) -> Self {
        Self::OutOfMemory { source }
    }
}

impl From<SignalBindError> for LaunchError {
    fn from(source: SignalBindError) -> Self {
        if source.signal == Signal::SIGPIPE {
            Self::BrokenPipeMask { source }
        } else {
            Self::SignalBind(source)
        }
    }
}
