//! Process-wide settings owned by the leading `base` subsystem.

use nix::sys::resource::{Resource, getrlimit, setrlimit};
use redsocks_config::{ConfigSection, EntrySpec, SectionError, SectionSpec, Value, ValueKind};
use strum::{Display, EnumString};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;

use crate::reactor::Reactor;
use crate::subsystem::{Subsystem, SubsystemError};
use crate::telemetry::{DEFAULT_LEVEL, TelemetryHandle};

const BASE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::base");

/// Only supported log destination.
pub const STDERR_LOG: &str = "stderr";

const BASE_ENTRIES: &[EntrySpec] = &[
    EntrySpec::new("log_debug", ValueKind::Bool),
    EntrySpec::new("log_info", ValueKind::Bool),
    EntrySpec::new("log", ValueKind::Str),
    EntrySpec::new("redirector", ValueKind::Str),
    EntrySpec::new("rlimit_nofile", ValueKind::U32),
];

static BASE_SPEC: SectionSpec = SectionSpec::new("base", BASE_ENTRIES);

/// Packet redirection mechanism the relays cooperate with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Redirector {
    /// Linux netfilter `REDIRECT`/`DNAT` rules.
    #[default]
    Iptables,
    /// BSD packet filter.
    Pf,
    /// IP Filter.
    Ipf,
    /// No original-destination lookup; relays use their configured target.
    Generic,
}

/// Values collected from the `base { }` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseSettings {
    /// `log_debug` flag, when given.
    pub log_debug: Option<bool>,
    /// `log_info` flag, when given.
    pub log_info: Option<bool>,
    /// Log destination.
    pub log: Option<String>,
    /// Redirection mechanism.
    pub redirector: Redirector,
    /// Requested `RLIMIT_NOFILE`, when given.
    pub rlimit_nofile: Option<u32>,
}

impl BaseSettings {
    /// Log level implied by the flags, or `None` when neither flag was set.
    ///
    /// `log_debug` wins over `log_info`; turning both off keeps warnings and
    /// errors only.
    #[must_use]
    pub fn verbosity(&self) -> Option<LevelFilter> {
        match (self.log_debug, self.log_info) {
            (None, None) => None,
            (Some(true), _) => Some(LevelFilter::DEBUG),
            (_, Some(true)) => Some(LevelFilter::INFO),
            _ => Some(LevelFilter::WARN),
        }
    }
}

#[derive(Debug, Default)]
struct BaseSection {
    settings: BaseSettings,
    seen: bool,
}

impl ConfigSection for BaseSection {
    fn spec(&self) -> &SectionSpec {
        &BASE_SPEC
    }

    fn on_enter(&mut self) -> Result<(), SectionError> {
        if self.seen {
            return Err(SectionError::new("only one base block is allowed"));
        }
        self.seen = true;
        Ok(())
    }

    fn on_entry(&mut self, key: &str, value: Value) -> Result<(), SectionError> {
        match key {
            "log_debug" => self.settings.log_debug = value.as_bool(),
            "log_info" => self.settings.log_info = value.as_bool(),
            "log" => {
                let target = value.as_str().unwrap_or_default();
                if target != STDERR_LOG {
                    return Err(SectionError::new(format!(
                        "unsupported log destination '{target}', only '{STDERR_LOG}' is available"
                    )));
                }
                self.settings.log = Some(target.to_owned());
            }
            "redirector" => {
                let name = value.as_str().unwrap_or_default();
                self.settings.redirector = name
                    .parse()
                    .map_err(|_| SectionError::new(format!("unknown redirector '{name}'")))?;
            }
            "rlimit_nofile" => self.settings.rlimit_nofile = value.as_u32(),
            _ => {}
        }
        Ok(())
    }
}

/// Leading subsystem applying process-wide settings.
///
/// It is initialised before the reactor exists, so it must not schedule any
/// reactor work.
pub struct BaseSubsystem {
    section: BaseSection,
    telemetry: TelemetryHandle,
    applied_level: Option<LevelFilter>,
}

impl BaseSubsystem {
    /// Builds the subsystem around the daemon's telemetry handle.
    #[must_use]
    pub fn new(telemetry: TelemetryHandle) -> Self {
        Self {
            section: BaseSection::default(),
            telemetry,
            applied_level: None,
        }
    }

    /// Settings parsed so far.
    #[must_use]
    pub const fn settings(&self) -> &BaseSettings {
        &self.section.settings
    }
}

impl Subsystem for BaseSubsystem {
    fn name(&self) -> &str {
        BASE_SPEC.name
    }

    fn config_section(&mut self) -> Option<&mut dyn ConfigSection> {
        Some(&mut self.section)
    }

    fn init(&mut self, _reactor: Option<&Reactor>) -> Result<(), SubsystemError> {
        let settings = &self.section.settings;
        if let Some(level) = settings.verbosity() {
            self.telemetry
                .set_verbosity(level)
                .map_err(|error| SubsystemError::with_source("failed to apply log level", error))?;
            self.applied_level = Some(level);
        }
        if let Some(limit) = settings.rlimit_nofile {
            let limit = u64::from(limit);
            setrlimit(Resource::RLIMIT_NOFILE, limit, limit).map_err(|errno| {
                SubsystemError::with_source(format!("setrlimit(RLIMIT_NOFILE, {limit})"), errno)
            })?;
        }
        Ok(())
    }

    fn fini(&mut self) {
        if self.applied_level.take().is_some() {
            if let Err(error) = self.telemetry.set_verbosity(DEFAULT_LEVEL) {
                warn!(target: BASE_TARGET, %error, "failed to restore log level");
            }
        }
    }

    fn dump(&self) {
        let settings = &self.section.settings;
        let level = self
            .applied_level
            .map_or_else(|| DEFAULT_LEVEL.to_string(), |level| level.to_string());
        match getrlimit(Resource::RLIMIT_NOFILE) {
            Ok((soft, hard)) => info!(
                target: BASE_TARGET,
                level = %level,
                log = settings.log.as_deref().unwrap_or(STDERR_LOG),
                redirector = %settings.redirector,
                nofile_soft = soft,
                nofile_hard = hard,
                "base settings"
            ),
            Err(error) => info!(
                target: BASE_TARGET,
                level = %level,
                log = settings.log.as_deref().unwrap_or(STDERR_LOG),
                redirector = %settings.redirector,
                %error,
                "base settings"
            ),
        }
    }
}
