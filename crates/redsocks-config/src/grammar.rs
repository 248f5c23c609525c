//! Declarative grammar sections contributed by subsystems.

use std::fmt;
use std::net::IpAddr;

use strum::{Display, EnumString};
use thiserror::Error;

/// Kinds of value a section entry accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ValueKind {
    /// `on`/`off`, `true`/`false` or `yes`/`no`.
    Bool,
    /// Free-form text, quoted or bare.
    Str,
    /// Unsigned 16-bit integer, typically a port.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// IPv4 or IPv6 address.
    IpAddr,
    /// Retired key that is still accepted but no longer has an effect.
    Obsolete,
}

/// Typed value handed to a section once its entry has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean flag.
    Bool(bool),
    /// Text value.
    Str(String),
    /// 16-bit integer.
    U16(u16),
    /// 32-bit integer.
    U32(u32),
    /// Network address.
    IpAddr(IpAddr),
    /// Raw text of an obsolete entry.
    Obsolete(String),
}

impl Value {
    /// Converts raw entry text into a value of the requested kind.
    ///
    /// Returns `None` when the text is not a valid rendition of `kind`.
    #[must_use]
    pub fn parse(kind: ValueKind, raw: &str) -> Option<Self> {
        match kind {
            ValueKind::Bool => parse_bool(raw).map(Self::Bool),
            ValueKind::Str => Some(Self::Str(raw.to_owned())),
            ValueKind::U16 => raw.parse().ok().map(Self::U16),
            ValueKind::U32 => raw.parse().ok().map(Self::U32),
            ValueKind::IpAddr => raw.parse().ok().map(Self::IpAddr),
            ValueKind::Obsolete => Some(Self::Obsolete(raw.to_owned())),
        }
    }

    /// Returns the boolean payload, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the 16-bit payload, if any.
    #[must_use]
    pub const fn as_u16(&self) -> Option<u16> {
        match self {
            Self::U16(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the 32-bit payload, if any.
    #[must_use]
    pub const fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the address payload, if any.
    #[must_use]
    pub const fn as_ip_addr(&self) -> Option<IpAddr> {
        match self {
            Self::IpAddr(value) => Some(*value),
            _ => None,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// One `key = value;` entry accepted inside a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySpec {
    /// Entry key as written in the file.
    pub key: &'static str,
    /// Kind the value is validated against.
    pub kind: ValueKind,
}

impl EntrySpec {
    /// Declares an entry.
    #[must_use]
    pub const fn new(key: &'static str, kind: ValueKind) -> Self {
        Self { key, kind }
    }
}

/// Grammar for one named `name { ... }` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    /// Block name.
    pub name: &'static str,
    /// Entries the block accepts.
    pub entries: &'static [EntrySpec],
}

impl SectionSpec {
    /// Declares a section.
    #[must_use]
    pub const fn new(name: &'static str, entries: &'static [EntrySpec]) -> Self {
        Self { name, entries }
    }

    /// Looks up the declaration for `key`.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&EntrySpec> {
        self.entries.iter().find(|entry| entry.key == key)
    }
}

/// Rejection raised by a section callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SectionError {
    message: String,
}

impl SectionError {
    /// Builds a rejection with a human-readable reason.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Reason supplied by the section.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Receiver for the contents of one grammar section.
///
/// The parser calls [`ConfigSection::on_enter`] when a block opens,
/// [`ConfigSection::on_entry`] once per validated entry and
/// [`ConfigSection::on_exit`] when the block closes. A block name may appear
/// several times; each occurrence produces its own enter/exit pair.
pub trait ConfigSection {
    /// Grammar the section accepts.
    fn spec(&self) -> &SectionSpec;

    /// Invoked when a block for this section opens.
    fn on_enter(&mut self) -> Result<(), SectionError> {
        Ok(())
    }

    /// Invoked once per entry after its value passed kind validation.
    fn on_entry(&mut self, key: &str, value: Value) -> Result<(), SectionError>;

    /// Invoked when the block closes.
    fn on_exit(&mut self) -> Result<(), SectionError> {
        Ok(())
    }
}

impl fmt::Display for SectionSpec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name)
    }
}
