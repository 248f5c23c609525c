//! Sectioned configuration grammar for the redsocks daemon.
//!
//! The daemon configuration is a sequence of named blocks:
//!
//! ```text
//! base {
//!     log_info = on;
//!     redirector = iptables;
//! }
//! ```
//!
//! Each subsystem contributes the grammar for its own block by implementing
//! [`ConfigSection`]. The daemon registers every section with a [`Parser`]
//! before running it once over the whole file. Entries are type-checked
//! against their [`EntrySpec`] before the owning section sees them, and the
//! first failure anywhere rejects the file.

mod errors;
mod grammar;
mod lexer;
mod parser;

pub use errors::{ParseError, ParseErrorKind, ParserBuildError, Position};
pub use grammar::{ConfigSection, EntrySpec, SectionError, SectionSpec, Value, ValueKind};
pub use parser::{ParseSummary, Parser, decode_source};
