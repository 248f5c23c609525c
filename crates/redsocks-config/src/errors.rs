//! Error surface of the configuration parser.

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

use crate::grammar::ValueKind;

/// One-based location inside the configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub column: usize,
}

impl Position {
    /// Builds a position.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// What went wrong while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A character outside the grammar was found.
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    /// The file is not valid UTF-8 text.
    #[error("invalid UTF-8 sequence")]
    InvalidEncoding,
    /// A quoted string reached end of input.
    #[error("unterminated string")]
    UnterminatedString,
    /// A block comment reached end of input.
    #[error("unterminated comment")]
    UnterminatedComment,
    /// A token appeared where the grammar expects something else.
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// Description of what the grammar allows here.
        expected: &'static str,
        /// Description of what was found.
        found: String,
    },
    /// Input ended inside a block.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// Description of what the grammar allows here.
        expected: &'static str,
    },
    /// No registered section uses this name.
    #[error("unknown section '{0}'")]
    UnknownSection(String),
    /// The section does not declare this key.
    #[error("unknown key '{key}' in section '{section}'")]
    UnknownKey {
        /// Section being parsed.
        section: String,
        /// Offending key.
        key: String,
    },
    /// The key was already set inside the same block.
    #[error("duplicate key '{key}' in section '{section}'")]
    DuplicateKey {
        /// Section being parsed.
        section: String,
        /// Repeated key.
        key: String,
    },
    /// The value is not a valid rendition of the declared kind.
    #[error("invalid {kind} value '{value}' for key '{key}'")]
    InvalidValue {
        /// Entry key.
        key: String,
        /// Declared kind.
        kind: ValueKind,
        /// Raw text found in the file.
        value: String,
    },
    /// A section callback rejected the block.
    #[error("section '{section}' rejected configuration: {message}")]
    Rejected {
        /// Section that rejected the input.
        section: String,
        /// Reason given by the section.
        message: String,
    },
}

/// Parse failure annotated with its location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {position}: {kind}")]
pub struct ParseError {
    position: Position,
    kind: ParseErrorKind,
}

impl ParseError {
    /// Builds an error at `position`.
    #[must_use]
    pub const fn new(position: Position, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }

    /// Where the failure was detected.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Failure category.
    #[must_use]
    pub const fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}

/// Errors raised while assembling a parser, before any input is consumed.
#[derive(Debug, Error)]
pub enum ParserBuildError {
    /// Reserving parser storage failed.
    #[error("not enough memory for parser: {source}")]
    OutOfMemory {
        /// Allocation failure reported by the collection.
        #[from]
        source: TryReserveError,
    },
    /// Two sections were registered under the same name.
    #[error("section '{0}' registered twice")]
    DuplicateSection(&'static str),
}
