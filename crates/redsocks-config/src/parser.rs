//! Single-pass parser driving registered grammar sections.

use std::collections::HashSet;

use crate::errors::{ParseError, ParseErrorKind, ParserBuildError, Position};
use crate::grammar::{ConfigSection, SectionError, SectionSpec, Value};
use crate::lexer::{Lexer, Token, TokenKind};

/// Counts reported by a successful parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    /// Number of blocks consumed.
    pub blocks: usize,
    /// Number of entries delivered to sections.
    pub entries: usize,
}

/// Parser over one configuration source.
///
/// Sections are registered before [`Parser::run`] and receive callbacks in
/// file order. The run stops at the first error, so a single malformed block
/// rejects the whole file.
pub struct Parser<'a> {
    source: &'a str,
    sections: Vec<&'a mut dyn ConfigSection>,
}

impl<'a> Parser<'a> {
    /// Builds a parser with room for `capacity` sections.
    ///
    /// # Errors
    ///
    /// Returns [`ParserBuildError::OutOfMemory`] when the section table cannot
    /// be reserved.
    pub fn with_capacity(source: &'a str, capacity: usize) -> Result<Self, ParserBuildError> {
        let mut sections = Vec::new();
        sections.try_reserve_exact(capacity)?;
        Ok(Self { source, sections })
    }

    /// Registers a grammar section.
    ///
    /// # Errors
    ///
    /// Fails when a section with the same name is already registered or when
    /// the section table cannot grow.
    pub fn add_section(&mut self, section: &'a mut dyn ConfigSection) -> Result<(), ParserBuildError> {
        let name = section.spec().name;
        if self.sections.iter().any(|known| known.spec().name == name) {
            return Err(ParserBuildError::DuplicateSection(name));
        }
        self.sections.try_reserve(1)?;
        self.sections.push(section);
        Ok(())
    }

    /// Names of the registered sections, in registration order.
    #[must_use]
    pub fn section_names(&self) -> Vec<&'static str> {
        self.sections.iter().map(|section| section.spec().name).collect()
    }

    /// Parses the whole source, feeding each block to its section.
    ///
    /// # Errors
    ///
    /// Returns the first lexical, grammatical or section-level failure.
    pub fn run(mut self) -> Result<ParseSummary, ParseError> {
        let mut lexer = Lexer::new(self.source);
        let mut summary = ParseSummary::default();
        while let Some(token) = lexer.next_token()? {
            let name = match token.kind {
                TokenKind::Word(name) => name,
                _ => return Err(unexpected("section name", &token)),
            };
            let section = self
                .sections
                .iter_mut()
                .find(|section| section.spec().name == name)
                .ok_or_else(|| {
                    ParseError::new(token.position, ParseErrorKind::UnknownSection(name.clone()))
                })?;
            summary.entries += parse_block(&mut lexer, &mut **section, token.position)?;
            summary.blocks += 1;
        }
        Ok(summary)
    }
}

fn parse_block(
    lexer: &mut Lexer<'_>,
    section: &mut dyn ConfigSection,
    opened_at: Position,
) -> Result<usize, ParseError> {
    let spec: SectionSpec = *section.spec();
    expect(lexer, &TokenKind::OpenBrace, "'{'")?;
    section
        .on_enter()
        .map_err(|error| rejected(&spec, opened_at, &error))?;

    let mut seen = HashSet::new();
    loop {
        let token = next_or_eof(lexer, "entry key or '}'")?;
        let key = match token.kind {
            TokenKind::CloseBrace => {
                section
                    .on_exit()
                    .map_err(|error| rejected(&spec, token.position, &error))?;
                return Ok(seen.len());
            }
            TokenKind::Word(key) => key,
            _ => return Err(unexpected("entry key or '}'", &token)),
        };
        let entry = spec.entry(&key).ok_or_else(|| {
            ParseError::new(
                token.position,
                ParseErrorKind::UnknownKey {
                    section: spec.name.to_owned(),
                    key: key.clone(),
                },
            )
        })?;
        expect(lexer, &TokenKind::Assign, "'='")?;
        let value_token = next_or_eof(lexer, "value")?;
        let raw = match value_token.kind {
            TokenKind::Word(raw) | TokenKind::Quoted(raw) => raw,
            _ => return Err(unexpected("value", &value_token)),
        };
        expect(lexer, &TokenKind::Semicolon, "';'")?;
        if !seen.insert(key.clone()) {
            return Err(ParseError::new(
                token.position,
                ParseErrorKind::DuplicateKey {
                    section: spec.name.to_owned(),
                    key,
                },
            ));
        }
        let value = Value::parse(entry.kind, &raw).ok_or_else(|| {
            ParseError::new(
                value_token.position,
                ParseErrorKind::InvalidValue {
                    key: key.clone(),
                    kind: entry.kind,
                    value: raw.clone(),
                },
            )
        })?;
        section
            .on_entry(&key, value)
            .map_err(|error| rejected(&spec, value_token.position, &error))?;
    }
}

/// Turns raw file contents into source text for a [`Parser`].
///
/// # Errors
///
/// Returns [`ParseErrorKind::InvalidEncoding`] positioned at the first byte
/// that does not belong to a valid UTF-8 sequence.
pub fn decode_source(bytes: Vec<u8>) -> Result<String, ParseError> {
    String::from_utf8(bytes).map_err(|error| {
        let valid = error.utf8_error().valid_up_to();
        let prefix = error
            .as_bytes()
            .get(..valid)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or_default();
        ParseError::new(end_of(prefix), ParseErrorKind::InvalidEncoding)
    })
}

fn end_of(text: &str) -> Position {
    text.chars().fold(Position::new(1, 1), |position, next| {
        if next == '\n' {
            Position::new(position.line + 1, 1)
        } else {
            Position::new(position.line, position.column + 1)
        }
    })
}

fn next_or_eof(lexer: &mut Lexer<'_>, expected: &'static str) -> Result<Token, ParseError> {
    match lexer.next_token()? {
        Some(token) => Ok(token),
        None => Err(ParseError::new(
            lexer.position(),
            ParseErrorKind::UnexpectedEof { expected },
        )),
    }
}

fn expect(lexer: &mut Lexer<'_>, kind: &TokenKind, expected: &'static str) -> Result<(), ParseError> {
    let token = next_or_eof(lexer, expected)?;
    if &token.kind == kind {
        Ok(())
    } else {
        Err(unexpected(expected, &token))
    }
}

fn unexpected(expected: &'static str, token: &Token) -> ParseError {
    ParseError::new(
        token.position,
        ParseErrorKind::UnexpectedToken {
            expected,
            found: token.kind.describe(),
        },
    )
}

fn rejected(spec: &SectionSpec, position: Position, error: &SectionError) -> ParseError {
    ParseError::new(
        position,
        ParseErrorKind::Rejected {
            section: spec.name.to_owned(),
            message: error.message().to_owned(),
        },
    )
}
