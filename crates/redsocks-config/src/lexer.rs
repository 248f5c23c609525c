//! Tokeniser for the sectioned configuration format.

use std::iter::Peekable;
use std::str::Chars;

use crate::errors::{ParseError, ParseErrorKind, Position};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word(String),
    Quoted(String),
    OpenBrace,
    CloseBrace,
    Assign,
    Semicolon,
}

impl TokenKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Word(word) => format!("'{word}'"),
            Self::Quoted(text) => format!("\"{text}\""),
            Self::OpenBrace => "'{'".to_owned(),
            Self::CloseBrace => "'}'".to_owned(),
            Self::Assign => "'='".to_owned(),
            Self::Semicolon => "';'".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) position: Position,
}

pub(crate) struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    pub(crate) const fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let next = self.chars.next()?;
        if next == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(next)
    }

    /// Produces the next token, or `None` at end of input.
    pub(crate) fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_trivia()?;
        let position = self.position();
        let Some(&next) = self.chars.peek() else {
            return Ok(None);
        };
        let kind = match next {
            '{' => self.single(TokenKind::OpenBrace),
            '}' => self.single(TokenKind::CloseBrace),
            '=' => self.single(TokenKind::Assign),
            ';' => self.single(TokenKind::Semicolon),
            '"' => self.quoted(position)?,
            other if is_word_char(other) => self.word(),
            other => {
                return Err(ParseError::new(
                    position,
                    ParseErrorKind::UnexpectedCharacter(other),
                ));
            }
        };
        Ok(Some(Token { kind, position }))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn word(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(&next) = self.chars.peek() {
            if !is_word_char(next) {
                break;
            }
            word.push(next);
            self.bump();
        }
        TokenKind::Word(word)
    }

    fn quoted(&mut self, start: Position) -> Result<TokenKind, ParseError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(TokenKind::Quoted(text)),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(escaped) => text.push(escaped),
                    None => break,
                },
                Some(other) => text.push(other),
                None => break,
            }
        }
        Err(ParseError::new(start, ParseErrorKind::UnterminatedString))
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.chars.peek() {
                Some(next) if next.is_whitespace() => {
                    self.bump();
                }
                Some('#') => self.skip_line(),
                // A lone slash starts a bare word such as an absolute path.
                Some('/') => match self.chars.clone().nth(1) {
                    Some('/') => self.skip_line(),
                    Some('*') => {
                        let start = self.position();
                        self.bump();
                        self.bump();
                        self.skip_block(start)?;
                    }
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(next) = self.bump() {
            if next == '\n' {
                break;
            }
        }
    }

    fn skip_block(&mut self, start: Position) -> Result<(), ParseError> {
        let mut star = false;
        while let Some(next) = self.bump() {
            if star && next == '/' {
                return Ok(());
            }
            star = next == '*';
        }
        Err(ParseError::new(start, ParseErrorKind::UnterminatedComment))
    }
}

fn is_word_char(value: char) -> bool {
    value.is_ascii_alphanumeric() || matches!(value, '_' | '-' | '.' | ':' | '/' | '[' | ']')
}
