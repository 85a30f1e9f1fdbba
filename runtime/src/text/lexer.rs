// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::Display;

use super::Str8View;

/// Which kind of line ending the lexer is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    pub const fn len(self) -> usize {
        match self {
            LineEnding::Lf => 1,
            LineEnding::CrLf => 2,
        }
    }
}

/// Errors from the parsing functions of [`Lexer`]. The positions are byte
/// offsets into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    ExpectedInteger { position: usize },
    ExpectedQuote { position: usize },
    /// The string starting at `position` has no closing quote.
    UnterminatedString { position: usize },
}

impl Display for LexError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LexError::ExpectedInteger { position } => {
                write!(f, "expected an integer at byte {position}")
            }
            LexError::ExpectedQuote { position } => {
                write!(f, "expected a '\"' at byte {position}")
            }
            LexError::UnterminatedString { position } => {
                write!(f, "the string starting at byte {position} is missing its closing '\"'")
            }
        }
    }
}

impl core::error::Error for LexError {}

/// A cursor over a byte buffer, with the scanning primitives the asset
/// formats are parsed with. Doesn't allocate or produce tokens, everything it
/// returns is a view into the source.
///
/// The cursor is always within `0..=source.len()`, and when it's at the end,
/// the [lexeme](Lexer::lexeme) reads as 0.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src [u8],
    cursor: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src [u8]) -> Lexer<'src> {
        Lexer { source, cursor: 0 }
    }

    /// The offset of the cursor from the start of the source.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The byte under the cursor, or 0 at the end.
    pub fn lexeme(&self) -> u8 {
        self.source.get(self.cursor).copied().unwrap_or(0)
    }

    /// The unconsumed part of the source.
    pub fn remaining(&self) -> Str8View<'src> {
        Str8View::new(&self.source[self.cursor..])
    }

    pub fn is_end(&self) -> bool {
        self.cursor >= self.source.len()
    }

    pub fn advance(&mut self) {
        self.advance_by(1);
    }

    /// Moves the cursor forward by `count` bytes, stopping at the end of the
    /// source.
    pub fn advance_by(&mut self, count: usize) {
        self.cursor = self.cursor.saturating_add(count).min(self.source.len());
    }

    /// The byte `offset` bytes from the cursor, or 0 if that's outside the
    /// source.
    pub fn peek(&self, offset: isize) -> u8 {
        self.cursor
            .checked_add_signed(offset)
            .and_then(|i| self.source.get(i))
            .copied()
            .unwrap_or(0)
    }

    /// For positive `offset`, the next `offset` bytes starting at the cursor.
    /// For negative `offset`, the `-offset` bytes right before the cursor.
    /// Empty if the bytes aren't all within the source, or if `offset` is 0.
    pub fn peek_view(&self, offset: isize) -> Str8View<'src> {
        let range = if offset >= 0 {
            self.cursor.checked_add(offset.unsigned_abs()).map(|end| self.cursor..end)
        } else {
            self.cursor.checked_sub(offset.unsigned_abs()).map(|start| start..self.cursor)
        };
        range
            .and_then(|range| self.source.get(range))
            .map(Str8View::new)
            .unwrap_or_default()
    }

    /// Returns true if the source continues with `text` at the cursor.
    pub fn check_peeked(&self, text: &[u8]) -> bool {
        self.source[self.cursor..].starts_with(text)
    }

    /// Like [`Lexer::check_peeked`], and consumes `text` if it matched.
    pub fn check_peeked_and_advance(&mut self, text: &[u8]) -> bool {
        let matched = self.check_peeked(text);
        if matched {
            self.advance_by(text.len());
        }
        matched
    }

    /// Returns the line ending at the cursor, if there's one.
    pub fn is_endline(&self) -> Option<LineEnding> {
        match (self.lexeme(), self.peek(1)) {
            (b'\n', _) => Some(LineEnding::Lf),
            (b'\r', b'\n') => Some(LineEnding::CrLf),
            _ => None,
        }
    }

    /// Advances past spaces, tabs, carriage returns and line feeds.
    pub fn skip_whitespace(&mut self) {
        while !self.is_end() && matches!(self.lexeme(), b' ' | b'\t' | b'\r' | b'\n') {
            self.advance();
        }
    }

    /// Advances until the cursor is at `byte` (or the end), returning the
    /// skipped bytes. The `byte` itself is not consumed.
    pub fn skip_until(&mut self, byte: u8) -> Str8View<'src> {
        let start = self.cursor;
        while !self.is_end() && self.lexeme() != byte {
            self.advance();
        }
        Str8View::new(&self.source[start..self.cursor])
    }

    /// Advances until the source continues with `text` (or the end),
    /// returning the skipped bytes. Skips nothing if `text` is empty.
    pub fn skip_until_view(&mut self, text: &[u8]) -> Str8View<'src> {
        let start = self.cursor;
        if !text.is_empty() {
            while !self.is_end() && !self.check_peeked(text) {
                self.advance();
            }
        }
        Str8View::new(&self.source[start..self.cursor])
    }

    /// Advances past the end of the current line, returning the line without
    /// its line ending. Both `\n` and `\r\n` are consumed whole.
    pub fn skip_until_endline(&mut self) -> Str8View<'src> {
        let start = self.cursor;
        let mut ending = None;
        while !self.is_end() {
            ending = self.is_endline();
            if ending.is_some() {
                break;
            }
            self.advance();
        }
        let line = Str8View::new(&self.source[start..self.cursor]);
        if let Some(ending) = ending {
            self.advance_by(ending.len());
        }
        line
    }

    /// Parses an optional `-` followed by decimal digits. Overflowing values
    /// wrap around. If there are no digits, nothing is consumed.
    pub fn parse_int(&mut self) -> Result<i32, LexError> {
        let start = self.cursor;
        let negative = self.lexeme() == b'-';
        if negative {
            self.advance();
        }

        if !self.lexeme().is_ascii_digit() {
            self.cursor = start;
            return Err(LexError::ExpectedInteger { position: start });
        }

        let mut value: i32 = 0;
        while self.lexeme().is_ascii_digit() {
            let digit = i32::from(self.lexeme() - b'0');
            value = value.wrapping_mul(10).wrapping_add(digit);
            self.advance();
        }

        Ok(if negative { value.wrapping_neg() } else { value })
    }

    /// Parses a `"`-quoted string, returning the contents between the quotes.
    /// There are no escapes. Nothing is consumed on failure.
    pub fn parse_quoted_string(&mut self) -> Result<Str8View<'src>, LexError> {
        let start = self.cursor;
        if self.lexeme() != b'"' {
            return Err(LexError::ExpectedQuote { position: start });
        }
        self.advance();

        let contents = self.skip_until(b'"');
        if self.is_end() {
            self.cursor = start;
            return Err(LexError::UnterminatedString { position: start });
        }
        self.advance();

        Ok(contents)
    }
}
