// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::Display;

use crate::{
    allocators::FixedArena,
    collections::FixedVec,
    text::{LexError, Lexer, Str8View},
};

use super::LINE_COMMENT;

const TILEMAP_DIRECTIVE: &[u8] = b"@tilemap";
const BITMAP_FORMAT: &[u8] = b"bmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilemapImageFormat {
    Bitmap,
}

/// A grid of tile indexes into a tile atlas image.
///
/// The format is a directive line followed by `row_count * col_count`
/// whitespace-separated indexes, in row-major order:
///
/// ```text
/// // comment
/// @tilemap <rows> <cols> "<atlas path>" bmp <tile width> <tile height>
/// 0 1
/// 2 3
/// ```
#[derive(Debug)]
pub struct Tilemap<'src, 'a> {
    pub row_count: usize,
    pub col_count: usize,
    pub image_path: Str8View<'src>,
    pub image_format: TilemapImageFormat,
    pub tile_x_pixel_count: u32,
    pub tile_y_pixel_count: u32,
    pub indexes: FixedVec<'a, i32>,
}

impl Tilemap<'_, '_> {
    /// The tile index at the given coordinates.
    pub fn tile(&self, col: usize, row: usize) -> Option<i32> {
        if col >= self.col_count || row >= self.row_count {
            return None;
        }
        self.indexes.get(row * self.col_count + col).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TilemapError {
    Lex(LexError),
    /// The image format after the path was something other than `bmp`.
    ExpectedBitmapFormat { position: usize },
    /// The row or column count, or a tile size, was zero or negative.
    InvalidDimensions,
    IndexesBeforeDirective { position: usize },
    TooManyIndexes { expected: usize },
    IndexCountMismatch { expected: usize, found: usize },
    MissingDirective,
    DuplicateDirective { position: usize },
    /// The arena didn't have room for the indexes.
    OutOfMemory { index_count: usize },
}

impl Display for TilemapError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TilemapError::Lex(err) => write!(f, "{err}"),
            TilemapError::ExpectedBitmapFormat { position } => {
                write!(f, "expected image format \"bmp\" at byte {position}")
            }
            TilemapError::InvalidDimensions => {
                write!(f, "tilemap and tile dimensions must be positive")
            }
            TilemapError::IndexesBeforeDirective { position } => {
                write!(f, "tile indexes at byte {position} before the @tilemap directive")
            }
            TilemapError::TooManyIndexes { expected } => {
                write!(f, "more than the expected {expected} tile indexes")
            }
            TilemapError::IndexCountMismatch { expected, found } => {
                write!(f, "expected {expected} tile indexes, found {found}")
            }
            TilemapError::MissingDirective => write!(f, "no @tilemap directive"),
            TilemapError::DuplicateDirective { position } => {
                write!(f, "second @tilemap directive at byte {position}")
            }
            TilemapError::OutOfMemory { index_count } => {
                write!(f, "not enough memory for {index_count} tile indexes")
            }
        }
    }
}

impl core::error::Error for TilemapError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            TilemapError::Lex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LexError> for TilemapError {
    fn from(err: LexError) -> Self {
        TilemapError::Lex(err)
    }
}

/// Parses a tilemap. The image path borrows from `source`, and the indexes
/// are allocated from `arena`.
pub fn parse_tilemap<'src, 'a>(
    source: &'src [u8],
    arena: &'a FixedArena,
) -> Result<Tilemap<'src, 'a>, TilemapError> {
    let mut lexer = Lexer::new(source);
    let mut tilemap: Option<Tilemap> = None;

    while !lexer.is_end() {
        lexer.skip_whitespace();

        if lexer.check_peeked(LINE_COMMENT) {
            lexer.skip_until_endline();
            continue;
        }

        let position = lexer.cursor();
        if lexer.check_peeked_and_advance(TILEMAP_DIRECTIVE) {
            if tilemap.is_some() {
                return Err(TilemapError::DuplicateDirective { position });
            }
            tilemap = Some(parse_directive(&mut lexer, arena)?);
            continue;
        }

        if starts_index(&lexer) {
            let Some(tilemap) = tilemap.as_mut() else {
                return Err(TilemapError::IndexesBeforeDirective { position });
            };
            let expected = tilemap.indexes.capacity();
            while starts_index(&lexer) {
                let index = lexer.parse_int()?;
                if tilemap.indexes.push(index).is_err() {
                    return Err(TilemapError::TooManyIndexes { expected });
                }
                lexer.skip_whitespace();
            }
            continue;
        }

        lexer.advance();
    }

    let tilemap = tilemap.ok_or(TilemapError::MissingDirective)?;
    let expected = tilemap.row_count * tilemap.col_count;
    if tilemap.indexes.len() != expected {
        return Err(TilemapError::IndexCountMismatch {
            expected,
            found: tilemap.indexes.len(),
        });
    }
    Ok(tilemap)
}

fn starts_index(lexer: &Lexer) -> bool {
    let first = lexer.lexeme();
    first.is_ascii_digit() || (first == b'-' && lexer.peek(1).is_ascii_digit())
}

/// Parses the fields after the directive keyword.
fn parse_directive<'src, 'a>(
    lexer: &mut Lexer<'src>,
    arena: &'a FixedArena,
) -> Result<Tilemap<'src, 'a>, TilemapError> {
    lexer.skip_whitespace();
    let row_count = lexer.parse_int()?;
    lexer.skip_whitespace();
    let col_count = lexer.parse_int()?;
    lexer.skip_whitespace();
    let image_path = lexer.parse_quoted_string()?;
    lexer.skip_whitespace();

    let position = lexer.cursor();
    if !lexer.check_peeked_and_advance(BITMAP_FORMAT) {
        return Err(TilemapError::ExpectedBitmapFormat { position });
    }
    lexer.skip_whitespace();

    let tile_x_pixel_count = lexer.parse_int()?;
    lexer.skip_whitespace();
    let tile_y_pixel_count = lexer.parse_int()?;

    let positive = |value: i32| u32::try_from(value).ok().filter(|&value| value > 0);
    let (Some(rows), Some(cols), Some(tile_x_pixel_count), Some(tile_y_pixel_count)) = (
        positive(row_count),
        positive(col_count),
        positive(tile_x_pixel_count),
        positive(tile_y_pixel_count),
    ) else {
        return Err(TilemapError::InvalidDimensions);
    };

    let row_count = rows as usize;
    let col_count = cols as usize;
    let index_count = row_count
        .checked_mul(col_count)
        .ok_or(TilemapError::InvalidDimensions)?;
    let indexes =
        FixedVec::new(arena, index_count).ok_or(TilemapError::OutOfMemory { index_count })?;

    Ok(Tilemap {
        row_count,
        col_count,
        image_path,
        image_format: TilemapImageFormat::Bitmap,
        tile_x_pixel_count,
        tile_y_pixel_count,
        indexes,
    })
}
