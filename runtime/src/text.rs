// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Byte and UTF-16 string views, an owning byte string, and the [`Lexer`]
//! the asset formats are parsed with.

mod lexer;
mod str8;
mod str_view;

pub use lexer::{LexError, Lexer, LineEnding};
pub use str8::Str8;
pub use str_view::{Str16View, Str8View};
