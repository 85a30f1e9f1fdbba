// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::fmt::Display;

use crate::text::{Lexer, Str8View};

use super::LINE_COMMENT;

const BEGIN_DIRECTIVE: &[u8] = b"#begin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    const ALL: [ShaderStage; 2] = [ShaderStage::Vertex, ShaderStage::Fragment];

    /// The word following `#begin` which starts this stage's section.
    pub const fn keyword(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl Display for ShaderStage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The per-stage sections of a combined shader source file:
///
/// ```text
/// #begin vertex
/// void main() { ... }
/// #begin fragment
/// void main() { ... }
/// ```
///
/// Each section is passed to the shader compiler as-is, this doesn't look
/// into the shader code at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderSource<'src> {
    pub vertex: Str8View<'src>,
    pub fragment: Str8View<'src>,
}

impl<'src> ShaderSource<'src> {
    pub fn stage(&self, stage: ShaderStage) -> Str8View<'src> {
        match stage {
            ShaderStage::Vertex => self.vertex,
            ShaderStage::Fragment => self.fragment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderError {
    DuplicateSection(ShaderStage),
    /// The section is missing, or empty.
    MissingSection(ShaderStage),
}

impl Display for ShaderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ShaderError::DuplicateSection(stage) => {
                write!(f, "more than one \"#begin {stage}\" section")
            }
            ShaderError::MissingSection(stage) => write!(f, "no \"#begin {stage}\" section"),
        }
    }
}

impl core::error::Error for ShaderError {}

/// Splits a combined shader source into its stages. A section starts after
/// `#begin <stage>` and the whitespace following it, and ends at the next
/// `#begin` or the end of the source. The sections can be in any order.
pub fn parse_shader(source: &[u8]) -> Result<ShaderSource<'_>, ShaderError> {
    let mut lexer = Lexer::new(source);
    let mut sections: [Option<Str8View>; 2] = [None, None];

    while !lexer.is_end() {
        lexer.skip_whitespace();

        if lexer.check_peeked(LINE_COMMENT) {
            lexer.skip_until_endline();
            continue;
        }

        if lexer.check_peeked_and_advance(BEGIN_DIRECTIVE) {
            lexer.skip_whitespace();
            let stage = ShaderStage::ALL
                .into_iter()
                .find(|stage| lexer.check_peeked_and_advance(stage.keyword().as_bytes()));
            if let Some(stage) = stage {
                let section = &mut sections[stage as usize];
                if section.is_some() {
                    return Err(ShaderError::DuplicateSection(stage));
                }
                lexer.skip_whitespace();
                *section = Some(lexer.skip_until_view(BEGIN_DIRECTIVE));
            }
            continue;
        }

        lexer.advance();
    }

    let section = |stage: ShaderStage| {
        sections[stage as usize]
            .filter(|section| !section.is_empty())
            .ok_or(ShaderError::MissingSection(stage))
    };
    Ok(ShaderSource {
        vertex: section(ShaderStage::Vertex)?,
        fragment: section(ShaderStage::Fragment)?,
    })
}
