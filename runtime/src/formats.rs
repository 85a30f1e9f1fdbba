// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The developer-authored text formats: tilemaps and shader sources.
//!
//! Both allow `//` line comments anywhere a token could start.

mod shader;
mod tilemap;

pub use shader::{parse_shader, ShaderError, ShaderSource, ShaderStage};
pub use tilemap::{parse_tilemap, Tilemap, TilemapError, TilemapImageFormat};

const LINE_COMMENT: &[u8] = b"//";
