// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! The JSON output of the tool.

use runtime::{
    assets::{AssetKind, AssetTable},
    formats::{ShaderSource, ShaderStage, Tilemap, TilemapImageFormat},
    text::Str8View,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Summary {
    pub file: String,
    #[serde(flatten)]
    pub contents: Contents,
    pub assets: Vec<AssetSummary>,
    pub memory: MemorySummary,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Contents {
    Tilemap(TilemapSummary),
    Shader(ShaderSummary),
}

#[derive(Debug, Serialize)]
pub struct TilemapSummary {
    pub rows: usize,
    pub cols: usize,
    pub image_path: String,
    pub image_format: &'static str,
    pub tile_width: u32,
    pub tile_height: u32,
    pub indexes: Vec<Vec<i32>>,
}

impl TilemapSummary {
    pub fn new(tilemap: &Tilemap) -> TilemapSummary {
        let indexes = (0..tilemap.row_count)
            .map(|row| {
                (0..tilemap.col_count)
                    .filter_map(|col| tilemap.tile(col, row))
                    .collect()
            })
            .collect();
        TilemapSummary {
            rows: tilemap.row_count,
            cols: tilemap.col_count,
            image_path: tilemap.image_path.to_string(),
            image_format: match tilemap.image_format {
                TilemapImageFormat::Bitmap => "bmp",
            },
            tile_width: tilemap.tile_x_pixel_count,
            tile_height: tilemap.tile_y_pixel_count,
            indexes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShaderSummary {
    pub vertex: StageSummary,
    pub fragment: StageSummary,
}

impl ShaderSummary {
    pub fn new(shader: &ShaderSource) -> ShaderSummary {
        ShaderSummary {
            vertex: StageSummary::new(shader.stage(ShaderStage::Vertex)),
            fragment: StageSummary::new(shader.stage(ShaderStage::Fragment)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StageSummary {
    pub bytes: usize,
    pub lines: usize,
}

impl StageSummary {
    fn new(section: Str8View) -> StageSummary {
        let bytes = section.as_bytes();
        let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
        let unterminated_last_line = !bytes.is_empty() && !bytes.ends_with(b"\n");
        StageSummary {
            bytes: bytes.len(),
            lines: newlines + unterminated_last_line as usize,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssetSummary {
    pub index: usize,
    pub kind: &'static str,
    pub path: String,
}

impl AssetSummary {
    pub fn collect(assets: &AssetTable) -> Vec<AssetSummary> {
        assets
            .iter()
            .map(|(id, entry)| AssetSummary {
                index: id.index(),
                kind: match entry.kind() {
                    Some(AssetKind::Texture) => "texture",
                    Some(AssetKind::Shader) => "shader",
                    Some(AssetKind::Tilemap) => "tilemap",
                    None => "unknown",
                },
                path: entry.path().to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct MemorySummary {
    pub arena_capacity: usize,
    pub arena_occupied: usize,
    pub platform_allocations: usize,
    pub platform_bytes: usize,
}
