// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

mod cli;
mod settings;
mod summary;

use std::{fs, io};

use anyhow::{anyhow, Context};
use cli::FormatKind;
use platform_std::StdPlatform;
use runtime::{
    assets::{AssetKind, AssetTable, AssetTableError},
    diagnostics::AllocationRecords,
    formats::{parse_shader, parse_tilemap},
    BasicAllocator, FixedArena,
};
use settings::InspectSettings;
use summary::{AssetSummary, Contents, MemorySummary, ShaderSummary, Summary, TilemapSummary};
use tracing::{debug, info, trace, warn};

/// Room for the inspected file and whatever it refers to.
const ASSET_TABLE_CAPACITY: usize = 16;

fn main() -> anyhow::Result<()> {
    let opts = cli::options().run();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(opts.verbosity_level)
        .init();

    let settings = match &opts.settings_path {
        Some(path) => settings::read(path)?,
        None => InspectSettings::default(),
    };
    let InspectSettings::V1 {
        arena_bytes,
        track_allocations,
    } = settings;
    let track_allocations = track_allocations || opts.dump_allocations;
    debug!(arena_bytes, track_allocations, "Loaded settings");

    let kind = match opts.kind {
        Some(kind) => kind,
        None => FormatKind::from_extension(&opts.file).ok_or_else(|| {
            anyhow!(
                "Can't tell the format of {} from its extension, pass --kind",
                opts.file.display()
            )
        })?,
    };
    let file_name = opts.file.to_string_lossy().into_owned();
    info!("Inspecting {file_name} as a {kind}");

    let source = fs::read(&opts.file).context("Failed to read the file to inspect")?;
    trace!("Read {} bytes", source.len());

    let platform = StdPlatform::new();
    let records = AllocationRecords::new(&platform);
    let allocator = if track_allocations {
        BasicAllocator::with_recorder(&platform, &records)
    } else {
        BasicAllocator::new(&platform)
    };

    let arena = FixedArena::new(allocator, arena_bytes)
        .context("Failed to allocate the arena for the parsed data")?;
    let mut assets = AssetTable::new(allocator, ASSET_TABLE_CAPACITY)
        .context("Failed to allocate the asset table")?;

    let contents = match kind {
        FormatKind::Tilemap => {
            let tilemap = parse_tilemap(&source, &arena).context("Failed to parse the tilemap")?;
            debug!(
                rows = tilemap.row_count,
                cols = tilemap.col_count,
                "Parsed the tilemap"
            );
            register(&mut assets, AssetKind::Tilemap, &file_name)?;
            match assets.insert(AssetKind::Texture, tilemap.image_path) {
                Ok(_) | Err(AssetTableError::AlreadyExists(_)) => {}
                Err(err) => warn!("Not registering the tile atlas {}: {err}", tilemap.image_path),
            }
            Contents::Tilemap(TilemapSummary::new(&tilemap))
        }
        FormatKind::Shader => {
            let shader = parse_shader(&source).context("Failed to parse the shader")?;
            debug!(
                vertex_bytes = shader.vertex.len(),
                fragment_bytes = shader.fragment.len(),
                "Parsed the shader"
            );
            register(&mut assets, AssetKind::Shader, &file_name)?;
            Contents::Shader(ShaderSummary::new(&shader))
        }
    };

    let summary = Summary {
        file: file_name,
        contents,
        assets: AssetSummary::collect(&assets),
        memory: MemorySummary {
            arena_capacity: arena.capacity(),
            arena_occupied: arena.occupied(),
            platform_allocations: platform.live_allocations(),
            platform_bytes: platform.live_bytes(),
        },
    };
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize the summary")?;
    println!("{json}");

    if opts.dump_allocations {
        records.dump(&platform);
        if records.unrecorded() > 0 {
            warn!(
                "{} allocations couldn't be recorded, the dump is incomplete",
                records.unrecorded()
            );
        }
    }

    drop(assets);
    drop(arena);
    if platform.live_allocations() == 0 {
        info!("All memory freed");
    } else {
        warn!(
            "{} platform allocations ({} bytes) still live after freeing everything",
            platform.live_allocations(),
            platform.live_bytes()
        );
    }

    Ok(())
}

fn register(assets: &mut AssetTable, kind: AssetKind, path: &str) -> anyhow::Result<()> {
    assets
        .insert(kind, path.into())
        .map(|id| trace!("Registered {path} at asset index {}", id.index()))
        .context("Failed to register the inspected file as an asset")
}
