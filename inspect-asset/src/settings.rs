// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ARENA_BYTES: usize = 1024 * 1024;

/// The memory settings for an inspection run.
///
/// Has enum variants for breaking changes in the format of the settings file,
/// but [`read`] always returns the newest variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "settings_file_version", rename_all = "snake_case")]
pub enum InspectSettings {
    V1 {
        /// Size of the arena the parsed data is allocated from.
        #[serde(default = "default_arena_bytes")]
        arena_bytes: usize,
        /// Whether to record every allocation, for
        /// `--dump-allocations`.
        #[serde(default)]
        track_allocations: bool,
    },
}

impl Default for InspectSettings {
    fn default() -> Self {
        InspectSettings::V1 {
            arena_bytes: DEFAULT_ARENA_BYTES,
            track_allocations: false,
        }
    }
}

fn default_arena_bytes() -> usize {
    DEFAULT_ARENA_BYTES
}

pub fn read(settings: &Path) -> anyhow::Result<InspectSettings> {
    let settings = if settings.exists() {
        let settings =
            fs::read_to_string(settings).context("Failed to open the settings file")?;
        parse(&settings)?
    } else {
        InspectSettings::default()
    };

    // NOTE: When there's new versions of InspectSettings, convert to the
    // newest here (main assumes it)

    Ok(settings)
}

fn parse(settings: &str) -> anyhow::Result<InspectSettings> {
    serde_json::from_str(settings).context("Failed to parse the settings file")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{parse, read, InspectSettings, DEFAULT_ARENA_BYTES};

    #[test]
    fn missing_file_gives_defaults() {
        let settings = read(Path::new("this/file/does/not/exist.json")).unwrap();
        assert_eq!(InspectSettings::default(), settings);
    }

    #[test]
    fn parses_v1() {
        let settings = parse(
            r#"{"settings_file_version": "v1", "arena_bytes": 4096, "track_allocations": true}"#,
        )
        .unwrap();
        assert_eq!(
            InspectSettings::V1 {
                arena_bytes: 4096,
                track_allocations: true,
            },
            settings
        );
    }

    #[test]
    fn missing_fields_get_defaults() {
        let settings = parse(r#"{"settings_file_version": "v1"}"#).unwrap();
        assert_eq!(
            InspectSettings::V1 {
                arena_bytes: DEFAULT_ARENA_BYTES,
                track_allocations: false,
            },
            settings
        );
    }

    #[test]
    fn unknown_versions_are_rejected() {
        assert!(parse(r#"{"settings_file_version": "v2", "arena_bytes": 1}"#).is_err());
    }
}
