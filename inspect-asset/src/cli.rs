// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fmt::Display, path::Path, path::PathBuf, str::FromStr};

use bpaf::{batteries::verbose_by_slice, construct, long, positional, OptionParser, Parser};
use tracing::level_filters::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Tilemap,
    Shader,
}

impl FormatKind {
    /// Guesses the format from the file extension.
    pub fn from_extension(path: &Path) -> Option<FormatKind> {
        match path.extension()?.to_str()? {
            "tilemap" | "tm" => Some(FormatKind::Tilemap),
            "glsl" | "shader" => Some(FormatKind::Shader),
            _ => None,
        }
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tilemap" => Ok(FormatKind::Tilemap),
            "shader" => Ok(FormatKind::Shader),
            _ => Err(format!("unknown format \"{s}\", expected tilemap or shader")),
        }
    }
}

impl Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatKind::Tilemap => write!(f, "tilemap"),
            FormatKind::Shader => write!(f, "shader"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    pub verbosity_level: LevelFilter,
    pub kind: Option<FormatKind>,
    pub settings_path: Option<PathBuf>,
    pub dump_allocations: bool,
    pub file: PathBuf,
}

pub fn options() -> OptionParser<Options> {
    let verbosity_level = verbose_by_slice(
        2,
        [
            LevelFilter::OFF,
            LevelFilter::ERROR,
            LevelFilter::WARN,
            LevelFilter::INFO,
            LevelFilter::DEBUG,
            LevelFilter::TRACE,
        ],
    );

    let kind = long("kind")
        .help("Parses the file as a tilemap or a shader, instead of going by the extension")
        .argument::<FormatKind>("KIND")
        .optional();

    let settings_path = long("settings")
        .help("Reads the memory settings from this JSON file")
        .argument::<PathBuf>("FILE")
        .complete_shell(bpaf::ShellComp::File {
            mask: Some("*.json"),
        })
        .optional();

    let dump_allocations = long("dump-allocations")
        .help("Prints out the live allocations after parsing")
        .switch();

    let file = positional::<PathBuf>("FILE")
        .help("The tilemap or shader file to inspect")
        .complete_shell(bpaf::ShellComp::File { mask: None });

    construct!(Options {
        verbosity_level,
        kind,
        settings_path,
        dump_allocations,
        file,
    })
    .to_options()
    .descr("Parses a tilemap or shader file and prints out what's in it as JSON")
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use tracing::level_filters::LevelFilter;

    use super::{options, FormatKind};

    #[test]
    fn check_bpaf_invariants() {
        options().check_invariants(true);
    }

    #[test]
    fn parses_flags_and_file() {
        let opts = options()
            .run_inner(&["-vv", "--kind", "shader", "--dump-allocations", "sprite.txt"])
            .unwrap();
        assert_eq!(LevelFilter::DEBUG, opts.verbosity_level);
        assert_eq!(Some(FormatKind::Shader), opts.kind);
        assert!(opts.dump_allocations);
        assert_eq!(None, opts.settings_path);
        assert_eq!(PathBuf::from("sprite.txt"), opts.file);
    }

    #[test]
    fn defaults_to_warnings() {
        let opts = options().run_inner(&["map.tilemap"]).unwrap();
        assert_eq!(LevelFilter::WARN, opts.verbosity_level);
        assert_eq!(None, opts.kind);
        assert!(!opts.dump_allocations);
    }

    #[test]
    fn rejects_unknown_kinds() {
        assert!(options().run_inner(&["--kind", "audio", "clip.ogg"]).is_err());
    }

    #[test]
    fn kind_from_extension() {
        let kind = |path: &str| FormatKind::from_extension(Path::new(path));
        assert_eq!(Some(FormatKind::Tilemap), kind("levels/first.tilemap"));
        assert_eq!(Some(FormatKind::Tilemap), kind("first.tm"));
        assert_eq!(Some(FormatKind::Shader), kind("sprite.glsl"));
        assert_eq!(Some(FormatKind::Shader), kind("sprite.shader"));
        assert_eq!(None, kind("sprite.png"));
        assert_eq!(None, kind("Makefile"));
    }
}
