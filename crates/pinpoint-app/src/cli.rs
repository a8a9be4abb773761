use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PinPoint: pin tiles to layouts and project them onto your displays.
#[derive(Parser, Debug)]
#[command(name = "pinpoint", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Data directory override.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tile definitions.
    Tiles,
    /// List layouts and their instances.
    Layouts,
    /// List configured displays.
    Displays,
    /// Create a tile.
    NewTile {
        #[arg(long = "type", default_value = "note")]
        tile_type: String,
        #[arg(long)]
        content: Option<String>,
        /// Use this id instead of a generated one.
        #[arg(long)]
        id: Option<String>,
    },
    /// Create an empty layout.
    NewLayout {
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value_t = 0)]
        display: usize,
    },
    /// Place a tile in a layout (editor coordinates).
    Place {
        #[arg(long)]
        layout: String,
        #[arg(long)]
        tile: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        x: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        y: i32,
    },
    /// Delete a tile and every instance of it.
    DeleteTile { id: String },
    /// Delete a layout.
    DeleteLayout { id: String },
    /// Project a layout and keep it live until Ctrl-C.
    Project {
        #[arg(long)]
        layout: String,
        #[arg(long)]
        display: Option<usize>,
    },
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_place_with_negative_coordinates() {
        let args = Args::try_parse_from([
            "pinpoint", "place", "--layout", "L1", "--tile", "note-1", "--x", "-40", "--y", "12",
        ])
        .unwrap();
        match args.command {
            Command::Place { layout, tile, x, y } => {
                assert_eq!(layout, "L1");
                assert_eq!(tile, "note-1");
                assert_eq!((x, y), (-40, 12));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::try_parse_from([
            "pinpoint",
            "tiles",
            "--data-dir",
            "/tmp/pp",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/pp")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(matches!(args.command, Command::Tiles));
    }

    #[test]
    fn new_tile_defaults_to_note() {
        let args = Args::try_parse_from(["pinpoint", "new-tile", "--content", "Hello"]).unwrap();
        match args.command {
            Command::NewTile {
                tile_type, content, ..
            } => {
                assert_eq!(tile_type, "note");
                assert_eq!(content.as_deref(), Some("Hello"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn project_display_is_optional() {
        let args = Args::try_parse_from(["pinpoint", "project", "--layout", "L1"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Project { display: None, .. }
        ));
    }
}
