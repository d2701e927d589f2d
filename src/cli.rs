//! Command-line interface definition.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::library::RecordKind;

#[derive(Debug, Parser)]
#[command(name = "fermata", version, about = "Manage music library metadata")]
pub struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Library database to use instead of the configured one.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub library: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Which record variant a command operates on. Tracks by default.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct KindArgs {
    /// Operate on albums.
    #[arg(short, long, conflicts_with = "extra")]
    pub album: bool,

    /// Operate on extra files (artwork, cue sheets, logs).
    #[arg(short, long)]
    pub extra: bool,
}

impl KindArgs {
    pub fn kind(self) -> RecordKind {
        if self.album {
            RecordKind::Album
        } else if self.extra {
            RecordKind::Extra
        } else {
            RecordKind::Track
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a directory and add new files to the library.
    Import {
        dir: PathBuf,
    },

    /// List records matching a query.
    List {
        #[command(flatten)]
        kind: KindArgs,

        /// `field:pattern` or bare patterns; all must match.
        query: Vec<String>,
    },

    /// Change fields of every record matching a query.
    ///
    /// Arguments containing `=` are edits (`FIELD=VALUE`, multiple values
    /// separated by `;`); all others form the query.
    Modify {
        #[command(flatten)]
        kind: KindArgs,

        /// Create custom fields for unknown field names.
        #[arg(short, long)]
        create: bool,

        /// Show what would change without saving.
        #[arg(short = 'n', long)]
        pretend: bool,

        #[arg(required = true, value_name = "QUERY|FIELD=VALUE")]
        args: Vec<String>,
    },

    /// Show the typed fields of a record kind.
    Fields {
        #[command(flatten)]
        kind: KindArgs,
    },

    /// Print the effective configuration as TOML.
    Config,
}
