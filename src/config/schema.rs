use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::library::RecordKind;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/fermata/config.toml`
/// or `~/.config/fermata/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `FERMATA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub edit: EditSettings,
    pub display: DisplaySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// SQLite database file. Defaults to `$XDG_DATA_HOME/fermata/library.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Extensions of non-audio files imported as album extras.
    pub extra_extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            database: None,
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "m4a".into(),
                "opus".into(),
            ],
            extra_extensions: vec![
                "jpg".into(),
                "jpeg".into(),
                "png".into(),
                "cue".into(),
                "log".into(),
                "txt".into(),
                "nfo".into(),
            ],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EditSettings {
    /// Let `modify` create custom fields for unknown names without `--create`.
    pub create_if_missing: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Fields shown for each track by `list`, in order.
    ///
    /// Example: ["artist", "album", "title"] -> "Artist - Album - Title"
    pub track_fields: Vec<String>,
    pub album_fields: Vec<String>,
    pub extra_fields: Vec<String>,
    /// Separator used to join the fields above.
    pub separator: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            track_fields: vec!["artist".into(), "album".into(), "title".into()],
            album_fields: vec!["albumartist".into(), "album".into()],
            extra_fields: vec!["category".into(), "path".into()],
            separator: " - ".to_string(),
        }
    }
}

impl DisplaySettings {
    pub fn fields_for(&self, kind: RecordKind) -> &[String] {
        match kind {
            RecordKind::Track => &self.track_fields,
            RecordKind::Album => &self.album_fields,
            RecordKind::Extra => &self.extra_fields,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is unset and no `-v` is given.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "error".to_string(),
        }
    }
}
