use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use lofty::prelude::*;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::model::{Album, Extra, Track};

/// One directory of audio files found on disk, not yet stored.
#[derive(Debug, Clone, Default)]
pub struct ScannedAlbum {
    pub album: Album,
    pub tracks: Vec<Track>,
    pub extras: Vec<Extra>,
}

#[derive(Default)]
struct DirFiles {
    audio: Vec<PathBuf>,
    extras: Vec<PathBuf>,
}

fn normalized(exts: &[String]) -> Vec<String> {
    exts.iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn has_extension(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn extra_category(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" => "artwork",
        "cue" => "cue",
        "log" => "log",
        "txt" | "nfo" | "md" => "text",
        _ => "other",
    }
}

/// Split a tag value on `;` the same way multi-valued edits are split.
fn split_multi(raw: &str) -> BTreeSet<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_track(path: &Path, added: NaiveDate) -> Track {
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();

    let mut track = Track {
        path: path.to_path_buf(),
        title,
        added: Some(added),
        ..Track::default()
    };

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.title() {
                    if !v.trim().is_empty() {
                        track.title = v.to_string();
                    }
                }
                if let Some(v) = tag.artist() {
                    track.artist = v.trim().to_string();
                }
                if let Some(v) = tag.album() {
                    track.album = v.trim().to_string();
                }
                if let Some(v) = tag.genre() {
                    track.genres = split_multi(&v);
                }
                if let Some(v) = tag.comment() {
                    track.comments = v.to_string();
                }
                track.track = tag.track().map(i64::from);
                track.disc = tag.disk().map(i64::from);
            }
        }
        Err(e) => trace!(path = %path.display(), error = %e, "no readable tags"),
    }

    track
}

fn build_album(dir: &Path, files: DirFiles, added: NaiveDate) -> ScannedAlbum {
    let mut tracks: Vec<Track> = files.audio.iter().map(|p| read_track(p, added)).collect();
    tracks.sort_by(|a, b| (a.disc, a.track, &a.path).cmp(&(b.disc, b.track, &b.path)));

    let first_non_empty = |get: fn(&Track) -> &str| {
        tracks
            .iter()
            .map(get)
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string()
    };

    let mut album = Album {
        path: dir.to_path_buf(),
        album: first_non_empty(|t| t.album.as_str()),
        albumartist: first_non_empty(|t| t.albumartist.as_str()),
        genres: tracks.iter().flat_map(|t| t.genres.iter().cloned()).collect(),
        disctotal: tracks.iter().filter_map(|t| t.disc).max(),
        added: Some(added),
        ..Album::default()
    };
    if album.albumartist.is_empty() {
        album.albumartist = first_non_empty(|t| t.artist.as_str());
    }
    if album.album.is_empty() {
        album.album = dir
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
    }

    for t in &mut tracks {
        if t.albumartist.is_empty() {
            t.albumartist = album.albumartist.clone();
        }
    }

    let mut extras: Vec<Extra> = files
        .extras
        .into_iter()
        .map(|path| Extra {
            category: extra_category(&path).to_string(),
            path,
            added: Some(added),
            ..Extra::default()
        })
        .collect();
    extras.sort_by(|a, b| a.path.cmp(&b.path));

    ScannedAlbum {
        album,
        tracks,
        extras,
    }
}

/// Walk `dir` and group audio files into albums, one per directory.
///
/// Extra files are only kept when their directory also holds audio. The
/// result is ordered by directory path.
pub fn scan(dir: &Path, settings: &LibrarySettings, added: NaiveDate) -> Vec<ScannedAlbum> {
    let audio_exts = normalized(&settings.extensions);
    let extra_exts = normalized(&settings.extra_extensions);
    let mut dirs: BTreeMap<PathBuf, DirFiles> = BTreeMap::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file() || (!settings.include_hidden && is_hidden(path)) {
            continue;
        }
        // Paths are stored as text and are a record's identity.
        if path.to_str().is_none() {
            warn!(path = %path.display(), "skipping file with a non-UTF-8 path");
            continue;
        }
        let Some(parent) = path.parent() else {
            continue;
        };

        if has_extension(path, &audio_exts) {
            dirs.entry(parent.to_path_buf())
                .or_default()
                .audio
                .push(path.to_path_buf());
        } else if has_extension(path, &extra_exts) {
            dirs.entry(parent.to_path_buf())
                .or_default()
                .extras
                .push(path.to_path_buf());
        }
    }

    let albums: Vec<ScannedAlbum> = dirs
        .into_iter()
        .filter(|(_, files)| !files.audio.is_empty())
        .map(|(dir, files)| build_album(&dir, files, added))
        .collect();

    debug!(
        root = %dir.display(),
        albums = albums.len(),
        tracks = albums.iter().map(|a| a.tracks.len()).sum::<usize>(),
        "scan complete"
    );
    albums
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn has_extension_matches_configured_extensions_case_insensitive() {
        let settings = LibrarySettings::default();
        let exts = normalized(&settings.extensions);
        assert!(has_extension(Path::new("/tmp/a.mp3"), &exts));
        assert!(has_extension(Path::new("/tmp/a.MP3"), &exts));
        assert!(has_extension(Path::new("/tmp/a.flac"), &exts));
        assert!(has_extension(Path::new("/tmp/a.ogg"), &exts));
        assert!(!has_extension(Path::new("/tmp/a.txt"), &exts));
        assert!(!has_extension(Path::new("/tmp/a"), &exts));
    }

    #[test]
    fn normalized_strips_dots_and_blanks() {
        let exts = normalized(&[".MP3".into(), "  ".into(), "flac ".into()]);
        assert_eq!(exts, vec!["mp3".to_string(), "flac".to_string()]);
    }

    #[test]
    fn extra_category_by_extension() {
        assert_eq!(extra_category(Path::new("cover.JPG")), "artwork");
        assert_eq!(extra_category(Path::new("rip.log")), "log");
        assert_eq!(extra_category(Path::new("disc.cue")), "cue");
        assert_eq!(extra_category(Path::new("info.nfo")), "text");
        assert_eq!(extra_category(Path::new("booklet.pdf")), "other");
    }

    #[test]
    fn scan_groups_audio_by_directory_and_keeps_extras() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("Artist - Album");
        let b = dir.path().join("Loose");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();

        fs::write(a.join("02 b.mp3"), b"not a real mp3").unwrap();
        fs::write(a.join("01 a.flac"), b"not a real flac").unwrap();
        fs::write(a.join("cover.jpg"), b"jpeg").unwrap();
        fs::write(a.join("notes.xyz"), b"ignored").unwrap();
        fs::write(b.join("only.cue"), b"no audio here").unwrap();

        let albums = scan(dir.path(), &LibrarySettings::default(), today());
        assert_eq!(albums.len(), 1);

        let album = &albums[0];
        assert_eq!(album.album.path, a);
        assert_eq!(album.album.album, "Artist - Album");
        assert_eq!(album.album.added, Some(today()));
        assert_eq!(album.tracks.len(), 2);
        assert_eq!(album.tracks[0].title, "01 a");
        assert_eq!(album.tracks[1].title, "02 b");
        assert_eq!(album.extras.len(), 1);
        assert_eq!(album.extras[0].category, "artwork");
    }

    #[test]
    fn scan_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"not real").unwrap();
        fs::write(dir.path().join("visible.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let albums = scan(dir.path(), &settings, today());

        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].tracks.len(), 1);
        assert_eq!(albums[0].tracks[0].title, "visible");
    }

    #[test]
    fn scan_respects_recursive_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("root.mp3"), b"not real").unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("child.mp3"), b"not real").unwrap();

        let settings = LibrarySettings {
            recursive: false,
            ..LibrarySettings::default()
        };
        let albums = scan(dir.path(), &settings, today());
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].tracks[0].title, "root");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn scan_skips_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ok.mp3"), b"not real").unwrap();
        let bad = dir.path().join(OsStr::from_bytes(b"caf\xe9.mp3"));
        fs::write(&bad, b"not real").unwrap();

        let albums = scan(dir.path(), &LibrarySettings::default(), today());
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].tracks.len(), 1);
        assert_eq!(albums[0].tracks[0].title, "ok");
    }

    #[test]
    fn split_multi_drops_blank_tag_values() {
        let set = split_multi("Rock; Pop ;;");
        assert_eq!(set.len(), 2);
        assert!(set.contains("Rock"));
        assert!(set.contains("Pop"));
    }
}
