//! Adding files from disk to the library.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::config::LibrarySettings;
use crate::library::scan;
use crate::store::{ImportCounts, Store, StoreError};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Scan `dir` and store every album, track and extra not already present.
///
/// Each album is committed on its own, so an error leaves earlier albums
/// imported.
pub fn import_dir(
    store: &mut Store,
    dir: &Path,
    settings: &LibrarySettings,
    added: NaiveDate,
) -> Result<ImportCounts, ImportError> {
    if !dir.is_dir() {
        return Err(ImportError::NotADirectory(dir.to_path_buf()));
    }

    let mut total = ImportCounts::default();
    for mut scanned in scan(dir, settings, added) {
        let counts = store.import_album(&mut scanned)?;
        if counts != ImportCounts::default() {
            info!(
                album = %scanned.album.path.display(),
                tracks = counts.tracks,
                extras = counts.extras,
                "imported"
            );
        }
        total += counts;
    }
    Ok(total)
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
    fn import_dir_adds_new_files_once() {
        let dir = tempdir().unwrap();
        let album_dir = dir.path().join("album");
        fs::create_dir_all(&album_dir).unwrap();
        fs::write(album_dir.join("01.mp3"), b"not real").unwrap();
        fs::write(album_dir.join("02.mp3"), b"not real").unwrap();
        fs::write(album_dir.join("folder.png"), b"png").unwrap();

        let mut store = Store::open_in_memory().unwrap();
        let settings = LibrarySettings::default();

        let counts = import_dir(&mut store, dir.path(), &settings, today()).unwrap();
        assert_eq!(
            counts,
            ImportCounts {
                albums: 1,
                tracks: 2,
                extras: 1
            }
        );

        fs::write(album_dir.join("03.mp3"), b"not real").unwrap();
        let counts = import_dir(&mut store, dir.path(), &settings, today()).unwrap();
        assert_eq!(
            counts,
            ImportCounts {
                albums: 0,
                tracks: 1,
                extras: 0
            }
        );

        let tracks = store.tracks().unwrap();
        assert_eq!(tracks.len(), 3);
        assert!(tracks.iter().all(|t| t.added == Some(today())));
        let albums = store.albums().unwrap();
        assert_eq!(albums.len(), 1);
        assert!(tracks.iter().all(|t| t.album_id == albums[0].id));
    }

    #[test]
    fn import_dir_rejects_missing_directories() {
        let dir = tempdir().unwrap();
        let mut store = Store::open_in_memory().unwrap();
        let err = import_dir(
            &mut store,
            &dir.path().join("missing"),
            &LibrarySettings::default(),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::NotADirectory(_)));
    }
}
