//! SQLite persistence for library records.
//!
//! Typed columns map one-to-one onto table columns. Multi-valued fields are
//! stored `;`-joined (NULL for the empty set) and custom fields live in a
//! shared `attributes` table keyed by entity kind and id.

mod schema;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, Row, named_params};
use thiserror::Error;
use tracing::{debug, warn};

use crate::library::{
    Album, CustomFields, Extra, Item, Record, RecordKind, ScannedAlbum, Track, is_typed_field,
};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("cannot create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: i64, supported: i64 },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// What importing one scanned album added to the store.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub albums: usize,
    pub tracks: usize,
    pub extras: usize,
}

impl std::ops::AddAssign for ImportCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.albums += rhs.albums;
        self.tracks += rhs.tracks;
        self.extras += rhs.extras;
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        debug!(path = %path.display(), "opening library database");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Whether a record of `kind` already exists at `path`.
    pub fn contains_path(&self, kind: RecordKind, path: &Path) -> Result<bool> {
        Ok(find_id(&self.conn, kind, path)?.is_some())
    }

    pub fn insert_track(&self, track: &mut Track) -> Result<i64> {
        insert_track(&self.conn, track)
    }

    pub fn insert_album(&self, album: &mut Album) -> Result<i64> {
        insert_album(&self.conn, album)
    }

    pub fn insert_extra(&self, extra: &mut Extra) -> Result<i64> {
        insert_extra(&self.conn, extra)
    }

    /// Store a scanned album and its files in one transaction.
    ///
    /// Paths already in the store are skipped; new tracks and extras of an
    /// album that already exists are attached to the stored album.
    pub fn import_album(&mut self, scanned: &mut ScannedAlbum) -> Result<ImportCounts> {
        let tx = self.conn.transaction()?;
        let mut counts = ImportCounts::default();

        let album_id = match find_id(&tx, RecordKind::Album, &scanned.album.path)? {
            Some(id) => {
                scanned.album.id = Some(id);
                id
            }
            None => {
                counts.albums += 1;
                insert_album(&tx, &mut scanned.album)?
            }
        };

        for track in &mut scanned.tracks {
            if find_id(&tx, RecordKind::Track, &track.path)?.is_some() {
                continue;
            }
            track.album_id = Some(album_id);
            insert_track(&tx, track)?;
            counts.tracks += 1;
        }
        for extra in &mut scanned.extras {
            if find_id(&tx, RecordKind::Extra, &extra.path)?.is_some() {
                continue;
            }
            extra.album_id = Some(album_id);
            insert_extra(&tx, extra)?;
            counts.extras += 1;
        }

        tx.commit()?;
        Ok(counts)
    }

    pub fn tracks(&self) -> Result<Vec<Track>> {
        let mut custom = load_attributes(&self.conn, RecordKind::Track)?;
        let mut stmt = self.conn.prepare("select * from tracks order by id")?;
        let rows = stmt.query_map([], track_from_row)?;
        let mut tracks = rows.collect::<rusqlite::Result<Vec<Track>>>()?;
        for t in &mut tracks {
            t.custom = t.id.and_then(|id| custom.remove(&id)).unwrap_or_default();
        }
        Ok(tracks)
    }

    pub fn albums(&self) -> Result<Vec<Album>> {
        let mut custom = load_attributes(&self.conn, RecordKind::Album)?;
        let mut stmt = self.conn.prepare("select * from albums order by id")?;
        let rows = stmt.query_map([], album_from_row)?;
        let mut albums = rows.collect::<rusqlite::Result<Vec<Album>>>()?;
        for a in &mut albums {
            a.custom = a.id.and_then(|id| custom.remove(&id)).unwrap_or_default();
        }
        Ok(albums)
    }

    pub fn extras(&self) -> Result<Vec<Extra>> {
        let mut custom = load_attributes(&self.conn, RecordKind::Extra)?;
        let mut stmt = self.conn.prepare("select * from extras order by id")?;
        let rows = stmt.query_map([], extra_from_row)?;
        let mut extras = rows.collect::<rusqlite::Result<Vec<Extra>>>()?;
        for e in &mut extras {
            e.custom = e.id.and_then(|id| custom.remove(&id)).unwrap_or_default();
        }
        Ok(extras)
    }

    /// Every record of one kind, in insertion order.
    pub fn items(&self, kind: RecordKind) -> Result<Vec<Item>> {
        let items = match kind {
            RecordKind::Track => self.tracks()?.into_iter().map(Item::from).collect(),
            RecordKind::Album => self.albums()?.into_iter().map(Item::from).collect(),
            RecordKind::Extra => self.extras()?.into_iter().map(Item::from).collect(),
        };
        Ok(items)
    }

    /// Write typed columns and custom fields of stored records in one transaction.
    ///
    /// Records without an id were never stored and are skipped. Returns the
    /// number of records written.
    pub fn save_items<'a, I>(&mut self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let tx = self.conn.transaction()?;
        let mut saved = 0;

        for item in items {
            let Some(id) = item.id() else {
                warn!(path = %item.path().display(), "skipping record that was never stored");
                continue;
            };
            match item {
                Item::Track(t) => write_track(&tx, UPDATE_TRACK, t)?,
                Item::Album(a) => write_album(&tx, UPDATE_ALBUM, a)?,
                Item::Extra(e) => write_extra(&tx, UPDATE_EXTRA, e)?,
            };
            write_attributes(&tx, item.kind(), id, item.custom())?;
            saved += 1;
        }

        tx.commit()?;
        debug!(saved, "records saved");
        Ok(saved)
    }
}

fn table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Track => "tracks",
        RecordKind::Album => "albums",
        RecordKind::Extra => "extras",
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn encode_set(values: &BTreeSet<String>) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let joined: Vec<&str> = values.iter().map(String::as_str).collect();
    Some(joined.join(";"))
}

fn decode_set(raw: Option<String>) -> BTreeSet<String> {
    match raw {
        Some(s) => s.split(';').map(str::to_string).collect(),
        None => BTreeSet::new(),
    }
}

fn find_id(conn: &Connection, kind: RecordKind, path: &Path) -> Result<Option<i64>> {
    let sql = format!("select id from {} where path = ?1", table(kind));
    let id = conn
        .query_row(&sql, [path_text(path)], |r| r.get(0))
        .optional()?;
    Ok(id)
}

const INSERT_TRACK: &str = "
    insert into tracks (
        id, path, title, artist, album, albumartist, composer, comments, mb_trackid,
        track, disc, year, bpm, genres, release_date, added, album_id
    ) values (
        :id, :path, :title, :artist, :album, :albumartist, :composer, :comments, :mb_trackid,
        :track, :disc, :year, :bpm, :genres, :release_date, :added, :album_id
    )
";

const UPDATE_TRACK: &str = "
    update tracks set
        path = :path, title = :title, artist = :artist, album = :album,
        albumartist = :albumartist, composer = :composer, comments = :comments,
        mb_trackid = :mb_trackid, track = :track, disc = :disc, year = :year, bpm = :bpm,
        genres = :genres, release_date = :release_date, added = :added, album_id = :album_id
    where id = :id
";

const INSERT_ALBUM: &str = "
    insert into albums (
        id, path, album, albumartist, label, catalognum, comments, mb_albumid,
        year, disctotal, genres, albumtypes, release_date, added
    ) values (
        :id, :path, :album, :albumartist, :label, :catalognum, :comments, :mb_albumid,
        :year, :disctotal, :genres, :albumtypes, :release_date, :added
    )
";

const UPDATE_ALBUM: &str = "
    update albums set
        path = :path, album = :album, albumartist = :albumartist, label = :label,
        catalognum = :catalognum, comments = :comments, mb_albumid = :mb_albumid,
        year = :year, disctotal = :disctotal, genres = :genres, albumtypes = :albumtypes,
        release_date = :release_date, added = :added
    where id = :id
";

const INSERT_EXTRA: &str = "
    insert into extras (id, path, album_id, category, comments, tags, added)
    values (:id, :path, :album_id, :category, :comments, :tags, :added)
";

const UPDATE_EXTRA: &str = "
    update extras set
        path = :path, album_id = :album_id, category = :category,
        comments = :comments, tags = :tags, added = :added
    where id = :id
";

fn write_track(conn: &Connection, sql: &str, t: &Track) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        named_params! {
            ":id": t.id,
            ":path": path_text(&t.path),
            ":title": t.title,
            ":artist": t.artist,
            ":album": t.album,
            ":albumartist": t.albumartist,
            ":composer": t.composer,
            ":comments": t.comments,
            ":mb_trackid": t.mb_trackid,
            ":track": t.track,
            ":disc": t.disc,
            ":year": t.year,
            ":bpm": t.bpm,
            ":genres": encode_set(&t.genres),
            ":release_date": t.release_date,
            ":added": t.added,
            ":album_id": t.album_id,
        },
    )
}

fn write_album(conn: &Connection, sql: &str, a: &Album) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        named_params! {
            ":id": a.id,
            ":path": path_text(&a.path),
            ":album": a.album,
            ":albumartist": a.albumartist,
            ":label": a.label,
            ":catalognum": a.catalognum,
            ":comments": a.comments,
            ":mb_albumid": a.mb_albumid,
            ":year": a.year,
            ":disctotal": a.disctotal,
            ":genres": encode_set(&a.genres),
            ":albumtypes": encode_set(&a.albumtypes),
            ":release_date": a.release_date,
            ":added": a.added,
        },
    )
}

fn write_extra(conn: &Connection, sql: &str, e: &Extra) -> rusqlite::Result<usize> {
    conn.execute(
        sql,
        named_params! {
            ":id": e.id,
            ":path": path_text(&e.path),
            ":album_id": e.album_id,
            ":category": e.category,
            ":comments": e.comments,
            ":tags": encode_set(&e.tags),
            ":added": e.added,
        },
    )
}

fn insert_track(conn: &Connection, track: &mut Track) -> Result<i64> {
    track.id = None;
    write_track(conn, INSERT_TRACK, track)?;
    let id = conn.last_insert_rowid();
    track.id = Some(id);
    write_attributes(conn, RecordKind::Track, id, &track.custom)?;
    Ok(id)
}

fn insert_album(conn: &Connection, album: &mut Album) -> Result<i64> {
    album.id = None;
    write_album(conn, INSERT_ALBUM, album)?;
    let id = conn.last_insert_rowid();
    album.id = Some(id);
    write_attributes(conn, RecordKind::Album, id, &album.custom)?;
    Ok(id)
}

fn insert_extra(conn: &Connection, extra: &mut Extra) -> Result<i64> {
    extra.id = None;
    write_extra(conn, INSERT_EXTRA, extra)?;
    let id = conn.last_insert_rowid();
    extra.id = Some(id);
    write_attributes(conn, RecordKind::Extra, id, &extra.custom)?;
    Ok(id)
}

fn track_from_row(row: &Row<'_>) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get("id")?,
        path: PathBuf::from(row.get::<_, String>("path")?),
        title: row.get("title")?,
        artist: row.get("artist")?,
        album: row.get("album")?,
        albumartist: row.get("albumartist")?,
        composer: row.get("composer")?,
        comments: row.get("comments")?,
        mb_trackid: row.get("mb_trackid")?,
        track: row.get("track")?,
        disc: row.get("disc")?,
        year: row.get("year")?,
        bpm: row.get("bpm")?,
        genres: decode_set(row.get("genres")?),
        release_date: row.get("release_date")?,
        added: row.get("added")?,
        album_id: row.get("album_id")?,
        custom: CustomFields::new(),
    })
}

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get("id")?,
        path: PathBuf::from(row.get::<_, String>("path")?),
        album: row.get("album")?,
        albumartist: row.get("albumartist")?,
        label: row.get("label")?,
        catalognum: row.get("catalognum")?,
        comments: row.get("comments")?,
        mb_albumid: row.get("mb_albumid")?,
        year: row.get("year")?,
        disctotal: row.get("disctotal")?,
        genres: decode_set(row.get("genres")?),
        albumtypes: decode_set(row.get("albumtypes")?),
        release_date: row.get("release_date")?,
        added: row.get("added")?,
        custom: CustomFields::new(),
    })
}

fn extra_from_row(row: &Row<'_>) -> rusqlite::Result<Extra> {
    Ok(Extra {
        id: row.get("id")?,
        path: PathBuf::from(row.get::<_, String>("path")?),
        album_id: row.get("album_id")?,
        category: row.get("category")?,
        comments: row.get("comments")?,
        tags: decode_set(row.get("tags")?),
        added: row.get("added")?,
        custom: CustomFields::new(),
    })
}

/// Custom fields of every record of `kind`, keyed by record id.
///
/// Keys that collide with a typed column are dropped: a name is either a
/// typed field or a custom field, never both.
fn load_attributes(conn: &Connection, kind: RecordKind) -> Result<HashMap<i64, CustomFields>> {
    let mut stmt =
        conn.prepare("select entity_id, key, value from attributes where entity = ?1")?;
    let rows = stmt.query_map([kind.name()], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;

    let mut by_id: HashMap<i64, CustomFields> = HashMap::new();
    for row in rows {
        let (id, key, value) = row?;
        if is_typed_field(kind, &key) {
            warn!(
                entity = kind.name(),
                id,
                key = %key,
                "ignoring custom field shadowing a typed field"
            );
            continue;
        }
        by_id.entry(id).or_default().insert(key, value);
    }
    Ok(by_id)
}

fn write_attributes(
    conn: &Connection,
    kind: RecordKind,
    id: i64,
    custom: &CustomFields,
) -> Result<()> {
    conn.execute(
        "delete from attributes where entity = ?1 and entity_id = ?2",
        rusqlite::params![kind.name(), id],
    )?;
    let mut stmt = conn.prepare_cached(
        "insert into attributes (entity, entity_id, key, value) values (?1, ?2, ?3, ?4)",
    )?;
    for (key, value) in custom {
        stmt.execute(rusqlite::params![kind.name(), id, key, value])?;
    }
    Ok(())
}
