//! Table layout and schema versioning.

use rusqlite::Connection;
use tracing::info;

use super::{Result, StoreError};

pub const SCHEMA_VERSION: i64 = 1;

const CREATE_TABLES: &str = "
    create table if not exists albums (
        id integer primary key,
        path text not null unique,
        album text not null default '',
        albumartist text not null default '',
        label text not null default '',
        catalognum text not null default '',
        comments text not null default '',
        mb_albumid text not null default '',
        year integer,
        disctotal integer,
        genres text,
        albumtypes text,
        release_date text,
        added text
    );

    create table if not exists tracks (
        id integer primary key,
        path text not null unique,
        title text not null default '',
        artist text not null default '',
        album text not null default '',
        albumartist text not null default '',
        composer text not null default '',
        comments text not null default '',
        mb_trackid text not null default '',
        track integer,
        disc integer,
        year integer,
        bpm integer,
        genres text,
        release_date text,
        added text,
        album_id integer
    );

    create table if not exists extras (
        id integer primary key,
        path text not null unique,
        album_id integer,
        category text not null default '',
        comments text not null default '',
        tags text,
        added text
    );

    create table if not exists attributes (
        entity text not null,
        entity_id integer not null,
        key text not null,
        value text not null,
        primary key (entity, entity_id, key)
    );
";

/// Create missing tables and stamp the schema version.
///
/// Databases written by a newer schema are refused rather than modified.
pub fn migrate(conn: &Connection) -> Result<()> {
    let found: i64 = conn.query_row("pragma user_version", [], |r| r.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(StoreError::SchemaVersion {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    conn.execute_batch(CREATE_TABLES)?;
    if found < SCHEMA_VERSION {
        conn.execute_batch(&format!("pragma user_version = {SCHEMA_VERSION}"))?;
        info!(from = found, to = SCHEMA_VERSION, "database schema initialized");
    }
    Ok(())
}
