use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Free-form attributes that are not part of a variant's fixed schema.
pub type CustomFields = BTreeMap<String, String>;

/// Which kind of library record a value belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    Track,
    Album,
    Extra,
}

impl RecordKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Album => "album",
            Self::Extra => "extra",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Date(NaiveDate),
    /// Multi-valued text; membership is the observable state.
    Set(BTreeSet<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Set(values) => {
                let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                f.write_str(&joined.join(";"))
            }
        }
    }
}

/// Uniform access to the typed columns and custom fields of a record.
///
/// `field` and `set_field` only cover the variant's typed columns; the
/// custom map is reached through `custom` / `custom_mut`.
pub trait Record {
    fn kind(&self) -> RecordKind;

    /// Store key, if the record has been persisted.
    fn id(&self) -> Option<i64>;

    /// Identity of the record on disk. Never editable.
    fn path(&self) -> &Path;

    /// Current value of a typed column. `None` when the column does not
    /// exist or is unset.
    fn field(&self, name: &str) -> Option<Value>;

    /// Write a typed column. Returns `false` when `name` is not a writable
    /// column of this variant or `value` has the wrong shape for it.
    fn set_field(&mut self, name: &str, value: Value) -> bool;

    fn custom(&self) -> &CustomFields;

    fn custom_mut(&mut self) -> &mut CustomFields;

    /// Render a typed column or custom field as text.
    fn render(&self, name: &str) -> Option<String> {
        match self.field(name) {
            Some(value) => Some(value.to_string()),
            None => self.custom().get(name).cloned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Track {
    pub id: Option<i64>,
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub albumartist: String,
    pub composer: String,
    pub comments: String,
    pub mb_trackid: String,
    pub track: Option<i64>,
    pub disc: Option<i64>,
    pub year: Option<i64>,
    pub bpm: Option<i64>,
    pub genres: BTreeSet<String>,
    pub release_date: Option<NaiveDate>,
    pub added: Option<NaiveDate>,
    pub album_id: Option<i64>,
    pub custom: CustomFields,
}

impl Record for Track {
    fn kind(&self) -> RecordKind {
        RecordKind::Track
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::Integer(self.id?),
            "path" => Value::Text(self.path.display().to_string()),
            "title" => Value::Text(self.title.clone()),
            "artist" => Value::Text(self.artist.clone()),
            "album" => Value::Text(self.album.clone()),
            "albumartist" => Value::Text(self.albumartist.clone()),
            "composer" => Value::Text(self.composer.clone()),
            "comments" => Value::Text(self.comments.clone()),
            "mb_trackid" => Value::Text(self.mb_trackid.clone()),
            "track" => Value::Integer(self.track?),
            "disc" => Value::Integer(self.disc?),
            "year" => Value::Integer(self.year?),
            "bpm" => Value::Integer(self.bpm?),
            "genres" => Value::Set(self.genres.clone()),
            "release_date" => Value::Date(self.release_date?),
            "added" => Value::Date(self.added?),
            "album_id" => Value::Integer(self.album_id?),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match (name, value) {
            ("title", Value::Text(v)) => self.title = v,
            ("artist", Value::Text(v)) => self.artist = v,
            ("album", Value::Text(v)) => self.album = v,
            ("albumartist", Value::Text(v)) => self.albumartist = v,
            ("composer", Value::Text(v)) => self.composer = v,
            ("comments", Value::Text(v)) => self.comments = v,
            ("mb_trackid", Value::Text(v)) => self.mb_trackid = v,
            ("track", Value::Integer(n)) => self.track = Some(n),
            ("disc", Value::Integer(n)) => self.disc = Some(n),
            ("year", Value::Integer(n)) => self.year = Some(n),
            ("bpm", Value::Integer(n)) => self.bpm = Some(n),
            ("genres", Value::Set(v)) => self.genres = v,
            ("release_date", Value::Date(d)) => self.release_date = Some(d),
            ("added", Value::Date(d)) => self.added = Some(d),
            ("album_id", Value::Integer(n)) => self.album_id = Some(n),
            _ => return false,
        }
        true
    }

    fn custom(&self) -> &CustomFields {
        &self.custom
    }

    fn custom_mut(&mut self) -> &mut CustomFields {
        &mut self.custom
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Album {
    pub id: Option<i64>,
    /// Directory holding the album's files.
    pub path: PathBuf,
    pub album: String,
    pub albumartist: String,
    pub label: String,
    pub catalognum: String,
    pub comments: String,
    pub mb_albumid: String,
    pub year: Option<i64>,
    pub disctotal: Option<i64>,
    pub genres: BTreeSet<String>,
    pub albumtypes: BTreeSet<String>,
    pub release_date: Option<NaiveDate>,
    pub added: Option<NaiveDate>,
    pub custom: CustomFields,
}

impl Record for Album {
    fn kind(&self) -> RecordKind {
        RecordKind::Album
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::Integer(self.id?),
            "path" => Value::Text(self.path.display().to_string()),
            "album" => Value::Text(self.album.clone()),
            "albumartist" => Value::Text(self.albumartist.clone()),
            "label" => Value::Text(self.label.clone()),
            "catalognum" => Value::Text(self.catalognum.clone()),
            "comments" => Value::Text(self.comments.clone()),
            "mb_albumid" => Value::Text(self.mb_albumid.clone()),
            "year" => Value::Integer(self.year?),
            "disctotal" => Value::Integer(self.disctotal?),
            "genres" => Value::Set(self.genres.clone()),
            "albumtypes" => Value::Set(self.albumtypes.clone()),
            "release_date" => Value::Date(self.release_date?),
            "added" => Value::Date(self.added?),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match (name, value) {
            ("album", Value::Text(v)) => self.album = v,
            ("albumartist", Value::Text(v)) => self.albumartist = v,
            ("label", Value::Text(v)) => self.label = v,
            ("catalognum", Value::Text(v)) => self.catalognum = v,
            ("comments", Value::Text(v)) => self.comments = v,
            ("mb_albumid", Value::Text(v)) => self.mb_albumid = v,
            ("year", Value::Integer(n)) => self.year = Some(n),
            ("disctotal", Value::Integer(n)) => self.disctotal = Some(n),
            ("genres", Value::Set(v)) => self.genres = v,
            ("albumtypes", Value::Set(v)) => self.albumtypes = v,
            ("release_date", Value::Date(d)) => self.release_date = Some(d),
            ("added", Value::Date(d)) => self.added = Some(d),
            _ => return false,
        }
        true
    }

    fn custom(&self) -> &CustomFields {
        &self.custom
    }

    fn custom_mut(&mut self) -> &mut CustomFields {
        &mut self.custom
    }
}

/// A non-audio file that belongs to an album (artwork, cue sheet, rip log).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extra {
    pub id: Option<i64>,
    pub path: PathBuf,
    pub album_id: Option<i64>,
    pub category: String,
    pub comments: String,
    pub tags: BTreeSet<String>,
    pub added: Option<NaiveDate>,
    pub custom: CustomFields,
}

impl Record for Extra {
    fn kind(&self) -> RecordKind {
        RecordKind::Extra
    }

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::Integer(self.id?),
            "path" => Value::Text(self.path.display().to_string()),
            "album_id" => Value::Integer(self.album_id?),
            "category" => Value::Text(self.category.clone()),
            "comments" => Value::Text(self.comments.clone()),
            "tags" => Value::Set(self.tags.clone()),
            "added" => Value::Date(self.added?),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        match (name, value) {
            ("album_id", Value::Integer(n)) => self.album_id = Some(n),
            ("category", Value::Text(v)) => self.category = v,
            ("comments", Value::Text(v)) => self.comments = v,
            ("tags", Value::Set(v)) => self.tags = v,
            ("added", Value::Date(d)) => self.added = Some(d),
            _ => return false,
        }
        true
    }

    fn custom(&self) -> &CustomFields {
        &self.custom
    }

    fn custom_mut(&mut self) -> &mut CustomFields {
        &mut self.custom
    }
}

/// Any library record, as loaded from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Track(Track),
    Album(Album),
    Extra(Extra),
}

impl Item {
    fn inner(&self) -> &dyn Record {
        match self {
            Self::Track(t) => t,
            Self::Album(a) => a,
            Self::Extra(e) => e,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Record {
        match self {
            Self::Track(t) => t,
            Self::Album(a) => a,
            Self::Extra(e) => e,
        }
    }
}

impl From<Track> for Item {
    fn from(t: Track) -> Self {
        Self::Track(t)
    }
}

impl From<Album> for Item {
    fn from(a: Album) -> Self {
        Self::Album(a)
    }
}

impl From<Extra> for Item {
    fn from(e: Extra) -> Self {
        Self::Extra(e)
    }
}

impl Record for Item {
    fn kind(&self) -> RecordKind {
        self.inner().kind()
    }

    fn id(&self) -> Option<i64> {
        self.inner().id()
    }

    fn path(&self) -> &Path {
        self.inner().path()
    }

    fn field(&self, name: &str) -> Option<Value> {
        self.inner().field(name)
    }

    fn set_field(&mut self, name: &str, value: Value) -> bool {
        self.inner_mut().set_field(name, value)
    }

    fn custom(&self) -> &CustomFields {
        self.inner().custom()
    }

    fn custom_mut(&mut self) -> &mut CustomFields {
        self.inner_mut().custom_mut()
    }
}
