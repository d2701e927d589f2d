//! Static field tables for each record variant.

use std::fmt;

use super::model::RecordKind;

/// Field that identifies a record on disk. Immutable for every variant.
pub const IDENTITY_FIELD: &str = "path";

/// Semantic type of a field, decided once from the schema.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Date,
    MultiText,
    /// Free-form text stored in the record's custom map.
    Custom,
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Date => "date",
            Self::MultiText => "multi-valued text",
            Self::Custom => "custom",
        }
    }

    /// Whether free-text selection should look at fields of this kind.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::MultiText | Self::Custom)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FieldDescriptor<'a> {
    pub name: &'a str,
    pub kind: FieldKind,
    pub mutable: bool,
}

impl<'a> FieldDescriptor<'a> {
    /// Descriptor for a custom field, existing or about to be created.
    pub fn custom(name: &'a str) -> Self {
        Self {
            name,
            kind: FieldKind::Custom,
            mutable: true,
        }
    }
}

const fn editable(name: &'static str, kind: FieldKind) -> FieldDescriptor<'static> {
    FieldDescriptor {
        name,
        kind,
        mutable: true,
    }
}

const fn fixed(name: &'static str, kind: FieldKind) -> FieldDescriptor<'static> {
    FieldDescriptor {
        name,
        kind,
        mutable: false,
    }
}

use FieldKind::{Date, Integer, MultiText, Text};

static TRACK_FIELDS: &[FieldDescriptor<'static>] = &[
    fixed("id", Integer),
    fixed(IDENTITY_FIELD, Text),
    editable("title", Text),
    editable("artist", Text),
    editable("album", Text),
    editable("albumartist", Text),
    editable("composer", Text),
    editable("comments", Text),
    editable("mb_trackid", Text),
    editable("track", Integer),
    editable("disc", Integer),
    editable("year", Integer),
    editable("bpm", Integer),
    editable("genres", MultiText),
    editable("release_date", Date),
    editable("added", Date),
    editable("album_id", Integer),
];

static ALBUM_FIELDS: &[FieldDescriptor<'static>] = &[
    fixed("id", Integer),
    fixed(IDENTITY_FIELD, Text),
    editable("album", Text),
    editable("albumartist", Text),
    editable("label", Text),
    editable("catalognum", Text),
    editable("comments", Text),
    editable("mb_albumid", Text),
    editable("year", Integer),
    editable("disctotal", Integer),
    editable("genres", MultiText),
    editable("albumtypes", MultiText),
    editable("release_date", Date),
    editable("added", Date),
];

static EXTRA_FIELDS: &[FieldDescriptor<'static>] = &[
    fixed("id", Integer),
    fixed(IDENTITY_FIELD, Text),
    editable("album_id", Integer),
    editable("category", Text),
    editable("comments", Text),
    editable("tags", MultiText),
    editable("added", Date),
];

/// All typed fields of a variant, in display order.
pub fn fields(kind: RecordKind) -> &'static [FieldDescriptor<'static>] {
    match kind {
        RecordKind::Track => TRACK_FIELDS,
        RecordKind::Album => ALBUM_FIELDS,
        RecordKind::Extra => EXTRA_FIELDS,
    }
}

/// Look up a typed field by name.
pub fn typed_field(kind: RecordKind, name: &str) -> Option<&'static FieldDescriptor<'static>> {
    fields(kind).iter().find(|f| f.name == name)
}

pub fn is_typed_field(kind: RecordKind, name: &str) -> bool {
    typed_field(kind, name).is_some()
}
