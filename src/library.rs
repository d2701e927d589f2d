//! Library records and their schema.
//!
//! Tracks, albums and extra files are plain structs with typed columns plus
//! an open-ended map of custom fields. Every variant publishes a static
//! field table (`schema`) so callers can resolve names without inspecting
//! the record at runtime.

mod display;
mod model;
mod query;
mod scan;
mod schema;

pub use display::display_from_fields;
pub use model::*;
pub use query::Query;
pub use scan::{ScannedAlbum, scan};
pub use schema::*;
