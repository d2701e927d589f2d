//! Configuration loader and schema types.
//!
//! Settings cover where the library lives on disk, how directories are
//! scanned, how records are listed and how edits behave by default.

mod load;
mod schema;

pub use schema::*;
