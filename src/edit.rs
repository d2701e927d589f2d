//! Typed bulk editing of library records.
//!
//! A batch of `FIELD=VALUE` terms is applied to every record of a selection.
//! Each (term, record) pair succeeds or fails on its own: a failure is
//! recorded and reported, and the rest of the batch still runs.

mod coerce;
mod error;
mod executor;
mod resolve;
mod term;

pub use executor::{EditOptions, EditOutcome, apply_terms};
pub use term::is_term;

#[cfg(test)]
mod tests;
