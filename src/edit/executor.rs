use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::library::{FieldDescriptor, FieldKind, Record, Value};

use super::coerce::coerce;
use super::error::{EditError, FailureKind};
use super::resolve::resolve;
use super::term::Term;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EditOptions {
    /// Turn unknown field names into new custom fields instead of failing.
    pub create_if_missing: bool,
}

/// One assignment that did not apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFailure {
    /// The raw term as given.
    pub term: String,
    /// Identity of the record, `None` when the term itself was malformed.
    pub record: Option<PathBuf>,
    pub error: EditError,
}

impl EditFailure {
    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}

impl fmt::Display for EditFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record {
            Some(path) => write!(f, "{}: {}", path.display(), self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

/// An applied assignment that changed what the record holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Index into the record slice passed to [`apply_terms`].
    pub record: usize,
    pub field: String,
    pub old: Option<String>,
    pub new: String,
}

/// Aggregate result of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Assignments that applied, including ones that left the value as it was.
    pub applied: usize,
    pub changes: Vec<FieldChange>,
    pub failures: Vec<EditFailure>,
}

impl EditOutcome {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Indices of records with at least one changed field.
    pub fn touched(&self) -> BTreeSet<usize> {
        self.changes.iter().map(|c| c.record).collect()
    }
}

fn current<R: Record + ?Sized>(record: &R, field: &FieldDescriptor<'_>) -> Option<Value> {
    match field.kind {
        FieldKind::Custom => record.custom().get(field.name).cloned().map(Value::Text),
        _ => record.field(field.name),
    }
}

fn write<R: Record + ?Sized>(
    record: &mut R,
    field: &FieldDescriptor<'_>,
    value: Value,
) -> Result<(), EditError> {
    match (field.kind, value) {
        (FieldKind::Custom, Value::Text(text)) => {
            record.custom_mut().insert(field.name.to_string(), text);
            Ok(())
        }
        (_, value) => {
            if record.set_field(field.name, value) {
                Ok(())
            } else {
                Err(EditError::ImmutableField {
                    field: field.name.to_string(),
                })
            }
        }
    }
}

/// Apply one parsed term to one record. The record is only written after
/// resolution and coercion both succeed.
fn assign<R: Record + ?Sized>(
    record: &mut R,
    term: &Term<'_>,
    options: EditOptions,
) -> Result<(Option<Value>, Value), EditError> {
    let field = resolve(record, term.field, options.create_if_missing)?;
    let value = coerce(term.value, &field)?;
    let old = current(record, &field);
    write(record, &field, value.clone())?;
    Ok((old, value))
}

/// Apply every term to every record, in input order.
///
/// Malformed terms fail once and are skipped. Every other failure is
/// confined to its (term, record) pair; earlier assignments stay applied and
/// later pairs still run. Records are mutated in place and never persisted
/// here.
pub fn apply_terms<R, S>(terms: &[S], records: &mut [R], options: EditOptions) -> EditOutcome
where
    R: Record,
    S: AsRef<str>,
{
    let mut outcome = EditOutcome::default();

    for raw in terms.iter().map(AsRef::as_ref) {
        let term = match Term::parse(raw) {
            Ok(term) => term,
            Err(error) => {
                warn!(term = raw, kind = %error.kind(), "{error}");
                outcome.failures.push(EditFailure {
                    term: raw.to_string(),
                    record: None,
                    error,
                });
                continue;
            }
        };

        for (index, record) in records.iter_mut().enumerate() {
            match assign(record, &term, options) {
                Ok((old, new)) => {
                    outcome.applied += 1;
                    // Compare values, not renderings: `{}` and `{""}` both print as "".
                    if old.as_ref() == Some(&new) {
                        continue;
                    }
                    let old = old.map(|v| v.to_string());
                    let new = new.to_string();
                    debug!(
                        record = %record.path().display(),
                        field = term.field,
                        old = old.as_deref().unwrap_or(""),
                        new = new.as_str(),
                        "field changed"
                    );
                    outcome.changes.push(FieldChange {
                        record: index,
                        field: term.field.to_string(),
                        old,
                        new,
                    });
                }
                Err(error) => {
                    warn!(
                        term = raw,
                        record = %record.path().display(),
                        field = term.field,
                        kind = %error.kind(),
                        "{error}"
                    );
                    outcome.failures.push(EditFailure {
                        term: raw.to_string(),
                        record: Some(record.path().to_path_buf()),
                        error,
                    });
                }
            }
        }
    }

    debug!(
        terms = terms.len(),
        records = records.len(),
        applied = outcome.applied,
        failures = outcome.failures.len(),
        "batch complete"
    );
    outcome
}
