use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::library::{FieldDescriptor, FieldKind, Value};

use super::error::{DATE_FORMAT_MESSAGE, EditError};

/// Separator between members of a multi-valued field.
pub const MULTI_VALUE_SEPARATOR: char = ';';

/// Convert `raw` into the value `field` stores.
///
/// Dispatch depends only on the descriptor, never on the field's current
/// value. Immutable fields are rejected before any parsing happens.
pub fn coerce(raw: &str, field: &FieldDescriptor<'_>) -> Result<Value, EditError> {
    if !field.mutable {
        return Err(EditError::ImmutableField {
            field: field.name.to_string(),
        });
    }

    let invalid = |message: String| EditError::TypeCoercion {
        field: field.name.to_string(),
        message,
    };

    match field.kind {
        FieldKind::Integer => parse_integer(raw).map(Value::Integer).map_err(invalid),
        FieldKind::Date => parse_date(raw)
            .map(Value::Date)
            .ok_or_else(|| invalid(DATE_FORMAT_MESSAGE.to_string())),
        FieldKind::MultiText => Ok(Value::Set(split_multi(raw))),
        FieldKind::Text | FieldKind::Custom => Ok(Value::Text(raw.to_string())),
    }
}

/// Strict base-10 `-?[0-9]+` within `i64`.
fn parse_integer(raw: &str) -> Result<i64, String> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{raw}' is not an integer"));
    }
    raw.parse::<i64>().map_err(|_| format!("'{raw}' is out of range"))
}

/// Exactly `YYYY-MM-DD`, and a date that exists on the calendar.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let b = raw.as_bytes();
    let shape_ok = b.len() == 10
        && b.iter().enumerate().all(|(i, c)| match i {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }

    let year = raw[0..4].parse().ok()?;
    let month = raw[5..7].parse().ok()?;
    let day = raw[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Split on `;` and trim each member. Empty members are kept as `""`.
fn split_multi(raw: &str) -> BTreeSet<String> {
    raw.split(MULTI_VALUE_SEPARATOR)
        .map(|s| s.trim().to_string())
        .collect()
}
