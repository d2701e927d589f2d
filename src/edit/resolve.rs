use crate::library::{FieldDescriptor, Record, typed_field};

use super::error::EditError;

/// Resolve `name` against the record's schema.
///
/// Typed columns win over custom keys, so the identity field always comes
/// back as an immutable typed field. Unknown names become custom fields only
/// when `create_if_missing` is set.
pub fn resolve<'a, R: Record + ?Sized>(
    record: &R,
    name: &'a str,
    create_if_missing: bool,
) -> Result<FieldDescriptor<'a>, EditError> {
    if let Some(desc) = typed_field(record.kind(), name) {
        return Ok(*desc);
    }
    if create_if_missing || record.custom().contains_key(name) {
        return Ok(FieldDescriptor::custom(name));
    }
    Err(EditError::UnknownField {
        field: name.to_string(),
    })
}
