use super::model::Record;

/// Build a display string for a record according to the provided `fields` and separator.
///
/// Each field name may be a typed column or a custom field. Empty values are
/// skipped, and the record's path is used when no parts were produced.
pub fn display_from_fields<R: Record + ?Sized>(record: &R, fields: &[String], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        if let Some(v) = record.render(f) {
            let v = v.trim();
            if !v.is_empty() {
                parts.push(v.to_string());
            }
        }
    }

    if parts.is_empty() {
        record.path().display().to_string()
    } else {
        parts.join(sep)
    }
}
