use super::error::EditError;

/// One `field=value` edit instruction, borrowed from its raw input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Term<'a> {
    pub field: &'a str,
    pub value: &'a str,
}

impl<'a> Term<'a> {
    /// Split `raw` at its first `=`. Later `=` characters belong to the value.
    ///
    /// Neither side is trimmed, and both must be non-empty.
    pub fn parse(raw: &'a str) -> Result<Self, EditError> {
        let malformed = |reason| EditError::MalformedTerm {
            term: raw.to_string(),
            reason,
        };

        let (field, value) = raw.split_once('=').ok_or_else(|| malformed("expected FIELD=VALUE"))?;
        if field.is_empty() {
            return Err(malformed("field name is empty"));
        }
        if value.is_empty() {
            return Err(malformed("value is empty"));
        }
        Ok(Self { field, value })
    }
}

/// Whether a command-line argument is an edit term rather than a query part.
pub fn is_term(arg: &str) -> bool {
    arg.contains('=')
}
