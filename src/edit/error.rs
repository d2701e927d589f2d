use std::fmt;

use thiserror::Error;

pub const DATE_FORMAT_MESSAGE: &str = "Date must be in format YYYY-MM-DD";

/// Why a single (term, record) assignment did not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("malformed term '{term}': {reason}")]
    MalformedTerm { term: String, reason: &'static str },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("field '{field}' cannot be modified")]
    ImmutableField { field: String },

    #[error("invalid value for '{field}': {message}")]
    TypeCoercion { field: String, message: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MalformedTerm,
    UnknownField,
    ImmutableField,
    TypeCoercion,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedTerm => "malformed-term",
            Self::UnknownField => "unknown-field",
            Self::ImmutableField => "immutable-field",
            Self::TypeCoercion => "type-coercion",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EditError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MalformedTerm { .. } => FailureKind::MalformedTerm,
            Self::UnknownField { .. } => FailureKind::UnknownField,
            Self::ImmutableField { .. } => FailureKind::ImmutableField,
            Self::TypeCoercion { .. } => FailureKind::TypeCoercion,
        }
    }
}
