use super::model::Record;
use super::schema::fields;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    /// `field:pattern`
    Field { field: String, pattern: String },
    /// Bare pattern, matched against every textual field.
    Any(String),
}

/// A conjunction of case-insensitive substring matches.
///
/// An empty query matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    parts: Vec<Part>,
}

impl Query {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Self {
        let parts = args
            .iter()
            .map(|a| a.as_ref())
            .filter(|a| !a.is_empty())
            .map(|a| match a.split_once(':') {
                Some((field, pattern)) if !field.is_empty() => Part::Field {
                    field: field.to_string(),
                    pattern: pattern.to_lowercase(),
                },
                _ => Part::Any(a.to_lowercase()),
            })
            .collect();
        Self { parts }
    }

    pub fn matches<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.parts.iter().all(|part| match part {
            Part::Field { field, pattern } => record
                .render(field)
                .map(|v| v.to_lowercase().contains(pattern.as_str()))
                .unwrap_or(false),
            Part::Any(pattern) => {
                let typed = fields(record.kind())
                    .iter()
                    .filter(|f| f.kind.is_textual())
                    .filter_map(|f| record.render(f.name));
                let custom = record.custom().values().cloned();
                typed
                    .chain(custom)
                    .any(|v| v.to_lowercase().contains(pattern.as_str()))
            }
        })
    }

    /// Keep the records this query matches, preserving their order.
    pub fn select<R: Record>(&self, records: Vec<R>) -> Vec<R> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
