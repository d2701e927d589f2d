use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::config::Settings;
use crate::import::import_dir;
use crate::library::{Query, Record, RecordKind, display_from_fields, fields};
use crate::store::Store;

pub fn import(
    store: &mut Store,
    dir: &Path,
    settings: &Settings,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let today = chrono::Local::now().date_naive();
    let counts = import_dir(store, dir, &settings.library, today)?;
    writeln!(
        out,
        "added {} album(s), {} track(s), {} extra(s)",
        counts.albums, counts.tracks, counts.extras
    )?;
    Ok(())
}

pub fn list(
    store: &Store,
    kind: RecordKind,
    query: &[String],
    settings: &Settings,
    out: &mut impl Write,
) -> Result<usize, Box<dyn std::error::Error>> {
    let items = Query::parse(query).select(store.items(kind)?);
    let shown = settings.display.fields_for(kind);
    for item in &items {
        writeln!(
            out,
            "{}",
            display_from_fields(item, shown, &settings.display.separator)
        )?;
    }
    Ok(items.len())
}

/// Print the typed schema of `kind`, then the custom field names in use.
pub fn fields_of(
    store: &Store,
    kind: RecordKind,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(out, "{kind} fields:")?;
    for f in fields(kind) {
        let note = if f.mutable { "" } else { " (read-only)" };
        writeln!(out, "  {:<14} {}{}", f.name, f.kind, note)?;
    }

    let custom: BTreeSet<String> = store
        .items(kind)?
        .iter()
        .flat_map(|item| item.custom().keys().cloned().collect::<Vec<_>>())
        .collect();
    if !custom.is_empty() {
        writeln!(out, "custom fields:")?;
        for name in custom {
            writeln!(out, "  {name}")?;
        }
    }
    Ok(())
}

pub fn show_config(
    settings: &Settings,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    write!(out, "{}", toml::to_string(settings)?)?;
    Ok(())
}
