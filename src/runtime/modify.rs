use std::collections::BTreeSet;
use std::io::Write;

use tracing::info;

use crate::edit::{EditOptions, EditOutcome, apply_terms, is_term};
use crate::library::{Item, Query, Record, RecordKind};
use crate::store::Store;

pub struct ModifyRequest<'a> {
    pub kind: RecordKind,
    /// Raw arguments: edit terms and query parts mixed.
    pub args: &'a [String],
    pub create_if_missing: bool,
    pub pretend: bool,
}

#[derive(Debug, Default)]
pub struct ModifyReport {
    pub selected: usize,
    pub saved: usize,
    /// `None` when the batch never ran (no edits, or nothing selected).
    pub outcome: Option<EditOutcome>,
}

impl ModifyReport {
    pub fn succeeded(&self) -> bool {
        self.selected > 0 && self.outcome.as_ref().is_some_and(EditOutcome::is_success)
    }
}

fn print_changes(
    out: &mut impl Write,
    items: &[Item],
    outcome: &EditOutcome,
) -> std::io::Result<()> {
    let touched: BTreeSet<usize> = outcome.touched();
    for index in touched {
        writeln!(out, "{}", items[index].path().display())?;
        for change in outcome.changes.iter().filter(|c| c.record == index) {
            writeln!(
                out,
                "  {}: {} -> {}",
                change.field,
                change.old.as_deref().unwrap_or(""),
                change.new
            )?;
        }
    }
    Ok(())
}

/// Select records, apply the edit batch, report, and save what changed.
///
/// Every successful assignment is saved even when other pairs failed.
pub fn modify(
    store: &mut Store,
    req: ModifyRequest<'_>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<ModifyReport, Box<dyn std::error::Error>> {
    let (terms, query): (Vec<&String>, Vec<&String>) =
        req.args.iter().partition(|a| is_term(a.as_str()));

    if terms.is_empty() {
        writeln!(err, "fermata: no edits given (expected FIELD=VALUE)")?;
        return Ok(ModifyReport::default());
    }

    let query = Query::parse(&query);
    let mut items = query.select(store.items(req.kind)?);
    if items.is_empty() {
        writeln!(err, "fermata: no {} matches the query", req.kind)?;
        return Ok(ModifyReport::default());
    }

    let options = EditOptions {
        create_if_missing: req.create_if_missing,
    };
    let outcome = apply_terms(&terms, &mut items, options);

    print_changes(out, &items, &outcome)?;
    for failure in &outcome.failures {
        writeln!(err, "error: {failure}")?;
    }

    let touched = outcome.touched();
    let saved = if req.pretend {
        0
    } else {
        store.save_items(touched.iter().map(|&i| &items[i]))?
    };

    writeln!(
        out,
        "{} {}(s) matched, {} changed, {} failure(s){}",
        items.len(),
        req.kind,
        touched.len(),
        outcome.failure_count(),
        if req.pretend { " (pretend, nothing saved)" } else { "" }
    )?;
    info!(
        kind = req.kind.name(),
        selected = items.len(),
        saved,
        failures = outcome.failure_count(),
        "modify finished"
    );

    Ok(ModifyReport {
        selected: items.len(),
        saved,
        outcome: Some(outcome),
    })
}
