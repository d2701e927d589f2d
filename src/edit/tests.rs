use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::NaiveDate;
use proptest::prelude::*;

use super::coerce::coerce;
use super::error::{EditError, FailureKind};
use super::executor::FieldChange;
use super::resolve::resolve;
use super::term::Term;
use super::*;
use crate::library::{Album, Extra, FieldDescriptor, FieldKind, Item, Record, Track, Value};

fn track(path: &str) -> Track {
    Track {
        path: PathBuf::from(path),
        title: "Untitled".into(),
        ..Track::default()
    }
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn create() -> EditOptions {
    EditOptions {
        create_if_missing: true,
    }
}

#[test]
fn term_splits_at_first_equals_sign() {
    let term = Term::parse("comment=a=b").unwrap();
    assert_eq!(term.field, "comment");
    assert_eq!(term.value, "a=b");

    let term = Term::parse("title= spaced ").unwrap();
    assert_eq!(term.value, " spaced ");
}

#[test]
fn term_rejects_missing_equals_or_empty_sides() {
    for raw in ["title", "=value", "title=", "=", ""] {
        let err = Term::parse(raw).unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedTerm, "{raw:?}");
    }
    assert!(is_term("a=b"));
    assert!(!is_term("artist:foo"));
}

#[test]
fn resolve_prefers_typed_then_custom_then_creation() {
    let mut t = track("/m/a.mp3");
    t.custom.insert("mood".into(), "calm".into());

    let desc = resolve(&t, "year", false).unwrap();
    assert_eq!(desc.kind, FieldKind::Integer);
    assert!(desc.mutable);

    let desc = resolve(&t, "mood", false).unwrap();
    assert_eq!(desc, FieldDescriptor::custom("mood"));

    let err = resolve(&t, "rating", false).unwrap_err();
    assert_eq!(err, EditError::UnknownField { field: "rating".into() });
    assert_eq!(resolve(&t, "rating", true).unwrap().kind, FieldKind::Custom);
}

#[test]
fn resolve_identity_field_is_immutable_even_with_creation() {
    let t = track("/m/a.mp3");
    for create in [false, true] {
        let desc = resolve(&t, "path", create).unwrap();
        assert!(!desc.mutable);
        assert_eq!(desc.kind, FieldKind::Text);
    }
}

#[test]
fn resolve_uses_each_variants_own_schema() {
    let album = Album::default();
    let extra = Extra::default();
    assert!(resolve(&album, "label", false).is_ok());
    assert!(resolve(&extra, "label", false).is_err());
    assert_eq!(resolve(&extra, "tags", false).unwrap().kind, FieldKind::MultiText);
}

#[test]
fn coerce_rejects_immutable_before_parsing() {
    let desc = FieldDescriptor {
        name: "id",
        kind: FieldKind::Integer,
        mutable: false,
    };
    let err = coerce("not even a number", &desc).unwrap_err();
    assert_eq!(err.kind(), FailureKind::ImmutableField);
}

#[test]
fn coerce_multi_values_trims_and_collapses() {
    let desc = FieldDescriptor {
        name: "genres",
        kind: FieldKind::MultiText,
        mutable: true,
    };
    assert_eq!(
        coerce("hip hop;pop", &desc).unwrap(),
        Value::Set(set(&["hip hop", "pop"]))
    );
    assert_eq!(
        coerce(" pop ; rock;pop", &desc).unwrap(),
        Value::Set(set(&["pop", "rock"]))
    );
}

#[test]
fn coerce_multi_values_keeps_empty_segments() {
    let desc = FieldDescriptor {
        name: "genres",
        kind: FieldKind::MultiText,
        mutable: true,
    };
    assert_eq!(
        coerce("pop;;rock", &desc).unwrap(),
        Value::Set(set(&["", "pop", "rock"]))
    );
    assert_eq!(coerce(";", &desc).unwrap(), Value::Set(set(&[""])));
}

#[test]
fn coerce_text_is_stored_verbatim() {
    let desc = FieldDescriptor::custom("note");
    assert_eq!(coerce("  a;b  ", &desc).unwrap(), Value::Text("  a;b  ".into()));
}

#[test]
fn coerce_date_reports_the_expected_format() {
    let desc = FieldDescriptor {
        name: "release_date",
        kind: FieldKind::Date,
        mutable: true,
    };
    let err = coerce("2020-02-30", &desc).unwrap_err();
    assert_eq!(
        err,
        EditError::TypeCoercion {
            field: "release_date".into(),
            message: "Date must be in format YYYY-MM-DD".into(),
        }
    );
    assert_eq!(
        coerce("2020-02-29", &desc).unwrap(),
        Value::Date(NaiveDate::from_ymd_opt(2020, 2, 29).unwrap())
    );
}

#[test]
fn identity_field_is_never_assignable() {
    let mut records: Vec<Item> = vec![
        track("/m/a.mp3").into(),
        Album {
            path: PathBuf::from("/m"),
            ..Album::default()
        }
        .into(),
        Extra {
            path: PathBuf::from("/m/cover.jpg"),
            ..Extra::default()
        }
        .into(),
    ];

    let outcome = apply_terms(&["path=/elsewhere", "id=4"], &mut records, create());
    assert_eq!(outcome.applied, 0);
    assert_eq!(outcome.failure_count(), 6);
    assert!(
        outcome
            .failures
            .iter()
            .all(|f| f.kind() == FailureKind::ImmutableField)
    );
    assert_eq!(records[0].path(), PathBuf::from("/m/a.mp3").as_path());
}

#[test]
fn apply_writes_typed_and_multi_valued_fields() {
    let mut records = vec![track("/m/a.mp3")];
    let outcome = apply_terms(
        &["genres=hip hop;pop", "year=1994", "release_date=1994-04-19", "title=N.Y. State of Mind"],
        &mut records,
        EditOptions::default(),
    );

    assert!(outcome.is_success());
    assert_eq!(outcome.applied, 4);
    let t = &records[0];
    assert_eq!(t.genres, set(&["hip hop", "pop"]));
    assert_eq!(t.year, Some(1994));
    assert_eq!(t.release_date, NaiveDate::from_ymd_opt(1994, 4, 19));
    assert_eq!(t.title, "N.Y. State of Mind");
}

#[test]
fn unknown_field_needs_create_if_missing() {
    let mut records = vec![track("/m/a.mp3")];

    let outcome = apply_terms(&["mood=calm"], &mut records, EditOptions::default());
    assert_eq!(outcome.failure_count(), 1);
    assert_eq!(outcome.failures[0].kind(), FailureKind::UnknownField);
    assert!(records[0].custom.is_empty());

    let outcome = apply_terms(&["mood=calm"], &mut records, create());
    assert!(outcome.is_success());
    assert_eq!(records[0].custom.get("mood").map(String::as_str), Some("calm"));

    // Once created, the field resolves without the flag.
    let outcome = apply_terms(&["mood=tense"], &mut records, EditOptions::default());
    assert!(outcome.is_success());
    assert_eq!(records[0].render("mood").as_deref(), Some("tense"));
}

#[test]
fn failed_coercion_leaves_the_previous_value() {
    let mut records = vec![Track {
        year: Some(2001),
        ..track("/m/a.mp3")
    }];
    let outcome = apply_terms(&["year=20O1"], &mut records, EditOptions::default());
    assert_eq!(outcome.failures[0].kind(), FailureKind::TypeCoercion);
    assert_eq!(records[0].year, Some(2001));
    assert!(outcome.changes.is_empty());
}

#[test]
fn batch_counts_every_failed_pair_and_applies_the_rest() {
    const N: usize = 4;
    let mut records: Vec<Track> = (0..N).map(|i| track(&format!("/m/{i}.mp3"))).collect();
    // Record 2 already has a custom key, so `mood=` only fails elsewhere.
    records[2].custom.insert("mood".into(), "old".into());

    let terms = ["artist=Nas", "path=/x", "mood=new", "bpm=90"];
    let m = terms.len();
    let outcome = apply_terms(&terms, &mut records, EditOptions::default());

    // path fails on every record, mood fails on the three records without it.
    let k = N + (N - 1);
    assert_eq!(outcome.failure_count(), k);
    assert_eq!(outcome.applied, N * m - k);

    for (i, r) in records.iter().enumerate() {
        assert_eq!(r.artist, "Nas");
        assert_eq!(r.bpm, Some(90));
        assert_eq!(r.path, PathBuf::from(format!("/m/{i}.mp3")));
    }
    assert_eq!(records[2].custom.get("mood").map(String::as_str), Some("new"));
    assert!(records[0].custom.is_empty());
}

#[test]
fn malformed_terms_fail_once_without_record_attribution() {
    let mut records = vec![track("/m/a.mp3"), track("/m/b.mp3")];
    let outcome = apply_terms(
        &["noequals", "artist=X", "=oops"],
        &mut records,
        EditOptions::default(),
    );

    assert_eq!(outcome.failure_count(), 2);
    assert!(outcome.failures.iter().all(|f| f.record.is_none()));
    assert_eq!(outcome.failures[0].term, "noequals");
    assert_eq!(outcome.applied, 2);
    assert!(records.iter().all(|r| r.artist == "X"));
}

#[test]
fn failures_are_reported_in_input_order() {
    let mut records = vec![track("/m/a.mp3"), track("/m/b.mp3")];
    let outcome = apply_terms(&["year=x", "id=1"], &mut records, EditOptions::default());

    let seen: Vec<(FailureKind, Option<PathBuf>)> = outcome
        .failures
        .iter()
        .map(|f| (f.kind(), f.record.clone()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (FailureKind::TypeCoercion, Some(PathBuf::from("/m/a.mp3"))),
            (FailureKind::TypeCoercion, Some(PathBuf::from("/m/b.mp3"))),
            (FailureKind::ImmutableField, Some(PathBuf::from("/m/a.mp3"))),
            (FailureKind::ImmutableField, Some(PathBuf::from("/m/b.mp3"))),
        ]
    );
    assert_eq!(
        outcome.failures[0].to_string(),
        "/m/a.mp3: invalid value for 'year': 'x' is not an integer"
    );
}

#[test]
fn changes_skip_assignments_that_keep_the_value() {
    let mut records = vec![
        Track {
            artist: "Same".into(),
            ..track("/m/a.mp3")
        },
        track("/m/b.mp3"),
    ];
    let outcome = apply_terms(&["artist=Same"], &mut records, EditOptions::default());

    assert_eq!(outcome.applied, 2);
    assert_eq!(
        outcome.changes,
        vec![FieldChange {
            record: 1,
            field: "artist".into(),
            old: Some(String::new()),
            new: "Same".into(),
        }]
    );
    assert_eq!(outcome.touched(), BTreeSet::from([1]));
}

#[test]
fn changes_tell_an_empty_member_from_an_empty_set() {
    let mut records = vec![track("/m/a.mp3"), track("/m/b.mp3")];
    records[1].genres = set(&[""]);
    let outcome = apply_terms(&["genres=;"], &mut records, EditOptions::default());

    assert_eq!(outcome.applied, 2);
    assert_eq!(outcome.touched(), BTreeSet::from([0]));
    assert_eq!(outcome.changes[0].old.as_deref(), Some(""));
    assert_eq!(outcome.changes[0].new, "");
    assert!(records.iter().all(|r| r.genres == set(&[""])));
}

#[test]
fn integer_coercion_normalizes_non_canonical_digits() {
    let desc = FieldDescriptor {
        name: "year",
        kind: FieldKind::Integer,
        mutable: true,
    };
    for (raw, shown) in [("007", "7"), ("-0", "0"), ("-012", "-12"), ("0000", "0")] {
        assert_eq!(coerce(raw, &desc).unwrap().to_string(), shown, "{raw:?}");
    }

    let mut records = vec![track("/m/a.mp3")];
    records[0].year = Some(7);
    let outcome = apply_terms(&["year=007"], &mut records, EditOptions::default());
    assert_eq!(outcome.applied, 1);
    assert!(outcome.changes.is_empty());
}

#[test]
fn empty_record_set_only_reports_malformed_terms() {
    let mut records: Vec<Track> = Vec::new();
    let outcome = apply_terms(&["year=1", "bad"], &mut records, EditOptions::default());
    assert_eq!(outcome.applied, 0);
    assert_eq!(outcome.failure_count(), 1);
}

proptest! {
    #[test]
    fn integer_round_trips_through_coercion(n in any::<i64>()) {
        let desc = FieldDescriptor { name: "bpm", kind: FieldKind::Integer, mutable: true };
        let s = n.to_string();
        let value = coerce(&s, &desc).unwrap();
        prop_assert_eq!(value.to_string(), s);
    }

    #[test]
    fn identity_rejects_any_value(value in ".*") {
        let mut records: Vec<Item> = vec![track("/m/a.mp3").into(), Album::default().into()];
        let raw = format!("path={value}");
        let outcome = apply_terms(&[raw], &mut records, create());
        prop_assert_eq!(outcome.applied, 0);
        prop_assert!(!outcome.failures.is_empty());
        let expected = if value.is_empty() {
            FailureKind::MalformedTerm
        } else {
            FailureKind::ImmutableField
        };
        prop_assert!(outcome.failures.iter().all(|f| f.kind() == expected));
    }
}
