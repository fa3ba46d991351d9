//! Integration tests for unifying a store of heterogeneous snapshots.

use fare_common::{EngineKind, FareError};
use schema_unifier::{probe_file, FormatVersion, Plan, SchemaUnifier};
use snapshot_store::SnapshotFile;
use test_utils::{
    scrape_day, scrape_time, stations, store_dir, unified_row, write_raw_snapshot, write_snapshot,
    write_snapshot_gz, Generation, TripSpec,
};

fn trips(offset: i64) -> Vec<TripSpec> {
    vec![
        TripSpec::new(scrape_day(offset + 3)),
        TripSpec::new(scrape_day(offset + 5))
            .origin(stations::LYON.0, stations::LYON.1)
            .train("6605")
            .seat(false),
    ]
}

#[test]
fn test_legacy_and_upstream_union_into_one_shape() {
    let dir = store_dir();
    write_snapshot(dir.path(), 1, Generation::Legacy, scrape_time(0), &trips(0));
    write_snapshot(dir.path(), 2, Generation::Upstream, scrape_time(1), &trips(1));

    let rows = SchemaUnifier::default().open(dir.path()).unwrap().materialize().unwrap();

    let mut expected = Vec::new();
    for trip in trips(0) {
        expected.push(unified_row(1, scrape_time(0), &trip));
    }
    for trip in trips(1) {
        expected.push(unified_row(2, scrape_time(1), &trip));
    }
    assert_eq!(rows, expected);
}

#[test]
fn test_all_generations_and_containers() {
    let dir = store_dir();
    write_snapshot(dir.path(), 1, Generation::Legacy, scrape_time(0), &trips(0));
    write_snapshot(dir.path(), 2, Generation::Upstream, scrape_time(1), &trips(1));
    write_snapshot_gz(dir.path(), 3, Generation::Typed, scrape_time(2), &trips(2));

    let relation = SchemaUnifier::default().open(dir.path()).unwrap();
    assert_eq!(relation.partition_count(), 3);

    let rows = relation.materialize().unwrap();
    assert_eq!(rows.len(), 6);
    assert!(rows[4].has_seat);
    assert!(!rows[5].has_seat);
    assert_eq!(rows[5].source_sequence, 3);
    assert_eq!(rows[5].days_to_trip, 5);
}

#[test]
fn test_probe_file_reports_generation() {
    let dir = store_dir();
    let path = write_snapshot(dir.path(), 1, Generation::Legacy, scrape_time(0), &trips(0));

    let header = probe_file(&SnapshotFile { sequence: 1, path }).unwrap();
    assert_eq!(header.version, FormatVersion::Legacy);
    assert_eq!(header.delimiter, b';');
}

#[test]
fn test_unification_is_repeatable() {
    let dir = store_dir();
    write_snapshot(dir.path(), 1, Generation::Legacy, scrape_time(0), &trips(0));
    write_snapshot(dir.path(), 2, Generation::Typed, scrape_time(1), &trips(1));

    let unifier = SchemaUnifier::default();
    let first = unifier.open(dir.path()).unwrap().materialize().unwrap();
    let second = unifier.open(dir.path()).unwrap().materialize().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_engines_produce_identical_rows() {
    let dir = store_dir();
    for seq in 1..=6u64 {
        let generation = match seq % 3 {
            0 => Generation::Legacy,
            1 => Generation::Upstream,
            _ => Generation::Typed,
        };
        let offset = seq as i64;
        write_snapshot(dir.path(), seq, generation, scrape_time(offset), &trips(offset));
    }

    let sequential = SchemaUnifier::default()
        .with_engine(EngineKind::Sequential)
        .open(dir.path())
        .unwrap()
        .materialize()
        .unwrap();
    let parallel = SchemaUnifier::default()
        .with_engine(EngineKind::Parallel)
        .open(dir.path())
        .unwrap()
        .materialize()
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_malformed_file_names_the_file() {
    let dir = store_dir();
    write_snapshot(dir.path(), 1, Generation::Upstream, scrape_time(0), &trips(0));
    let bad = write_raw_snapshot(
        dir.path(),
        2,
        "date,train_no,origine_iata,destination_iata,origine,destination,heure_depart,heure_arrivee,od_happy_card,request_date\n\
         2024-05-09,6201,FRPLY,FRMSC,PARIS,MARSEILLE,7h37,10:55,OUI,2024-05-02T06:00:00\n",
    );

    let err = SchemaUnifier::default()
        .open(dir.path())
        .unwrap()
        .materialize()
        .unwrap_err();

    match &err {
        FareError::SchemaUnification { path, line, .. } => {
            assert_eq!(path, &bad);
            assert_eq!(*line, Some(2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("2.csv"));
}

#[test]
fn test_wrong_column_count_fails() {
    let dir = store_dir();
    write_raw_snapshot(
        dir.path(),
        1,
        "date,train_no,origine_iata,destination_iata,origine,destination,heure_depart,heure_arrivee,od_happy_card,request_date\n\
         2024-05-09,6201,FRPLY\n",
    );

    let err = SchemaUnifier::default()
        .open(dir.path())
        .unwrap()
        .count()
        .execute()
        .unwrap_err();
    assert!(err.to_string().contains("expected 10 columns, found 3"));
}

#[test]
fn test_mixed_request_dates_in_one_file_fail() {
    let dir = store_dir();
    write_raw_snapshot(
        dir.path(),
        1,
        "date,train_no,origine_iata,destination_iata,origine,destination,heure_depart,heure_arrivee,od_happy_card,request_date\n\
         2024-05-09,6201,FRPLY,FRMSC,PARIS,MARSEILLE,07:37,10:55,OUI,2024-05-02T06:00:00\n\
         2024-05-09,6203,FRPLY,FRMSC,PARIS,MARSEILLE,08:37,11:55,OUI,2024-05-03T06:00:00\n",
    );

    let err = SchemaUnifier::default()
        .open(dir.path())
        .unwrap()
        .materialize()
        .unwrap_err();
    assert!(matches!(err, FareError::SchemaUnification { line: Some(3), .. }));
}

#[test]
fn test_partial_mode_skips_and_reports_bad_files() {
    let dir = store_dir();
    write_snapshot(dir.path(), 1, Generation::Upstream, scrape_time(0), &trips(0));
    let bad = write_raw_snapshot(dir.path(), 2, "not,a,snapshot\n1,2,3\n");
    write_snapshot(dir.path(), 3, Generation::Typed, scrape_time(2), &trips(2));

    let strict = SchemaUnifier::default().open(dir.path()).unwrap();
    assert!(strict.count().execute().is_err());

    let partial = SchemaUnifier::default().allow_partial(true).open(dir.path()).unwrap();
    let scanned = partial.count().execute_scanned().unwrap();
    assert_eq!(scanned.value, 4);
    assert!(scanned.is_partial());
    assert_eq!(scanned.skipped.len(), 1);
    assert_eq!(scanned.skipped[0].path.as_deref(), Some(bad.as_path()));
}

#[test]
fn test_empty_store_is_an_empty_relation() {
    let dir = store_dir();
    let relation = SchemaUnifier::default().open(dir.path().join("missing")).unwrap();
    assert_eq!(relation.partition_count(), 0);
    assert!(relation.materialize().unwrap().is_empty());
}
