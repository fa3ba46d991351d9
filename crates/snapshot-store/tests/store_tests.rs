//! Integration tests for sequence allocation and snapshot writing.

use std::fs;
use std::io::Read;

use chrono::NaiveDate;
use fare_common::{FareError, RawTable};
use snapshot_store::{SnapshotStore, REQUEST_DATE_COLUMN};
use tempfile::TempDir;

fn upstream_table() -> RawTable {
    let mut table = RawTable::new(
        ["date", "train_no", "origine_iata", "destination_iata", "od_happy_card"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    table.push(
        ["2024-05-10", "6201", "FRPLY", "FRMSC", "OUI"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    );
    table
}

// ============================================================================
// Allocation tests
// ============================================================================

#[test]
fn test_allocate_empty_directory_returns_one() {
    let tmp = TempDir::new().unwrap();
    let store = SnapshotStore::new(tmp.path(), "csv");

    let next = store.allocate_next_path().unwrap();
    assert_eq!(next.sequence, 1);
    assert_eq!(next.path, tmp.path().join("1.csv"));
}

#[test]
fn test_allocate_uses_max_plus_one_not_gap() {
    let tmp = TempDir::new().unwrap();
    for n in [1, 2, 5] {
        fs::write(tmp.path().join(format!("{n}.csv")), "date\n").unwrap();
    }
    let store = SnapshotStore::new(tmp.path(), "csv");

    let next = store.allocate_next_path().unwrap();
    assert_eq!(next.sequence, 6);
    assert_eq!(next.path, tmp.path().join("6.csv"));
}

#[test]
fn test_allocate_orders_numerically_not_lexically() {
    let tmp = TempDir::new().unwrap();
    for n in [9, 10, 2] {
        fs::write(tmp.path().join(format!("{n}.csv")), "date\n").unwrap();
    }
    let store = SnapshotStore::new(tmp.path(), "csv");

    assert_eq!(store.allocate_next_path().unwrap().sequence, 11);
}

#[test]
fn test_allocate_ignores_unrelated_files() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("3.csv"), "date\n").unwrap();
    fs::write(tmp.path().join("README.md"), "notes").unwrap();
    fs::write(tmp.path().join("backup.csv"), "date\n").unwrap();
    let store = SnapshotStore::new(tmp.path(), "csv");

    assert_eq!(store.allocate_next_path().unwrap().sequence, 4);
}

#[test]
fn test_allocate_fails_on_unparseable_sequence() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("1.csv"), "date\n").unwrap();
    fs::write(tmp.path().join("184467440737095516160.csv"), "date\n").unwrap();
    let store = SnapshotStore::new(tmp.path(), "csv");

    let err = store.allocate_next_path().unwrap_err();
    match err {
        FareError::StoreCorruption { path, .. } => {
            assert!(path.ends_with("184467440737095516160.csv"));
        }
        other => panic!("expected StoreCorruption, got {other:?}"),
    }
}

// ============================================================================
// Write / ingest tests
// ============================================================================

#[test]
fn test_write_snapshot_creates_parents_and_overwrites() {
    let tmp = TempDir::new().unwrap();
    let store = SnapshotStore::new(tmp.path().join("a/b"), "csv");
    let path = store.dir().join("1.csv");

    store.write_snapshot(&path, &upstream_table()).unwrap();
    let first = fs::read_to_string(&path).unwrap();
    assert!(first.starts_with("date,train_no,origine_iata"));

    store.write_snapshot(&path, &RawTable::new(vec!["date".into()])).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "date\n");
}

#[test]
fn test_ingest_stamps_request_date_and_appends() {
    let tmp = TempDir::new().unwrap();
    let store = SnapshotStore::new(tmp.path(), "csv");
    let at = NaiveDate::from_ymd_opt(2024, 4, 20)
        .unwrap()
        .and_hms_opt(6, 30, 0)
        .unwrap();

    let first = store.ingest(upstream_table(), at).unwrap();
    let second = store.ingest(upstream_table(), at).unwrap();
    assert_eq!((first.sequence, second.sequence), (1, 2));

    let content = fs::read_to_string(&second.path).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().ends_with(REQUEST_DATE_COLUMN));
    assert!(lines.next().unwrap().ends_with("2024-04-20T06:30:00.000000"));

    let listed: Vec<u64> = store.list().unwrap().iter().map(|f| f.sequence).collect();
    assert_eq!(listed, vec![1, 2]);
}

#[test]
fn test_gzip_extension_writes_compressed_file() {
    let tmp = TempDir::new().unwrap();
    let store = SnapshotStore::new(tmp.path(), "csv.gz");
    let at = NaiveDate::from_ymd_opt(2024, 4, 20)
        .unwrap()
        .and_hms_opt(6, 30, 0)
        .unwrap();

    let file = store.ingest(upstream_table(), at).unwrap();
    assert_eq!(file.path, tmp.path().join("1.csv.gz"));

    let mut decoded = String::new();
    flate2::read::GzDecoder::new(fs::File::open(&file.path).unwrap())
        .read_to_string(&mut decoded)
        .unwrap();
    assert!(decoded.starts_with("date,train_no"));
}

#[test]
fn test_unreadable_extension_is_refused_without_writing() {
    let tmp = TempDir::new().unwrap();
    let store = SnapshotStore::new(tmp.path(), "parquet");
    let at = NaiveDate::from_ymd_opt(2024, 4, 20)
        .unwrap()
        .and_hms_opt(6, 30, 0)
        .unwrap();

    let err = store
        .write_snapshot(&tmp.path().join("1.parquet"), &upstream_table())
        .unwrap_err();
    assert!(matches!(err, FareError::Config(_)));

    assert!(store.ingest(upstream_table(), at).is_err());
    assert!(!tmp.path().join("1.parquet").exists());
    assert!(store.list().unwrap().is_empty());
}
