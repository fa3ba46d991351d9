//! The append-only snapshot directory.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use fare_common::time::format_request_timestamp;
use fare_common::{AuditConfig, FareError, FareResult, RawTable};

use crate::naming::{parse_sequence, snapshot_file_name, Container, SnapshotFile};

/// Column the downloader attaches with the scrape time.
pub const REQUEST_DATE_COLUMN: &str = "request_date";

/// Sequence-numbered store of immutable snapshot files.
///
/// Precondition: a single writer. `allocate_next_path` followed by
/// `write_snapshot` takes no lock, so two concurrent callers can be handed
/// the same path.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    extension: String,
}

impl SnapshotStore {
    /// Create a store rooted at `dir`, writing new files with `extension`.
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Create a store from the audit configuration.
    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(config.snapshot_dir(), config.snapshot_extension.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List every numbered snapshot in the directory, ascending by sequence.
    ///
    /// A missing directory is an empty store. Files that are not numbered
    /// snapshots are skipped with a warning.
    pub fn list(&self) -> FareResult<Vec<SnapshotFile>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.dir.clone());
                FareError::io(path, io::Error::new(io::ErrorKind::Other, e.to_string()))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            match parse_sequence(entry.path())? {
                Some(sequence) => files.push(SnapshotFile {
                    sequence,
                    path: entry.path().to_path_buf(),
                }),
                None => {
                    warn!(path = %entry.path().display(), "Ignoring non-snapshot file in store");
                }
            }
        }

        files.sort();

        if let Some(pair) = files.windows(2).find(|w| w[0].sequence == w[1].sequence) {
            return Err(FareError::store_corruption(
                &pair[1].path,
                format!(
                    "sequence {} also used by {}",
                    pair[1].sequence,
                    pair[0].path.display()
                ),
            ));
        }

        debug!(dir = %self.dir.display(), count = files.len(), "Listed snapshots");
        Ok(files)
    }

    /// Path for the next snapshot: `max(existing) + 1`, or `1` when empty.
    ///
    /// Never fills gaps in the numbering. Creates the directory tree if absent.
    pub fn allocate_next_path(&self) -> FareResult<SnapshotFile> {
        fs::create_dir_all(&self.dir).map_err(|e| FareError::io(&self.dir, e))?;

        let next = match self.list()?.last() {
            Some(last) => last.sequence.checked_add(1).ok_or_else(|| {
                FareError::store_corruption(&last.path, "sequence space exhausted")
            })?,
            None => 1,
        };

        Ok(SnapshotFile {
            sequence: next,
            path: self.dir.join(snapshot_file_name(next, &self.extension)),
        })
    }

    /// Write `table` to `path` in the store's delimited format.
    ///
    /// Overwrites whatever is at `path`; the allocator is the only guard
    /// against collisions. Paths whose extension the unifier cannot read
    /// are refused before anything is created.
    pub fn write_snapshot(&self, path: &Path, table: &RawTable) -> FareResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| FareError::io(parent, e))?;
        }

        let container = Container::from_path(path);
        if container == Container::Unsupported {
            return Err(FareError::Config(format!(
                "cannot write snapshot {}: only .csv and .csv.gz can be read back",
                path.display()
            )));
        }

        let file = File::create(path).map_err(|e| FareError::io(path, e))?;

        let result = match container {
            Container::CsvGz => {
                let encoder = GzEncoder::new(file, Compression::default());
                write_delimited(encoder, table).and_then(|enc| enc.finish().map(|_| ()))
            }
            Container::Csv | Container::Unsupported => {
                write_delimited(file, table).map(|_| ())
            }
        };

        result.map_err(|e| FareError::io(path, e))?;

        debug!(path = %path.display(), rows = table.len(), "Wrote snapshot");
        Ok(())
    }

    /// Persist one scrape: stamp every row with `requested_at`, allocate the
    /// next sequence number and write the file.
    pub fn ingest(&self, table: RawTable, requested_at: NaiveDateTime) -> FareResult<SnapshotFile> {
        let stamped =
            table.with_constant_column(REQUEST_DATE_COLUMN, &format_request_timestamp(&requested_at));

        let target = self.allocate_next_path()?;
        self.write_snapshot(&target.path, &stamped)?;

        info!(
            sequence = target.sequence,
            path = %target.path.display(),
            rows = stamped.len(),
            "Snapshot stored"
        );

        Ok(target)
    }
}

fn write_delimited<W: Write>(writer: W, table: &RawTable) -> io::Result<W> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    csv_writer.write_record(&table.headers)?;
    for record in &table.records {
        csv_writer.write_record(record)?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))
}
