//! Row sources a lazy relation can scan.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use fare_common::{FareResult, UnifiedRow};
use snapshot_store::SnapshotFile;

use crate::reader::read_snapshot;

/// A partitioned supply of unified rows.
///
/// A partition is the unit of failure and of parallelism: it either yields
/// all of its rows or fails as a whole.
pub trait RowSource: Send + Sync + fmt::Debug {
    /// Number of partitions.
    fn partition_count(&self) -> usize;

    /// File behind a partition, for error reporting.
    fn partition_path(&self, index: usize) -> Option<PathBuf>;

    /// Push every row of one partition into `sink`.
    fn scan_partition(&self, index: usize, sink: &mut dyn FnMut(UnifiedRow)) -> FareResult<()>;
}

/// One partition per snapshot file, in sequence order.
#[derive(Debug, Clone)]
pub struct SnapshotScan {
    files: Vec<SnapshotFile>,
}

impl SnapshotScan {
    pub fn new(mut files: Vec<SnapshotFile>) -> Self {
        files.sort();
        Self { files }
    }

    pub fn files(&self) -> &[SnapshotFile] {
        &self.files
    }
}

impl RowSource for SnapshotScan {
    fn partition_count(&self) -> usize {
        self.files.len()
    }

    fn partition_path(&self, index: usize) -> Option<PathBuf> {
        self.files.get(index).map(|f| f.path.clone())
    }

    fn scan_partition(&self, index: usize, sink: &mut dyn FnMut(UnifiedRow)) -> FareResult<()> {
        match self.files.get(index) {
            Some(file) => read_snapshot(file, sink).map(|_| ()),
            None => Ok(()),
        }
    }
}

/// Rows already in memory, one partition per source sequence.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    partitions: Vec<Vec<UnifiedRow>>,
}

impl MemorySource {
    /// Group `rows` by `source_sequence`, keeping their relative order.
    pub fn new(rows: Vec<UnifiedRow>) -> Self {
        let mut by_sequence: BTreeMap<u64, Vec<UnifiedRow>> = BTreeMap::new();
        for row in rows {
            by_sequence.entry(row.source_sequence).or_default().push(row);
        }

        Self {
            partitions: by_sequence.into_values().collect(),
        }
    }
}

impl RowSource for MemorySource {
    fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    fn partition_path(&self, _index: usize) -> Option<PathBuf> {
        None
    }

    fn scan_partition(&self, index: usize, sink: &mut dyn FnMut(UnifiedRow)) -> FareResult<()> {
        if let Some(rows) = self.partitions.get(index) {
            for row in rows {
                sink(row.clone());
            }
        }
        Ok(())
    }
}
