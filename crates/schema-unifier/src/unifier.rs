//! Entry point that turns a snapshot directory into a unified relation.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use fare_common::{AuditConfig, EngineKind, FareResult};
use snapshot_store::{SnapshotFile, SnapshotStore};

use crate::reader::{probe_file, SnapshotHeader};
use crate::relation::LazyRelation;
use crate::source::SnapshotScan;

/// Opens snapshot directories as lazy, schema-uniform relations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaUnifier {
    engine: EngineKind,
    partial: bool,
}

impl SchemaUnifier {
    /// Create a unifier using the configured engine and partial-audit mode.
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            engine: config.engine,
            partial: config.partial_audit,
        }
    }

    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn allow_partial(mut self, partial: bool) -> Self {
        self.partial = partial;
        self
    }

    /// Discover every numbered snapshot in `directory` and expose them as
    /// one relation.
    ///
    /// Only the directory listing happens here. Files are opened, probed
    /// and normalized when a plan over the relation is executed.
    pub fn open(&self, directory: impl AsRef<Path>) -> FareResult<LazyRelation> {
        let directory = directory.as_ref();
        // The extension only matters for writing; any numbered file is listed.
        let files = SnapshotStore::new(directory, "").list()?;

        info!(
            dir = %directory.display(),
            snapshots = files.len(),
            engine = ?self.engine,
            partial = self.partial,
            "Opened unified relation"
        );

        Ok(LazyRelation::new(Arc::new(SnapshotScan::new(files)))
            .with_engine(self.engine)
            .allow_partial(self.partial))
    }

    /// Read one snapshot's header and report its format generation.
    pub fn probe(&self, file: &SnapshotFile) -> FareResult<SnapshotHeader> {
        probe_file(file)
    }
}
