//! The auditor's commands, wired from configuration to the core crates.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use tracing::{info, warn};

use fare_audit::{
    audit_completeness, CompletenessReport, IdentityResolver, NameDrift, OrphanReport,
    StationCatalog,
};
use fare_common::{AuditConfig, RawTable};
use schema_unifier::{format, LazyRelation, SchemaUnifier};
use snapshot_store::{SnapshotFile, SnapshotStore, REQUEST_DATE_COLUMN};

/// Store a locally downloaded upstream export as the next snapshot.
///
/// An export whose header the unifier would reject never reaches the
/// store, so one bad download cannot make every later audit fail.
pub fn ingest(config: &AuditConfig, from: &Path, requested_at: NaiveDateTime) -> Result<SnapshotFile> {
    let table = read_export(from)?;

    let mut headers = table.headers.clone();
    if table.column_index(REQUEST_DATE_COLUMN).is_none() {
        headers.push(REQUEST_DATE_COLUMN.to_string());
    }
    format::probe(&headers)
        .map_err(|reason| anyhow!("Export {} cannot be unified: {}", from.display(), reason))?;

    let store = SnapshotStore::from_config(config);
    let stored = store
        .ingest(table, requested_at)
        .with_context(|| format!("Failed to store export {}", from.display()))?;

    // Read the header back; a file the unifier cannot read is removed again.
    let header = match SchemaUnifier::new(config).probe(&stored) {
        Ok(header) => header,
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(&stored.path) {
                warn!(path = %stored.path.display(), error = %remove_err, "Failed to remove unreadable snapshot");
            }
            return Err(anyhow::Error::new(err).context("Stored snapshot is not readable"));
        }
    };
    info!(
        sequence = stored.sequence,
        version = %header.version,
        "Ingested export"
    );

    Ok(stored)
}

/// Completeness audit over the configured store.
pub fn missing_requests(config: &AuditConfig) -> Result<CompletenessReport> {
    let relation = open_relation(config)?;
    Ok(audit_completeness(&relation)?)
}

/// Name drift over the configured store.
pub fn name_drift(config: &AuditConfig) -> Result<NameDrift> {
    let relation = open_relation(config)?;
    Ok(IdentityResolver::new(config).name_drift(&relation)?)
}

/// Catalog reconciliation over the configured store.
pub fn orphans(config: &AuditConfig, suggest: bool) -> Result<OrphanReport> {
    let catalog = StationCatalog::load(config.station_catalog.as_deref())?;
    let relation = open_relation(config)?;
    Ok(IdentityResolver::new(config).reconcile(&relation, &catalog, suggest)?)
}

fn open_relation(config: &AuditConfig) -> Result<LazyRelation> {
    let dir = config.snapshot_dir();
    SchemaUnifier::new(config)
        .open(&dir)
        .with_context(|| format!("Failed to open snapshot store {}", dir.display()))
}

/// Read a raw export as delivered upstream, `;` or `,` separated.
pub fn read_export(path: &Path) -> Result<RawTable> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);

    let delimiter = {
        let head = reader.fill_buf()?;
        let first_line = head.split(|b| *b == b'\n').next().unwrap_or_default();
        let semicolons = first_line.iter().filter(|b| **b == b';').count();
        let commas = first_line.iter().filter(|b| **b == b',').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(String::from)
        .collect();

    let mut table = RawTable::new(headers);
    for record in csv_reader.records() {
        let record = record.with_context(|| format!("Malformed row in {}", path.display()))?;
        table.push(record.iter().map(String::from).collect());
    }

    Ok(table)
}
