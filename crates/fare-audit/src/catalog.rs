//! External station reference catalog.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use fare_common::{FareError, FareResult, StationRecord};

/// Stations keyed uniquely by code, loaded once per audit run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationCatalog {
    stations: BTreeMap<String, StationRecord>,
}

impl StationCatalog {
    /// Build a catalog from records already in memory.
    ///
    /// Duplicate codes make the catalog unusable as a key.
    pub fn from_records(records: impl IntoIterator<Item = StationRecord>) -> FareResult<Self> {
        let mut stations = BTreeMap::new();
        for record in records {
            let code = record.code.clone();
            if stations.insert(code.clone(), record).is_some() {
                return Err(FareError::catalog_unavailable(
                    None,
                    format!("duplicate station code '{}'", code),
                ));
            }
        }
        Ok(Self { stations })
    }

    /// Load the catalog from a delimited file with a
    /// `code,name,latitude,longitude` header (`,` or `;` separated).
    ///
    /// No path, an unreadable file, an empty catalog and duplicate codes
    /// are all reported as `CatalogUnavailable`.
    pub fn load(path: Option<&Path>) -> FareResult<Self> {
        let Some(path) = path else {
            return Err(FareError::catalog_unavailable(
                None,
                "no station catalog configured",
            ));
        };

        let unavailable = |reason: String| FareError::catalog_unavailable(Some(path), reason);

        let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
        let mut reader = BufReader::new(file);
        let delimiter = {
            let head = reader.fill_buf().map_err(|e| unavailable(e.to_string()))?;
            let first_line = head.split(|b| *b == b'\n').next().unwrap_or_default();
            if first_line.contains(&b';') {
                b';'
            } else {
                b','
            }
        };

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in csv_reader.deserialize::<StationRecord>() {
            let record = result.map_err(|e| unavailable(format!("malformed catalog row: {}", e)))?;
            records.push(record);
        }

        if records.is_empty() {
            return Err(unavailable("catalog has no stations".to_string()));
        }

        let catalog = Self::from_records(records).map_err(|e| match e {
            FareError::CatalogUnavailable { reason, .. } => unavailable(reason),
            other => other,
        })?;

        info!(path = %path.display(), stations = catalog.len(), "Loaded station catalog");
        Ok(catalog)
    }

    pub fn get(&self, code: &str) -> Option<&StationRecord> {
        self.stations.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.stations.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations in code order.
    pub fn iter(&self) -> impl Iterator<Item = &StationRecord> {
        self.stations.values()
    }
}
