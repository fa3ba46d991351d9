//! Station identity checks: name drift and catalog reconciliation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use fare_common::{AuditConfig, FareError, FareResult, UnifiedRow};
use schema_unifier::{LazyRelation, Plan};

use crate::catalog::StationCatalog;
use crate::completeness::SkippedFile;
use crate::similarity::{rank_candidates, MatchCandidate};

/// Code to every name observed under it, for codes whose name changed.
pub type NameDrift = BTreeMap<String, BTreeSet<String>>;

type NamesByCode = BTreeMap<String, BTreeSet<String>>;

/// Result of reconciling observed origin codes against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanReport {
    /// Observed origin codes absent from the catalog, sentinel excluded.
    pub orphans: BTreeSet<String>,
    /// Representative trips per orphan code, in scan order.
    pub samples: BTreeMap<String, Vec<UnifiedRow>>,
    /// Advisory catalog matches per orphan code. Never a resolved mapping.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub suggestions: BTreeMap<String, Vec<MatchCandidate>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_snapshots: Vec<SkippedFile>,
}

/// Detects identity drift and orphan station codes.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    unknown_code: String,
    sample_size: usize,
    suggestion_limit: usize,
}

impl IdentityResolver {
    pub fn new(config: &AuditConfig) -> Self {
        Self {
            unknown_code: config.unknown_station_code.clone(),
            sample_size: config.orphan_sample_size,
            suggestion_limit: config.suggestion_limit,
        }
    }

    /// Codes observed under more than one name in either role.
    ///
    /// Origin and destination names are grouped separately; a code is
    /// flagged when either role saw several names, and the output merges
    /// the names of both roles.
    pub fn name_drift(&self, relation: &LazyRelation) -> FareResult<NameDrift> {
        let (origins, destinations) = relation
            .aggregate(
                || (NamesByCode::new(), NamesByCode::new()),
                |(origins, destinations): &mut (NamesByCode, NamesByCode), row: UnifiedRow| {
                    origins
                        .entry(row.origin_code)
                        .or_default()
                        .insert(row.origin_name);
                    destinations
                        .entry(row.destination_code)
                        .or_default()
                        .insert(row.destination_name);
                },
                |(origins, destinations): &mut (NamesByCode, NamesByCode),
                 (o, d): (NamesByCode, NamesByCode)| {
                    merge_names(origins, o);
                    merge_names(destinations, d);
                },
            )
            .execute()?;

        let drift = flag_drift(origins, destinations);
        info!(flagged = drift.len(), "Name drift detection finished");
        Ok(drift)
    }

    /// Reconcile observed origin codes against `catalog`.
    ///
    /// An empty catalog is reported as unavailable, never as "no orphans".
    /// When `suggest` is set, each orphan gets advisory catalog matches
    /// ranked by name similarity.
    pub fn reconcile(
        &self,
        relation: &LazyRelation,
        catalog: &StationCatalog,
        suggest: bool,
    ) -> FareResult<OrphanReport> {
        if catalog.is_empty() {
            return Err(FareError::catalog_unavailable(None, "catalog has no stations"));
        }

        let unknown = self.unknown_code.clone();
        let observed = relation
            .clone()
            .filter(move |row| row.origin_code != unknown)
            .group_distinct(|row| row.origin_code.clone(), |row| row.origin_name.clone())
            .execute_scanned()?;

        let orphan_names: NamesByCode = observed
            .value
            .into_iter()
            .filter(|(code, _)| !catalog.contains(code))
            .collect();
        let orphans: BTreeSet<String> = orphan_names.keys().cloned().collect();

        debug!(orphans = orphans.len(), "Collecting orphan samples");

        let samples = if orphans.is_empty() || self.sample_size == 0 {
            BTreeMap::new()
        } else {
            let wanted = Arc::new(orphans.clone());
            relation
                .clone()
                .filter(move |row| wanted.contains(&row.origin_code))
                .sample_per_key(|row| row.origin_code.clone(), self.sample_size)
                .execute()?
        };

        let suggestions = if suggest {
            orphan_names
                .iter()
                .map(|(code, names)| {
                    let names: Vec<String> = names.iter().cloned().collect();
                    (code.clone(), rank_candidates(&names, catalog, self.suggestion_limit))
                })
                .collect()
        } else {
            BTreeMap::new()
        };

        info!(
            orphans = orphans.len(),
            catalog_stations = catalog.len(),
            skipped = observed.skipped.len(),
            "Catalog reconciliation finished"
        );

        Ok(OrphanReport {
            orphans,
            samples,
            suggestions,
            skipped_snapshots: observed.skipped.into_iter().map(SkippedFile::from).collect(),
        })
    }
}

fn merge_names(total: &mut NamesByCode, part: NamesByCode) {
    for (code, names) in part {
        total.entry(code).or_default().extend(names);
    }
}

fn flag_drift(mut origins: NamesByCode, mut destinations: NamesByCode) -> NameDrift {
    let flagged: BTreeSet<String> = origins
        .iter()
        .chain(destinations.iter())
        .filter(|(_, names)| names.len() > 1)
        .map(|(code, _)| code.clone())
        .collect();

    flagged
        .into_iter()
        .map(|code| {
            let mut names = origins.remove(&code).unwrap_or_default();
            names.extend(destinations.remove(&code).unwrap_or_default());
            (code, names)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[(&str, &[&str])]) -> NamesByCode {
        list.iter()
            .map(|(code, names)| {
                (
                    code.to_string(),
                    names.iter().map(|n| n.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_flag_drift_merges_roles() {
        let origins = names(&[("AAA", &["Alpha", "AlphaCity"]), ("BBB", &["Beta"])]);
        let destinations = names(&[("AAA", &["Alpha Central"]), ("CCC", &["Gamma", "Gamma Sud"])]);

        let drift = flag_drift(origins, destinations);
        assert_eq!(drift.len(), 2);
        assert_eq!(drift["AAA"].len(), 3);
        assert_eq!(drift["CCC"].len(), 2);
        assert!(!drift.contains_key("BBB"));
    }

    #[test]
    fn test_one_name_per_role_is_not_drift() {
        let origins = names(&[("AAA", &["Alpha"])]);
        let destinations = names(&[("AAA", &["Alpha Ville"])]);
        assert!(flag_drift(origins, destinations).is_empty());
    }
}
