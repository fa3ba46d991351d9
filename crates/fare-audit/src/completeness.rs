//! Scrape cadence audit.
//!
//! The upstream job is expected to run once per calendar day. This module
//! finds the days it did, and counts the places where it did not.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::info;

use fare_common::{FareResult, UnifiedRow};
use schema_unifier::{LazyRelation, Plan, SkippedSnapshot};

/// Fixed-shape result of a completeness audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    /// Distinct calendar dates with at least one scrape.
    pub n_requested_days: usize,
    /// Gap occurrences between consecutive scrape dates.
    ///
    /// A jump of more than one day counts once however many days it spans,
    /// so this is a lower bound on the number of days without a scrape.
    pub n_missing_days: usize,
    pub requests_start: Option<NaiveDate>,
    pub requests_end: Option<NaiveDate>,
    /// Snapshots left out because the audit ran in partial mode.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_snapshots: Vec<SkippedFile>,
}

/// A snapshot left out of a partial audit, in serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: Option<PathBuf>,
    pub reason: String,
}

impl From<SkippedSnapshot> for SkippedFile {
    fn from(skipped: SkippedSnapshot) -> Self {
        Self {
            path: skipped.path,
            reason: skipped.reason,
        }
    }
}

/// One scrape event with its row and seat counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeEvent {
    pub source_sequence: u64,
    pub request_timestamp: NaiveDateTime,
    pub rows: u64,
    pub seats: u64,
}

/// Gap statistics over scrape dates, in any order and with repeats.
pub fn gap_statistics(dates: impl IntoIterator<Item = NaiveDate>) -> CompletenessReport {
    let mut days: Vec<NaiveDate> = dates.into_iter().collect();
    days.sort_unstable();
    days.dedup();

    let n_missing_days = days
        .windows(2)
        .filter(|pair| (pair[1] - pair[0]).num_days() > 1)
        .count();

    CompletenessReport {
        n_requested_days: days.len(),
        n_missing_days,
        requests_start: days.first().copied(),
        requests_end: days.last().copied(),
        skipped_snapshots: Vec::new(),
    }
}

/// Audit scrape cadence over the unified relation.
///
/// Each scrape event is identified by its `(source_sequence,
/// request_timestamp)` pair, so two files sharing a timestamp still count
/// as two events, and a day with two events is still one requested day.
pub fn audit_completeness(relation: &LazyRelation) -> FareResult<CompletenessReport> {
    let scanned = relation
        .distinct(UnifiedRow::scrape_key)
        .execute_scanned()?;

    let mut events: Vec<(u64, NaiveDateTime)> = scanned.value.into_iter().collect();
    events.sort_by_key(|(sequence, ts)| (*ts, *sequence));

    let mut report = gap_statistics(events.iter().map(|(_, ts)| ts.date()));
    report.skipped_snapshots = scanned.skipped.into_iter().map(SkippedFile::from).collect();

    info!(
        scrape_events = events.len(),
        requested_days = report.n_requested_days,
        missing_days = report.n_missing_days,
        skipped = report.skipped_snapshots.len(),
        "Completeness audit finished"
    );

    Ok(report)
}

/// Every scrape event, ordered by timestamp then sequence.
pub fn scrape_events(relation: &LazyRelation) -> FareResult<Vec<ScrapeEvent>> {
    let counts = relation
        .aggregate(
            BTreeMap::new,
            |acc: &mut BTreeMap<(NaiveDateTime, u64), (u64, u64)>, row| {
                let entry = acc
                    .entry((row.request_timestamp, row.source_sequence))
                    .or_insert((0, 0));
                entry.0 += 1;
                if row.has_seat {
                    entry.1 += 1;
                }
            },
            |total, part| {
                for (key, (rows, seats)) in part {
                    let entry = total.entry(key).or_insert((0, 0));
                    entry.0 += rows;
                    entry.1 += seats;
                }
            },
        )
        .execute()?;

    Ok(counts
        .into_iter()
        .map(|((request_timestamp, source_sequence), (rows, seats))| ScrapeEvent {
            source_sequence,
            request_timestamp,
            rows,
            seats,
        })
        .collect())
}
