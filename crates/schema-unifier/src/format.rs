//! Snapshot format generations and header probing.
//!
//! The upstream dataset changed shape several times over the life of the
//! store. Each file's generation is decided once, from its header, and
//! every row of that file goes through the matching normalizer.

use std::collections::HashSet;

/// Column names, in the upstream dataset's vocabulary.
pub mod columns {
    pub const TRIP_DATE: &str = "date";
    pub const TRAIN_NUMBER: &str = "train_no";
    pub const ORIGIN_CODE: &str = "origine_iata";
    pub const DESTINATION_CODE: &str = "destination_iata";
    pub const ORIGIN_NAME: &str = "origine";
    pub const DESTINATION_NAME: &str = "destination";
    pub const DEPARTURE_TIME: &str = "heure_depart";
    pub const ARRIVAL_TIME: &str = "heure_arrivee";
    /// Textual availability flag (`OUI` / `NON`)
    pub const AVAILABILITY_TEXT: &str = "od_happy_card";
    /// Boolean availability flag
    pub const HAS_SEAT: &str = "has_seat";
    pub const REQUEST_DATE: &str = "request_date";

    /// Bookkeeping columns injected by an earlier collection pipeline.
    pub const AUXILIARY: &[&str] = &[
        "recordid",
        "record_timestamp",
        "datasetid",
        "record_key",
        "record_type",
    ];

    /// Columns every generation must carry.
    pub const REQUIRED: &[&str] = &[
        TRIP_DATE,
        TRAIN_NUMBER,
        ORIGIN_CODE,
        DESTINATION_CODE,
        ORIGIN_NAME,
        DESTINATION_NAME,
        DEPARTURE_TIME,
        ARRIVAL_TIME,
        REQUEST_DATE,
    ];
}

/// Known historical snapshot generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Upstream text columns plus auxiliary record bookkeeping columns
    Legacy,
    /// Upstream text columns: `HH:MM` times and an `OUI`/`NON` flag
    Upstream,
    /// Boolean `has_seat` column; times may carry seconds
    Typed,
}

impl FormatVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatVersion::Legacy => "legacy",
            FormatVersion::Upstream => "upstream",
            FormatVersion::Typed => "typed",
        }
    }

    /// Column carrying the availability flag in this generation.
    pub fn availability_column(&self) -> &'static str {
        match self {
            FormatVersion::Legacy | FormatVersion::Upstream => columns::AVAILABILITY_TEXT,
            FormatVersion::Typed => columns::HAS_SEAT,
        }
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Positions of the unified columns within one file's records.
///
/// Auxiliary and unrecognized columns have no slot here, so they never
/// reach a unified row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub trip_date: usize,
    pub train_number: usize,
    pub origin_code: usize,
    pub destination_code: usize,
    pub origin_name: usize,
    pub destination_name: usize,
    pub departure_time: usize,
    pub arrival_time: usize,
    pub availability: usize,
    pub request_date: usize,
    /// Header width, every record must match it
    pub width: usize,
}

/// Decide the format generation of a header and resolve its column layout.
pub fn probe(headers: &[String]) -> Result<(FormatVersion, ColumnLayout), String> {
    let normalized: Vec<&str> = headers
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}'))
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = normalized.iter().find(|h| !seen.insert(**h)) {
        return Err(format!("duplicate column '{}'", dup));
    }

    let has = |name: &str| normalized.contains(&name);

    let version = if columns::AUXILIARY.iter().any(|c| has(*c)) {
        FormatVersion::Legacy
    } else if has(columns::HAS_SEAT) {
        FormatVersion::Typed
    } else if has(columns::AVAILABILITY_TEXT) {
        FormatVersion::Upstream
    } else {
        return Err(format!(
            "no availability column (expected '{}' or '{}')",
            columns::AVAILABILITY_TEXT,
            columns::HAS_SEAT
        ));
    };

    let missing: Vec<&str> = columns::REQUIRED
        .iter()
        .chain(std::iter::once(&version.availability_column()))
        .filter(|c| !has(**c))
        .copied()
        .collect();

    if !missing.is_empty() {
        return Err(format!(
            "{} format is missing column(s): {}",
            version,
            missing.join(", ")
        ));
    }

    let idx = |name: &str| normalized.iter().position(|h| *h == name).unwrap_or_default();

    let layout = ColumnLayout {
        trip_date: idx(columns::TRIP_DATE),
        train_number: idx(columns::TRAIN_NUMBER),
        origin_code: idx(columns::ORIGIN_CODE),
        destination_code: idx(columns::DESTINATION_CODE),
        origin_name: idx(columns::ORIGIN_NAME),
        destination_name: idx(columns::DESTINATION_NAME),
        departure_time: idx(columns::DEPARTURE_TIME),
        arrival_time: idx(columns::ARRIVAL_TIME),
        availability: idx(version.availability_column()),
        request_date: idx(columns::REQUEST_DATE),
        width: normalized.len(),
    };

    Ok((version, layout))
}
