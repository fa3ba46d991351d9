//! Record shapes shared across the store, unifier and auditors.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One offer-check record after schema unification.
///
/// Every field is validated once at the unifier boundary; downstream code
/// reads these fields directly and never re-checks column presence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnifiedRow {
    /// Calendar date of the trip
    pub trip_date: NaiveDate,
    pub train_number: String,
    pub origin_code: String,
    pub destination_code: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    /// Station names as published at scrape time
    pub origin_name: String,
    pub destination_name: String,
    pub has_seat: bool,
    /// When the scrape producing this row was taken
    pub request_timestamp: NaiveDateTime,
    /// Sequence number of the owning snapshot file
    pub source_sequence: u64,
    /// `trip_date - request_timestamp.date()`, in days
    pub days_to_trip: i64,
}

impl UnifiedRow {
    /// Identity of the scrape event that produced this row.
    pub fn scrape_key(&self) -> (u64, NaiveDateTime) {
        (self.source_sequence, self.request_timestamp)
    }
}

/// A station from the external reference catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub code: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A raw table as delivered by the downloader: a header plus string cells.
///
/// No typing happens here. The store persists it verbatim and the unifier
/// interprets it later according to the format version its header implies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: Vec<String>) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Set `name` to `value` on every record, appending the column if absent.
    pub fn with_constant_column(mut self, name: &str, value: &str) -> Self {
        match self.column_index(name) {
            Some(idx) => {
                for record in &mut self.records {
                    if let Some(cell) = record.get_mut(idx) {
                        *cell = value.to_string();
                    }
                }
            }
            None => {
                self.headers.push(name.to_string());
                for record in &mut self.records {
                    record.push(value.to_string());
                }
            }
        }
        self
    }
}
