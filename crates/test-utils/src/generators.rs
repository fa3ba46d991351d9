//! Snapshot file and row generators for testing.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use flate2::write::GzEncoder;
use flate2::Compression;

use fare_common::UnifiedRow;

use crate::fixtures::{headers, stations, time};

/// Historical snapshot generation to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Legacy,
    Upstream,
    Typed,
}

impl Generation {
    fn header(&self) -> &'static [&'static str] {
        match self {
            Generation::Legacy => headers::LEGACY,
            Generation::Upstream => headers::UPSTREAM,
            Generation::Typed => headers::TYPED,
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            Generation::Legacy => b';',
            Generation::Upstream | Generation::Typed => b',',
        }
    }
}

/// One trip offer-check, independent of how a generation encodes it.
#[derive(Debug, Clone, PartialEq)]
pub struct TripSpec {
    pub trip_date: NaiveDate,
    pub train_number: String,
    pub origin: (String, String),
    pub destination: (String, String),
    pub departure: NaiveTime,
    pub arrival: NaiveTime,
    pub has_seat: bool,
}

impl TripSpec {
    /// A Paris to Marseille trip on `trip_date` with a seat available.
    pub fn new(trip_date: NaiveDate) -> Self {
        Self {
            trip_date,
            train_number: "6201".to_string(),
            origin: owned(stations::PARIS),
            destination: owned(stations::MARSEILLE),
            departure: NaiveTime::from_hms_opt(7, 37, 0).unwrap(),
            arrival: NaiveTime::from_hms_opt(10, 55, 0).unwrap(),
            has_seat: true,
        }
    }

    pub fn origin(mut self, code: &str, name: &str) -> Self {
        self.origin = (code.to_string(), name.to_string());
        self
    }

    pub fn destination(mut self, code: &str, name: &str) -> Self {
        self.destination = (code.to_string(), name.to_string());
        self
    }

    pub fn train(mut self, number: &str) -> Self {
        self.train_number = number.to_string();
        self
    }

    pub fn seat(mut self, has_seat: bool) -> Self {
        self.has_seat = has_seat;
        self
    }

    fn render(&self, generation: Generation, requested_at: NaiveDateTime, index: usize) -> Vec<String> {
        let (time_fmt, flag) = match generation {
            Generation::Typed => ("%H:%M:%S", self.has_seat.to_string()),
            Generation::Legacy | Generation::Upstream => {
                ("%H:%M", if self.has_seat { "OUI" } else { "NON" }.to_string())
            }
        };

        let mut fields = Vec::new();
        if generation == Generation::Legacy {
            fields.push("tgvmax".to_string());
            fields.push(format!("rec{:06}", index));
            fields.push(requested_at.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
        fields.extend([
            self.trip_date.format("%Y-%m-%d").to_string(),
            self.train_number.clone(),
            "SA".to_string(),
            "SUD EST".to_string(),
            self.origin.0.clone(),
            self.destination.0.clone(),
            self.origin.1.clone(),
            self.destination.1.clone(),
            self.departure.format(time_fmt).to_string(),
            self.arrival.format(time_fmt).to_string(),
            flag,
            requested_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        ]);
        fields
    }
}

fn owned((code, name): (&str, &str)) -> (String, String) {
    (code.to_string(), name.to_string())
}

/// The fixtures' first scrape day plus `offset` days.
pub fn scrape_day(offset: i64) -> NaiveDate {
    NaiveDate::parse_from_str(time::FIRST_SCRAPE_DAY, "%Y-%m-%d").unwrap() + Duration::days(offset)
}

/// Scrape timestamp on `scrape_day(offset)` at the usual hour.
pub fn scrape_time(offset: i64) -> NaiveDateTime {
    scrape_day(offset).and_hms_opt(time::SCRAPE_HOUR, 12, 33).unwrap()
}

/// Render a snapshot of `generation` as delimited text.
pub fn snapshot_text(generation: Generation, requested_at: NaiveDateTime, trips: &[TripSpec]) -> Vec<u8> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(generation.delimiter())
        .from_writer(Vec::new());
    writer.write_record(generation.header()).unwrap();
    for (index, trip) in trips.iter().enumerate() {
        writer.write_record(trip.render(generation, requested_at, index)).unwrap();
    }
    writer.into_inner().unwrap()
}

/// Write `<sequence>.csv` into `dir`.
pub fn write_snapshot(
    dir: &Path,
    sequence: u64,
    generation: Generation,
    requested_at: NaiveDateTime,
    trips: &[TripSpec],
) -> PathBuf {
    let path = dir.join(format!("{}.csv", sequence));
    std::fs::write(&path, snapshot_text(generation, requested_at, trips)).unwrap();
    path
}

/// Write `<sequence>.csv.gz` into `dir`.
pub fn write_snapshot_gz(
    dir: &Path,
    sequence: u64,
    generation: Generation,
    requested_at: NaiveDateTime,
    trips: &[TripSpec],
) -> PathBuf {
    let path = dir.join(format!("{}.csv.gz", sequence));
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    encoder
        .write_all(&snapshot_text(generation, requested_at, trips))
        .unwrap();
    encoder.finish().unwrap();
    path
}

/// Write raw text as `<sequence>.csv`, for malformed-file tests.
pub fn write_raw_snapshot(dir: &Path, sequence: u64, text: &str) -> PathBuf {
    let path = dir.join(format!("{}.csv", sequence));
    std::fs::write(&path, text).unwrap();
    path
}

/// The unified row the unifier is expected to produce for `trip`.
pub fn unified_row(sequence: u64, requested_at: NaiveDateTime, trip: &TripSpec) -> UnifiedRow {
    UnifiedRow {
        trip_date: trip.trip_date,
        train_number: trip.train_number.clone(),
        origin_code: trip.origin.0.clone(),
        destination_code: trip.destination.0.clone(),
        departure_time: trip.departure,
        arrival_time: trip.arrival,
        origin_name: trip.origin.1.clone(),
        destination_name: trip.destination.1.clone(),
        has_seat: trip.has_seat,
        request_timestamp: requested_at,
        source_sequence: sequence,
        days_to_trip: (trip.trip_date - requested_at.date()).num_days(),
    }
}

/// Write a station catalog CSV with the given rows.
pub fn write_catalog(path: &Path, rows: &[(&str, &str, f64, f64)]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer
        .write_record(["code", "name", "latitude", "longitude"])
        .unwrap();
    for (code, name, lat, lon) in rows {
        writer
            .write_record([code.to_string(), name.to_string(), lat.to_string(), lon.to_string()])
            .unwrap();
    }
    writer.flush().unwrap();
}
