//! Per-generation row normalizers.
//!
//! Each known format version has exactly one normalizer. They all produce
//! the same `UnifiedRow`, with `has_seat` and `days_to_trip` derived here
//! and nowhere else.

use chrono::{NaiveDateTime, NaiveTime};
use csv::StringRecord;

use fare_common::time::{
    days_between, parse_clock_time, parse_request_timestamp, parse_time_of_day, parse_trip_date,
};
use fare_common::{TimeParseError, UnifiedRow};

use crate::format::{ColumnLayout, FormatVersion};

/// Availability text meaning "a seat is offered".
pub const SEAT_AVAILABLE: &str = "OUI";

/// Normalize one record of a file of the given generation.
pub fn normalize(
    version: FormatVersion,
    layout: &ColumnLayout,
    record: &StringRecord,
    source_sequence: u64,
) -> Result<UnifiedRow, String> {
    match version {
        FormatVersion::Legacy => normalize_legacy(layout, record, source_sequence),
        FormatVersion::Upstream => normalize_upstream(layout, record, source_sequence),
        FormatVersion::Typed => normalize_typed(layout, record, source_sequence),
    }
}

/// Legacy files: the auxiliary columns have no slot in the layout, so once
/// they are dropped the remaining columns read exactly like upstream ones.
fn normalize_legacy(
    layout: &ColumnLayout,
    record: &StringRecord,
    source_sequence: u64,
) -> Result<UnifiedRow, String> {
    normalize_upstream(layout, record, source_sequence)
}

fn normalize_upstream(
    layout: &ColumnLayout,
    record: &StringRecord,
    source_sequence: u64,
) -> Result<UnifiedRow, String> {
    let has_seat = field(record, layout.availability)? == SEAT_AVAILABLE;
    build_row(layout, record, source_sequence, has_seat, parse_clock_time)
}

fn normalize_typed(
    layout: &ColumnLayout,
    record: &StringRecord,
    source_sequence: u64,
) -> Result<UnifiedRow, String> {
    let raw = field(record, layout.availability)?;
    let has_seat = parse_bool(raw).ok_or_else(|| format!("invalid has_seat value '{}'", raw))?;
    build_row(layout, record, source_sequence, has_seat, parse_time_of_day)
}

fn build_row(
    layout: &ColumnLayout,
    record: &StringRecord,
    source_sequence: u64,
    has_seat: bool,
    parse_time: fn(&str) -> Result<NaiveTime, TimeParseError>,
) -> Result<UnifiedRow, String> {
    let trip_date = parse_trip_date(field(record, layout.trip_date)?).map_err(|e| e.to_string())?;
    let departure_time =
        parse_time(field(record, layout.departure_time)?).map_err(|e| e.to_string())?;
    let arrival_time =
        parse_time(field(record, layout.arrival_time)?).map_err(|e| e.to_string())?;
    let request_timestamp = request_timestamp(layout, record)?;

    Ok(UnifiedRow {
        trip_date,
        train_number: field(record, layout.train_number)?.to_string(),
        origin_code: field(record, layout.origin_code)?.to_string(),
        destination_code: field(record, layout.destination_code)?.to_string(),
        departure_time,
        arrival_time,
        origin_name: field(record, layout.origin_name)?.to_string(),
        destination_name: field(record, layout.destination_name)?.to_string(),
        has_seat,
        request_timestamp,
        source_sequence,
        days_to_trip: days_between(&request_timestamp, trip_date),
    })
}

/// Parse the `request_date` cell of a record.
pub fn request_timestamp(
    layout: &ColumnLayout,
    record: &StringRecord,
) -> Result<NaiveDateTime, String> {
    parse_request_timestamp(field(record, layout.request_date)?).map_err(|e| e.to_string())
}

fn field(record: &StringRecord, index: usize) -> Result<&str, String> {
    record
        .get(index)
        .ok_or_else(|| format!("record has no column {}", index))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::probe;
    use chrono::NaiveDate;

    fn layout_for(cols: &[&str]) -> (FormatVersion, ColumnLayout) {
        let header: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
        probe(&header).unwrap()
    }

    const UPSTREAM: &[&str] = &[
        "date",
        "train_no",
        "origine_iata",
        "destination_iata",
        "origine",
        "destination",
        "heure_depart",
        "heure_arrivee",
        "od_happy_card",
        "request_date",
    ];

    fn upstream_record(flag: &str, trip: &str) -> StringRecord {
        StringRecord::from(vec![
            trip,
            "6201",
            "FRPLY",
            "FRMSC",
            "PARIS (intramuros)",
            "MARSEILLE ST CHARLES",
            "07:37",
            "10:55",
            flag,
            "2024-05-01T06:12:33.000000",
        ])
    }

    #[test]
    fn test_derived_columns() {
        let (version, layout) = layout_for(UPSTREAM);
        let row = normalize(version, &layout, &upstream_record("OUI", "2024-05-11"), 7).unwrap();

        assert!(row.has_seat);
        assert_eq!(row.days_to_trip, 10);
        assert_eq!(row.source_sequence, 7);
        assert_eq!(row.trip_date, NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
        assert_eq!(row.departure_time, NaiveTime::from_hms_opt(7, 37, 0).unwrap());
    }

    #[test]
    fn test_any_other_availability_text_is_false() {
        let (version, layout) = layout_for(UPSTREAM);
        for flag in ["NON", "oui", "", "OUI "] {
            let row = normalize(version, &layout, &upstream_record(flag, "2024-05-11"), 1).unwrap();
            assert!(!row.has_seat, "flag {flag:?} must not mean a seat");
        }
    }

    #[test]
    fn test_upstream_rejects_seconds_in_times() {
        let (version, layout) = layout_for(UPSTREAM);
        let mut fields: Vec<String> = upstream_record("OUI", "2024-05-11")
            .iter()
            .map(String::from)
            .collect();
        fields[6] = "07:37:00".into();
        let err = normalize(version, &layout, &StringRecord::from(fields), 1).unwrap_err();
        assert!(err.contains("07:37:00"));
    }

    #[test]
    fn test_typed_accepts_boolean_and_seconds() {
        let cols: Vec<&str> = UPSTREAM
            .iter()
            .map(|c| if *c == "od_happy_card" { "has_seat" } else { *c })
            .collect();
        let (version, layout) = layout_for(&cols);
        let mut fields: Vec<String> = upstream_record("true", "2024-05-11")
            .iter()
            .map(String::from)
            .collect();
        fields[6] = "07:37:00".into();

        let row = normalize(version, &layout, &StringRecord::from(fields.clone()), 1).unwrap();
        assert!(row.has_seat);

        fields[8] = "maybe".into();
        assert!(normalize(version, &layout, &StringRecord::from(fields), 1).is_err());
    }

    #[test]
    fn test_bad_trip_date() {
        let (version, layout) = layout_for(UPSTREAM);
        let err = normalize(version, &layout, &upstream_record("OUI", "11/05/2024"), 1).unwrap_err();
        assert!(err.contains("11/05/2024"));
    }
}
