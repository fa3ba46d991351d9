//! Streaming reader for a single snapshot file.
//!
//! Rows are pushed to a sink one at a time; a file is never held in
//! memory as a whole.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use tracing::debug;

use fare_common::{FareError, FareResult, UnifiedRow};
use snapshot_store::{Container, SnapshotFile};

use crate::format::{probe, ColumnLayout, FormatVersion};
use crate::normalize::{normalize, request_timestamp};

/// Header information of one snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub version: FormatVersion,
    pub delimiter: u8,
    pub layout: ColumnLayout,
}

/// Summary of one fully read snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub version: FormatVersion,
    pub rows: u64,
    pub request_timestamp: Option<NaiveDateTime>,
}

/// Read only the header of a snapshot and decide its format generation.
pub fn probe_file(file: &SnapshotFile) -> FareResult<SnapshotHeader> {
    let (header, _) = open_records(file)?;
    Ok(header)
}

/// Stream every unified row of `file` into `sink`.
///
/// Fails with a unification error naming the file (and line, when known)
/// on the first record that cannot be reconciled.
pub fn read_snapshot(
    file: &SnapshotFile,
    sink: &mut dyn FnMut(UnifiedRow),
) -> FareResult<FileSummary> {
    let path = file.path.as_path();
    let (header, mut records) = open_records(file)?;

    let mut rows = 0u64;
    let mut scrape_time: Option<NaiveDateTime> = None;
    let mut record = csv::StringRecord::new();

    loop {
        match records.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Err(csv_error(path, e)),
        }

        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() != header.layout.width {
            return Err(FareError::unification_at(
                path,
                line,
                format!(
                    "expected {} columns, found {}",
                    header.layout.width,
                    record.len()
                ),
            ));
        }

        let ts = request_timestamp(&header.layout, &record)
            .map_err(|reason| FareError::unification_at(path, line, reason))?;
        match scrape_time {
            None => scrape_time = Some(ts),
            Some(first) if first != ts => {
                return Err(FareError::unification_at(
                    path,
                    line,
                    format!("request_date {} differs from the file's first value {}", ts, first),
                ));
            }
            Some(_) => {}
        }

        let row = normalize(header.version, &header.layout, &record, file.sequence)
            .map_err(|reason| FareError::unification_at(path, line, reason))?;
        sink(row);
        rows += 1;
    }

    debug!(
        path = %path.display(),
        sequence = file.sequence,
        version = %header.version,
        rows = rows,
        "Scanned snapshot"
    );

    Ok(FileSummary {
        version: header.version,
        rows,
        request_timestamp: scrape_time,
    })
}

type Records = csv::Reader<Box<dyn Read + Send>>;

fn open_records(file: &SnapshotFile) -> FareResult<(SnapshotHeader, Records)> {
    let path = file.path.as_path();

    let raw: Box<dyn Read + Send> = match file.container() {
        Container::Csv => Box::new(File::open(path).map_err(|e| FareError::io(path, e))?),
        Container::CsvGz => Box::new(GzDecoder::new(
            File::open(path).map_err(|e| FareError::io(path, e))?,
        )),
        Container::Unsupported => {
            return Err(FareError::unification(
                path,
                "unsupported snapshot container (expected .csv or .csv.gz)",
            ));
        }
    };

    let mut buffered = BufReader::new(raw);
    let mut first_line = String::new();
    let read = buffered
        .read_line(&mut first_line)
        .map_err(|e| FareError::unification(path, format!("cannot read header: {}", e)))?;
    if read == 0 || first_line.trim().is_empty() {
        return Err(FareError::unification(path, "empty snapshot file (no header)"));
    }

    let delimiter = sniff_delimiter(&first_line);
    let chained: Box<dyn Read + Send> = Box::new(Cursor::new(first_line.into_bytes()).chain(buffered));

    let mut records = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(chained);

    let headers: Vec<String> = records
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(String::from)
        .collect();

    let (version, layout) = probe(&headers).map_err(|reason| FareError::unification(path, reason))?;

    Ok((
        SnapshotHeader {
            version,
            delimiter,
            layout,
        },
        records,
    ))
}

/// Raw upstream exports use `;`, store-written files use `,`.
fn sniff_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn csv_error(path: &Path, err: csv::Error) -> FareError {
    match err.position() {
        Some(pos) => FareError::unification_at(path, pos.line(), err.to_string()),
        None => FareError::unification(path, err.to_string()),
    }
}
