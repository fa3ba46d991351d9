//! Snapshot file naming: `<sequence>.<extension>`.
//!
//! The sequence is a positive integer with no zero padding. The extension
//! may have several parts (`7.csv.gz`); only the leading integer matters
//! for ordering.

use std::path::{Path, PathBuf};

use fare_common::{FareError, FareResult};

/// Container a snapshot file is stored in, from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Plain delimited text
    Csv,
    /// Gzip-compressed delimited text
    CsvGz,
    /// Numbered file with an extension the store cannot read
    Unsupported,
}

impl Container {
    /// Detect container type from the part of the file name after the sequence.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "csv" => Container::Csv,
            "csv.gz" => Container::CsvGz,
            _ => Container::Unsupported,
        }
    }

    /// Detect container type from a `<sequence>.<extension>` path.
    pub fn from_path(path: &Path) -> Self {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split_once('.'))
            .map(|(_, ext)| Container::from_extension(ext))
            .unwrap_or(Container::Unsupported)
    }
}

/// A numbered snapshot file discovered in (or allocated for) the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotFile {
    pub sequence: u64,
    pub path: PathBuf,
}

impl SnapshotFile {
    /// Container type implied by the file's extension.
    pub fn container(&self) -> Container {
        Container::from_path(&self.path)
    }
}

/// Parse the sequence number out of a snapshot file name.
///
/// Returns `Ok(None)` for names that are not numbered snapshots at all
/// (`README.md`, `.gitkeep`, `notes.csv`). Names that look numbered but
/// cannot be a valid sequence (overflow, zero) are store corruption.
pub fn parse_sequence(path: &Path) -> FareResult<Option<u64>> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };

    let Some((stem, ext)) = name.split_once('.') else {
        return Ok(None);
    };

    if stem.is_empty() || ext.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    let sequence: u64 = stem.parse().map_err(|e| {
        FareError::store_corruption(path, format!("sequence '{}' is not a valid integer: {}", stem, e))
    })?;

    if sequence == 0 {
        return Err(FareError::store_corruption(
            path,
            "sequence numbers start at 1",
        ));
    }

    Ok(Some(sequence))
}

/// File name for a given sequence and extension.
pub fn snapshot_file_name(sequence: u64, extension: &str) -> String {
    format!("{}.{}", sequence, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence(Path::new("data/12.csv")).unwrap(), Some(12));
        assert_eq!(parse_sequence(Path::new("3.csv.gz")).unwrap(), Some(3));
        assert_eq!(parse_sequence(Path::new("notes.csv")).unwrap(), None);
        assert_eq!(parse_sequence(Path::new("12")).unwrap(), None);
        assert_eq!(parse_sequence(Path::new("12a.csv")).unwrap(), None);
        assert_eq!(parse_sequence(Path::new(".gitkeep")).unwrap(), None);
    }

    #[test]
    fn test_parse_sequence_overflow_is_corruption() {
        let err = parse_sequence(Path::new("99999999999999999999999.csv")).unwrap_err();
        assert!(matches!(err, FareError::StoreCorruption { .. }));
        assert!(err.to_string().contains("99999999999999999999999"));
    }

    #[test]
    fn test_parse_sequence_zero_is_corruption() {
        assert!(matches!(
            parse_sequence(Path::new("0.csv")),
            Err(FareError::StoreCorruption { .. })
        ));
    }

    #[test]
    fn test_container_detection() {
        let file = |name: &str| SnapshotFile {
            sequence: 1,
            path: PathBuf::from(name),
        };
        assert_eq!(file("1.csv").container(), Container::Csv);
        assert_eq!(file("1.CSV.GZ").container(), Container::CsvGz);
        assert_eq!(file("1.parquet").container(), Container::Unsupported);
    }

    #[test]
    fn test_configurable_extensions_are_readable() {
        for ext in fare_common::SUPPORTED_SNAPSHOT_EXTENSIONS {
            assert_ne!(Container::from_extension(ext), Container::Unsupported, "{ext}");
        }
    }
}
