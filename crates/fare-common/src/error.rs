//! Error types shared by every stage of the snapshot audit.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using FareError.
pub type FareResult<T> = Result<T, FareError>;

/// Primary error type for snapshot ingestion and auditing.
#[derive(Debug, Error)]
pub enum FareError {
    // === Store Errors ===
    #[error("snapshot store corrupted at {path}: {reason}")]
    StoreCorruption { path: PathBuf, reason: String },

    // === Unification Errors ===
    #[error("cannot unify snapshot {path}{}: {reason}", line_suffix(.line))]
    SchemaUnification {
        path: PathBuf,
        line: Option<u64>,
        reason: String,
    },

    // === Catalog Errors ===
    #[error("station catalog unavailable ({}): {reason}", display_optional(.path))]
    CatalogUnavailable {
        path: Option<PathBuf>,
        reason: String,
    },

    // === Infrastructure Errors ===
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

fn display_optional(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "no path configured".to_string())
}

impl FareError {
    /// Create a StoreCorruption error.
    pub fn store_corruption(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StoreCorruption {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SchemaUnification error for a whole file.
    pub fn unification(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SchemaUnification {
            path: path.into(),
            line: None,
            reason: reason.into(),
        }
    }

    /// Create a SchemaUnification error pointing at one line of a file.
    pub fn unification_at(path: impl Into<PathBuf>, line: u64, reason: impl Into<String>) -> Self {
        Self::SchemaUnification {
            path: path.into(),
            line: Some(line),
            reason: reason.into(),
        }
    }

    /// Create a CatalogUnavailable error.
    pub fn catalog_unavailable(path: Option<&Path>, reason: impl Into<String>) -> Self {
        Self::CatalogUnavailable {
            path: path.map(Path::to_path_buf),
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// File that triggered the failure, when there is one.
    pub fn offending_path(&self) -> Option<&Path> {
        match self {
            FareError::StoreCorruption { path, .. }
            | FareError::SchemaUnification { path, .. }
            | FareError::Io { path, .. } => Some(path),
            FareError::CatalogUnavailable { path, .. } => path.as_deref(),
            FareError::Config(_) => None,
        }
    }

    /// Stable short code for the error class, used in CLI exit reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            FareError::StoreCorruption { .. } => "StoreCorruptionError",
            FareError::SchemaUnification { .. } => "SchemaUnificationError",
            FareError::CatalogUnavailable { .. } => "CatalogUnavailableError",
            FareError::Io { .. } => "IoError",
            FareError::Config(_) => "ConfigError",
        }
    }
}

impl From<serde_yaml::Error> for FareError {
    fn from(err: serde_yaml::Error) -> Self {
        FareError::Config(format!("YAML error: {}", err))
    }
}
