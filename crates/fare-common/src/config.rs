//! Configuration for the snapshot audit components.
//!
//! One `AuditConfig` is built at startup (defaults, then YAML, then
//! environment) and handed to each component's constructor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FareError, FareResult};

/// Snapshot extensions the store can write and the unifier can read back.
pub const SUPPORTED_SNAPSHOT_EXTENSIONS: &[&str] = &["csv", "csv.gz"];

/// Configuration shared by the store, unifier and auditors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Root data directory.
    pub data_dir: PathBuf,

    /// Sub-directory of `data_dir` holding the numbered snapshot files.
    pub snapshot_subdir: String,

    /// Extension the store writes new snapshots with.
    pub snapshot_extension: String,

    /// Station reference catalog (CSV: code,name,latitude,longitude).
    pub station_catalog: Option<PathBuf>,

    /// Placeholder station code meaning "unknown / to be determined".
    pub unknown_station_code: String,

    /// Execution engine for scans over the unified relation.
    pub engine: EngineKind,

    /// Skip and report snapshot files that fail unification instead of
    /// aborting the run.
    pub partial_audit: bool,

    /// Representative trip rows kept per orphan station code.
    pub orphan_sample_size: usize,

    /// Advisory name-match candidates listed per orphan station code.
    pub suggestion_limit: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_subdir: "maxjeune".to_string(),
            snapshot_extension: "csv".to_string(),
            station_catalog: None,
            unknown_station_code: "XXXXX".to_string(),
            engine: EngineKind::Sequential,
            partial_audit: false,
            orphan_sample_size: 3,
            suggestion_limit: 3,
        }
    }
}

impl AuditConfig {
    /// Directory the numbered snapshots live in.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_subdir)
    }

    /// Load configuration from a YAML file; missing keys take defaults.
    pub fn from_yaml(path: impl AsRef<Path>) -> FareResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| FareError::io(path, e))?;
        let config: Self = serde_yaml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of defaults.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `FARE_*` environment variables over the current values.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("FARE_DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("FARE_SNAPSHOT_SUBDIR") {
            self.snapshot_subdir = val;
        }

        if let Ok(val) = std::env::var("FARE_SNAPSHOT_EXTENSION") {
            self.snapshot_extension = val;
        }

        if let Ok(val) = std::env::var("FARE_STATION_CATALOG") {
            self.station_catalog = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("FARE_UNKNOWN_STATION_CODE") {
            self.unknown_station_code = val;
        }

        if let Ok(val) = std::env::var("FARE_ENGINE") {
            self.engine = EngineKind::from_str(&val);
        }

        if let Ok(val) = std::env::var("FARE_PARTIAL_AUDIT") {
            self.partial_audit = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("FARE_ORPHAN_SAMPLE_SIZE") {
            if let Ok(n) = val.parse() {
                self.orphan_sample_size = n;
            }
        }

        if let Ok(val) = std::env::var("FARE_SUGGESTION_LIMIT") {
            if let Ok(n) = val.parse() {
                self.suggestion_limit = n;
            }
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> FareResult<()> {
        if self.snapshot_subdir.is_empty() {
            return Err(FareError::Config("snapshot_subdir must not be empty".into()));
        }

        let ext = &self.snapshot_extension;
        if ext.is_empty() || ext.starts_with('.') {
            return Err(FareError::Config(format!(
                "snapshot_extension must be non-empty and given without a leading dot, got '{}'",
                ext
            )));
        }

        if !SUPPORTED_SNAPSHOT_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            return Err(FareError::Config(format!(
                "snapshot_extension '{}' is not supported, expected one of {:?}",
                ext, SUPPORTED_SNAPSHOT_EXTENSIONS
            )));
        }

        if self.unknown_station_code.is_empty() {
            return Err(FareError::Config(
                "unknown_station_code must not be empty".into(),
            ));
        }

        Ok(())
    }
}

/// How scans over the unified relation are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// One snapshot file at a time on the calling thread.
    #[default]
    Sequential,
    /// Snapshot files scanned concurrently on a rayon pool.
    Parallel,
}

impl EngineKind {
    /// Parse from string (case-insensitive); unknown values fall back to sequential.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "parallel" | "rayon" => Self::Parallel,
            _ => Self::Sequential,
        }
    }
}
