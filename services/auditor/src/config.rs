//! Configuration loading for the auditor service.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, `FARE_*`
//! environment variables (a `.env` file is loaded by `main`), then
//! command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use fare_common::{AuditConfig, EngineKind};

/// Values given on the command line, applied last.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<PathBuf>,
    pub station_catalog: Option<PathBuf>,
    pub engine: Option<String>,
    pub partial: bool,
}

/// Build the effective configuration.
pub fn load_config(config_file: Option<&Path>, overrides: &CliOverrides) -> Result<AuditConfig> {
    let base = match config_file {
        Some(path) => AuditConfig::from_yaml(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => AuditConfig::default(),
    };

    apply_overrides(base.with_env_overrides(), overrides)
}

/// Apply command-line values on top of `config` and validate the result.
pub fn apply_overrides(mut config: AuditConfig, overrides: &CliOverrides) -> Result<AuditConfig> {
    if let Some(dir) = &overrides.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(catalog) = &overrides.station_catalog {
        config.station_catalog = Some(catalog.clone());
    }
    if let Some(engine) = &overrides.engine {
        config.engine = EngineKind::from_str(engine);
    }
    if overrides.partial {
        config.partial_audit = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
