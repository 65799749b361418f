//! Load, validate and snapshot the analysis configuration in one step.

use std::path::Path;

use crate::analysis::AnalysisConfig;
use crate::resolve::{resolve_config, ConfigPath};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_config, ValidationError};

/// A configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AnalysisConfig,
    pub location: ConfigPath,
    /// Raw file content, kept for provenance hashing.
    pub raw: Option<String>,
}

impl LoadedConfig {
    /// Snapshot the configuration as it stands now (after any overrides).
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(&self.config, &self.location, self.raw.as_deref())
    }

    /// Re-run semantic validation, e.g. after applying CLI overrides.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_config(&self.config)
    }
}

/// Resolve, read and validate the analysis configuration.
///
/// With no config file anywhere on the resolution path this returns the
/// built-in default analysis.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ValidationError> {
    let location = resolve_config(cli_path);
    let (config, raw) = match &location.path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let config: AnalysisConfig = raw.parse()?;
            (config, Some(raw))
        }
        None => (AnalysisConfig::default(), None),
    };
    validate_config(&config)?;
    Ok(LoadedConfig {
        config,
        location,
        raw,
    })
}
