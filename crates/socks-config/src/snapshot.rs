//! Configuration snapshots for reproducible analyses.
//!
//! A snapshot captures the effective configuration at the start of a run
//! (after CLI overrides), so any reported posterior can be traced back to
//! the exact inputs that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analysis::{AnalysisConfig, LikelihoodKind, PriorKind};
use crate::resolve::ConfigPath;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path the config file was loaded from.
    #[serde(default)]
    pub path: Option<String>,

    /// Source of the configuration.
    pub source: String,

    /// SHA-256 of the raw file content, if a file was loaded.
    #[serde(default)]
    pub file_hash: Option<String>,

    /// SHA-256 of the effective configuration serialized as JSON.
    pub effective_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub k: u64,
    pub p_max: u64,
    pub s_max: u64,
    pub prior: PriorKind,
    /// True when no prior was configured and the flat prior was substituted.
    pub prior_fallback: bool,
    pub likelihood: LikelihoodKind,
}

impl ConfigSnapshot {
    /// Create a snapshot of the effective configuration.
    pub fn new(config: &AnalysisConfig, location: &ConfigPath, raw: Option<&str>) -> Self {
        let effective = serde_json::to_string(config).unwrap_or_default();
        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            path: location.path.as_ref().map(|p| p.display().to_string()),
            source: location.source.to_string(),
            file_hash: raw.map(hash_content),
            effective_hash: hash_content(&effective),
            summary: ConfigSummary {
                k: config.observation.k,
                p_max: config.grid.p_max,
                s_max: config.grid.s_max,
                prior: config.prior_label(),
                prior_fallback: config.prior.is_none(),
                likelihood: config.likelihood,
            },
        }
    }

    /// Check if this snapshot describes the same effective configuration.
    pub fn matches(&self, other: &ConfigSnapshot) -> bool {
        self.effective_hash == other.effective_hash
    }

    /// Short identifier for this snapshot (first 12 chars of the effective hash).
    pub fn short_id(&self) -> &str {
        &self.effective_hash[..12.min(self.effective_hash.len())]
    }
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
