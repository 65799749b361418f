//! Socks analysis configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `analysis.json`
//! - Config resolution (CLI → env → config dir → XDG → system → defaults)
//! - Semantic validation with stable error codes
//! - Config snapshots recording provenance of each analysis run

pub mod analysis;
pub mod load;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use analysis::{
    AnalysisConfig, BetaShape, CountPrior, DiagnosticsConfig, GridConfig, LikelihoodKind,
    Observation, PriorConfig, PriorKind,
};
pub use load::{load_config, LoadedConfig};
pub use resolve::{resolve_config, ConfigPath, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
