//! JSON Schema generation for configuration and output types.
//!
//! ```bash
//! socks config schema                  # AnalysisConfig
//! socks config schema PosteriorSummary
//! socks config schema --list
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::inference::{Diagnostic, MarginalEntry, PosteriorSummary, Propriety};
pub use crate::simulate::{SimulationComparison, SimulationEstimate};
pub use socks_config::AnalysisConfig;

/// Schema of the analysis configuration file.
pub const DEFAULT_SCHEMA: &str = "AnalysisConfig";

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        ("AnalysisConfig", "analysis.json configuration file"),
        ("PosteriorSummary", "Headline numbers of a posterior run"),
        ("Diagnostic", "Warning attached to a posterior table"),
        ("MarginalEntry", "Mass of one value of a marginal"),
        ("Propriety", "Whether a prior integrates to one"),
        ("SimulationEstimate", "Monte Carlo estimate for one drum"),
        (
            "SimulationComparison",
            "Simulated against exact probability for one drum",
        ),
    ]
}

/// Generate JSON Schema for a type by name.
///
/// Returns None if the type is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "AnalysisConfig" => schema_for!(AnalysisConfig),
        "PosteriorSummary" => schema_for!(PosteriorSummary),
        "Diagnostic" => schema_for!(Diagnostic),
        "MarginalEntry" => schema_for!(MarginalEntry),
        "Propriety" => schema_for!(Propriety),
        "SimulationEstimate" => schema_for!(SimulationEstimate),
        "SimulationComparison" => schema_for!(SimulationComparison),
        _ => return None,
    };
    serde_json::to_value(schema).ok()
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|schema| (name.to_string(), schema)))
        .collect()
}
