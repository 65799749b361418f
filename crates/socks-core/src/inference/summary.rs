//! Serializable views of a posterior table.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::posterior::Diagnostic;
use super::prior::Propriety;

/// Mass assigned to one value of a marginalized quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MarginalEntry {
    pub value: u64,
    pub mass: f64,
}

/// The most probable grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModeSummary {
    pub p: u64,
    pub s: u64,
    pub n: u64,
    pub posterior: f64,
}

/// Headline numbers of a posterior run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorSummary {
    pub k: u64,
    pub p_max: u64,
    pub s_max: u64,
    pub points: usize,
    pub prior: String,
    pub prior_propriety: Propriety,
    pub likelihood: String,
    pub log_evidence: f64,
    pub total_mass: f64,
    pub mode: Option<ModeSummary>,
    pub expected_n: f64,
    pub expected_pairs: f64,
    pub expected_singletons: f64,
    pub median_n: Option<u64>,
    /// Equal-tailed 90% interval for the total sock count.
    pub credible_interval_90: Option<[u64; 2]>,
    pub boundary_mass: f64,
    /// Prior mass inside the grid; only reported for proper priors.
    pub prior_mass_captured: Option<f64>,
    pub diagnostics: Vec<Diagnostic>,
}
