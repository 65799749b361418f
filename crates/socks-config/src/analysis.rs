//! Analysis configuration types.
//!
//! An `analysis.json` fixes everything a posterior sweep depends on: the
//! observation, the grid window, the prior and its hyperparameters, and the
//! likelihood model.
//!
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "observation": { "k": 11 },
//!   "grid": { "p_max": 50, "s_max": 50 },
//!   "prior": {
//!     "kind": "baath",
//!     "total": { "mean": 30.0, "sd": 15.0 },
//!     "pair_fraction": { "alpha": 15.0, "beta": 2.0 }
//!   },
//!   "likelihood": "fixed"
//! }
//! ```
//!
//! Omitting `prior` is allowed but selects the improper flat prior; the
//! engine reports that choice as a diagnostic.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::validate::ValidationError;

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisConfig {
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    pub observation: Observation,

    pub grid: GridConfig,

    /// Prior over (pairs, singletons). `None` falls back to the flat prior.
    #[serde(default)]
    pub prior: Option<PriorConfig>,

    #[serde(default)]
    pub likelihood: LikelihoodKind,

    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,

    /// Evaluate grid points on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

/// The observed data: `k` socks drawn, all distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    pub k: u64,
}

/// Inclusive upper bounds of the (pairs, singletons) grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GridConfig {
    pub p_max: u64,
    pub s_max: u64,
}

impl GridConfig {
    /// Number of grid points, or None on overflow.
    pub fn point_count(&self) -> Option<u64> {
        self.p_max
            .checked_add(1)?
            .checked_mul(self.s_max.checked_add(1)?)
    }
}

/// Mean/standard-deviation description of a negative binomial count prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CountPrior {
    pub mean: f64,
    pub sd: f64,
}

/// Beta shape parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BetaShape {
    pub alpha: f64,
    pub beta: f64,
}

/// Prior selection and hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorConfig {
    /// Constant log-prior. Improper over the unbounded domain.
    Flat {
        #[serde(default = "default_flat_log_value")]
        log_value: f64,
    },
    /// Negative binomial on the total count, Beta on the fraction of socks
    /// that belong to pairs.
    Baath {
        total: CountPrior,
        pair_fraction: BetaShape,
    },
    /// Independent negative binomials on pairs and singletons.
    Factored {
        pairs: CountPrior,
        singletons: CountPrior,
    },
}

/// Prior family selector used on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriorKind {
    Flat,
    Baath,
    Factored,
}

/// Likelihood model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LikelihoodKind {
    /// k was fixed before drawing.
    #[default]
    Fixed,
    /// Drawing stopped at the first matching sock, after k distinct ones.
    Stopped,
}

/// Thresholds for post-hoc warnings about the grid window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DiagnosticsConfig {
    /// Warn when posterior mass on the outer grid edges exceeds this.
    #[serde(default = "default_boundary_mass_warn")]
    pub boundary_mass_warn: f64,
    /// Warn when a proper prior keeps less than `1 - prior_capture_warn` inside the grid.
    #[serde(default = "default_prior_capture_warn")]
    pub prior_capture_warn: f64,
}

fn default_parallel() -> bool {
    true
}

fn default_flat_log_value() -> f64 {
    1.0
}

fn default_boundary_mass_warn() -> f64 {
    1e-3
}

fn default_prior_capture_warn() -> f64 {
    1e-3
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            boundary_mass_warn: default_boundary_mass_warn(),
            prior_capture_warn: default_prior_capture_warn(),
        }
    }
}

impl Default for AnalysisConfig {
    /// Broman's laundry: eleven distinct socks, a 50 × 50 window, Baath's prior.
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            description: None,
            observation: Observation { k: 11 },
            grid: GridConfig {
                p_max: 50,
                s_max: 50,
            },
            prior: Some(PriorConfig::default_for(PriorKind::Baath)),
            likelihood: LikelihoodKind::Fixed,
            diagnostics: DiagnosticsConfig::default(),
            parallel: true,
        }
    }
}

impl PriorConfig {
    /// Default hyperparameters for each prior family.
    pub fn default_for(kind: PriorKind) -> Self {
        match kind {
            PriorKind::Flat => PriorConfig::Flat {
                log_value: default_flat_log_value(),
            },
            PriorKind::Baath => PriorConfig::Baath {
                total: CountPrior {
                    mean: 30.0,
                    sd: 15.0,
                },
                pair_fraction: BetaShape {
                    alpha: 15.0,
                    beta: 2.0,
                },
            },
            PriorKind::Factored => PriorConfig::Factored {
                pairs: CountPrior {
                    mean: 12.0,
                    sd: 6.0,
                },
                singletons: CountPrior { mean: 4.0, sd: 3.0 },
            },
        }
    }

    pub fn kind(&self) -> PriorKind {
        match self {
            PriorConfig::Flat { .. } => PriorKind::Flat,
            PriorConfig::Baath { .. } => PriorKind::Baath,
            PriorConfig::Factored { .. } => PriorKind::Factored,
        }
    }
}

impl std::fmt::Display for PriorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorKind::Flat => write!(f, "flat"),
            PriorKind::Baath => write!(f, "baath"),
            PriorKind::Factored => write!(f, "factored"),
        }
    }
}

impl std::fmt::Display for LikelihoodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikelihoodKind::Fixed => write!(f, "fixed"),
            LikelihoodKind::Stopped => write!(f, "stopped"),
        }
    }
}

impl AnalysisConfig {
    /// Load analysis config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        content.parse()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Label of the effective prior, `flat` when none is configured.
    pub fn prior_label(&self) -> PriorKind {
        self.prior
            .as_ref()
            .map(PriorConfig::kind)
            .unwrap_or(PriorKind::Flat)
    }
}

impl FromStr for AnalysisConfig {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(|e| ValidationError::ParseError(e.to_string()))
    }
}
