//! Configuration validation errors and semantic validation.
//!
//! Shape errors surface from serde as `ParseError`; everything here checks
//! that a well-formed config also describes proper distributions and a grid
//! the engine can enumerate. Feasibility of `k` against the grid is left to
//! the posterior engine, which owns that error.

use thiserror::Error;

use crate::analysis::{AnalysisConfig, BetaShape, CountPrior, DiagnosticsConfig, PriorConfig};

/// Largest grid the engine will enumerate.
pub const MAX_GRID_POINTS: u64 = 25_000_000;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::SemanticError(_) => 63,
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

/// Validate an analysis configuration semantically.
pub fn validate_config(config: &AnalysisConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    match config.grid.point_count() {
        Some(points) if points <= MAX_GRID_POINTS => {}
        _ => {
            return Err(ValidationError::SemanticError(format!(
                "Grid of ({} + 1) x ({} + 1) points exceeds the limit of {} points",
                config.grid.p_max, config.grid.s_max, MAX_GRID_POINTS
            )));
        }
    }

    if let Some(prior) = &config.prior {
        validate_prior(prior)?;
    }

    validate_diagnostics(&config.diagnostics)?;

    Ok(())
}

/// Validate a prior's hyperparameters.
pub fn validate_prior(prior: &PriorConfig) -> ValidationResult<()> {
    match prior {
        PriorConfig::Flat { log_value } => {
            if !log_value.is_finite() {
                return Err(ValidationError::InvalidValue {
                    field: "prior.log_value".to_string(),
                    message: format!("Must be finite, got {}", log_value),
                });
            }
            Ok(())
        }
        PriorConfig::Baath {
            total,
            pair_fraction,
        } => {
            validate_count_prior("prior.total", total)?;
            validate_beta_shape("prior.pair_fraction", pair_fraction)
        }
        PriorConfig::Factored { pairs, singletons } => {
            validate_count_prior("prior.pairs", pairs)?;
            validate_count_prior("prior.singletons", singletons)
        }
    }
}

/// A negative binomial needs a positive mean and variance above the mean.
fn validate_count_prior(field: &str, params: &CountPrior) -> ValidationResult<()> {
    if !params.mean.is_finite() || params.mean <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: format!("{}.mean", field),
            message: format!("Must be positive, got {}", params.mean),
        });
    }
    if !params.sd.is_finite() || params.sd <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: format!("{}.sd", field),
            message: format!("Must be positive, got {}", params.sd),
        });
    }
    if params.sd * params.sd <= params.mean {
        return Err(ValidationError::InvalidValue {
            field: format!("{}.sd", field),
            message: format!(
                "Variance {} must exceed the mean {} for a negative binomial",
                params.sd * params.sd,
                params.mean
            ),
        });
    }
    Ok(())
}

/// Validate Beta distribution parameters.
fn validate_beta_shape(field: &str, params: &BetaShape) -> ValidationResult<()> {
    if !params.alpha.is_finite() || params.alpha <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: format!("{}.alpha", field),
            message: format!("Must be positive, got {}", params.alpha),
        });
    }
    if !params.beta.is_finite() || params.beta <= 0.0 {
        return Err(ValidationError::InvalidValue {
            field: format!("{}.beta", field),
            message: format!("Must be positive, got {}", params.beta),
        });
    }
    Ok(())
}

fn validate_diagnostics(diag: &DiagnosticsConfig) -> ValidationResult<()> {
    for (field, value) in [
        ("diagnostics.boundary_mass_warn", diag.boundary_mass_warn),
        ("diagnostics.prior_capture_warn", diag.prior_capture_warn),
    ] {
        if !(0.0..1.0).contains(&value) {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("Must be in [0, 1), got {}", value),
            });
        }
    }
    Ok(())
}
