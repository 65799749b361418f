//! Log-domain normalization of unnormalized log-masses.
//!
//! Normalization subtracts `log_sum_exp` of the input, which itself factors
//! out the maximum, so inputs of any magnitude normalize without overflow.

use super::stable::log_sum_exp;

/// Normalize log-masses into log-probabilities that sum to 1 in probability space.
///
/// NaN anywhere yields all-NaN; all `-inf` input yields all `-inf` (there is
/// no mass to normalize, and the caller must treat that as degenerate).
pub fn normalize_log_probs(logp: &[f64]) -> Vec<f64> {
    if logp.is_empty() {
        return Vec::new();
    }
    let z = log_sum_exp(logp);
    if z.is_nan() {
        return vec![f64::NAN; logp.len()];
    }
    if z == f64::NEG_INFINITY {
        return vec![f64::NEG_INFINITY; logp.len()];
    }
    logp.iter().map(|v| v - z).collect()
}
