//! Negative binomial distribution over non-negative counts.
//!
//! Uses the mean/size parameterization common in ecology and in R's
//! `dnbinom(mu = , size = )`:
//!
//! P(N = n) = Γ(n + r) / (Γ(r) · n!) · (r / (r + μ))^r · (μ / (r + μ))^n
//!
//! with variance μ + μ²/r. A prior expressed as "mean μ, standard deviation σ"
//! maps to `r = μ² / (σ² − μ)`, which requires an over-dispersed count
//! (σ² > μ).

use serde::{Deserialize, Serialize};

use super::stable::{log_factorial, log_gamma};

/// Negative binomial with dispersion `size` (r) and mean `mean` (μ).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NegBinomial {
    pub size: f64,
    pub mean: f64,
}

impl NegBinomial {
    /// Create from dispersion and mean; both must be positive and finite.
    pub fn new(size: f64, mean: f64) -> Option<Self> {
        if size.is_finite() && mean.is_finite() && size > 0.0 && mean > 0.0 {
            Some(Self { size, mean })
        } else {
            None
        }
    }

    /// Create from mean and standard deviation.
    ///
    /// Returns None unless `sd² > mean > 0` (a Poisson or under-dispersed
    /// count has no negative binomial representation).
    pub fn from_mean_sd(mean: f64, sd: f64) -> Option<Self> {
        if !mean.is_finite() || !sd.is_finite() || mean <= 0.0 || sd <= 0.0 {
            return None;
        }
        let excess = sd * sd - mean;
        if excess <= 0.0 {
            return None;
        }
        Self::new(mean * mean / excess, mean)
    }

    /// Variance μ + μ²/r.
    pub fn variance(&self) -> f64 {
        self.mean + self.mean * self.mean / self.size
    }

    /// Standard deviation.
    pub fn sd(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Log probability mass at `n`.
    pub fn log_pmf(&self, n: u64) -> f64 {
        let r = self.size;
        let mu = self.mean;
        let n_f = n as f64;
        let log_denom = (r + mu).ln();
        log_gamma(n_f + r) - log_gamma(r) - log_factorial(n)
            + r * (r.ln() - log_denom)
            + n_f * (mu.ln() - log_denom)
    }

    /// Probability mass at `n`.
    pub fn pmf(&self, n: u64) -> f64 {
        self.log_pmf(n).exp()
    }
}
