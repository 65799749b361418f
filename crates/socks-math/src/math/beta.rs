//! Beta distribution CDF for discretized priors.
//!
//! The CDF uses the regularized incomplete beta function evaluated with a
//! continued fraction (Numerical Recipes `betacf`). Interval masses pick the
//! tail that keeps the subtraction well conditioned.

use serde::{Deserialize, Serialize};

use super::stable::log_beta;

const BETACF_MAX_ITERS: usize = 300;
const BETACF_EPS: f64 = 1.0e-14;
const BETACF_FPMIN: f64 = 1.0e-300;

/// Beta(alpha, beta) distribution on [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaDist {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaDist {
    /// Create a Beta distribution; both shape parameters must be positive and finite.
    pub fn new(alpha: f64, beta: f64) -> Option<Self> {
        if alpha.is_finite() && beta.is_finite() && alpha > 0.0 && beta > 0.0 {
            Some(Self { alpha, beta })
        } else {
            None
        }
    }

    /// Mean alpha / (alpha + beta).
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// P(X <= x), clamped to 0 below the support and 1 above it.
    pub fn cdf(&self, x: f64) -> f64 {
        beta_cdf(x, self.alpha, self.beta)
    }

    /// P(X > x), computed directly rather than as `1 - cdf(x)`.
    pub fn sf(&self, x: f64) -> f64 {
        beta_cdf(1.0 - x, self.beta, self.alpha)
    }

    /// P(lo < X <= hi) with both endpoints clamped to [0, 1].
    ///
    /// Returns 0 for empty or inverted intervals and NaN if an endpoint is NaN.
    pub fn interval_mass(&self, lo: f64, hi: f64) -> f64 {
        if lo.is_nan() || hi.is_nan() {
            return f64::NAN;
        }
        let lo = lo.clamp(0.0, 1.0);
        let hi = hi.clamp(0.0, 1.0);
        if hi <= lo {
            return 0.0;
        }
        let mass = if lo >= self.mean() {
            self.sf(lo) - self.sf(hi)
        } else {
            self.cdf(hi) - self.cdf(lo)
        };
        mass.max(0.0)
    }
}

/// Regularized incomplete beta function I_x(a, b).
pub fn beta_cdf(x: f64, alpha: f64, beta: f64) -> f64 {
    if x.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let log_front = alpha * x.ln() + beta * (-x).ln_1p() - log_beta(alpha, beta);
    let front = log_front.exp();
    let threshold = (alpha + 1.0) / (alpha + beta + 2.0);
    if x < threshold {
        front * betacf(alpha, beta, x) / alpha
    } else {
        1.0 - front * betacf(beta, alpha, 1.0 - x) / beta
    }
}

fn clamp_tiny(v: f64) -> f64 {
    if v.abs() < BETACF_FPMIN {
        BETACF_FPMIN
    } else {
        v
    }
}

fn betacf(alpha: f64, beta: f64, x: f64) -> f64 {
    let qab = alpha + beta;
    let qap = alpha + 1.0;
    let qam = alpha - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 / clamp_tiny(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=BETACF_MAX_ITERS {
        let m_f = m as f64;
        let m2 = 2.0 * m_f;

        // Even step.
        let aa = m_f * (beta - m_f) * x / ((qam + m2) * (alpha + m2));
        d = 1.0 / clamp_tiny(1.0 + aa * d);
        c = clamp_tiny(1.0 + aa / c);
        h *= d * c;

        // Odd step.
        let aa = -(alpha + m_f) * (qab + m_f) * x / ((alpha + m2) * (qap + m2));
        d = 1.0 / clamp_tiny(1.0 + aa * d);
        c = clamp_tiny(1.0 + aa / c);
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < BETACF_EPS {
            break;
        }
    }

    h
}
