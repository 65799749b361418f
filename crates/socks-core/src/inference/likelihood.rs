//! Exact likelihood that the first `k` socks drawn are all distinct.
//!
//! A drum holds `p` pairs and `s` singletons, `n = 2p + s` socks in total.
//! Drawing `k` without replacement, the chance that no two drawn socks match is
//!
//! ```text
//! L(p, s | k) = C(n, k)^-1 · Σ_j 2^(k-j) · C(s, j) · C(p, k-j)
//! ```
//!
//! where `j` counts the singletons among the draw. The term nearest the
//! bulk of the sum is rewritten as
//!
//! ```text
//! C(k, j) · Π_{i<k-j} (2p - 2i) / (n - i) · Π_{i<j} (s - i) / (n - k + j - i)
//! ```
//!
//! with each ratio near 1 taken as `ln_1p((num - den) / den)` on an exact
//! integer difference. Neighbouring terms follow from
//!
//! ```text
//! T(j + 1) / T(j) = (s - j) (k - j) / (2 (j + 1) (p - k + j + 1))
//! ```
//!
//! so a drum of billions of socks keeps the tiny deficit `1 - L` instead of
//! losing it to cancellation between huge binomial logs.

use std::f64::consts::LN_2;

use socks_config::LikelihoodKind;
use socks_math::{log_binomial, log_sum_exp};

/// `ln(num / den)` for positive integers.
fn log_ratio(num: u128, den: u128) -> f64 {
    if 2 * num < den {
        return (num as f64 / den as f64).ln();
    }
    let diff = num as i128 - den as i128;
    (diff as f64 / den as f64).ln_1p()
}

/// Log of the `j`-singleton term `2^(k-j) C(s, j) C(p, k-j) / C(n, k)`.
fn log_term(p: u128, s: u128, k: u128, j: u128) -> f64 {
    let n = 2 * p + s;
    let pairs_drawn = k - j;
    let from_pairs: f64 = (0..pairs_drawn)
        .map(|i| log_ratio(2 * (p - i), n - i))
        .sum();
    let from_singletons: f64 = (0..j)
        .map(|i| log_ratio(s - i, n - pairs_drawn - i))
        .sum();
    log_binomial(k as u64, j as u64) + from_pairs + from_singletons
}

/// `ln T(j + 1) - ln T(j)`.
fn log_step(p: u128, s: u128, k: u128, j: u128) -> f64 {
    ((s - j) as f64).ln() + ((k - j) as f64).ln()
        - LN_2
        - ((j + 1) as f64).ln()
        - ((p + j + 1 - k) as f64).ln()
}

/// Log-likelihood of observing `k` distinct socks from `p` pairs and `s` singletons.
///
/// Returns `0.0` for `k = 0` and `-inf` when `k > p + s` (there are not
/// enough distinct sock types). Never NaN and never positive.
pub fn log_likelihood(p: u64, s: u64, k: u64) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let (p, s, k) = (u128::from(p), u128::from(s), u128::from(k));
    if k > p + s {
        return f64::NEG_INFINITY;
    }

    // j outside [k - p, min(k, s)] contributes a zero binomial.
    let j_lo = k.saturating_sub(p);
    let j_hi = k.min(s);
    // The singleton count of a random draw averages k s / n.
    let anchor = (k * s / (2 * p + s)).clamp(j_lo, j_hi);

    let mut terms = vec![0.0; (j_hi - j_lo + 1) as usize];
    let at = |j: u128| (j - j_lo) as usize;
    terms[at(anchor)] = log_term(p, s, k, anchor);
    for j in anchor..j_hi {
        terms[at(j + 1)] = terms[at(j)] + log_step(p, s, k, j);
    }
    for j in (j_lo..anchor).rev() {
        terms[at(j)] = terms[at(j + 1)] - log_step(p, s, k, j);
    }
    // The terms sum to at most 1; rounding must not push it above.
    log_sum_exp(&terms).min(0.0)
}

/// Log-likelihood when sampling stopped at the first match after `k` distinct socks.
///
/// `ln k + ln(k + 1) - ln(n - k) + log_likelihood(p, s, k)` when `k + 1 <= n`,
/// otherwise `-inf` (there is no sock left to draw the match from).
pub fn log_likelihood_stopped(p: u64, s: u64, k: u64) -> f64 {
    let n = p.saturating_mul(2).saturating_add(s);
    if k.saturating_add(1) > n {
        return f64::NEG_INFINITY;
    }
    let base = log_likelihood(p, s, k);
    if base == f64::NEG_INFINITY {
        return base;
    }
    (k as f64).ln() + ((k + 1) as f64).ln() - ((n - k) as f64).ln() + base
}

/// A log-likelihood over grid points for a fixed observation.
pub trait LogLikelihood: Send + Sync {
    /// Natural-log likelihood of `k` distinct socks at `(p, s)`.
    fn log_likelihood(&self, p: u64, s: u64, k: u64) -> f64;

    /// Short name used in logs and output.
    fn name(&self) -> &str;
}

/// The number of socks drawn was fixed in advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixedSampleLikelihood;

impl LogLikelihood for FixedSampleLikelihood {
    fn log_likelihood(&self, p: u64, s: u64, k: u64) -> f64 {
        log_likelihood(p, s, k)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Drawing continued until the first matching sock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoppingTimeLikelihood;

impl LogLikelihood for StoppingTimeLikelihood {
    fn log_likelihood(&self, p: u64, s: u64, k: u64) -> f64 {
        log_likelihood_stopped(p, s, k)
    }

    fn name(&self) -> &str {
        "stopped"
    }
}

/// Built-in likelihoods selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LikelihoodModel {
    #[default]
    Fixed,
    Stopped,
}

impl From<LikelihoodKind> for LikelihoodModel {
    fn from(kind: LikelihoodKind) -> Self {
        match kind {
            LikelihoodKind::Fixed => LikelihoodModel::Fixed,
            LikelihoodKind::Stopped => LikelihoodModel::Stopped,
        }
    }
}

impl LogLikelihood for LikelihoodModel {
    fn log_likelihood(&self, p: u64, s: u64, k: u64) -> f64 {
        match self {
            LikelihoodModel::Fixed => FixedSampleLikelihood.log_likelihood(p, s, k),
            LikelihoodModel::Stopped => StoppingTimeLikelihood.log_likelihood(p, s, k),
        }
    }

    fn name(&self) -> &str {
        match self {
            LikelihoodModel::Fixed => FixedSampleLikelihood.name(),
            LikelihoodModel::Stopped => StoppingTimeLikelihood.name(),
        }
    }
}

/// Adapts a closure into a named likelihood.
pub struct LikelihoodFn<F> {
    name: String,
    f: F,
}

impl<F> LikelihoodFn<F>
where
    F: Fn(u64, u64, u64) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> LogLikelihood for LikelihoodFn<F>
where
    F: Fn(u64, u64, u64) -> f64 + Send + Sync,
{
    fn log_likelihood(&self, p: u64, s: u64, k: u64) -> f64 {
        (self.f)(p, s, k)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for LikelihoodFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikelihoodFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
