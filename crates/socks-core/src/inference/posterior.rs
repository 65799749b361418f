//! Grid posterior over (pairs, singletons).
//!
//! For every point of a bounded grid the engine evaluates a prior and a
//! likelihood, adds them in log space, and normalizes against the grid-wide
//! log-sum-exp:
//!
//! ```text
//! log π(p, s | k) = log π(p, s) + log L(p, s | k) - log Σ_grid exp(…)
//! ```
//!
//! Point evaluations are independent and may run on the rayon pool. The max
//! and sum reductions always run sequentially in grid order, so parallel and
//! sequential runs produce bit-identical tables.
//!
//! The grid truncates the domain. An improper prior only yields a proper
//! posterior because of that truncation, and any prior can leave mass on the
//! grid edges; both situations are reported as [`Diagnostic`]s.

use std::collections::BTreeMap;
use std::time::Instant;

use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use socks_config::AnalysisConfig;
use socks_math::{log_sum_exp, normalize_log_probs};
use thiserror::Error;
use tracing::{debug, warn};

use super::grid::{GridBounds, GridPoint};
use super::likelihood::LogLikelihood;
use super::prior::{FlatPrior, LogPrior, Propriety};
use super::summary::{MarginalEntry, ModeSummary, PosteriorSummary};

/// Tolerance used when walking a cumulative marginal for quantiles.
const QUANTILE_TOLERANCE: f64 = 1e-12;

/// Errors raised while building a grid posterior.
#[derive(Debug, Error)]
pub enum PosteriorError {
    #[error("no grid point can explain k = {k} distinct socks (p_max = {p_max}, s_max = {s_max})")]
    NoFeasiblePoint { k: u64, p_max: u64, s_max: u64 },

    #[error("prior returned {value} at (p = {p}, s = {s})")]
    InvalidPrior { p: u64, s: u64, value: f64 },

    #[error("likelihood returned {value} at (p = {p}, s = {s}, k = {k})")]
    InvalidLikelihood { p: u64, s: u64, k: u64, value: f64 },

    #[error("prior assigns zero mass to every grid point")]
    PriorExcludesGrid,

    /// Prior and likelihood each allow some point, but never the same one.
    #[error("posterior is zero everywhere on the grid for k = {k}")]
    Degenerate { k: u64 },

    #[error("invalid prior parameters for {field}: {message}")]
    InvalidPriorParams { field: String, message: String },
}

impl PosteriorError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            PosteriorError::NoFeasiblePoint { .. } => 70,
            PosteriorError::InvalidPrior { .. } => 71,
            PosteriorError::InvalidLikelihood { .. } => 72,
            PosteriorError::PriorExcludesGrid => 73,
            PosteriorError::Degenerate { .. } => 74,
            PosteriorError::InvalidPriorParams { .. } => 75,
        }
    }

    /// Coarse error class: the inputs were wrong, or the numbers collapsed.
    pub fn category(&self) -> &'static str {
        match self {
            PosteriorError::Degenerate { .. } => "numerical_degeneracy",
            _ => "configuration",
        }
    }
}

/// Engine switches and diagnostic thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosteriorOptions {
    /// Evaluate points on the rayon pool.
    pub parallel: bool,
    /// Warn when posterior mass on the outer edges exceeds this.
    pub boundary_mass_warn: f64,
    /// Warn when a proper prior keeps less than `1 - prior_capture_warn` on the grid.
    pub prior_capture_warn: f64,
}

impl Default for PosteriorOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            boundary_mass_warn: 1e-3,
            prior_capture_warn: 1e-3,
        }
    }
}

impl PosteriorOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            parallel: config.parallel,
            boundary_mass_warn: config.diagnostics.boundary_mass_warn,
            prior_capture_warn: config.diagnostics.prior_capture_warn,
        }
    }
}

/// Warnings attached to a posterior table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The prior is improper; the posterior depends on the grid bounds.
    ImproperPrior {
        prior: String,
        /// No prior was supplied and the flat prior was substituted.
        fallback: bool,
    },
    /// Too much posterior mass sits on `p = p_max` or `s = s_max`.
    BoundaryMass { mass: f64, threshold: f64 },
    /// A proper prior puts too little of its mass inside the grid.
    PriorMassOutsideGrid { captured: f64, threshold: f64 },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::ImproperPrior { prior, fallback } => {
                if *fallback {
                    write!(
                        f,
                        "no prior configured; using improper {} prior, posterior depends on grid bounds",
                        prior
                    )
                } else {
                    write!(
                        f,
                        "{} prior is improper; posterior depends on grid bounds",
                        prior
                    )
                }
            }
            Diagnostic::BoundaryMass { mass, threshold } => write!(
                f,
                "posterior mass {:.3e} on grid edges exceeds {:.1e}; widen the grid",
                mass, threshold
            ),
            Diagnostic::PriorMassOutsideGrid {
                captured,
                threshold,
            } => write!(
                f,
                "grid captures only {:.6} of the prior mass (tolerance {:.1e})",
                captured, threshold
            ),
        }
    }
}

/// One grid point of the posterior table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PosteriorRecord {
    pub p: u64,
    pub s: u64,
    pub n: u64,
    pub k: u64,
    pub log_prior: f64,
    pub log_likelihood: f64,
    pub prior: f64,
    pub log_posterior: f64,
    pub posterior: f64,
}

/// Normalized posterior over the grid, in p-major order.
#[derive(Debug, Clone, Serialize)]
pub struct PosteriorTable {
    bounds: GridBounds,
    k: u64,
    prior: String,
    prior_propriety: Propriety,
    likelihood: String,
    log_evidence: f64,
    diagnostics: Vec<Diagnostic>,
    records: Vec<PosteriorRecord>,
}

/// Compute the grid posterior with default options.
///
/// `prior = None` selects [`FlatPrior`] explicitly and records an
/// [`Diagnostic::ImproperPrior`] with `fallback = true`.
pub fn grid_posterior(
    bounds: GridBounds,
    k: u64,
    likelihood: &dyn LogLikelihood,
    prior: Option<&dyn LogPrior>,
) -> Result<PosteriorTable, PosteriorError> {
    grid_posterior_with(bounds, k, likelihood, prior, &PosteriorOptions::default())
}

/// Compute the grid posterior.
pub fn grid_posterior_with(
    bounds: GridBounds,
    k: u64,
    likelihood: &dyn LogLikelihood,
    prior: Option<&dyn LogPrior>,
    options: &PosteriorOptions,
) -> Result<PosteriorTable, PosteriorError> {
    let started = Instant::now();

    if k > bounds.max_distinct() {
        return Err(PosteriorError::NoFeasiblePoint {
            k,
            p_max: bounds.p_max,
            s_max: bounds.s_max,
        });
    }

    let fallback_prior = FlatPrior::default();
    let (prior, fallback): (&dyn LogPrior, bool) = match prior {
        Some(prior) => (prior, false),
        None => {
            warn!(
                prior = fallback_prior.name(),
                log_value = fallback_prior.log_value,
                "No prior supplied; falling back to the improper flat prior"
            );
            (&fallback_prior as &dyn LogPrior, true)
        }
    };

    let points: Vec<GridPoint> = bounds.points().collect();
    let evaluate = |pt: &GridPoint| {
        (
            prior.log_prior(pt.p, pt.s),
            likelihood.log_likelihood(pt.p, pt.s, k),
        )
    };
    let evaluated: Vec<(f64, f64)> = if options.parallel {
        points.par_iter().map(evaluate).collect()
    } else {
        points.iter().map(evaluate).collect()
    };

    for (pt, (lp, ll)) in points.iter().zip(&evaluated) {
        if lp.is_nan() || *lp == f64::INFINITY {
            return Err(PosteriorError::InvalidPrior {
                p: pt.p,
                s: pt.s,
                value: *lp,
            });
        }
        if ll.is_nan() || *ll == f64::INFINITY {
            return Err(PosteriorError::InvalidLikelihood {
                p: pt.p,
                s: pt.s,
                k,
                value: *ll,
            });
        }
    }

    // The likelihood rules out every point, e.g. a stopped draw with no sock
    // left to match on a grid of singletons.
    if evaluated.iter().all(|(_, ll)| *ll == f64::NEG_INFINITY) {
        return Err(PosteriorError::NoFeasiblePoint {
            k,
            p_max: bounds.p_max,
            s_max: bounds.s_max,
        });
    }

    let log_priors: Vec<f64> = evaluated.iter().map(|(lp, _)| *lp).collect();
    if log_priors.iter().all(|lp| *lp == f64::NEG_INFINITY) {
        return Err(PosteriorError::PriorExcludesGrid);
    }

    let log_unnormalized: Vec<f64> = evaluated.iter().map(|(lp, ll)| lp + ll).collect();
    let log_evidence = log_sum_exp(&log_unnormalized);
    if log_evidence == f64::NEG_INFINITY {
        return Err(PosteriorError::Degenerate { k });
    }
    let log_posterior = normalize_log_probs(&log_unnormalized);

    let records: Vec<PosteriorRecord> = points
        .iter()
        .zip(&evaluated)
        .zip(&log_posterior)
        .map(|((pt, (lp, ll)), lpost)| PosteriorRecord {
            p: pt.p,
            s: pt.s,
            n: pt.n(),
            k,
            log_prior: *lp,
            log_likelihood: *ll,
            prior: lp.exp(),
            log_posterior: *lpost,
            posterior: lpost.exp(),
        })
        .collect();

    let mut table = PosteriorTable {
        bounds,
        k,
        prior: prior.name().to_string(),
        prior_propriety: prior.propriety(),
        likelihood: likelihood.name().to_string(),
        log_evidence,
        diagnostics: Vec::new(),
        records,
    };
    table.diagnostics = table.collect_diagnostics(fallback, options);
    for diagnostic in &table.diagnostics {
        warn!(
            prior = %table.prior,
            k,
            p_max = bounds.p_max,
            s_max = bounds.s_max,
            "{}",
            diagnostic
        );
    }

    debug!(
        points = table.records.len(),
        k,
        prior = %table.prior,
        likelihood = %table.likelihood,
        log_evidence,
        parallel = options.parallel,
        duration_ms = started.elapsed().as_millis() as u64,
        "Grid posterior computed"
    );

    Ok(table)
}

impl PosteriorTable {
    fn collect_diagnostics(&self, fallback: bool, options: &PosteriorOptions) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        if self.prior_propriety == Propriety::Improper {
            diagnostics.push(Diagnostic::ImproperPrior {
                prior: self.prior.clone(),
                fallback,
            });
        }
        let edge = self.boundary_mass();
        if edge > options.boundary_mass_warn {
            diagnostics.push(Diagnostic::BoundaryMass {
                mass: edge,
                threshold: options.boundary_mass_warn,
            });
        }
        if let Some(captured) = self.prior_mass_captured() {
            if captured < 1.0 - options.prior_capture_warn {
                diagnostics.push(Diagnostic::PriorMassOutsideGrid {
                    captured,
                    threshold: options.prior_capture_warn,
                });
            }
        }
        diagnostics
    }

    /// All records in p-major grid order.
    pub fn records(&self) -> &[PosteriorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn k(&self) -> u64 {
        self.k
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn prior_name(&self) -> &str {
        &self.prior
    }

    pub fn prior_propriety(&self) -> Propriety {
        self.prior_propriety
    }

    pub fn likelihood_name(&self) -> &str {
        &self.likelihood
    }

    /// Log of the grid marginal likelihood, `ln Σ exp(log_prior + log_likelihood)`.
    pub fn log_evidence(&self) -> f64 {
        self.log_evidence
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Sum of posterior masses; 1 up to rounding.
    pub fn total_mass(&self) -> f64 {
        self.records.iter().map(|r| r.posterior).sum()
    }

    /// Record at `(p, s)`, if it lies on the grid.
    pub fn get(&self, p: u64, s: u64) -> Option<&PosteriorRecord> {
        self.bounds
            .index_of(p, s)
            .and_then(|idx| self.records.get(idx))
    }

    /// Posterior mode. Ties go to the earliest point in grid order.
    pub fn mode(&self) -> Option<&PosteriorRecord> {
        let mut best: Option<&PosteriorRecord> = None;
        for record in &self.records {
            match best {
                Some(current) if record.posterior <= current.posterior => {}
                _ => best = Some(record),
            }
        }
        best
    }

    /// The `count` most probable points, highest first.
    pub fn top(&self, count: usize) -> Vec<&PosteriorRecord> {
        let mut ranked: Vec<&PosteriorRecord> = self.records.iter().collect();
        // Stable sort keeps grid order among ties.
        ranked.sort_by(|a, b| b.posterior.total_cmp(&a.posterior));
        ranked.truncate(count);
        ranked
    }

    /// Posterior over the total sock count `n = 2p + s`, ascending in `n`.
    pub fn marginal_n(&self) -> Vec<MarginalEntry> {
        marginal(self.records.iter().map(|r| (r.n, r.posterior)))
    }

    /// Posterior over the number of pairs.
    pub fn marginal_pairs(&self) -> Vec<MarginalEntry> {
        marginal(self.records.iter().map(|r| (r.p, r.posterior)))
    }

    /// Posterior over the number of singletons.
    pub fn marginal_singletons(&self) -> Vec<MarginalEntry> {
        marginal(self.records.iter().map(|r| (r.s, r.posterior)))
    }

    /// Posterior mean of `n`.
    pub fn expected_n(&self) -> f64 {
        self.records.iter().map(|r| r.n as f64 * r.posterior).sum()
    }

    pub fn expected_pairs(&self) -> f64 {
        self.records.iter().map(|r| r.p as f64 * r.posterior).sum()
    }

    pub fn expected_singletons(&self) -> f64 {
        self.records.iter().map(|r| r.s as f64 * r.posterior).sum()
    }

    /// Smallest `n` whose cumulative posterior reaches `q`.
    ///
    /// Returns None for `q` outside `[0, 1]`.
    pub fn n_quantile(&self, q: f64) -> Option<u64> {
        if !(0.0..=1.0).contains(&q) {
            return None;
        }
        let supported: Vec<MarginalEntry> = self
            .marginal_n()
            .into_iter()
            .filter(|entry| entry.mass > 0.0)
            .collect();
        let mut cumulative = 0.0;
        for entry in &supported {
            cumulative += entry.mass;
            if cumulative >= q - QUANTILE_TOLERANCE {
                return Some(entry.value);
            }
        }
        supported.last().map(|entry| entry.value)
    }

    /// Equal-tailed credible interval for `n` at `level` (e.g. 0.9).
    pub fn credible_interval_n(&self, level: f64) -> Option<(u64, u64)> {
        if !(level > 0.0 && level < 1.0) {
            return None;
        }
        let tail = (1.0 - level) / 2.0;
        Some((self.n_quantile(tail)?, self.n_quantile(1.0 - tail)?))
    }

    /// Posterior mass on `p = p_max` or `s = s_max`.
    pub fn boundary_mass(&self) -> f64 {
        self.records
            .iter()
            .filter(|r| self.bounds.is_boundary(r.p, r.s))
            .map(|r| r.posterior)
            .sum()
    }

    /// Prior mass inside the grid, for proper priors only.
    pub fn prior_mass_captured(&self) -> Option<f64> {
        if self.prior_propriety != Propriety::Proper {
            return None;
        }
        let log_priors: Vec<f64> = self.records.iter().map(|r| r.log_prior).collect();
        Some(log_sum_exp(&log_priors).exp())
    }

    /// Condensed, serializable view of the table.
    pub fn summary(&self) -> PosteriorSummary {
        PosteriorSummary {
            k: self.k,
            p_max: self.bounds.p_max,
            s_max: self.bounds.s_max,
            points: self.records.len(),
            prior: self.prior.clone(),
            prior_propriety: self.prior_propriety,
            likelihood: self.likelihood.clone(),
            log_evidence: self.log_evidence,
            total_mass: self.total_mass(),
            mode: self.mode().map(|r| ModeSummary {
                p: r.p,
                s: r.s,
                n: r.n,
                posterior: r.posterior,
            }),
            expected_n: self.expected_n(),
            expected_pairs: self.expected_pairs(),
            expected_singletons: self.expected_singletons(),
            median_n: self.n_quantile(0.5),
            credible_interval_90: self.credible_interval_n(0.9).map(|(lo, hi)| [lo, hi]),
            boundary_mass: self.boundary_mass(),
            prior_mass_captured: self.prior_mass_captured(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

fn marginal(pairs: impl Iterator<Item = (u64, f64)>) -> Vec<MarginalEntry> {
    let mut acc: BTreeMap<u64, f64> = BTreeMap::new();
    for (value, mass) in pairs {
        *acc.entry(value).or_insert(0.0) += mass;
    }
    acc.into_iter()
        .map(|(value, mass)| MarginalEntry { value, mass })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::likelihood::{
        FixedSampleLikelihood, LikelihoodFn, StoppingTimeLikelihood,
    };
    use crate::inference::prior::{BaathPrior, FactoredPrior, PriorFn};
    use socks_math::NegBinomial;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn sequential() -> PosteriorOptions {
        PosteriorOptions {
            parallel: false,
            ..PosteriorOptions::default()
        }
    }

    #[test]
    fn posterior_sums_to_one() {
        let prior = BaathPrior::default();
        let table = grid_posterior(
            GridBounds::new(50, 50),
            11,
            &FixedSampleLikelihood,
            Some(&prior),
        )
        .unwrap();
        assert_eq!(table.len(), 51 * 51);
        assert!(approx_eq(table.total_mass(), 1.0, 1e-9));
        assert!(table.log_evidence().is_finite());
    }

    #[test]
    fn records_are_consistent() {
        let prior = BaathPrior::default();
        let table = grid_posterior(
            GridBounds::new(20, 15),
            11,
            &FixedSampleLikelihood,
            Some(&prior),
        )
        .unwrap();
        for r in table.records() {
            assert_eq!(r.n, 2 * r.p + r.s);
            assert_eq!(r.k, 11);
            assert!(approx_eq(r.posterior, r.log_posterior.exp(), 1e-15));
            let unnorm = r.log_prior + r.log_likelihood;
            if unnorm.is_finite() {
                assert!(approx_eq(
                    r.log_posterior,
                    unnorm - table.log_evidence(),
                    1e-9
                ));
            } else {
                assert_eq!(r.posterior, 0.0);
            }
        }
    }

    #[test]
    fn infeasible_points_get_zero_mass() {
        let table =
            grid_posterior(GridBounds::new(10, 10), 11, &FixedSampleLikelihood, None).unwrap();
        for r in table.records() {
            if r.p + r.s < 11 {
                assert_eq!(r.posterior, 0.0);
                assert_eq!(r.log_likelihood, f64::NEG_INFINITY);
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let prior = FactoredPrior::default();
        let a = grid_posterior(GridBounds::new(30, 20), 11, &FixedSampleLikelihood, Some(&prior))
            .unwrap();
        let b = grid_posterior(GridBounds::new(30, 20), 11, &FixedSampleLikelihood, Some(&prior))
            .unwrap();
        assert_eq!(a.records(), b.records());
        assert_eq!(a.log_evidence().to_bits(), b.log_evidence().to_bits());
    }

    #[test]
    fn parallel_matches_sequential_bitwise() {
        let prior = BaathPrior::default();
        let bounds = GridBounds::new(60, 40);
        let par = grid_posterior_with(
            bounds,
            11,
            &FixedSampleLikelihood,
            Some(&prior),
            &PosteriorOptions::default(),
        )
        .unwrap();
        let seq = grid_posterior_with(
            bounds,
            11,
            &FixedSampleLikelihood,
            Some(&prior),
            &sequential(),
        )
        .unwrap();
        assert_eq!(par.len(), seq.len());
        for (a, b) in par.records().iter().zip(seq.records()) {
            assert_eq!(a.log_posterior.to_bits(), b.log_posterior.to_bits());
            assert_eq!(a.posterior.to_bits(), b.posterior.to_bits());
        }
        assert_eq!(par.log_evidence().to_bits(), seq.log_evidence().to_bits());
    }

    #[test]
    fn missing_prior_falls_back_to_flat() {
        let table =
            grid_posterior(GridBounds::new(10, 10), 3, &FixedSampleLikelihood, None).unwrap();
        assert_eq!(table.prior_name(), "flat");
        assert_eq!(table.prior_propriety(), Propriety::Improper);
        assert!(table.diagnostics().contains(&Diagnostic::ImproperPrior {
            prior: "flat".to_string(),
            fallback: true,
        }));
        assert!(table.prior_mass_captured().is_none());
        assert!(table.records().iter().all(|r| r.log_prior == 1.0));
    }

    #[test]
    fn explicit_flat_prior_is_not_a_fallback() {
        let flat = FlatPrior::default();
        let table =
            grid_posterior(GridBounds::new(10, 10), 3, &FixedSampleLikelihood, Some(&flat))
                .unwrap();
        assert!(table.diagnostics().contains(&Diagnostic::ImproperPrior {
            prior: "flat".to_string(),
            fallback: false,
        }));
    }

    #[test]
    fn flat_prior_posterior_is_normalized_likelihood() {
        let table =
            grid_posterior(GridBounds::new(8, 8), 4, &FixedSampleLikelihood, None).unwrap();
        let liks: Vec<f64> = table.records().iter().map(|r| r.log_likelihood).collect();
        let z = log_sum_exp(&liks);
        for r in table.records() {
            assert!(approx_eq(r.posterior, (r.log_likelihood - z).exp(), 1e-12));
        }
    }

    #[test]
    fn infeasible_k_is_an_error() {
        let err = grid_posterior(GridBounds::new(3, 4), 8, &FixedSampleLikelihood, None)
            .unwrap_err();
        assert!(matches!(
            err,
            PosteriorError::NoFeasiblePoint {
                k: 8,
                p_max: 3,
                s_max: 4
            }
        ));
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn exactly_feasible_k_uses_corner() {
        let table =
            grid_posterior(GridBounds::new(3, 4), 7, &FixedSampleLikelihood, None).unwrap();
        let mode = table.mode().unwrap();
        assert_eq!((mode.p, mode.s), (3, 4));
        assert!(approx_eq(mode.posterior, 1.0, 1e-12));
    }

    #[test]
    fn nan_prior_is_rejected() {
        let prior = PriorFn::new("broken", |p, _| if p == 2 { f64::NAN } else { 0.0 });
        let err = grid_posterior(GridBounds::new(5, 5), 2, &FixedSampleLikelihood, Some(&prior))
            .unwrap_err();
        assert!(matches!(err, PosteriorError::InvalidPrior { p: 2, s: 0, .. }));
    }

    #[test]
    fn infinite_likelihood_is_rejected() {
        let lik = LikelihoodFn::new("spike", |_, s, _| if s == 3 { f64::INFINITY } else { 0.0 });
        let err = grid_posterior(GridBounds::new(2, 5), 1, &lik, None).unwrap_err();
        assert!(matches!(
            err,
            PosteriorError::InvalidLikelihood { p: 0, s: 3, k: 1, .. }
        ));
    }

    #[test]
    fn prior_excluding_grid_is_rejected() {
        let prior = PriorFn::new("nowhere", |_, _| f64::NEG_INFINITY);
        let err = grid_posterior(GridBounds::new(5, 5), 2, &FixedSampleLikelihood, Some(&prior))
            .unwrap_err();
        assert!(matches!(err, PosteriorError::PriorExcludesGrid));
        assert_eq!(err.code(), 73);
    }

    #[test]
    fn stopped_draw_without_spare_sock_is_infeasible() {
        // Five singletons and k = 5 leave nothing to match: every point is
        // ruled out by the likelihood, which is a bounds problem.
        let err = grid_posterior(GridBounds::new(0, 5), 5, &StoppingTimeLikelihood, None)
            .unwrap_err();
        assert!(matches!(
            err,
            PosteriorError::NoFeasiblePoint {
                k: 5,
                p_max: 0,
                s_max: 5
            }
        ));
        assert_eq!(err.category(), "configuration");
        assert_eq!(err.code(), 70);
    }

    #[test]
    fn disjoint_prior_and_likelihood_is_degenerate() {
        // Prior lives only on drums with fewer than k distinct types.
        let prior = PriorFn::new("small", |p, s| if p + s < 4 { 0.0 } else { f64::NEG_INFINITY });
        let err = grid_posterior(GridBounds::new(5, 5), 4, &FixedSampleLikelihood, Some(&prior))
            .unwrap_err();
        assert!(matches!(err, PosteriorError::Degenerate { k: 4 }));
        assert_eq!(err.category(), "numerical_degeneracy");
    }

    #[test]
    fn small_window_reports_boundary_mass() {
        let table =
            grid_posterior(GridBounds::new(12, 6), 11, &FixedSampleLikelihood, None).unwrap();
        assert!(table.boundary_mass() > 1e-3);
        assert!(table
            .diagnostics()
            .iter()
            .any(|d| matches!(d, Diagnostic::BoundaryMass { .. })));
    }

    #[test]
    fn small_window_reports_lost_prior_mass() {
        let prior = BaathPrior::default();
        let table =
            grid_posterior(GridBounds::new(12, 12), 11, &FixedSampleLikelihood, Some(&prior))
                .unwrap();
        let captured = table.prior_mass_captured().unwrap();
        assert!(captured < 0.999);
        assert!(table
            .diagnostics()
            .iter()
            .any(|d| matches!(d, Diagnostic::PriorMassOutsideGrid { .. })));
    }

    #[test]
    fn wide_window_is_quiet() {
        let prior = BaathPrior::default();
        let table =
            grid_posterior(GridBounds::new(120, 120), 11, &FixedSampleLikelihood, Some(&prior))
                .unwrap();
        assert!(table.diagnostics().is_empty(), "{:?}", table.diagnostics());
    }

    #[test]
    fn marginals_sum_to_one() {
        let prior = BaathPrior::default();
        let table =
            grid_posterior(GridBounds::new(40, 40), 11, &FixedSampleLikelihood, Some(&prior))
                .unwrap();
        for marginal in [
            table.marginal_n(),
            table.marginal_pairs(),
            table.marginal_singletons(),
        ] {
            let total: f64 = marginal.iter().map(|e| e.mass).sum();
            assert!(approx_eq(total, 1.0, 1e-9));
            assert!(marginal.windows(2).all(|w| w[0].value < w[1].value));
        }
        let n_marginal = table.marginal_n();
        assert_eq!(n_marginal.first().map(|e| e.value), Some(0));
        assert_eq!(n_marginal.last().map(|e| e.value), Some(120));
    }

    #[test]
    fn expected_n_matches_marginal() {
        let prior = BaathPrior::default();
        let table =
            grid_posterior(GridBounds::new(40, 40), 11, &FixedSampleLikelihood, Some(&prior))
                .unwrap();
        let from_marginal: f64 = table
            .marginal_n()
            .iter()
            .map(|e| e.value as f64 * e.mass)
            .sum();
        assert!(approx_eq(table.expected_n(), from_marginal, 1e-9));
        assert!(approx_eq(
            table.expected_n(),
            2.0 * table.expected_pairs() + table.expected_singletons(),
            1e-9
        ));
    }

    #[test]
    fn quantiles_are_ordered() {
        let prior = BaathPrior::default();
        let table =
            grid_posterior(GridBounds::new(50, 50), 11, &FixedSampleLikelihood, Some(&prior))
                .unwrap();
        let lo = table.n_quantile(0.05).unwrap();
        let median = table.n_quantile(0.5).unwrap();
        let hi = table.n_quantile(0.95).unwrap();
        assert!(lo <= median && median <= hi);
        // Eleven distinct socks need at least eleven socks.
        assert!(lo >= 11);
        assert_eq!(table.credible_interval_n(0.9), Some((lo, hi)));
        assert_eq!(table.n_quantile(1.5), None);
        assert_eq!(table.credible_interval_n(1.0), None);
    }

    #[test]
    fn mode_ties_go_to_first_point() {
        let lik = LikelihoodFn::new("constant", |_, _, _| 0.0);
        let table = grid_posterior(GridBounds::new(3, 3), 0, &lik, None).unwrap();
        let mode = table.mode().unwrap();
        assert_eq!((mode.p, mode.s), (0, 0));
        let top = table.top(3);
        let coords: Vec<(u64, u64)> = top.iter().map(|r| (r.p, r.s)).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (0, 2)]);
    }

    #[test]
    fn top_is_sorted_descending() {
        let prior = BaathPrior::default();
        let table =
            grid_posterior(GridBounds::new(30, 30), 11, &FixedSampleLikelihood, Some(&prior))
                .unwrap();
        let top = table.top(10);
        assert_eq!(top.len(), 10);
        assert!(top.windows(2).all(|w| w[0].posterior >= w[1].posterior));
        assert_eq!(top[0], table.mode().unwrap());
    }

    #[test]
    fn get_looks_up_by_coordinates() {
        let table =
            grid_posterior(GridBounds::new(6, 9), 2, &FixedSampleLikelihood, None).unwrap();
        let r = table.get(4, 7).unwrap();
        assert_eq!((r.p, r.s, r.n), (4, 7, 15));
        assert!(table.get(7, 0).is_none());
    }

    #[test]
    fn stopped_likelihood_shifts_posterior_up() {
        let prior = BaathPrior::default();
        let bounds = GridBounds::new(60, 60);
        let fixed =
            grid_posterior(bounds, 11, &FixedSampleLikelihood, Some(&prior)).unwrap();
        let stopped =
            grid_posterior(bounds, 11, &StoppingTimeLikelihood, Some(&prior)).unwrap();
        assert_eq!(stopped.likelihood_name(), "stopped");
        assert!(approx_eq(stopped.total_mass(), 1.0, 1e-9));
        assert_ne!(fixed.expected_n(), stopped.expected_n());
    }

    #[test]
    fn factored_prior_equals_product_on_grid() {
        let prior = FactoredPrior::new(
            NegBinomial::from_mean_sd(12.0, 6.0).unwrap(),
            NegBinomial::from_mean_sd(4.0, 3.0).unwrap(),
        );
        let table = grid_posterior(GridBounds::new(5, 5), 0, &FixedSampleLikelihood, Some(&prior))
            .unwrap();
        let r = table.get(3, 2).unwrap();
        assert!(approx_eq(r.log_prior, prior.log_prior(3, 2), 1e-15));
        assert_eq!(r.log_likelihood, 0.0);
    }

    #[test]
    fn summary_reflects_table() {
        let table =
            grid_posterior(GridBounds::new(12, 6), 11, &FixedSampleLikelihood, None).unwrap();
        let summary = table.summary();
        assert_eq!(summary.points, 13 * 7);
        assert_eq!(summary.prior, "flat");
        assert_eq!(summary.diagnostics, table.diagnostics());
        assert_eq!(summary.median_n, table.n_quantile(0.5));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["likelihood"], "fixed");
        assert_eq!(json["diagnostics"][0]["kind"], "improper_prior");
    }
}
