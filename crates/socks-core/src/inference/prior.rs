//! Priors over (pairs, singletons).
//!
//! Three families are built in:
//! - [`FlatPrior`]: a constant log value, improper over the unbounded domain.
//! - [`BaathPrior`]: negative binomial on the total `n`, Beta on the fraction
//!   of socks that come in pairs, discretized to integer pair counts.
//! - [`FactoredPrior`]: independent negative binomials on `p` and `s`.
//!
//! [`PriorModel`] builds one of these from a [`PriorConfig`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use socks_config::{BetaShape, CountPrior, PriorConfig};
use socks_math::{BetaDist, NegBinomial};

use super::posterior::PosteriorError;

/// Default constant for the flat prior.
pub const DEFAULT_FLAT_LOG_VALUE: f64 = 1.0;

/// Whether a prior integrates to one over the unbounded (p, s) domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Propriety {
    Proper,
    Improper,
    Unknown,
}

/// A log-prior over grid points.
pub trait LogPrior: Send + Sync {
    /// Natural-log prior mass at `(p, s)`.
    fn log_prior(&self, p: u64, s: u64) -> f64;

    /// Short name used in logs and output.
    fn name(&self) -> &str;

    fn propriety(&self) -> Propriety {
        Propriety::Unknown
    }
}

/// Constant log-prior.
///
/// Only yields a proper posterior because the grid is finite; the result
/// depends on where the grid is cut off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatPrior {
    pub log_value: f64,
}

impl Default for FlatPrior {
    fn default() -> Self {
        Self {
            log_value: DEFAULT_FLAT_LOG_VALUE,
        }
    }
}

impl LogPrior for FlatPrior {
    fn log_prior(&self, _p: u64, _s: u64) -> f64 {
        self.log_value
    }

    fn name(&self) -> &str {
        "flat"
    }

    fn propriety(&self) -> Propriety {
        Propriety::Improper
    }
}

/// Baath's two-stage prior.
///
/// `n ~ NegBinomial(μ, σ)`, `θ ~ Beta(α, β)`, `p = round(floor(n/2) · θ)`,
/// `s = n - 2p`. On the grid this becomes
///
/// ```text
/// log π(p, s) = log NB(n) + ln[F((p + ½)/m) - F((p - ½)/m)],   m = floor(n/2)
/// ```
///
/// with `F` the Beta CDF and both arguments clamped to `[0, 1]`. When `m = 0`
/// the only reachable pair count is `p = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaathPrior {
    total: NegBinomial,
    pair_fraction: BetaDist,
}

impl BaathPrior {
    pub fn new(total: NegBinomial, pair_fraction: BetaDist) -> Self {
        Self {
            total,
            pair_fraction,
        }
    }

    /// Build from configuration hyperparameters.
    pub fn from_params(total: &CountPrior, pair_fraction: &BetaShape) -> Result<Self, PosteriorError> {
        Ok(Self::new(
            count_prior("prior.total", total)?,
            beta_shape("prior.pair_fraction", pair_fraction)?,
        ))
    }

    pub fn total(&self) -> &NegBinomial {
        &self.total
    }

    pub fn pair_fraction(&self) -> &BetaDist {
        &self.pair_fraction
    }

    /// log P(p | n): the chance that `n` socks split into `p` pairs.
    pub fn log_pairs_given_total(&self, p: u64, n: u64) -> f64 {
        let m = n / 2;
        if m == 0 {
            return if p == 0 { 0.0 } else { f64::NEG_INFINITY };
        }
        let m = m as f64;
        let p = p as f64;
        let mass = self
            .pair_fraction
            .interval_mass((p - 0.5) / m, (p + 0.5) / m);
        if mass > 0.0 {
            mass.ln()
        } else {
            f64::NEG_INFINITY
        }
    }
}

impl Default for BaathPrior {
    /// n with mean 30 and sd 15, θ ~ Beta(15, 2).
    fn default() -> Self {
        Self::new(
            NegBinomial {
                size: 30.0 * 30.0 / (15.0 * 15.0 - 30.0),
                mean: 30.0,
            },
            BetaDist {
                alpha: 15.0,
                beta: 2.0,
            },
        )
    }
}

impl LogPrior for BaathPrior {
    fn log_prior(&self, p: u64, s: u64) -> f64 {
        let n = p.saturating_mul(2).saturating_add(s);
        let split = self.log_pairs_given_total(p, n);
        if split == f64::NEG_INFINITY {
            return split;
        }
        self.total.log_pmf(n) + split
    }

    fn name(&self) -> &str {
        "baath"
    }

    fn propriety(&self) -> Propriety {
        Propriety::Proper
    }
}

/// Independent negative binomial priors on pairs and singletons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactoredPrior {
    pairs: NegBinomial,
    singletons: NegBinomial,
}

impl FactoredPrior {
    pub fn new(pairs: NegBinomial, singletons: NegBinomial) -> Self {
        Self { pairs, singletons }
    }

    pub fn from_params(pairs: &CountPrior, singletons: &CountPrior) -> Result<Self, PosteriorError> {
        Ok(Self::new(
            count_prior("prior.pairs", pairs)?,
            count_prior("prior.singletons", singletons)?,
        ))
    }
}

impl Default for FactoredPrior {
    /// Pairs with mean 12 and sd 6, singletons with mean 4 and sd 3.
    fn default() -> Self {
        Self::new(
            NegBinomial {
                size: 12.0 * 12.0 / (6.0 * 6.0 - 12.0),
                mean: 12.0,
            },
            NegBinomial {
                size: 4.0 * 4.0 / (3.0 * 3.0 - 4.0),
                mean: 4.0,
            },
        )
    }
}

impl LogPrior for FactoredPrior {
    fn log_prior(&self, p: u64, s: u64) -> f64 {
        self.pairs.log_pmf(p) + self.singletons.log_pmf(s)
    }

    fn name(&self) -> &str {
        "factored"
    }

    fn propriety(&self) -> Propriety {
        Propriety::Proper
    }
}

/// Adapts a closure into a named prior of unknown propriety.
pub struct PriorFn<F> {
    name: String,
    f: F,
}

impl<F> PriorFn<F>
where
    F: Fn(u64, u64) -> f64 + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> LogPrior for PriorFn<F>
where
    F: Fn(u64, u64) -> f64 + Send + Sync,
{
    fn log_prior(&self, p: u64, s: u64) -> f64 {
        (self.f)(p, s)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for PriorFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorFn")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A built-in prior selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriorModel {
    Flat(FlatPrior),
    Baath(BaathPrior),
    Factored(FactoredPrior),
}

impl PriorModel {
    /// Build the configured prior. `None` in, `None` out: the caller decides
    /// how to fall back.
    pub fn from_config(config: Option<&PriorConfig>) -> Result<Option<Self>, PosteriorError> {
        let Some(config) = config else {
            return Ok(None);
        };
        let model = match config {
            PriorConfig::Flat { log_value } => {
                if !log_value.is_finite() {
                    return Err(PosteriorError::InvalidPriorParams {
                        field: "prior.log_value".to_string(),
                        message: format!("must be finite, got {}", log_value),
                    });
                }
                PriorModel::Flat(FlatPrior {
                    log_value: *log_value,
                })
            }
            PriorConfig::Baath {
                total,
                pair_fraction,
            } => PriorModel::Baath(BaathPrior::from_params(total, pair_fraction)?),
            PriorConfig::Factored { pairs, singletons } => {
                PriorModel::Factored(FactoredPrior::from_params(pairs, singletons)?)
            }
        };
        Ok(Some(model))
    }

    fn inner(&self) -> &dyn LogPrior {
        match self {
            PriorModel::Flat(prior) => prior,
            PriorModel::Baath(prior) => prior,
            PriorModel::Factored(prior) => prior,
        }
    }
}

impl LogPrior for PriorModel {
    fn log_prior(&self, p: u64, s: u64) -> f64 {
        self.inner().log_prior(p, s)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn propriety(&self) -> Propriety {
        self.inner().propriety()
    }
}

fn count_prior(field: &str, params: &CountPrior) -> Result<NegBinomial, PosteriorError> {
    NegBinomial::from_mean_sd(params.mean, params.sd).ok_or_else(|| {
        PosteriorError::InvalidPriorParams {
            field: field.to_string(),
            message: format!(
                "mean {} / sd {} do not describe a negative binomial (needs sd^2 > mean > 0)",
                params.mean, params.sd
            ),
        }
    })
}

fn beta_shape(field: &str, params: &BetaShape) -> Result<BetaDist, PosteriorError> {
    BetaDist::new(params.alpha, params.beta).ok_or_else(|| PosteriorError::InvalidPriorParams {
        field: field.to_string(),
        message: format!(
            "Beta({}, {}) needs positive finite shapes",
            params.alpha, params.beta
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use socks_math::log_sum_exp;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn flat_is_constant_and_improper() {
        let prior = FlatPrior::default();
        assert_eq!(prior.log_prior(0, 0), 1.0);
        assert_eq!(prior.log_prior(40, 3), 1.0);
        assert_eq!(prior.propriety(), Propriety::Improper);
    }

    #[test]
    fn baath_split_sums_to_one() {
        let prior = BaathPrior::default();
        for n in [1u64, 2, 7, 30, 101] {
            let terms: Vec<f64> = (0..=n / 2)
                .map(|p| prior.log_pairs_given_total(p, n))
                .collect();
            assert!(
                approx_eq(log_sum_exp(&terms).exp(), 1.0, 1e-10),
                "n={}",
                n
            );
        }
    }

    #[test]
    fn baath_seven_socks() {
        // m = 3; P(p | 7) = F((p + ½)/3) - F((p - ½)/3) with F(x) = 16x^15 - 15x^16.
        let cdf = |x: f64| {
            let x = x.clamp(0.0, 1.0);
            16.0 * x.powi(15) - 15.0 * x.powi(16)
        };
        let prior = BaathPrior::default();
        for p in 0..=3u64 {
            let expected = cdf((p as f64 + 0.5) / 3.0) - cdf((p as f64 - 0.5) / 3.0);
            let got = prior.log_pairs_given_total(p, 7).exp();
            assert!(approx_eq(got, expected, 1e-10), "p={}", p);
        }
    }

    #[test]
    fn baath_zero_pairs() {
        let prior = BaathPrior::default();
        // m = 0: no pairs possible, all mass on p = 0.
        assert_eq!(prior.log_pairs_given_total(0, 1), 0.0);
        assert_eq!(prior.log_pairs_given_total(0, 0), 0.0);
        // p = 0 with m > 0 keeps the [0, 1/(2m)] sliver of the Beta.
        let sliver = prior.log_pairs_given_total(0, 20);
        assert!(sliver.is_finite());
        assert!(sliver < -30.0);
        let total = prior.total().log_pmf(5);
        assert!(approx_eq(prior.log_prior(0, 5), total + prior.log_pairs_given_total(0, 5), 1e-12));
    }

    #[test]
    fn baath_zero_singletons() {
        // s = 0 means p = m, the top interval [(m - ½)/m, 1].
        let prior = BaathPrior::default();
        let m = 10u64;
        let top = prior
            .pair_fraction()
            .interval_mass((m as f64 - 0.5) / m as f64, 1.0);
        assert!(approx_eq(
            prior.log_pairs_given_total(m, 2 * m).exp(),
            top,
            1e-12
        ));
        assert!(prior.log_prior(m, 0).is_finite());
    }

    #[test]
    fn baath_is_proper_over_large_window() {
        let prior = BaathPrior::default();
        let mut terms = Vec::new();
        for p in 0..=150u64 {
            for s in 0..=300u64 {
                terms.push(prior.log_prior(p, s));
            }
        }
        assert!(approx_eq(log_sum_exp(&terms).exp(), 1.0, 1e-6));
    }

    #[test]
    fn factored_is_sum_of_two_counts() {
        let prior = match PriorModel::from_config(Some(&PriorConfig::default_for(
            socks_config::PriorKind::Factored,
        ))) {
            Ok(Some(PriorModel::Factored(prior))) => prior,
            other => panic!("expected factored prior, got {:?}", other),
        };
        let pairs = NegBinomial::from_mean_sd(12.0, 6.0).unwrap();
        let singles = NegBinomial::from_mean_sd(4.0, 3.0).unwrap();
        for (p, s) in [(0, 0), (12, 4), (30, 0), (3, 17)] {
            assert!(approx_eq(
                prior.log_prior(p, s),
                pairs.log_pmf(p) + singles.log_pmf(s),
                1e-12
            ));
        }
        assert_eq!(prior.propriety(), Propriety::Proper);
    }

    #[test]
    fn missing_config_builds_nothing() {
        assert!(PriorModel::from_config(None).unwrap().is_none());
    }

    #[test]
    fn invalid_hyperparameters_rejected() {
        let config = PriorConfig::Baath {
            total: CountPrior {
                mean: 30.0,
                sd: 4.0,
            },
            pair_fraction: BetaShape {
                alpha: 15.0,
                beta: 2.0,
            },
        };
        match PriorModel::from_config(Some(&config)) {
            Err(PosteriorError::InvalidPriorParams { field, .. }) => {
                assert_eq!(field, "prior.total")
            }
            other => panic!("expected InvalidPriorParams, got {:?}", other),
        }
    }

    #[test]
    fn model_delegates_name_and_propriety() {
        let flat = PriorModel::Flat(FlatPrior::default());
        let baath = PriorModel::Baath(BaathPrior::default());
        assert_eq!(flat.name(), "flat");
        assert_eq!(baath.name(), "baath");
        assert_eq!(flat.propriety(), Propriety::Improper);
        assert_eq!(baath.propriety(), Propriety::Proper);
    }

    #[test]
    fn closure_prior_has_unknown_propriety() {
        let prior = PriorFn::new("even-only", |p, _s| if p % 2 == 0 { 0.0 } else { f64::NEG_INFINITY });
        assert_eq!(prior.name(), "even-only");
        assert_eq!(prior.propriety(), Propriety::Unknown);
        assert_eq!(prior.log_prior(3, 0), f64::NEG_INFINITY);
    }
}
