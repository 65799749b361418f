//! Property-based tests for socks-math numerical functions.
//!
//! Uses proptest to verify mathematical properties hold across many random inputs.

use proptest::prelude::*;
use socks_math::{
    beta_cdf, log_binomial, log_factorial, log_gamma, log_sum_exp, normalize_log_probs, BetaDist,
    NegBinomial,
};

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-10;

/// Extended tolerance for log_gamma where Lanczos approximation has some error.
const LGAMMA_TOL: f64 = 1e-8;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_nan() || b.is_nan() {
        return false;
    }
    if a.is_infinite() && b.is_infinite() {
        return a.signum() == b.signum();
    }
    if a.is_infinite() || b.is_infinite() {
        return false;
    }
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

// ============================================================================
// log_sum_exp properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// The stabilized form equals the naive ln(sum(exp)) wherever the naive
    /// form cannot overflow or underflow.
    #[test]
    fn log_sum_exp_matches_naive(values in prop::collection::vec(-30.0..30.0f64, 1..16)) {
        let stable = log_sum_exp(&values);
        let naive = values.iter().map(|v| v.exp()).sum::<f64>().ln();
        prop_assert!(approx_eq(stable, naive, TOL), "stable={} naive={}", stable, naive);
    }

    /// Order of the terms does not matter.
    #[test]
    fn log_sum_exp_commutative(a in -100.0..100.0f64, b in -100.0..100.0f64) {
        let ab = log_sum_exp(&[a, b]);
        let ba = log_sum_exp(&[b, a]);
        prop_assert!(approx_eq(ab, ba, TOL), "lse([{},{}])={} != {}", a, b, ab, ba);
    }

    /// Grouping does not matter.
    #[test]
    fn log_sum_exp_associative(a in -50.0..50.0f64, b in -50.0..50.0f64, c in -50.0..50.0f64) {
        let direct = log_sum_exp(&[a, b, c]);
        let grouped = log_sum_exp(&[log_sum_exp(&[a, b]), c]);
        prop_assert!(approx_eq(direct, grouped, TOL), "{} != {}", direct, grouped);
    }

    /// Result is bounded below by the max term and above by max + ln(len).
    #[test]
    fn log_sum_exp_bounds(values in prop::collection::vec(-700.0..700.0f64, 1..32)) {
        let result = log_sum_exp(&values);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(result.is_finite());
        prop_assert!(result >= max - TOL);
        prop_assert!(result <= max + (values.len() as f64).ln() + TOL);
    }

    /// Adding -inf terms never changes the sum.
    #[test]
    fn log_sum_exp_ignores_neg_inf(values in prop::collection::vec(-50.0..50.0f64, 1..8), pads in 1usize..5) {
        let base = log_sum_exp(&values);
        let mut padded = values.clone();
        padded.extend(std::iter::repeat(f64::NEG_INFINITY).take(pads));
        prop_assert!(approx_eq(base, log_sum_exp(&padded), 0.0));
    }
}

// ============================================================================
// Normalization properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Normalized log-probabilities exponentiate to a probability vector.
    #[test]
    fn normalized_probs_sum_to_one(values in prop::collection::vec(-500.0..500.0f64, 1..64)) {
        let logs = normalize_log_probs(&values);
        let total: f64 = logs.iter().map(|l| l.exp()).sum();
        prop_assert!(approx_eq(total, 1.0, 1e-9), "sum={}", total);
        prop_assert!(logs.iter().all(|l| *l <= 1e-12));
    }
}

// ============================================================================
// log_gamma / log_factorial properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// log_gamma recurrence: log_gamma(z+1) = log_gamma(z) + ln(z).
    #[test]
    fn log_gamma_recurrence(z in 1.0..100.0f64) {
        let expected = log_gamma(z) + z.ln();
        prop_assert!(approx_eq(log_gamma(z + 1.0), expected, LGAMMA_TOL));
    }

    /// log_factorial matches log_gamma(n+1) on both sides of the direct-sum cutoff.
    #[test]
    fn log_factorial_matches_log_gamma(n in 0u64..200) {
        let lf = log_factorial(n);
        let lg = log_gamma((n as f64) + 1.0);
        prop_assert!(approx_eq(lf, lg, LGAMMA_TOL), "n={} lf={} lg={}", n, lf, lg);
    }
}

// ============================================================================
// log_binomial properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// C(n,k) = C(n,n-k).
    #[test]
    fn log_binomial_symmetric(n in 1u64..120, k_frac in 0.0..1.0f64) {
        let k = ((n as f64) * k_frac) as u64;
        prop_assert!(approx_eq(log_binomial(n, k), log_binomial(n, n - k), TOL));
    }

    /// Pascal's identity: C(n,k) = C(n-1,k-1) + C(n-1,k).
    #[test]
    fn log_binomial_pascal(n in 2u64..40, k_frac in 0.1..0.9f64) {
        let k = 1 + ((n as f64 - 2.0) * k_frac) as u64;
        let lhs = log_binomial(n, k);
        let rhs = log_sum_exp(&[log_binomial(n - 1, k - 1), log_binomial(n - 1, k)]);
        prop_assert!(approx_eq(lhs, rhs, TOL), "C({},{})", n, k);
    }

    /// Vandermonde: sum_j C(a,j) C(b,k-j) = C(a+b,k).
    #[test]
    fn log_binomial_vandermonde(a in 0u64..30, b in 0u64..30, k_frac in 0.0..1.0f64) {
        let k = (((a + b) as f64) * k_frac) as u64;
        let terms: Vec<f64> = (0..=k)
            .filter(|j| k - j <= b)
            .map(|j| log_binomial(a, j) + log_binomial(b, k - j))
            .collect();
        prop_assert!(approx_eq(log_sum_exp(&terms), log_binomial(a + b, k), TOL));
    }

    /// C(n,k) is zero (log -inf) when k > n.
    #[test]
    fn log_binomial_invalid(n in 0u64..50, extra in 1u64..10) {
        prop_assert!(log_binomial(n, n + extra) == f64::NEG_INFINITY);
    }
}

// ============================================================================
// Distribution properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The Beta CDF is monotone and bounded.
    #[test]
    fn beta_cdf_monotone(alpha in 0.5..30.0f64, beta in 0.5..30.0f64, x in 0.0..1.0f64, dx in 0.0..0.5f64) {
        let lo = beta_cdf(x, alpha, beta);
        let hi = beta_cdf((x + dx).min(1.0), alpha, beta);
        prop_assert!((0.0..=1.0).contains(&lo));
        prop_assert!(hi >= lo - 1e-12, "F({})={} > F({})={}", x, lo, x + dx, hi);
    }

    /// Adjacent interval masses sum to the mass of their union.
    #[test]
    fn beta_interval_mass_additive(alpha in 0.5..30.0f64, beta in 0.5..30.0f64, a in 0.0..1.0f64, b in 0.0..1.0f64) {
        let dist = BetaDist::new(alpha, beta).unwrap();
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let mid = 0.5 * (lo + hi);
        let split = dist.interval_mass(lo, mid) + dist.interval_mass(mid, hi);
        prop_assert!(approx_eq(split, dist.interval_mass(lo, hi), 1e-10));
    }

    /// A negative binomial pmf is a distribution.
    #[test]
    fn negbinom_pmf_sums_to_one(mean in 1.0..40.0f64, extra_sd in 0.5..20.0f64) {
        let sd = mean.sqrt() + extra_sd;
        let nb = NegBinomial::from_mean_sd(mean, sd).unwrap();
        let total: f64 = (0..5_000).map(|n| nb.pmf(n)).sum();
        prop_assert!(approx_eq(total, 1.0, 1e-7), "mean={} sd={} total={}", mean, sd, total);
    }
}

// ============================================================================
// Edge cases
// ============================================================================

#[test]
fn edge_case_empty_log_sum_exp() {
    assert!(log_sum_exp(&[]) == f64::NEG_INFINITY);
}

#[test]
fn edge_case_infinity_handling() {
    assert!(log_sum_exp(&[f64::INFINITY, 1.0]) == f64::INFINITY);
    assert!(log_gamma(f64::INFINITY) == f64::INFINITY);
}

#[test]
fn known_values_log_binomial() {
    assert!((log_binomial(10, 4) - 210.0_f64.ln()).abs() < 1e-12);
    assert!((log_binomial(20, 10) - 184_756.0_f64.ln()).abs() < 1e-10);
    assert!((log_binomial(150, 11) - log_binomial(150, 139)).abs() < 1e-9);
}
