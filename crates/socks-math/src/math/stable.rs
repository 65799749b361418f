//! Numerically stable primitives for log-domain counting and Bayesian math.

use std::f64::consts::PI;

const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8; // 0.5 * ln(2*pi)
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)] // These are published numerical constants
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Below this bound `log_factorial` sums logs directly instead of going
/// through the Lanczos approximation.
const DIRECT_FACTORIAL_LIMIT: u64 = 64;

/// Stable log(sum(exp(values))).
///
/// Factors out the maximum so every exponentiated term is at most 1, and
/// adds the remaining terms through `ln_1p` so a sum just above the maximum
/// keeps its low-order digits.
/// Returns NEG_INFINITY for empty input or all -inf inputs; NaN propagates.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let (argmax, max) = values
        .iter()
        .cloned()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| {
            if v > best.1 {
                (i, v)
            } else {
                best
            }
        });
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let rest: f64 = values
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != argmax)
        .map(|(_, v)| (*v - max).exp())
        .sum();
    max + rest.ln_1p()
}

/// Natural log of the Gamma function (log |Gamma(z)|).
///
/// Uses a Lanczos approximation with reflection for z < 0.5.
pub fn log_gamma(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z == f64::INFINITY {
        return f64::INFINITY;
    }
    if z == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if z <= 0.0 && (z - z.round()).abs() < 1e-15 {
        return f64::NAN;
    }
    if z < 0.5 {
        let sin_pi = (PI * z).sin();
        if sin_pi == 0.0 {
            return f64::NAN;
        }
        return PI.ln() - sin_pi.abs().ln() - log_gamma(1.0 - z);
    }

    let z_minus = z - 1.0;
    let mut x = LANCZOS_COEFFS[0];
    for (i, coeff) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        x += coeff / (z_minus + i as f64);
    }
    let t = z_minus + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (z_minus + 0.5) * t.ln() - t + x.ln()
}

/// log Beta(a, b) = log Gamma(a) + log Gamma(b) - log Gamma(a+b).
pub fn log_beta(a: f64, b: f64) -> f64 {
    log_gamma(a) + log_gamma(b) - log_gamma(a + b)
}

/// log(n!).
///
/// Small arguments are summed directly so that sock-sized binomial
/// coefficients stay exact to a few ulps.
pub fn log_factorial(n: u64) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    if n < DIRECT_FACTORIAL_LIMIT {
        return (2..=n).map(|i| (i as f64).ln()).sum();
    }
    log_gamma((n as f64) + 1.0)
}

/// log binomial coefficient: log(n choose k).
///
/// Returns NEG_INFINITY when `k > n` (the coefficient is zero). When the
/// shorter side `min(k, n - k)` is small the ratio of falling factorials is
/// summed term by term; differencing three large `log_gamma` values would
/// cancel away every significant digit for a huge `n`.
pub fn log_binomial(n: u64, k: u64) -> f64 {
    if k > n {
        return f64::NEG_INFINITY;
    }
    let m = k.min(n - k);
    if m == 0 {
        return 0.0;
    }
    if m < DIRECT_FACTORIAL_LIMIT {
        return (0..m)
            .map(|i| ((n - i) as f64).ln() - ((i + 1) as f64).ln())
            .sum();
    }
    log_factorial(n) - log_factorial(k) - log_factorial(n - k)
}
