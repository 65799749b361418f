//! Monte Carlo check of the exact likelihood.
//!
//! Builds the drum explicitly, draws `k` socks without replacement by a
//! partial Fisher-Yates shuffle, and counts how often every drawn sock is of
//! a different type. The estimate is independent of the closed form and is
//! used to cross-check it.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::inference::log_likelihood;

/// Largest drum the simulator will materialize.
pub const MAX_DRUM_SIZE: u64 = 10_000_000;

/// Errors raised by the simulator.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("cannot draw {k} socks from a drum of {n}")]
    TooFewSocks { k: u64, n: u64 },

    #[error("drum of {n} socks exceeds the simulation limit of {limit}")]
    DrumTooLarge { n: u64, limit: u64 },

    #[error("at least one draw is required")]
    NoDraws,
}

/// Result of repeated draws from one drum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SimulationEstimate {
    pub p: u64,
    pub s: u64,
    pub k: u64,
    pub draws: u64,
    /// Draws in which all `k` socks were distinct.
    pub distinct: u64,
    pub probability: f64,
    /// Binomial standard error of `probability`.
    pub std_error: f64,
}

/// Simulated against exact probability for one drum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SimulationComparison {
    pub seed: u64,
    pub estimate: SimulationEstimate,
    pub exact: f64,
    /// `(estimate - exact) / se`, with `se` from the exact probability.
    /// None when the exact probability is 0 or 1.
    pub z_score: Option<f64>,
}

/// Estimate the probability that `k` socks drawn from `p` pairs and `s`
/// singletons are all distinct.
pub fn estimate_distinct_probability<R: Rng + ?Sized>(
    p: u64,
    s: u64,
    k: u64,
    draws: u64,
    rng: &mut R,
) -> Result<SimulationEstimate, SimulationError> {
    if draws == 0 {
        return Err(SimulationError::NoDraws);
    }
    let n = p.saturating_mul(2).saturating_add(s);
    if n > MAX_DRUM_SIZE {
        return Err(SimulationError::DrumTooLarge {
            n,
            limit: MAX_DRUM_SIZE,
        });
    }
    if k > n {
        return Err(SimulationError::TooFewSocks { k, n });
    }

    // Pair i contributes two socks of type i; singletons get types p..p+s.
    let mut drum: Vec<u64> = (0..p).flat_map(|i| [i, i]).chain(p..p + s).collect();
    let amount = k as usize;
    let mut drawn: Vec<u64> = Vec::with_capacity(amount);
    let mut distinct = 0u64;

    for _ in 0..draws {
        let (chosen, _) = drum.partial_shuffle(rng, amount);
        drawn.clear();
        drawn.extend_from_slice(chosen);
        drawn.sort_unstable();
        if drawn.windows(2).all(|w| w[0] != w[1]) {
            distinct += 1;
        }
    }

    let probability = distinct as f64 / draws as f64;
    let std_error = (probability * (1.0 - probability) / draws as f64).sqrt();
    Ok(SimulationEstimate {
        p,
        s,
        k,
        draws,
        distinct,
        probability,
        std_error,
    })
}

/// Simulate with a seeded generator and compare against the closed form.
pub fn compare(
    p: u64,
    s: u64,
    k: u64,
    draws: u64,
    seed: u64,
) -> Result<SimulationComparison, SimulationError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let estimate = estimate_distinct_probability(p, s, k, draws, &mut rng)?;
    let exact = log_likelihood(p, s, k).exp();
    let se = (exact * (1.0 - exact) / draws as f64).sqrt();
    let z_score = if se > 0.0 {
        Some((estimate.probability - exact) / se)
    } else {
        None
    };
    debug!(
        p,
        s,
        k,
        draws,
        seed,
        exact,
        simulated = estimate.probability,
        "Simulation finished"
    );
    Ok(SimulationComparison {
        seed,
        estimate,
        exact,
        z_score,
    })
}
