//! Socks inference core library.
//!
//! Given that the first `k` socks pulled from a drum of `p` pairs and `s`
//! singletons are all distinct, this crate provides:
//! - The exact log-likelihood and its stopping-time variant
//! - Pluggable priors over (pairs, singletons)
//! - A brute-force grid posterior with marginals and diagnostics
//! - A Monte Carlo cross-check of the likelihood
//! - Logging, output rendering and exit codes for the `socks` binary
//!
//! The binary entry point is in `main.rs`.

pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod output;
pub mod schema;
pub mod simulate;

pub use inference::{
    grid_posterior, grid_posterior_with, log_likelihood, log_likelihood_stopped, GridBounds,
    LogLikelihood, LogPrior, PosteriorError, PosteriorOptions, PosteriorTable,
};
