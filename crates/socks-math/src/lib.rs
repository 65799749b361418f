//! Numerical primitives for the socks inference workspace.
//!
//! Everything here works in the natural-log domain and is total: invalid
//! inputs yield `NaN` or `-inf` sentinels rather than errors, so callers can
//! decide which sentinels are fatal.

pub mod math;

pub use math::beta::{beta_cdf, BetaDist};
pub use math::negbinom::NegBinomial;
pub use math::normalize::normalize_log_probs;
pub use math::stable::*;
