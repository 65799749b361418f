//! Fuzz target for the exact likelihood.
//!
//! The log-likelihood is never NaN and never positive, for any drum.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use socks_core::inference::{log_likelihood, log_likelihood_stopped};

#[derive(Debug, Arbitrary)]
struct Drum {
    pairs: u32,
    singletons: u32,
    k: u16,
}

fuzz_target!(|drum: Drum| {
    let (p, s, k) = (drum.pairs as u64, drum.singletons as u64, drum.k as u64);
    let ll = log_likelihood(p, s, k);
    assert!(!ll.is_nan());
    assert!(ll <= 0.0);
    assert!(!log_likelihood_stopped(p, s, k).is_nan());
});
