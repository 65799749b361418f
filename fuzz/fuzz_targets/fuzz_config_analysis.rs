//! Fuzz target for analysis.json parsing and validation.
//!
//! Arbitrary input must only ever produce a parse or validation error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use socks_config::{validate_config, AnalysisConfig};
use socks_core::inference::PriorModel;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<AnalysisConfig>(data) else {
        return;
    };
    if validate_config(&config).is_ok() {
        let _ = PriorModel::from_config(config.prior.as_ref());
    }
});
