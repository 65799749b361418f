//! Command payloads and their renderings.
//!
//! Every command produces a payload that can be written three ways:
//! - `json`: the payload wrapped in an [`Envelope`] with provenance
//! - `md`: a Markdown report
//! - `summary`: a single line for quick checks
//!
//! Non-finite numbers (e.g. `-inf` log-likelihoods) are written as `null`
//! in JSON.

mod render;

use std::io::{self, Write};

use chrono::Utc;
use clap::ValueEnum;
use serde::Serialize;
use socks_config::{AnalysisConfig, ConfigSnapshot};

use crate::inference::{MarginalEntry, PosteriorRecord, PosteriorSummary, PosteriorTable};
use crate::simulate::SimulationComparison;

/// Schema version of the JSON envelope.
pub const OUTPUT_SCHEMA_VERSION: &str = "1.0.0";

/// Output format for stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON (default)
    #[default]
    Json,
    /// Human-readable Markdown
    Md,
    /// One-line summary
    Summary,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Md => write!(f, "md"),
            OutputFormat::Summary => write!(f, "summary"),
        }
    }
}

/// Text renderings of a payload.
pub trait Render {
    fn markdown(&self) -> String;
    fn summary_line(&self) -> String;
}

/// JSON wrapper carrying provenance for a payload.
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub schema_version: &'static str,
    pub generated_at: String,
    pub run_id: &'a str,
    pub command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<&'a ConfigSnapshot>,
    pub result: &'a T,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    pub fn new(run_id: &'a str, command: &'a str, result: &'a T) -> Self {
        Self {
            schema_version: OUTPUT_SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            run_id,
            command,
            config: None,
            result,
        }
    }

    pub fn with_config(mut self, snapshot: &'a ConfigSnapshot) -> Self {
        self.config = Some(snapshot);
        self
    }
}

/// Write a payload in the requested format.
pub fn write_output<W, T>(
    out: &mut W,
    format: OutputFormat,
    envelope: &Envelope<'_, T>,
) -> io::Result<()>
where
    W: Write,
    T: Serialize + Render,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, envelope)?;
            writeln!(out)
        }
        OutputFormat::Md => write!(out, "{}", envelope.result.markdown()),
        OutputFormat::Summary => writeln!(out, "{}", envelope.result.summary_line()),
    }
}

/// `socks likelihood` payload.
#[derive(Debug, Clone, Serialize)]
pub struct LikelihoodReport {
    pub p: u64,
    pub s: u64,
    pub k: u64,
    pub n: u64,
    pub model: String,
    pub log_likelihood: f64,
    pub likelihood: f64,
}

/// `socks posterior` payload.
#[derive(Debug, Clone, Serialize)]
pub struct PosteriorReport {
    pub summary: PosteriorSummary,
    /// Most probable points, or the full table when requested.
    pub records: Vec<PosteriorRecord>,
}

impl PosteriorReport {
    /// Keep the `top` most probable records; `None` keeps the whole grid.
    pub fn from_table(table: &PosteriorTable, top: Option<usize>) -> Self {
        let records = match top {
            Some(count) => table.top(count).into_iter().copied().collect(),
            None => table.records().to_vec(),
        };
        Self {
            summary: table.summary(),
            records,
        }
    }
}

/// `socks summary` payload.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub summary: PosteriorSummary,
}

/// `socks marginal` payload.
#[derive(Debug, Clone, Serialize)]
pub struct MarginalReport {
    pub k: u64,
    pub prior: String,
    pub likelihood: String,
    pub n: Vec<MarginalEntry>,
    pub pairs: Vec<MarginalEntry>,
    pub singletons: Vec<MarginalEntry>,
}

impl MarginalReport {
    pub fn from_table(table: &PosteriorTable) -> Self {
        Self {
            k: table.k(),
            prior: table.prior_name().to_string(),
            likelihood: table.likelihood_name().to_string(),
            n: table.marginal_n(),
            pairs: table.marginal_pairs(),
            singletons: table.marginal_singletons(),
        }
    }
}

/// `socks simulate` payload.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    #[serde(flatten)]
    pub comparison: SimulationComparison,
}

/// `socks config show` payload.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub source: String,
    pub path: Option<String>,
    pub config: AnalysisConfig,
}

/// `socks config validate` payload.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub path: Option<String>,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u32>,
}

/// `socks version` payload.
#[derive(Debug, Clone, Serialize)]
pub struct VersionReport {
    pub socks_version: &'static str,
    pub config_schema_version: &'static str,
    pub output_schema_version: &'static str,
}

impl Default for VersionReport {
    fn default() -> Self {
        Self {
            socks_version: env!("CARGO_PKG_VERSION"),
            config_schema_version: socks_config::CONFIG_SCHEMA_VERSION,
            output_schema_version: OUTPUT_SCHEMA_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{grid_posterior, BaathPrior, FixedSampleLikelihood, GridBounds};

    fn table() -> PosteriorTable {
        let prior = BaathPrior::default();
        grid_posterior(
            GridBounds::new(30, 20),
            11,
            &FixedSampleLikelihood,
            Some(&prior),
        )
        .unwrap()
    }

    #[test]
    fn json_envelope_has_provenance() {
        let report = LikelihoodReport {
            p: 2,
            s: 0,
            k: 3,
            n: 4,
            model: "fixed".to_string(),
            log_likelihood: f64::NEG_INFINITY,
            likelihood: 0.0,
        };
        let mut buf = Vec::new();
        write_output(
            &mut buf,
            OutputFormat::Json,
            &Envelope::new("run-abc", "likelihood", &report),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["schema_version"], OUTPUT_SCHEMA_VERSION);
        assert_eq!(value["run_id"], "run-abc");
        assert_eq!(value["command"], "likelihood");
        assert!(value.get("config").is_none());
        assert!(value["result"]["log_likelihood"].is_null());
        assert_eq!(value["result"]["likelihood"], 0.0);
    }

    #[test]
    fn posterior_report_keeps_top_records() {
        let table = table();
        let report = PosteriorReport::from_table(&table, Some(5));
        assert_eq!(report.records.len(), 5);
        assert_eq!(report.records[0], *table.mode().unwrap());
        let full = PosteriorReport::from_table(&table, None);
        assert_eq!(full.records.len(), table.len());
    }

    #[test]
    fn summary_line_is_single_line() {
        let table = table();
        let report = SummaryReport {
            summary: table.summary(),
        };
        let mut buf = Vec::new();
        write_output(
            &mut buf,
            OutputFormat::Summary,
            &Envelope::new("run-abc", "summary", &report),
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("k=11"));
    }

    #[test]
    fn markdown_marginal_has_table() {
        let report = MarginalReport::from_table(&table());
        let md = report.markdown();
        assert!(md.starts_with("# "));
        assert!(md.contains("| n |"));
    }
}
