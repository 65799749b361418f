//! Markdown and one-line renderings.

use std::fmt::Write as _;

use super::{
    ConfigReport, LikelihoodReport, MarginalReport, PosteriorReport, Render, SimulationReport,
    SummaryReport, ValidationReport, VersionReport,
};
use crate::inference::{MarginalEntry, PosteriorSummary};

/// Marginal rows below this mass are left out of Markdown tables.
const MARKDOWN_MIN_MASS: f64 = 1e-6;

fn num(value: f64) -> String {
    if value.is_finite() {
        format!("{:.6}", value)
    } else {
        value.to_string()
    }
}

fn interval(summary: &PosteriorSummary) -> String {
    match summary.credible_interval_90 {
        Some([lo, hi]) => format!("[{}, {}]", lo, hi),
        None => "n/a".to_string(),
    }
}

fn summary_markdown(out: &mut String, summary: &PosteriorSummary) {
    let _ = writeln!(
        out,
        "- k = {} distinct socks, grid p ≤ {}, s ≤ {} ({} points)",
        summary.k, summary.p_max, summary.s_max, summary.points
    );
    let _ = writeln!(
        out,
        "- prior: {} ({:?}), likelihood: {}",
        summary.prior, summary.prior_propriety, summary.likelihood
    );
    if let Some(mode) = &summary.mode {
        let _ = writeln!(
            out,
            "- mode: p = {}, s = {} (n = {}), posterior {}",
            mode.p,
            mode.s,
            mode.n,
            num(mode.posterior)
        );
    }
    let _ = writeln!(
        out,
        "- E[n] = {:.2}, E[p] = {:.2}, E[s] = {:.2}",
        summary.expected_n, summary.expected_pairs, summary.expected_singletons
    );
    if let Some(median) = summary.median_n {
        let _ = writeln!(out, "- median n = {}, 90% interval {}", median, interval(summary));
    }
    let _ = writeln!(
        out,
        "- log evidence {}, edge mass {}",
        num(summary.log_evidence),
        num(summary.boundary_mass)
    );
    if let Some(captured) = summary.prior_mass_captured {
        let _ = writeln!(out, "- prior mass on grid {}", num(captured));
    }
    if !summary.diagnostics.is_empty() {
        let _ = writeln!(out, "\n## Diagnostics\n");
        for diagnostic in &summary.diagnostics {
            let _ = writeln!(out, "- {}", diagnostic);
        }
    }
}

fn summary_line(summary: &PosteriorSummary) -> String {
    let mode = summary
        .mode
        .as_ref()
        .map(|m| format!("p={} s={}", m.p, m.s))
        .unwrap_or_else(|| "none".to_string());
    format!(
        "k={} prior={} likelihood={} mode=({}) E[n]={:.2} median_n={} ci90={} warnings={}",
        summary.k,
        summary.prior,
        summary.likelihood,
        mode,
        summary.expected_n,
        summary
            .median_n
            .map(|m| m.to_string())
            .unwrap_or_else(|| "n/a".to_string()),
        interval(summary),
        summary.diagnostics.len()
    )
}

fn marginal_table(out: &mut String, label: &str, entries: &[MarginalEntry]) {
    let _ = writeln!(out, "| {} | mass |", label);
    let _ = writeln!(out, "|---:|---:|");
    for entry in entries.iter().filter(|e| e.mass >= MARKDOWN_MIN_MASS) {
        let _ = writeln!(out, "| {} | {} |", entry.value, num(entry.mass));
    }
}

impl Render for LikelihoodReport {
    fn markdown(&self) -> String {
        let mut out = String::from("# Likelihood\n\n");
        let _ = writeln!(
            out,
            "- p = {}, s = {} (n = {}), k = {}, model {}",
            self.p, self.s, self.n, self.k, self.model
        );
        let _ = writeln!(out, "- log L = {}", num(self.log_likelihood));
        let _ = writeln!(out, "- L = {}", num(self.likelihood));
        out
    }

    fn summary_line(&self) -> String {
        format!(
            "p={} s={} k={} model={} log_likelihood={} likelihood={}",
            self.p,
            self.s,
            self.k,
            self.model,
            num(self.log_likelihood),
            num(self.likelihood)
        )
    }
}

impl Render for PosteriorReport {
    fn markdown(&self) -> String {
        let mut out = String::from("# Posterior\n\n");
        summary_markdown(&mut out, &self.summary);
        let _ = writeln!(out, "\n## Grid points\n");
        let _ = writeln!(out, "| p | s | n | log prior | log likelihood | posterior |");
        let _ = writeln!(out, "|---:|---:|---:|---:|---:|---:|");
        for r in &self.records {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} |",
                r.p,
                r.s,
                r.n,
                num(r.log_prior),
                num(r.log_likelihood),
                num(r.posterior)
            );
        }
        out
    }

    fn summary_line(&self) -> String {
        summary_line(&self.summary)
    }
}

impl Render for SummaryReport {
    fn markdown(&self) -> String {
        let mut out = String::from("# Posterior summary\n\n");
        summary_markdown(&mut out, &self.summary);
        out
    }

    fn summary_line(&self) -> String {
        summary_line(&self.summary)
    }
}

impl Render for MarginalReport {
    fn markdown(&self) -> String {
        let mut out = format!(
            "# Marginal posteriors\n\nk = {}, prior {}, likelihood {}\n\n## Total socks\n\n",
            self.k, self.prior, self.likelihood
        );
        marginal_table(&mut out, "n", &self.n);
        let _ = writeln!(out, "\n## Pairs\n");
        marginal_table(&mut out, "p", &self.pairs);
        let _ = writeln!(out, "\n## Singletons\n");
        marginal_table(&mut out, "s", &self.singletons);
        out
    }

    fn summary_line(&self) -> String {
        let best = self
            .n
            .iter()
            .fold(None::<&MarginalEntry>, |best, e| match best {
                Some(b) if e.mass <= b.mass => Some(b),
                _ => Some(e),
            });
        match best {
            Some(entry) => format!(
                "k={} prior={} n_values={} most_likely_n={} mass={}",
                self.k,
                self.prior,
                self.n.len(),
                entry.value,
                num(entry.mass)
            ),
            None => format!("k={} prior={} n_values=0", self.k, self.prior),
        }
    }
}

impl Render for SimulationReport {
    fn markdown(&self) -> String {
        let c = &self.comparison;
        let mut out = String::from("# Simulation\n\n");
        let _ = writeln!(
            out,
            "- p = {}, s = {}, k = {}, {} draws (seed {})",
            c.estimate.p, c.estimate.s, c.estimate.k, c.estimate.draws, c.seed
        );
        let _ = writeln!(
            out,
            "- simulated {} ± {}",
            num(c.estimate.probability),
            num(c.estimate.std_error)
        );
        let _ = writeln!(out, "- exact {}", num(c.exact));
        if let Some(z) = c.z_score {
            let _ = writeln!(out, "- z = {:.3}", z);
        }
        out
    }

    fn summary_line(&self) -> String {
        let c = &self.comparison;
        format!(
            "p={} s={} k={} draws={} simulated={} exact={} z={}",
            c.estimate.p,
            c.estimate.s,
            c.estimate.k,
            c.estimate.draws,
            num(c.estimate.probability),
            num(c.exact),
            c.z_score
                .map(|z| format!("{:.3}", z))
                .unwrap_or_else(|| "n/a".to_string())
        )
    }
}

impl Render for ConfigReport {
    fn markdown(&self) -> String {
        let body = serde_json::to_string_pretty(&self.config).unwrap_or_default();
        format!(
            "# Configuration\n\nsource: {}{}\n\n```json\n{}\n```\n",
            self.source,
            self.path
                .as_deref()
                .map(|p| format!(" ({})", p))
                .unwrap_or_default(),
            body
        )
    }

    fn summary_line(&self) -> String {
        format!(
            "source={} k={} grid={}x{} prior={} likelihood={}",
            self.source,
            self.config.observation.k,
            self.config.grid.p_max,
            self.config.grid.s_max,
            self.config.prior_label(),
            self.config.likelihood
        )
    }
}

impl Render for ValidationReport {
    fn markdown(&self) -> String {
        let target = self.path.as_deref().unwrap_or("builtin defaults");
        match &self.error {
            None => format!("# Configuration valid\n\n{}\n", target),
            Some(error) => format!("# Configuration invalid\n\n{}\n\n{}\n", target, error),
        }
    }

    fn summary_line(&self) -> String {
        match (&self.error, self.code) {
            (Some(error), Some(code)) => format!("invalid code={} {}", code, error),
            (Some(error), None) => format!("invalid {}", error),
            _ => "valid".to_string(),
        }
    }
}

impl Render for VersionReport {
    fn markdown(&self) -> String {
        format!(
            "# socks {}\n\n- config schema {}\n- output schema {}\n",
            self.socks_version, self.config_schema_version, self.output_schema_version
        )
    }

    fn summary_line(&self) -> String {
        format!("socks {}", self.socks_version)
    }
}
