//! socks CLI entry point.
//!
//! stdout carries the command payload; stderr carries logs and errors.

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use socks_config::{
    load_config, AnalysisConfig, LikelihoodKind, LoadedConfig, PriorConfig, PriorKind,
    ValidationError,
};
use socks_core::exit_codes::ExitCode;
use socks_core::inference::{
    grid_posterior_with, log_likelihood, log_likelihood_stopped, LikelihoodModel, LogLikelihood,
    LogPrior, PosteriorError, PosteriorOptions, PosteriorTable, PriorModel,
};
use socks_core::logging::{generate_run_id, init_logging, run_span, LogConfig, LogFormat, LogLevel};
use socks_core::output::{
    write_output, ConfigReport, Envelope, LikelihoodReport, MarginalReport, OutputFormat,
    PosteriorReport, Render, SimulationReport, SummaryReport, ValidationReport, VersionReport,
    OUTPUT_SCHEMA_VERSION,
};
use socks_core::schema::{available_schemas, generate_schema, DEFAULT_SCHEMA};
use socks_core::simulate::{self, SimulationError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Broman's socks: how many socks are in the laundry?
#[derive(Parser)]
#[command(name = "socks")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to analysis.json (otherwise SOCKS_CONFIG, SOCKS_CONFIG_DIR, XDG, /etc/socks)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exact likelihood that k drawn socks are all distinct
    Likelihood(LikelihoodArgs),
    /// Posterior table over (pairs, singletons)
    Posterior(PosteriorArgs),
    /// Posterior headline numbers
    Summary(AnalysisArgs),
    /// Marginal posteriors over total socks, pairs and singletons
    Marginal(AnalysisArgs),
    /// Monte Carlo check of the exact likelihood
    Simulate(SimulateArgs),
    /// Inspect and validate configuration
    Config(ConfigArgs),
    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct LikelihoodArgs {
    /// Number of pairs
    #[arg(long, short = 'p')]
    pairs: u64,

    /// Number of singletons
    #[arg(long, short = 's')]
    singletons: u64,

    /// Number of distinct socks drawn
    #[arg(short = 'k', long = "distinct")]
    k: u64,

    /// Likelihood model
    #[arg(long, value_enum, default_value_t = LikelihoodKind::Fixed)]
    model: LikelihoodKind,
}

/// Overrides applied on top of the loaded analysis configuration.
#[derive(Args, Debug, Default)]
struct AnalysisArgs {
    /// Number of distinct socks drawn
    #[arg(short = 'k', long = "distinct")]
    k: Option<u64>,

    /// Largest number of pairs on the grid
    #[arg(long)]
    p_max: Option<u64>,

    /// Largest number of singletons on the grid
    #[arg(long)]
    s_max: Option<u64>,

    /// Prior family (default hyperparameters unless the config already uses it)
    #[arg(long, value_enum, conflicts_with = "no_prior")]
    prior: Option<PriorKind>,

    /// Drop the configured prior and fall back to the flat prior
    #[arg(long)]
    no_prior: bool,

    /// Likelihood model
    #[arg(long, value_enum)]
    likelihood: Option<LikelihoodKind>,

    /// Evaluate grid points on one thread
    #[arg(long)]
    sequential: bool,
}

#[derive(Args, Debug)]
struct PosteriorArgs {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Number of most probable points to print
    #[arg(long, default_value_t = 20, conflicts_with = "all")]
    top: usize,

    /// Print every grid point
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Number of pairs
    #[arg(long, short = 'p')]
    pairs: u64,

    /// Number of singletons
    #[arg(long, short = 's')]
    singletons: u64,

    /// Number of socks drawn
    #[arg(short = 'k', long = "distinct")]
    k: u64,

    /// Number of simulated draws
    #[arg(long, default_value_t = 100_000)]
    draws: u64,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved configuration)
        path: Option<PathBuf>,
    },
    /// Print a JSON schema
    Schema {
        /// Type name
        #[arg(default_value = DEFAULT_SCHEMA)]
        name: String,

        /// List available schema names
        #[arg(long)]
        list: bool,
    },
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] PosteriorError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("unknown schema type: {0}")]
    UnknownSchema(String),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Config(ValidationError::IoError(_)) => ExitCode::IoError,
            CliError::Config(_) => ExitCode::ConfigError,
            CliError::Inference(PosteriorError::InvalidPriorParams { .. }) => ExitCode::ConfigError,
            CliError::Inference(_) => ExitCode::InferenceError,
            CliError::Simulation(_) | CliError::UnknownSchema(_) => ExitCode::ArgsError,
            CliError::Output(_) => ExitCode::IoError,
            CliError::Serialize(e) if e.is_io() => ExitCode::IoError,
            CliError::Serialize(_) => ExitCode::InternalError,
        }
    }

    /// Stable numeric code of the underlying error, when it has one.
    fn error_code(&self) -> Option<u32> {
        match self {
            CliError::Config(e) => Some(e.code()),
            CliError::Inference(e) => Some(e.code()),
            _ => None,
        }
    }
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Ok,
                _ => ExitCode::ArgsError,
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(log_level, cli.global.log_format));

    let run_id = generate_run_id();
    let command = command_name(&cli.command);
    let span = run_span(&run_id, command);
    let _entered = span.enter();
    debug!(format = %cli.global.format, "Starting command");

    let result = match &cli.command {
        Commands::Likelihood(args) => run_likelihood(&cli.global, &run_id, args),
        Commands::Posterior(args) => run_posterior(&cli.global, &run_id, args),
        Commands::Summary(args) => run_summary(&cli.global, &run_id, args),
        Commands::Marginal(args) => run_marginal(&cli.global, &run_id, args),
        Commands::Simulate(args) => run_simulate(&cli.global, &run_id, args),
        Commands::Config(args) => run_config(&cli.global, &run_id, args),
        Commands::Version => emit(&cli.global, &run_id, command, &VersionReport::default(), None)
            .map(|_| ExitCode::Ok),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(err) => report_error(&cli.global, &run_id, command, &err),
    };
    std::process::exit(exit_code.as_i32());
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Likelihood(_) => "likelihood",
        Commands::Posterior(_) => "posterior",
        Commands::Summary(_) => "summary",
        Commands::Marginal(_) => "marginal",
        Commands::Simulate(_) => "simulate",
        Commands::Config(args) => match args.command {
            ConfigCommands::Show => "config show",
            ConfigCommands::Validate { .. } => "config validate",
            ConfigCommands::Schema { .. } => "config schema",
        },
        Commands::Version => "version",
    }
}

// ============================================================================
// Commands
// ============================================================================

fn run_likelihood(
    global: &GlobalOpts,
    run_id: &str,
    args: &LikelihoodArgs,
) -> Result<ExitCode, CliError> {
    let value = match args.model {
        LikelihoodKind::Fixed => log_likelihood(args.pairs, args.singletons, args.k),
        LikelihoodKind::Stopped => log_likelihood_stopped(args.pairs, args.singletons, args.k),
    };
    let report = LikelihoodReport {
        p: args.pairs,
        s: args.singletons,
        k: args.k,
        n: args.pairs.saturating_mul(2).saturating_add(args.singletons),
        model: args.model.to_string(),
        log_likelihood: value,
        likelihood: value.exp(),
    };
    emit(global, run_id, "likelihood", &report, None)?;
    Ok(ExitCode::Ok)
}

fn run_posterior(
    global: &GlobalOpts,
    run_id: &str,
    args: &PosteriorArgs,
) -> Result<ExitCode, CliError> {
    let (loaded, table) = run_analysis(global, &args.analysis)?;
    let top = if args.all { None } else { Some(args.top) };
    let report = PosteriorReport::from_table(&table, top);
    emit(global, run_id, "posterior", &report, Some(&loaded))?;
    Ok(ExitCode::Ok)
}

fn run_summary(global: &GlobalOpts, run_id: &str, args: &AnalysisArgs) -> Result<ExitCode, CliError> {
    let (loaded, table) = run_analysis(global, args)?;
    let report = SummaryReport {
        summary: table.summary(),
    };
    emit(global, run_id, "summary", &report, Some(&loaded))?;
    Ok(ExitCode::Ok)
}

fn run_marginal(global: &GlobalOpts, run_id: &str, args: &AnalysisArgs) -> Result<ExitCode, CliError> {
    let (loaded, table) = run_analysis(global, args)?;
    let report = MarginalReport::from_table(&table);
    emit(global, run_id, "marginal", &report, Some(&loaded))?;
    Ok(ExitCode::Ok)
}

fn run_simulate(global: &GlobalOpts, run_id: &str, args: &SimulateArgs) -> Result<ExitCode, CliError> {
    let comparison = simulate::compare(args.pairs, args.singletons, args.k, args.draws, args.seed)?;
    let report = SimulationReport { comparison };
    emit(global, run_id, "simulate", &report, None)?;
    Ok(ExitCode::Ok)
}

fn run_config(global: &GlobalOpts, run_id: &str, args: &ConfigArgs) -> Result<ExitCode, CliError> {
    match &args.command {
        ConfigCommands::Show => {
            let loaded = load_config(global.config.as_deref())?;
            let report = ConfigReport {
                source: loaded.location.source.to_string(),
                path: display_path(loaded.location.path.as_deref()),
                config: loaded.config.clone(),
            };
            emit(global, run_id, "config show", &report, Some(&loaded))?;
            Ok(ExitCode::Ok)
        }
        ConfigCommands::Validate { path } => {
            let target = path.as_deref().or(global.config.as_deref());
            let (report, code) = match load_config(target) {
                Ok(loaded) => (
                    ValidationReport {
                        path: display_path(loaded.location.path.as_deref()),
                        valid: true,
                        error: None,
                        code: None,
                    },
                    ExitCode::Ok,
                ),
                Err(err) => {
                    info!(code = err.code(), "Configuration is invalid: {}", err);
                    let report = ValidationReport {
                        path: display_path(target),
                        valid: false,
                        error: Some(err.to_string()),
                        code: Some(err.code()),
                    };
                    (report, CliError::Config(err).exit_code())
                }
            };
            emit(global, run_id, "config validate", &report, None)?;
            Ok(code)
        }
        ConfigCommands::Schema { name, list } => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            if *list {
                for (schema, description) in available_schemas() {
                    writeln!(out, "{:<22} {}", schema, description)?;
                }
            } else {
                let schema =
                    generate_schema(name).ok_or_else(|| CliError::UnknownSchema(name.clone()))?;
                serde_json::to_writer_pretty(&mut out, &schema)?;
                writeln!(out)?;
            }
            out.flush()?;
            Ok(ExitCode::Ok)
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Load the configuration, apply CLI overrides and compute the posterior.
fn run_analysis(
    global: &GlobalOpts,
    args: &AnalysisArgs,
) -> Result<(LoadedConfig, PosteriorTable), CliError> {
    let mut loaded = load_config(global.config.as_deref())?;
    debug!(
        source = %loaded.location.source,
        path = ?loaded.location.path,
        "Configuration loaded"
    );
    apply_overrides(&mut loaded.config, args);
    loaded.validate()?;

    let config = &loaded.config;
    let prior = PriorModel::from_config(config.prior.as_ref())?;
    let likelihood = LikelihoodModel::from(config.likelihood);
    let options = PosteriorOptions::from_config(config);
    info!(
        k = config.observation.k,
        p_max = config.grid.p_max,
        s_max = config.grid.s_max,
        prior = %config.prior_label(),
        likelihood = likelihood.name(),
        "Computing grid posterior"
    );

    let table = grid_posterior_with(
        config.grid.into(),
        config.observation.k,
        &likelihood,
        prior.as_ref().map(|p| p as &dyn LogPrior),
        &options,
    )?;
    Ok((loaded, table))
}

fn apply_overrides(config: &mut AnalysisConfig, args: &AnalysisArgs) {
    if let Some(k) = args.k {
        config.observation.k = k;
    }
    if let Some(p_max) = args.p_max {
        config.grid.p_max = p_max;
    }
    if let Some(s_max) = args.s_max {
        config.grid.s_max = s_max;
    }
    if let Some(kind) = args.prior {
        let same_family = config.prior.as_ref().map(PriorConfig::kind) == Some(kind);
        if !same_family {
            config.prior = Some(PriorConfig::default_for(kind));
        }
    }
    if args.no_prior {
        config.prior = None;
    }
    if let Some(likelihood) = args.likelihood {
        config.likelihood = likelihood;
    }
    if args.sequential {
        config.parallel = false;
    }
}

fn display_path(path: Option<&Path>) -> Option<String> {
    path.map(|p| p.display().to_string())
}

/// Write a payload to stdout in the selected format.
fn emit<T>(
    global: &GlobalOpts,
    run_id: &str,
    command: &str,
    payload: &T,
    loaded: Option<&LoadedConfig>,
) -> Result<(), CliError>
where
    T: serde::Serialize + Render,
{
    let snapshot = loaded.map(LoadedConfig::snapshot);
    let mut envelope = Envelope::new(run_id, command, payload);
    if let Some(snapshot) = &snapshot {
        envelope = envelope.with_config(snapshot);
    }
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_output(&mut out, global.format, &envelope)?;
    out.flush()?;
    Ok(())
}

/// Print an error to stderr in the selected format and pick the exit code.
fn report_error(global: &GlobalOpts, run_id: &str, command: &str, err: &CliError) -> ExitCode {
    let exit_code = err.exit_code();
    error!(exit_code = %exit_code, "{}", err);

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": OUTPUT_SCHEMA_VERSION,
                "run_id": run_id,
                "command": command,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "error": {
                    "code": err.error_code(),
                    "exit_code": exit_code.as_i32(),
                    "kind": exit_code.code_name(),
                    "message": err.to_string(),
                }
            });
            match serde_json::to_string_pretty(&response) {
                Ok(text) => eprintln!("{}", text),
                Err(_) => eprintln!("error: {}", err),
            }
        }
        OutputFormat::Summary => {
            eprintln!("[{}] {} error: {}", run_id, command, err);
        }
        OutputFormat::Md => {
            eprintln!("# Error");
            eprintln!();
            eprintln!("Error: {}", err);
        }
    }

    exit_code
}
