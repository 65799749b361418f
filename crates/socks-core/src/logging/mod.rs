//! Structured logging for the socks CLI.
//!
//! - stdout is reserved for command payloads (JSON/MD output)
//! - stderr receives all log output, human-readable or JSONL
//! - every invocation carries a `run_id` span field for correlation

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel, ENV_LOG, ENV_LOG_FORMAT};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// Returns false if a subscriber was already installed (e.g. by a test).
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_new(config.filter_directive())
        .unwrap_or_else(|_| EnvFilter::new(format!("socks={0},socks_core={0}", config.level)));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
                    .is_ok()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
                    .is_ok()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
                .is_ok()
        }
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("run-{}", &uuid.simple().to_string()[..12])
}

/// Root span for one CLI command.
pub fn run_span(run_id: &str, command: &str) -> tracing::Span {
    tracing::info_span!("run", run_id = %run_id, command = %command)
}
