//! Diagnostic logging.
//!
//! Stdout carries the MCP protocol, so log records go to stderr or, when a
//! path is given, are appended to that file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Checked before `RUST_LOG`.
pub const LOG_FILTER_ENV: &str = "SHEETBRIDGE_LOG";
const DEFAULT_FILTER: &str = "info";

fn resolve_env_filter() -> EnvFilter {
    if let Ok(filter) = std::env::var(LOG_FILTER_ENV) {
        if let Ok(filter) = EnvFilter::try_new(filter) {
            return filter;
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Calling it again is a no-op.
///
/// Fails only when `log_file` cannot be opened for appending.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), std::io::Error> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(resolve_env_filter())
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }

    Ok(())
}
