//! Diagnostic logging to stderr.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Builds the filter for `level`. `RUST_LOG`, when set, replaces it.
///
/// Dependencies log at `warn` unless the level asks for less.
pub fn filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(format!("warn,leo_cli={level},leo={level}"))
        .with_context(|| format!("Invalid log level: '{level}'"))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(level: &str) -> Result<()> {
    let filter = filter(level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
    Ok(())
}
