//! Diagnostic logging for the `swprep` binary.
//!
//! The library only emits `tracing` events; this installs the subscriber.
//! `RUST_LOG` wins over the `--log-level` flag when set. Output goes to
//! stderr so reports on stdout stay clean.

use tracing_subscriber::EnvFilter;

use crate::domain::LogLevel;
use crate::error::{AppError, Result};

pub fn init_logging(level: LogLevel) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| AppError::Config(format!("failed to install logger: {e}")))
}
