//! Crate-wide error type.
//!
//! Every fallible operation returns [`AppError`]. The variants follow the
//! failure classes a caller has to tell apart:
//!
//! - `InvalidInput`: bad numeric ranges handed to a factory or resampler
//! - `Format`: a `.param` / `.target` / text dump that does not parse
//! - `Statistics`: a statistic whose preconditions are not met
//! - `Domain`: a request outside the data (e.g. extrapolation)
//! - `Io` / `Config`: filesystem and recipe problems
//!
//! The binary maps each class onto a process exit code via [`AppError::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("malformed {context}: expected {expected}, found {found}")]
    Format {
        context: String,
        expected: String,
        found: String,
    },

    #[error("statistics unavailable: {0}")]
    Statistics(String),

    #[error("outside data domain: {0}")]
    Domain(String),

    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AppError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn format(
        context: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::Format {
            context: context.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for the `swprep` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::InvalidInput(_) | AppError::Io { .. } | AppError::Config(_) => 2,
            AppError::Format { .. } => 3,
            AppError::Statistics(_) | AppError::Domain(_) => 4,
        }
    }
}
