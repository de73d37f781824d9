//! Read/write suite statistics JSON files.
//!
//! The summary is the portable record of a `swprep stats` run:
//! - where the models came from and how many were kept
//! - misfit range and Vs30 spread
//! - the sigma_ln profile

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::ground::SigmaLn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub source: PathBuf,
    pub models: usize,
    pub misfit_range: Option<(f64, f64)>,
    pub vs30: Vec<f64>,
    pub vs30_median: Option<f64>,
    pub sigma_ln: SigmaLn,
}

/// Write a stats summary JSON file.
pub fn write_stats_json(path: &Path, summary: &StatsSummary) -> Result<()> {
    let file = File::create(path).map_err(|e| AppError::io(path, e))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::Config(format!("failed to write stats JSON '{}': {e}", path.display())))?;
    Ok(())
}

/// Read a stats summary JSON file.
pub fn read_stats_json(path: &Path) -> Result<StatsSummary> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::format(format!("stats JSON '{}'", path.display()), "a stats summary", e.to_string()))
}
