//! Export suite statistics to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::ground::SigmaLn;

/// Write a `depth,sigma_ln_<parameter>` table.
pub fn write_sigma_csv(path: &Path, sigma: &SigmaLn) -> Result<()> {
    let mut file = File::create(path).map_err(|e| AppError::io(path, e))?;

    writeln!(file, "depth,sigma_ln_{}", sigma.parameter).map_err(|e| AppError::io(path, e))?;

    for (depth, value) in sigma.depth.iter().zip(&sigma.sigma) {
        writeln!(file, "{depth:.4},{value:.6}").map_err(|e| AppError::io(path, e))?;
    }

    Ok(())
}

/// Write one `rank,identifier,misfit,vs30` row per suite member.
pub fn write_vs30_csv(path: &Path, identifiers: &[u64], misfits: &[Option<f64>], vs30: &[f64]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| AppError::io(path, e))?;

    writeln!(file, "rank,identifier,misfit,vs30").map_err(|e| AppError::io(path, e))?;

    for (rank, ((id, misfit), vs30)) in identifiers.iter().zip(misfits).zip(vs30).enumerate() {
        writeln!(
            file,
            "{rank},{id},{},{vs30:.3}",
            misfit.map(|m| format!("{m:.6}")).unwrap_or_default()
        )
        .map_err(|e| AppError::io(path, e))?;
    }

    Ok(())
}
