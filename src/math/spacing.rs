//! Sample grids for resampling and discretization.
//!
//! Both generators include the endpoints exactly (the last sample is pinned to
//! `max` rather than accumulated) so a resampling request for `[1, 100]` never
//! reaches a hair past the data hull.

use crate::error::{AppError, Result};

/// Upper bound on the samples a single discretization may allocate.
pub const MAX_DEPTH_SAMPLES: usize = 1_000_000;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::input(format!(
            "invalid log range: min={min}, max={max} (must be finite, >0, and max>min)"
        )));
    }
    if steps < 2 {
        return Err(AppError::input(format!("number of points must be >= 2, not {steps}")));
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    out.push(min);
    for i in 1..steps - 1 {
        out.push((ln_min + step * i as f64).exp());
    }
    out.push(max);
    Ok(out)
}

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn lin_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(AppError::input(format!(
            "invalid linear range: min={min}, max={max} (must be finite and max>min)"
        )));
    }
    if steps < 2 {
        return Err(AppError::input(format!("number of points must be >= 2, not {steps}")));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out = Vec::with_capacity(steps);
    out.push(min);
    for i in 1..steps - 1 {
        out.push(min + step * i as f64);
    }
    out.push(max);
    Ok(out)
}

/// Depth samples `0, dy, 2dy, ..., max_depth` used by discretization.
///
/// The count is `round(max_depth / dy) + 1`, so `max_depth` need not be an
/// exact multiple of `dy`.
pub fn depth_grid(max_depth: f64, dy: f64) -> Result<Vec<f64>> {
    if !(max_depth.is_finite() && max_depth > 0.0) {
        return Err(AppError::input(format!("maximum depth must be > 0, not {max_depth}")));
    }
    if !(dy.is_finite() && dy > 0.0) {
        return Err(AppError::input(format!("depth increment must be > 0, not {dy}")));
    }
    let steps = (max_depth / dy).round();
    if !(steps < MAX_DEPTH_SAMPLES as f64) {
        return Err(AppError::input(format!(
            "depth increment {dy} over {max_depth} needs more than {MAX_DEPTH_SAMPLES} samples"
        )));
    }
    let n = steps as usize + 1;
    if n < 2 {
        return Ok(vec![0.0, max_depth]);
    }
    lin_space(0.0, max_depth, n)
}
