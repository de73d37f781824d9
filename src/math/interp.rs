//! Piecewise-linear interpolation over sorted abscissae.

use crate::error::{AppError, Result};

/// Interpolate `ys(xs)` at each of `targets`.
///
/// `xs` must be strictly increasing. Targets outside `[xs[0], xs[n-1]]` are
/// rejected rather than extrapolated.
pub fn interp_linear(xs: &[f64], ys: &[f64], targets: &[f64]) -> Result<Vec<f64>> {
    if xs.len() != ys.len() {
        return Err(AppError::input(format!(
            "interpolation needs equal lengths, got {} abscissae and {} ordinates",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(AppError::input("interpolation needs at least two points"));
    }
    if xs.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(AppError::input("interpolation abscissae must be strictly increasing"));
    }

    let lo = xs[0];
    let hi = xs[xs.len() - 1];
    let tol = 1e-9 * (hi - lo).abs().max(1.0);

    targets
        .iter()
        .map(|&t| {
            if !(t >= lo - tol && t <= hi + tol) {
                return Err(AppError::Domain(format!(
                    "{t} lies outside the data range [{lo}, {hi}]"
                )));
            }
            let t = t.clamp(lo, hi);
            // Index of the first abscissa >= t.
            let upper = xs.partition_point(|&x| x < t).max(1);
            let (x0, x1) = (xs[upper - 1], xs[upper]);
            let (y0, y1) = (ys[upper - 1], ys[upper]);
            let u = (t - x0) / (x1 - x0);
            Ok(y0 + u * (y1 - y0))
        })
        .collect()
}
