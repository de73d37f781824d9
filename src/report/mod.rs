//! Reporting utilities: summary statistics and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the library types stay free of presentation concerns
//! - output changes are localized (important for future snapshot tests)

pub mod format;

pub use format::*;

use crate::math::median;

/// Min / median / max of a set of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

/// Spread of the finite entries of `values`; `None` when there are none.
pub fn spread(values: &[f64]) -> Option<Spread> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let median = median(&finite)?;
    Some(Spread {
        min: finite.iter().copied().fold(f64::INFINITY, f64::min),
        median,
        max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Depth and value of the largest finite entry of a depth profile; ties go to the deeper sample.
pub fn profile_peak(depth: &[f64], values: &[f64]) -> Option<(f64, f64)> {
    depth
        .iter()
        .zip(values)
        .filter(|(_, v)| v.is_finite())
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(d, v)| (*d, *v))
}
