//! A theoretical dispersion curve computed by the engine.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispersionCurve {
    frequency: Vec<f64>,
    velocity: Vec<f64>,
}

impl DispersionCurve {
    pub fn new(frequency: Vec<f64>, velocity: Vec<f64>) -> Result<Self> {
        if frequency.is_empty() || frequency.len() != velocity.len() {
            return Err(AppError::input(format!(
                "dispersion curve needs equal non-empty frequency and velocity, found {} and {}",
                frequency.len(),
                velocity.len()
            )));
        }
        if let Some(v) = velocity.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(AppError::input(format!("dispersion velocity must be > 0, not {v}")));
        }
        Ok(Self { frequency, velocity })
    }

    /// Build from `(frequency, slowness)` rows.
    pub fn from_slowness(rows: &[(f64, f64)]) -> Result<Self> {
        let frequency = rows.iter().map(|r| r.0).collect();
        let velocity = rows.iter().map(|r| 1.0 / r.1).collect();
        Self::new(frequency, velocity)
    }

    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }

    pub fn frequency(&self) -> &[f64] {
        &self.frequency
    }

    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn wavelength(&self) -> Vec<f64> {
        self.velocity.iter().zip(&self.frequency).map(|(v, f)| v / f).collect()
    }

    pub fn slowness(&self) -> Vec<f64> {
        self.velocity.iter().map(|v| 1.0 / v).collect()
    }

    /// `frequency slowness` rows as the engine writes them.
    pub fn to_text(&self) -> String {
        self.frequency
            .iter()
            .zip(self.slowness())
            .map(|(f, p)| format!("{f} {p}\n"))
            .collect()
    }
}

/// Curves compare equal when every value agrees to six decimals.
impl PartialEq for DispersionCurve {
    fn eq(&self, other: &Self) -> bool {
        let same = |a: &[f64], b: &[f64]| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x * 1e6).round() == (y * 1e6).round())
        };
        same(&self.frequency, &other.frequency) && same(&self.velocity, &other.velocity)
    }
}
