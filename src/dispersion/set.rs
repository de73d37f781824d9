//! Rayleigh and Love curves computed for one ground model.

use std::collections::BTreeMap;

use crate::domain::Polarization;
use crate::dispersion::curve::DispersionCurve;
use crate::error::{AppError, Result};
use crate::io::geopsy::model_header;

/// Curves keyed by mode number.
pub type ModeCurves = BTreeMap<u32, DispersionCurve>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispersionSet {
    rayleigh: ModeCurves,
    love: ModeCurves,
}

impl DispersionSet {
    pub fn new(rayleigh: ModeCurves, love: ModeCurves) -> Result<Self> {
        if rayleigh.is_empty() && love.is_empty() {
            return Err(AppError::input("a dispersion set needs at least one Rayleigh or Love curve"));
        }
        Ok(Self { rayleigh, love })
    }

    pub fn rayleigh(&self) -> &ModeCurves {
        &self.rayleigh
    }

    pub fn love(&self) -> &ModeCurves {
        &self.love
    }

    pub fn curves(&self, polarization: Polarization) -> &ModeCurves {
        match polarization {
            Polarization::Rayleigh => &self.rayleigh,
            Polarization::Love => &self.love,
        }
    }

    pub fn curve(&self, polarization: Polarization, mode: u32) -> Option<&DispersionCurve> {
        self.curves(polarization).get(&mode)
    }

    /// One engine block per polarization present.
    pub fn to_geopsy_text(&self, identifier: u64, misfit: Option<f64>) -> String {
        let mut out = String::new();
        for polarization in [Polarization::Rayleigh, Polarization::Love] {
            let curves = self.curves(polarization);
            if curves.is_empty() {
                continue;
            }
            out.push_str(&model_header(identifier, Some(misfit.unwrap_or(0.0))));
            out.push('\n');
            out.push_str(&format!(
                "# {} {} dispersion mode(s)\n# CPU Time = 0 ms\n",
                curves.len(),
                polarization.engine_name()
            ));
            for (mode, curve) in curves {
                out.push_str(&format!("# Mode {mode}\n"));
                out.push_str(&curve.to_text());
            }
        }
        out
    }
}
