//! Shared domain types.
//!
//! These types are small, `Copy` where possible, and serializable so they can be:
//!
//! - selected from the command line (`clap::ValueEnum`)
//! - read from JSON parameterization recipes
//! - passed through the library as closed enums instead of free-form strings

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Geopsy/Dinver release whose file schema is read or written.
///
/// Only these two releases are supported; the bare major versions `2` and `3`
/// are accepted as shorthands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum GeopsyVersion {
    #[serde(rename = "2.10.1", alias = "2")]
    #[value(name = "2.10.1", alias = "2")]
    V2_10_1,
    #[serde(rename = "3.4.2", alias = "3")]
    #[value(name = "3.4.2", alias = "3")]
    V3_4_2,
}

impl GeopsyVersion {
    pub const SUPPORTED: [GeopsyVersion; 2] = [GeopsyVersion::V2_10_1, GeopsyVersion::V3_4_2];

    pub fn as_str(self) -> &'static str {
        match self {
            GeopsyVersion::V2_10_1 => "2.10.1",
            GeopsyVersion::V3_4_2 => "3.4.2",
        }
    }
}

impl Default for GeopsyVersion {
    fn default() -> Self {
        GeopsyVersion::V3_4_2
    }
}

impl fmt::Display for GeopsyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeopsyVersion {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2" | "2.10.1" => Ok(GeopsyVersion::V2_10_1),
            "3" | "3.4.2" => Ok(GeopsyVersion::V3_4_2),
            other => {
                let supported: Vec<&str> = Self::SUPPORTED.iter().map(|v| v.as_str()).collect();
                Err(AppError::input(format!(
                    "Geopsy version '{other}' is not supported, use one of {supported:?}"
                )))
            }
        }
    }
}

/// One of the four layered profiles of a ground model.
///
/// `Pr` is Poisson's ratio, `Rh` is mass density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Vp,
    Pr,
    Vs,
    #[serde(alias = "density")]
    #[value(alias = "density")]
    Rh,
}

impl ProfileKind {
    /// Order in which the engine lists its profiles.
    pub const ENGINE_ORDER: [ProfileKind; 4] =
        [ProfileKind::Vp, ProfileKind::Pr, ProfileKind::Vs, ProfileKind::Rh];

    /// Name used by the engine in `<shortName>` and `linkedTo`.
    pub fn short_name(self) -> &'static str {
        match self {
            ProfileKind::Vp => "Vp",
            ProfileKind::Pr => "Nu",
            ProfileKind::Vs => "Vs",
            ProfileKind::Rh => "Rho",
        }
    }

    pub fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "Vp" => Some(ProfileKind::Vp),
            "Nu" => Some(ProfileKind::Pr),
            "Vs" => Some(ProfileKind::Vs),
            "Rho" => Some(ProfileKind::Rh),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProfileKind::Vp => "vp",
            ProfileKind::Pr => "pr",
            ProfileKind::Vs => "vs",
            ProfileKind::Rh => "rh",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a parameter's layer bounds are thicknesses or depths to layer bottoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Thickness,
    Depth,
}

/// Surface-wave polarization of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    Rayleigh,
    Love,
}

impl Polarization {
    pub fn as_str(self) -> &'static str {
        match self {
            Polarization::Rayleigh => "rayleigh",
            Polarization::Love => "love",
        }
    }

    /// Capitalized form used inside engine files.
    pub fn engine_name(self) -> &'static str {
        match self {
            Polarization::Rayleigh => "Rayleigh",
            Polarization::Love => "Love",
        }
    }
}

impl FromStr for Polarization {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rayleigh" => Ok(Polarization::Rayleigh),
            "love" => Ok(Polarization::Love),
            other => Err(AppError::input(format!(
                "polarization '{other}' is not recognized, use rayleigh or love"
            ))),
        }
    }
}

/// One potential identity of an experimental mode, e.g. fundamental Rayleigh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeDescription {
    pub polarization: Polarization,
    pub mode: u32,
}

impl ModeDescription {
    pub fn new(polarization: Polarization, mode: u32) -> Self {
        Self { polarization, mode }
    }
}

impl Default for ModeDescription {
    fn default() -> Self {
        Self::new(Polarization::Rayleigh, 0)
    }
}

/// Axis along which dispersion data is cut or resampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResampleDomain {
    Frequency,
    Wavelength,
}

/// Point spacing used when generating a resampling grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    Log,
    Linear,
}

/// Depth range over which suite statistics are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthExtent {
    /// Stop at the shallowest half-space top among the members.
    Shallowest,
    /// Evaluate down to this depth, extending every member with its half-space.
    Fixed(f64),
}

impl Default for DepthExtent {
    fn default() -> Self {
        DepthExtent::Shallowest
    }
}

/// Per-profile entry of a JSON parameterization recipe.
///
/// Each variant carries the inputs of the `Parameter` factory of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum ProfileRecipe {
    Fx {
        value: f64,
    },
    Ftl {
        nlayers: usize,
        thickness: f64,
        par_min: f64,
        par_max: f64,
        #[serde(default)]
        par_rev: bool,
    },
    Ln {
        nlayers: usize,
        par_min: f64,
        par_max: f64,
        #[serde(default)]
        par_rev: bool,
    },
    Lr {
        lr: f64,
        par_min: f64,
        par_max: f64,
        #[serde(default)]
        par_rev: bool,
    },
    Linked {
        to: ProfileKind,
        par_min: f64,
        par_max: f64,
        #[serde(default)]
        par_rev: bool,
    },
    Custom {
        lay_min: Vec<f64>,
        lay_max: Vec<f64>,
        par_min: Vec<f64>,
        par_max: Vec<f64>,
        par_rev: Vec<bool>,
        kind: LayerKind,
    },
}

/// A full parameterization recipe as read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamRecipe {
    pub wmin: f64,
    pub wmax: f64,
    #[serde(default = "default_depth_factor")]
    pub depth_factor: f64,
    pub vp: ProfileRecipe,
    pub pr: ProfileRecipe,
    pub vs: ProfileRecipe,
    pub rh: ProfileRecipe,
}

impl ParamRecipe {
    pub fn profile(&self, kind: ProfileKind) -> &ProfileRecipe {
        match kind {
            ProfileKind::Vp => &self.vp,
            ProfileKind::Pr => &self.pr,
            ProfileKind::Vs => &self.vs,
            ProfileKind::Rh => &self.rh,
        }
    }
}

fn default_depth_factor() -> f64 {
    2.0
}

/// Verbosity of the `swprep` binary's diagnostic log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Warn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_accepts_major_shorthand() {
        assert_eq!("2".parse::<GeopsyVersion>().unwrap(), GeopsyVersion::V2_10_1);
        assert_eq!("3.4.2".parse::<GeopsyVersion>().unwrap(), GeopsyVersion::V3_4_2);
        assert!("3.4.1".parse::<GeopsyVersion>().is_err());
    }

    #[test]
    fn profile_short_names_round_trip() {
        for kind in ProfileKind::ENGINE_ORDER {
            assert_eq!(ProfileKind::from_short_name(kind.short_name()), Some(kind));
        }
        assert_eq!(ProfileKind::from_short_name("Qs"), None);
    }

    #[test]
    fn recipe_parses_tagged_profiles() {
        let json = r#"{
            "wmin": 1.0, "wmax": 100.0,
            "vp": {"scheme": "linked", "to": "vs", "par_min": 200, "par_max": 1000},
            "pr": {"scheme": "fx", "value": 0.33},
            "vs": {"scheme": "lr", "lr": 3.0, "par_min": 100, "par_max": 500, "par_rev": true},
            "rh": {"scheme": "fx", "value": 2000}
        }"#;
        let recipe: ParamRecipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.depth_factor, 2.0);
        assert_eq!(recipe.pr, ProfileRecipe::Fx { value: 0.33 });
        assert!(matches!(
            recipe.profile(ProfileKind::Vs),
            ProfileRecipe::Lr { par_rev: true, .. }
        ));
    }
}
