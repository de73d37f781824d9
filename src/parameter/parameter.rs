//! Layer-wise search bounds for one ground-model profile.
//!
//! A [`Parameter`] holds, for each of its N layers:
//!
//! - layer bounds `lay_min[i] <= lay_max[i]`, either thicknesses or depths to
//!   the layer bottom depending on [`LayerKind`]
//! - value bounds `par_min[i] <= par_max[i]`
//! - `par_rev[i]`, whether the value may decrease relative to the layer above
//!
//! The factories mirror the layering schemes understood by Dinver:
//!
//! - `FX`  one fixed value, no depth dependence
//! - `FTL` N layers of a fixed thickness
//! - `LN`  layering by number: N layers whose bottoms range over the
//!   resolvable depth `[wmin/3, wmax/depth_factor]`
//! - `LR`  layering ratio: layer bottoms growing geometrically by `lr`
//! - `CT` / `CD` custom thickness / depth bounds given layer by layer
//!
//! Every factory validates its inputs and either returns a fully consistent
//! parameter or an `InvalidInput` error; nothing is swapped or clamped.

use serde::{Deserialize, Serialize};

use crate::domain::{LayerKind, ProfileKind};
use crate::error::{AppError, Result};

/// Default ratio between the maximum wavelength and the maximum resolvable depth.
pub const DEFAULT_DEPTH_FACTOR: f64 = 2.0;

/// Layer bounds the engine expects for a fixed (`FX`) profile.
const FIXED_LAYER_MIN: f64 = 1824.0;
const FIXED_LAYER_MAX: f64 = 1883.0;

/// How a parameter's layer bounds were generated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum Layering {
    Fixed { value: f64 },
    FixedThickness { nlayers: usize, thickness: f64 },
    ByNumber { nlayers: usize },
    Ratio { lr: f64 },
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    lay_min: Vec<f64>,
    lay_max: Vec<f64>,
    par_min: Vec<f64>,
    par_max: Vec<f64>,
    par_rev: Vec<bool>,
    kind: LayerKind,
    layering: Layering,
    linked: Option<ProfileKind>,
}

impl Parameter {
    /// Custom parameter from explicit per-layer bounds (`CT` or `CD`).
    pub fn new(
        lay_min: Vec<f64>,
        lay_max: Vec<f64>,
        par_min: Vec<f64>,
        par_max: Vec<f64>,
        par_rev: Vec<bool>,
        kind: LayerKind,
    ) -> Result<Self> {
        check_bounds("lay_min", &lay_min, "lay_max", &lay_max)?;
        check_bounds("par_min", &par_min, "par_max", &par_max)?;
        let n = lay_min.len();
        if par_min.len() != n || par_rev.len() != n {
            return Err(AppError::input(format!(
                "all per-layer inputs must have the same length: {} layer bounds, {} value bounds, {} reversal flags",
                n,
                par_min.len(),
                par_rev.len()
            )));
        }
        if lay_min.iter().any(|&v| v < 0.0) {
            return Err(AppError::input("layer bounds must be >= 0"));
        }

        Ok(Self {
            lay_min,
            lay_max,
            par_min,
            par_max,
            par_rev,
            kind,
            layering: Layering::Custom,
            linked: None,
        })
    }

    /// Single layer fixed at `value` (`FX`).
    pub fn from_fx(value: f64) -> Result<Self> {
        if !(value.is_finite() && value > 0.0) {
            return Err(AppError::input(format!("fixed value must be positive, not {value}")));
        }
        let mut par = Self::new(
            vec![FIXED_LAYER_MIN],
            vec![FIXED_LAYER_MAX],
            vec![value],
            vec![value],
            vec![false],
            LayerKind::Thickness,
        )?;
        par.layering = Layering::Fixed { value };
        Ok(par)
    }

    /// `nlayers` layers of exactly `thickness` each (`FTL`).
    pub fn from_ftl(nlayers: usize, thickness: f64, par_min: f64, par_max: f64, par_rev: bool) -> Result<Self> {
        if nlayers < 1 {
            return Err(AppError::input("number of layers must be >= 1"));
        }
        if !(thickness.is_finite() && thickness > 0.0) {
            return Err(AppError::input(format!("layer thickness must be positive, not {thickness}")));
        }
        let (pmin, pmax, prev) = repeat_bounds(nlayers, par_min, par_max, par_rev)?;
        let mut par = Self::new(
            vec![thickness; nlayers],
            vec![thickness; nlayers],
            pmin,
            pmax,
            prev,
            LayerKind::Thickness,
        )?;
        par.layering = Layering::FixedThickness { nlayers, thickness };
        Ok(par)
    }

    /// Layering by number (`LN`).
    ///
    /// Every layer bottom may fall anywhere in `[wmin/3, wmax/depth_factor]`;
    /// the engine keeps the bottoms ordered through the space script written
    /// alongside the parameterization.
    pub fn from_ln(
        wmin: f64,
        wmax: f64,
        nlayers: usize,
        par_min: f64,
        par_max: f64,
        par_rev: bool,
        depth_factor: f64,
    ) -> Result<Self> {
        check_wavelengths(wmin, wmax)?;
        check_depth_factor(depth_factor)?;
        if nlayers < 1 {
            return Err(AppError::input("number of layers must be >= 1"));
        }

        let dmin = wmin / 3.0;
        let dmax = wmax / depth_factor;
        if dmin > dmax {
            return Err(AppError::input(format!(
                "wavelength range too narrow: minimum depth {dmin} exceeds maximum depth {dmax}"
            )));
        }

        let (pmin, pmax, prev) = repeat_bounds(nlayers, par_min, par_max, par_rev)?;
        let mut par = Self::new(vec![dmin; nlayers], vec![dmax; nlayers], pmin, pmax, prev, LayerKind::Depth)?;
        par.layering = Layering::ByNumber { nlayers };
        Ok(par)
    }

    /// Layering ratio (`LR`).
    pub fn from_lr(
        wmin: f64,
        wmax: f64,
        lr: f64,
        par_min: f64,
        par_max: f64,
        par_rev: bool,
        depth_factor: f64,
    ) -> Result<Self> {
        let (lay_min, lay_max) = depth_lr(wmin, wmax, lr, depth_factor)?;
        let (pmin, pmax, prev) = repeat_bounds(lay_min.len(), par_min, par_max, par_rev)?;
        let mut par = Self::new(lay_min, lay_max, pmin, pmax, prev, LayerKind::Depth)?;
        par.layering = Layering::Ratio { lr };
        Ok(par)
    }

    /// Copy `existing`'s layer bounds with new value bounds, linking the
    /// result to the `ptype` profile.
    pub fn from_parameter_and_link(
        par_min: f64,
        par_max: f64,
        par_rev: bool,
        existing: &Parameter,
        ptype: ProfileKind,
    ) -> Result<Self> {
        let n = existing.nlayers();
        if n == 0 {
            return Err(AppError::input("cannot link to a parameter with no layers"));
        }
        let (pmin, pmax, prev) = repeat_bounds(n, par_min, par_max, par_rev)?;
        let mut par = Self::new(
            existing.lay_min.clone(),
            existing.lay_max.clone(),
            pmin,
            pmax,
            prev,
            existing.kind,
        )?;
        par.linked = Some(ptype);
        Ok(par)
    }

    /// Attach link metadata, e.g. when restoring a parsed parameterization.
    pub(crate) fn with_link(mut self, linked: Option<ProfileKind>) -> Self {
        self.linked = linked;
        self
    }

    pub fn nlayers(&self) -> usize {
        self.lay_min.len()
    }

    pub fn lay_min(&self) -> &[f64] {
        &self.lay_min
    }

    pub fn lay_max(&self) -> &[f64] {
        &self.lay_max
    }

    pub fn par_min(&self) -> &[f64] {
        &self.par_min
    }

    pub fn par_max(&self) -> &[f64] {
        &self.par_max
    }

    pub fn par_rev(&self) -> &[bool] {
        &self.par_rev
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn layering(&self) -> Layering {
        self.layering
    }

    pub fn linked(&self) -> Option<ProfileKind> {
        self.linked
    }

    /// Engine tag for the layering scheme.
    pub fn lay_type(&self) -> &'static str {
        match self.layering {
            Layering::Fixed { .. } => "FX",
            Layering::FixedThickness { .. } => "FTL",
            Layering::ByNumber { .. } => "LN",
            Layering::Ratio { .. } => "LR",
            Layering::Custom => match self.kind {
                LayerKind::Thickness => "CT",
                LayerKind::Depth => "CD",
            },
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.lay_min == other.lay_min
            && self.lay_max == other.lay_max
            && self.par_min == other.par_min
            && self.par_max == other.par_max
            && self.par_rev == other.par_rev
    }
}

/// Layer-bottom depth bounds for the layering-ratio scheme.
///
/// The first layer bottom lies in `[wmin/3, wmin/2]`; each further layer's
/// maximum bottom grows the previous layer's maximum thickness by `lr`, until
/// the maximum depth `wmax/depth_factor` is passed. The final boundary is then
/// pulled back to exactly that depth and a half-space layer appended.
pub fn depth_lr(wmin: f64, wmax: f64, lr: f64, depth_factor: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    check_wavelengths(wmin, wmax)?;
    check_depth_factor(depth_factor)?;
    if !(lr.is_finite() && lr > 1.0) {
        return Err(AppError::input(format!("layering ratio must be > 1, not {lr}")));
    }

    let dmax = wmax / depth_factor;
    let mut mins = vec![wmin / 3.0];
    let mut maxs = vec![wmin / 2.0];
    if maxs[0] >= dmax {
        return Err(AppError::input(format!(
            "wavelength range too narrow: first layer bottom {} already reaches maximum depth {dmax}",
            maxs[0]
        )));
    }

    while let Some(&last) = maxs.last() {
        if last >= dmax {
            break;
        }
        mins.push(last);
        let next = match maxs.len() {
            1 => last * lr + last,
            n => (last - maxs[n - 2]) * lr + last,
        };
        maxs.push(next);
    }

    let n = maxs.len();
    let penultimate = maxs[n - 2];
    let before = if n >= 3 { maxs[n - 3] } else { 0.0 };
    if dmax - penultimate > penultimate - before {
        maxs[n - 1] = dmax;
        mins.push(dmax);
        maxs.push(dmax + 1.0);
    } else {
        maxs[n - 2] = dmax;
        mins[n - 1] = dmax;
        maxs[n - 1] = dmax + 1.0;
    }
    Ok((mins, maxs))
}

fn check_wavelengths(wmin: f64, wmax: f64) -> Result<()> {
    if !(wmin.is_finite() && wmin > 0.0) {
        return Err(AppError::input(format!("minimum wavelength must be > 0, not {wmin}")));
    }
    if !(wmax.is_finite() && wmax > wmin) {
        return Err(AppError::input(format!(
            "maximum wavelength ({wmax}) must be greater than minimum wavelength ({wmin})"
        )));
    }
    Ok(())
}

fn check_depth_factor(depth_factor: f64) -> Result<()> {
    if !(depth_factor.is_finite() && depth_factor >= 2.0) {
        return Err(AppError::input(format!("depth factor must be >= 2, not {depth_factor}")));
    }
    Ok(())
}

fn check_bounds(lower_name: &str, lower: &[f64], upper_name: &str, upper: &[f64]) -> Result<()> {
    if lower.is_empty() {
        return Err(AppError::input(format!("`{lower_name}` must contain at least one layer")));
    }
    if lower.len() != upper.len() {
        return Err(AppError::input(format!(
            "`{lower_name}` and `{upper_name}` must be the same length ({} != {})",
            lower.len(),
            upper.len()
        )));
    }
    for (index, (lo, hi)) in lower.iter().zip(upper).enumerate() {
        if !(lo.is_finite() && hi.is_finite()) {
            return Err(AppError::input(format!("`{lower_name}[{index}]` and `{upper_name}[{index}]` must be finite")));
        }
        if lo > hi {
            return Err(AppError::input(format!(
                "`{upper_name}[{index}]` ({hi}) must be >= `{lower_name}[{index}]` ({lo})"
            )));
        }
    }
    Ok(())
}

fn repeat_bounds(n: usize, par_min: f64, par_max: f64, par_rev: bool) -> Result<(Vec<f64>, Vec<f64>, Vec<bool>)> {
    if !(par_min.is_finite() && par_max.is_finite()) {
        return Err(AppError::input("value bounds must be finite"));
    }
    if par_min > par_max {
        return Err(AppError::input(format!(
            "par_min ({par_min}) must be <= par_max ({par_max})"
        )));
    }
    Ok((vec![par_min; n], vec![par_max; n], vec![par_rev; n]))
}
