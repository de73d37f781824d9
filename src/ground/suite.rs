//! Ranked collections of ground models and their depth-resolved statistics.

use std::ops::Deref;
use std::path::Path;

use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{DepthExtent, ProfileKind};
use crate::error::{AppError, Result};
use crate::ground::model::{parse_dump, GroundModel};
use crate::math::{median, sample_std};
use crate::suite::{Ranked, Suite};

/// Depth used by [`DepthExtent::Shallowest`] when every member is a pure half-space.
pub const UNBOUNDED_EXTENT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GroundModelSuite {
    suite: Suite<GroundModel>,
}

impl Deref for GroundModelSuite {
    type Target = Suite<GroundModel>;

    fn deref(&self) -> &Self::Target {
        &self.suite
    }
}

/// Depth-resolved log-standard-deviation profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigmaLn {
    pub parameter: ProfileKind,
    pub depth: Vec<f64>,
    pub sigma: Vec<f64>,
}

impl GroundModelSuite {
    pub fn new(members: Vec<Ranked<GroundModel>>) -> Result<Self> {
        if members.is_empty() {
            return Err(AppError::input("a ground-model suite needs at least one model"));
        }
        Ok(Self {
            suite: Suite::new(members),
        })
    }

    /// Suite of unranked models numbered from 0.
    pub fn from_models(models: Vec<GroundModel>) -> Result<Self> {
        Self::new(
            models
                .into_iter()
                .enumerate()
                .map(|(i, m)| Ranked::new(i as u64, None, m))
                .collect(),
        )
    }

    /// Parse up to `max_models` models, keeping file order.
    pub fn from_geopsy(text: &str, max_models: Option<usize>) -> Result<Self> {
        if max_models == Some(0) {
            return Err(AppError::input("max_models must be at least 1"));
        }
        let parsed = parse_dump(text, max_models)?;
        if parsed.is_empty() {
            return Err(AppError::format("ground-model dump", "at least 1 model", "0"));
        }
        debug!(models = parsed.len(), "parsed ground-model dump");
        Self::new(
            parsed
                .into_iter()
                .map(|(id, misfit, model)| Ranked::new(id, misfit, model))
                .collect(),
        )
    }

    pub fn from_geopsy_file(path: &Path, max_models: Option<usize>) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Self::from_geopsy(&text, max_models)
    }

    pub fn nbest(&self, nbest: usize) -> Result<Self> {
        Ok(Self {
            suite: self.suite.nbest(nbest)?,
        })
    }

    pub fn vs30(&self) -> Vec<f64> {
        self.items().map(GroundModel::vs30).collect()
    }

    /// Standard deviation of `ln(parameter)` across members at each depth.
    pub fn sigma_ln(&self, parameter: ProfileKind, dy: f64, extent: DepthExtent) -> Result<SigmaLn> {
        if self.len() < 2 {
            return Err(AppError::Statistics(format!(
                "sigma_ln needs at least 2 models, suite has {}",
                self.len()
            )));
        }
        let max_depth = match extent {
            DepthExtent::Fixed(depth) => depth,
            DepthExtent::Shallowest => self.shallowest_extent(),
        };

        let sampled: Vec<(Vec<f64>, Vec<f64>)> = self
            .members()
            .par_iter()
            .map(|m| m.item.discretize(max_depth, dy, parameter))
            .collect::<Result<_>>()?;

        let depth = sampled[0].0.clone();
        let samples = DMatrix::from_fn(depth.len(), sampled.len(), |row, col| sampled[col].1[row].ln());
        let sigma = samples
            .row_iter()
            .map(|row| {
                let values: Vec<f64> = row.iter().copied().collect();
                sample_std(&values).unwrap_or(f64::NAN)
            })
            .collect();

        debug!(%parameter, max_depth, points = depth.len(), models = self.len(), "computed sigma_ln");
        Ok(SigmaLn {
            parameter,
            depth,
            sigma,
        })
    }

    /// Shallowest half-space top among members that have finite layers.
    fn shallowest_extent(&self) -> f64 {
        self.items()
            .map(GroundModel::half_space_depth)
            .filter(|d| *d > 0.0)
            .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
            .unwrap_or(UNBOUNDED_EXTENT)
    }

    /// Layer-wise median of the simplified `parameter` profiles.
    ///
    /// Every member must simplify to the same number of layers.
    pub fn median_simple(&self, parameter: ProfileKind) -> Result<(Vec<f64>, Vec<f64>)> {
        let simplified: Vec<(Vec<f64>, Vec<f64>)> = self
            .items()
            .map(|m| m.simplify(parameter))
            .collect::<Result<_>>()?;
        let Some(first) = simplified.first() else {
            return Err(AppError::Statistics("median_simple needs at least 1 model".into()));
        };
        let nlay = first.0.len();
        if let Some((i, _)) = simplified.iter().enumerate().find(|(_, (tk, _))| tk.len() != nlay) {
            return Err(AppError::Statistics(format!(
                "median_simple needs equal layer counts: model 0 has {nlay} {parameter} layers, model {i} has {}",
                simplified[i].0.len()
            )));
        }

        let mut tk = Vec::with_capacity(nlay);
        let mut values = Vec::with_capacity(nlay);
        for lay in 0..nlay {
            let tks: Vec<f64> = simplified.iter().map(|(t, _)| t[lay]).collect();
            let vals: Vec<f64> = simplified.iter().map(|(_, v)| v[lay]).collect();
            tk.push(layer_median(&tks, parameter, lay)?);
            values.push(layer_median(&vals, parameter, lay)?);
        }
        Ok((tk, values))
    }

    /// Median model assembled from the Vp, Vs and density medians.
    pub fn median(&self) -> Result<GroundModel> {
        let (vp_tk, vp) = self.median_simple(ProfileKind::Vp)?;
        let (vs_tk, vs) = self.median_simple(ProfileKind::Vs)?;
        let (rh_tk, rh) = self.median_simple(ProfileKind::Rh)?;
        GroundModel::from_simple_profiles(&vp_tk, &vp, &vs_tk, &vs, &rh_tk, &rh)
    }

    pub fn to_geopsy_text(&self) -> String {
        self.members()
            .iter()
            .map(|m| m.item.to_geopsy_text(m.identifier, m.misfit))
            .collect()
    }
}

fn layer_median(column: &[f64], parameter: ProfileKind, lay: usize) -> Result<f64> {
    median(column).ok_or_else(|| AppError::Statistics(format!("no median for {parameter} layer {lay}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model(tk: &[f64], vs: &[f64]) -> GroundModel {
        let vp: Vec<f64> = vs.iter().map(|v| 2.0 * v).collect();
        GroundModel::new(tk.to_vec(), vp, vs.to_vec(), vec![2000.0; vs.len()]).unwrap()
    }

    fn dump() -> String {
        [
            "# Layered model 52: value=0.41\n3\n2 400 200 1900\n8 800 400 2000\n0 1600 800 2100\n",
            "# Layered model 19: value=0.47\n3\n3 360 180 1900\n6 900 450 2000\n0 1500 750 2100\n",
            "# Layered model 7: value=0.52\n3\n2 440 220 1900\n9 760 380 2000\n0 1700 850 2100\n",
        ]
        .concat()
    }

    #[test]
    fn from_geopsy_respects_cap_and_order() {
        let suite = GroundModelSuite::from_geopsy(&dump(), Some(2)).unwrap();
        assert_eq!(suite.len(), 2);
        assert_eq!(suite.identifiers(), vec![52, 19]);
        assert_eq!(suite.misfits(), vec![Some(0.41), Some(0.47)]);
        assert_eq!(suite.misfit_repr(None).unwrap(), "[0.41-0.47]");
        assert!(GroundModelSuite::from_geopsy("", None).is_err());
    }

    #[test]
    fn text_round_trip_preserves_suite() {
        let suite = GroundModelSuite::from_geopsy(&dump(), None).unwrap();
        let again = GroundModelSuite::from_geopsy(&suite.to_geopsy_text(), None).unwrap();
        assert_eq!(again, suite);
    }

    #[test]
    fn sigma_ln_of_identical_models_is_zero() {
        let m = model(&[5.0, 0.0], &[150.0, 400.0]);
        let suite = GroundModelSuite::from_models(vec![m.clone(), m]).unwrap();
        let s = suite.sigma_ln(ProfileKind::Vs, 0.5, DepthExtent::Shallowest).unwrap();
        assert_eq!(s.depth.len(), 11);
        assert!(s.sigma.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn sigma_ln_of_half_spaces_is_constant() {
        let suite = GroundModelSuite::from_models(vec![model(&[0.0], &[100.0]), model(&[0.0], &[200.0])]).unwrap();
        let s = suite.sigma_ln(ProfileKind::Vs, 1.0, DepthExtent::default()).unwrap();
        assert_eq!(*s.depth.last().unwrap(), UNBOUNDED_EXTENT);
        let expected = sample_std(&[100f64.ln(), 200f64.ln()]).unwrap();
        for v in s.sigma {
            assert_relative_eq!(v, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn sigma_ln_extent_policies() {
        let suite = GroundModelSuite::from_models(vec![
            model(&[4.0, 0.0], &[100.0, 300.0]),
            model(&[10.0, 0.0], &[100.0, 300.0]),
        ])
        .unwrap();
        let shallow = suite.sigma_ln(ProfileKind::Vs, 1.0, DepthExtent::Shallowest).unwrap();
        assert_eq!(*shallow.depth.last().unwrap(), 4.0);

        let fixed = suite.sigma_ln(ProfileKind::Vs, 1.0, DepthExtent::Fixed(20.0)).unwrap();
        assert_eq!(fixed.depth.len(), 21);
        assert_eq!(fixed.sigma[0], 0.0);
        assert!(fixed.sigma[6] > 0.0);
        assert_eq!(fixed.sigma[15], 0.0);
    }

    #[test]
    fn sigma_ln_needs_two_models() {
        let suite = GroundModelSuite::from_models(vec![model(&[0.0], &[100.0])]).unwrap();
        assert!(matches!(
            suite.sigma_ln(ProfileKind::Vs, 1.0, DepthExtent::Shallowest),
            Err(AppError::Statistics(_))
        ));
    }

    #[test]
    fn medians_of_simplified_profiles() {
        let suite = GroundModelSuite::from_geopsy(&dump(), None).unwrap();
        let (tk, vs) = suite.median_simple(ProfileKind::Vs).unwrap();
        assert_eq!(tk, vec![2.0, 8.0, 0.0]);
        assert_eq!(vs, vec![200.0, 400.0, 800.0]);

        let m = suite.median().unwrap();
        assert_eq!(m.vs(), &[200.0, 400.0, 800.0]);
        assert_eq!(m.rh(), &[1900.0, 2000.0, 2100.0]);

        let uneven = GroundModelSuite::from_models(vec![model(&[0.0], &[100.0]), model(&[3.0, 0.0], &[100.0, 200.0])]).unwrap();
        assert!(uneven.median_simple(ProfileKind::Vs).is_err());
    }

    #[test]
    fn vs30_per_member() {
        let suite = GroundModelSuite::from_models(vec![model(&[0.0], &[200.0]), model(&[30.0, 0.0], &[100.0, 500.0])]).unwrap();
        let vs30 = suite.vs30();
        assert_relative_eq!(vs30[0], 200.0);
        assert_relative_eq!(vs30[1], 100.0);
        assert_eq!(suite.nbest(1).unwrap().vs30().len(), 1);
    }

    #[test]
    fn zero_models_requested_is_rejected() {
        let suite = GroundModelSuite::from_models(vec![model(&[0.0], &[200.0]), model(&[0.0], &[300.0])]).unwrap();
        assert!(matches!(suite.nbest(0), Err(AppError::InvalidInput(_))));
        assert!(matches!(GroundModelSuite::from_geopsy(&dump(), Some(0)), Err(AppError::InvalidInput(_))));
        let one = suite.nbest(1).unwrap();
        assert_eq!(one.median_simple(ProfileKind::Vs).unwrap(), (vec![0.0], vec![200.0]));
    }
}
