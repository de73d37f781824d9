//! One 1-D layered earth model.
//!
//! Layers are stored top-down as parallel thickness / Vp / Vs / density
//! vectors. The last layer is the half-space and its thickness is stored as 0.

use serde::{Deserialize, Serialize};

use crate::domain::ProfileKind;
use crate::error::{AppError, Result};
use crate::io::geopsy::{model_header, parse_model_header, parse_row};
use crate::math::depth_grid;

/// Depth standing in for the bottom of the half-space in [`GroundModel::gm2`].
pub const HALF_SPACE_SENTINEL: f64 = 9999.0;

/// Depth over which [`GroundModel::vs30`] averages.
const VS30_DEPTH: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundModel {
    tk: Vec<f64>,
    vp: Vec<f64>,
    vs: Vec<f64>,
    rh: Vec<f64>,
}

impl GroundModel {
    pub fn new(tk: Vec<f64>, vp: Vec<f64>, vs: Vec<f64>, rh: Vec<f64>) -> Result<Self> {
        let n = tk.len();
        if n == 0 {
            return Err(AppError::input("ground model needs at least one layer"));
        }
        if vp.len() != n || vs.len() != n || rh.len() != n {
            return Err(AppError::input(format!(
                "ground model lengths differ: tk={n}, vp={}, vs={}, rh={}",
                vp.len(),
                vs.len(),
                rh.len()
            )));
        }
        for (i, &t) in tk[..n - 1].iter().enumerate() {
            if !(t.is_finite() && t > 0.0) {
                return Err(AppError::input(format!("layer {i} thickness must be > 0, not {t}")));
            }
        }
        for (name, values) in [("vp", &vp), ("vs", &vs), ("rh", &rh)] {
            if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !(v.is_finite() && **v > 0.0)) {
                return Err(AppError::input(format!("layer {i} {name} must be > 0, not {v}")));
            }
        }

        let mut tk = tk;
        tk[n - 1] = 0.0;
        Ok(Self { tk, vp, vs, rh })
    }

    /// Merge three independently layered profiles onto the union of their
    /// layer boundaries.
    pub fn from_simple_profiles(
        vp_tk: &[f64],
        vp: &[f64],
        vs_tk: &[f64],
        vs: &[f64],
        rh_tk: &[f64],
        rh: &[f64],
    ) -> Result<Self> {
        let profiles = [("vp", vp_tk, vp), ("vs", vs_tk, vs), ("rh", rh_tk, rh)];
        let mut boundaries = Vec::new();
        for (name, tk, values) in profiles {
            if tk.is_empty() || tk.len() != values.len() {
                return Err(AppError::input(format!(
                    "{name} profile needs equal non-empty thickness and value lists, found {} and {}",
                    tk.len(),
                    values.len()
                )));
            }
            boundaries.extend(thick_to_depth(tk).into_iter().skip(1));
        }
        boundaries.sort_by(f64::total_cmp);
        boundaries.dedup_by(|a, b| (*a - *b).abs() <= 1e-9 * b.abs().max(1.0));

        let mut tops = Vec::with_capacity(boundaries.len() + 1);
        tops.push(0.0);
        tops.extend(boundaries);

        let sample = |tk: &[f64], values: &[f64]| -> Vec<f64> {
            let own_tops = thick_to_depth(tk);
            tops.iter().map(|&d| value_at(&own_tops, values, d)).collect()
        };
        let merged_vp = sample(vp_tk, vp);
        let merged_vs = sample(vs_tk, vs);
        let merged_rh = sample(rh_tk, rh);

        Self::new(depth_to_thick(&tops), merged_vp, merged_vs, merged_rh)
    }

    pub fn nlayers(&self) -> usize {
        self.tk.len()
    }

    pub fn tk(&self) -> &[f64] {
        &self.tk
    }

    pub fn vp(&self) -> &[f64] {
        &self.vp
    }

    pub fn vs(&self) -> &[f64] {
        &self.vs
    }

    pub fn rh(&self) -> &[f64] {
        &self.rh
    }

    /// Depth to the top of each layer.
    pub fn depth(&self) -> Vec<f64> {
        thick_to_depth(&self.tk)
    }

    /// Depth to the top of the half-space.
    pub fn half_space_depth(&self) -> f64 {
        self.tk.iter().sum()
    }

    pub fn poissons_ratio(&self) -> Result<Vec<f64>> {
        calc_pr(&self.vp, &self.vs)
    }

    /// Per-layer values of one profile.
    pub fn values(&self, parameter: ProfileKind) -> Result<Vec<f64>> {
        Ok(match parameter {
            ProfileKind::Vp => self.vp.clone(),
            ProfileKind::Vs => self.vs.clone(),
            ProfileKind::Rh => self.rh.clone(),
            ProfileKind::Pr => self.poissons_ratio()?,
        })
    }

    /// Sample `parameter` at `0, dy, ..., max_depth`.
    ///
    /// A depth landing exactly on a boundary takes the value of the layer
    /// below it; depths past the last boundary take the half-space value.
    pub fn discretize(&self, max_depth: f64, dy: f64, parameter: ProfileKind) -> Result<(Vec<f64>, Vec<f64>)> {
        let depths = depth_grid(max_depth, dy)?;
        let values = self.values(parameter)?;
        let tops = self.depth();
        let sampled = depths.iter().map(|&d| value_at(&tops, &values, d)).collect();
        Ok((depths, sampled))
    }

    /// Time-averaged shear-wave velocity over the top 30 m.
    ///
    /// Any depth not covered by finite layers is filled with the half-space.
    pub fn vs30(&self) -> f64 {
        let mut remaining = VS30_DEPTH;
        let mut travel_time = 0.0;
        let n = self.nlayers();
        for (&tk, &vs) in self.tk[..n - 1].iter().zip(&self.vs) {
            let h = tk.min(remaining);
            travel_time += h / vs;
            remaining -= h;
            if remaining <= 0.0 {
                break;
            }
        }
        if remaining > 0.0 {
            travel_time += remaining / self.vs[n - 1];
        }
        VS30_DEPTH / travel_time
    }

    /// Stair-step `(depth, value)` pairs tracing the profile, two per layer.
    pub fn gm2(&self, parameter: ProfileKind) -> Result<(Vec<f64>, Vec<f64>)> {
        let values = self.values(parameter)?;
        let tops = self.depth();
        let n = self.nlayers();
        let mut depth = Vec::with_capacity(2 * n);
        let mut out = Vec::with_capacity(2 * n);
        for (i, &v) in values.iter().enumerate() {
            let bottom = if i + 1 < n { tops[i + 1] } else { HALF_SPACE_SENTINEL };
            depth.push(tops[i]);
            depth.push(bottom);
            out.push(v);
            out.push(v);
        }
        Ok((depth, out))
    }

    /// `(thickness, value)` of `parameter` with equal adjacent layers merged.
    pub fn simplify(&self, parameter: ProfileKind) -> Result<(Vec<f64>, Vec<f64>)> {
        let values = self.values(parameter)?;
        let mut tk: Vec<f64> = Vec::with_capacity(values.len());
        let mut out: Vec<f64> = Vec::with_capacity(values.len());
        for (&t, &v) in self.tk.iter().zip(&values) {
            match (tk.last_mut(), out.last()) {
                (Some(last_tk), Some(&last_v)) if last_v == v => *last_tk += t,
                _ => {
                    tk.push(t);
                    out.push(v);
                }
            }
        }
        if let Some(last) = tk.last_mut() {
            *last = 0.0;
        }
        Ok((tk, out))
    }

    /// Engine text block: `# Layered model <id>: value=<misfit>`, then the
    /// layer count, then one `thickness vp vs density` row per layer.
    pub fn to_geopsy_text(&self, identifier: u64, misfit: Option<f64>) -> String {
        let mut out = format!("{}\n{}\n", model_header(identifier, misfit), self.nlayers());
        for i in 0..self.nlayers() {
            out.push_str(&format!("{} {} {} {}\n", self.tk[i], self.vp[i], self.vs[i], self.rh[i]));
        }
        out
    }

    /// Parse the model at `model_index` (zero-based) of an engine dump.
    pub fn from_geopsy(text: &str, model_index: usize) -> Result<Self> {
        let mut models = parse_dump(text, Some(model_index + 1))?;
        if models.len() <= model_index {
            return Err(AppError::format(
                "ground-model dump",
                format!("at least {} models", model_index + 1),
                models.len().to_string(),
            ));
        }
        Ok(models.swap_remove(model_index).2)
    }
}

/// Poisson's ratio from Vp and Vs, layer by layer.
pub fn calc_pr(vp: &[f64], vs: &[f64]) -> Result<Vec<f64>> {
    if vp.len() != vs.len() {
        return Err(AppError::input(format!(
            "vp and vs lengths differ: {} and {}",
            vp.len(),
            vs.len()
        )));
    }
    vp.iter()
        .zip(vs)
        .enumerate()
        .map(|(i, (&p, &s))| {
            if p <= s {
                return Err(AppError::input(format!("layer {i}: vp ({p}) must exceed vs ({s})")));
            }
            let x = (p * p) / (s * s);
            let pr = (2.0 - x) / (2.0 - 2.0 * x);
            if pr <= 0.0 {
                return Err(AppError::input(format!(
                    "layer {i}: vp={p} and vs={s} give a non-positive Poisson's ratio ({pr})"
                )));
            }
            Ok(pr)
        })
        .collect()
}

/// Layer thicknesses from layer-top depths; the last layer gets 0.
pub fn depth_to_thick(depths: &[f64]) -> Vec<f64> {
    let mut tk: Vec<f64> = depths.windows(2).map(|w| w[1] - w[0]).collect();
    if !depths.is_empty() {
        tk.push(0.0);
    }
    tk
}

/// Layer-top depths from thicknesses.
pub fn thick_to_depth(tk: &[f64]) -> Vec<f64> {
    let mut depths = Vec::with_capacity(tk.len());
    let mut top = 0.0;
    for &t in tk {
        depths.push(top);
        top += t;
    }
    depths
}

/// Value of the layer containing `depth`; boundaries belong to the layer below.
fn value_at(tops: &[f64], values: &[f64], depth: f64) -> f64 {
    let idx = tops.partition_point(|&top| top <= depth).max(1) - 1;
    values[idx]
}

/// Parse up to `limit` models from an engine dump.
///
/// Each block is an optional `# Layered model <id>: value=<misfit>` header,
/// a layer-count line, and that many `thickness vp vs density` rows separated
/// by whitespace or commas. Blocks without a header are numbered by position.
pub(crate) fn parse_dump(text: &str, limit: Option<usize>) -> Result<Vec<(u64, Option<f64>, GroundModel)>> {
    let mut out = Vec::new();
    let mut header: Option<(u64, Option<f64>)> = None;
    let mut lines = text.lines().enumerate();

    while let Some((lineno, raw)) = lines.next() {
        if limit.is_some_and(|max| out.len() >= max) {
            break;
        }
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            if let Some(parsed) = parse_model_header(comment)? {
                header = Some(parsed);
            }
            continue;
        }

        let count: usize = line.parse().map_err(|_| {
            AppError::format(
                format!("ground-model dump line {}", lineno + 1),
                "a layer count",
                line.to_string(),
            )
        })?;
        let (identifier, misfit) = header.take().unwrap_or((out.len() as u64, None));

        let mut columns: [Vec<f64>; 4] = Default::default();
        for _ in 0..count {
            let Some((row_no, row)) = lines.next() else {
                return Err(AppError::format(
                    format!("ground model {identifier}"),
                    format!("{count} layer rows"),
                    columns[0].len().to_string(),
                ));
            };
            let values = parse_row(
                || format!("ground-model dump line {} (thickness vp vs density)", row_no + 1),
                row,
                4,
            )?;
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }

        let [tk, vp, vs, rh] = columns;
        let model = GroundModel::new(tk, vp, vs, rh).map_err(|e| {
            AppError::format(format!("ground model {identifier}"), "a valid layered model", e.to_string())
        })?;
        out.push((identifier, misfit, model));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gm(tk: &[f64], vp: &[f64], vs: &[f64], rh: &[f64]) -> GroundModel {
        GroundModel::new(tk.to_vec(), vp.to_vec(), vs.to_vec(), rh.to_vec()).unwrap()
    }

    fn with_vs(tk: &[f64], vs: &[f64]) -> GroundModel {
        let vp: Vec<f64> = vs.iter().map(|v| 2.0 * v).collect();
        gm(tk, &vp, vs, &vec![2000.0; vs.len()])
    }

    #[test]
    fn construction_validates_and_normalizes_half_space() {
        let m = gm(&[5.0, 12.0], &[300.0, 600.0], &[150.0, 300.0], &[1900.0, 2000.0]);
        assert_eq!(m.tk(), &[5.0, 0.0]);
        assert!(GroundModel::new(vec![], vec![], vec![], vec![]).is_err());
        assert!(GroundModel::new(vec![0.0, 0.0], vec![1.0; 2], vec![1.0; 2], vec![1.0; 2]).is_err());
        assert!(GroundModel::new(vec![1.0, 0.0], vec![1.0; 2], vec![1.0], vec![1.0; 2]).is_err());
        assert!(GroundModel::new(vec![1.0, 0.0], vec![1.0; 2], vec![-1.0, 1.0], vec![1.0; 2]).is_err());
    }

    #[test]
    fn calc_pr_matches_reference_values() {
        let pr = calc_pr(&[200.0, 300.0], &[110.0, 210.0]).unwrap();
        assert_relative_eq!(pr[0], 0.283154121863799, epsilon = 1e-12);
        assert_relative_eq!(pr[1], 0.0196078431372549, epsilon = 1e-12);
        assert!(calc_pr(&[100.0], &[100.0]).is_err());
        assert!(calc_pr(&[120.0], &[100.0]).is_err());
    }

    #[test]
    fn vs30_cases() {
        assert_relative_eq!(with_vs(&[0.0], &[200.0]).vs30(), 200.0);
        assert_relative_eq!(with_vs(&[50.0, 0.0], &[100.0, 100.0]).vs30(), 100.0);
        assert_relative_eq!(with_vs(&[15.0, 15.0, 0.0], &[100.0, 100.0, 100.0]).vs30(), 100.0);
        assert_relative_eq!(with_vs(&[30.0, 0.0], &[100.0, 200.0]).vs30(), 100.0);
        assert_relative_eq!(with_vs(&[15.0, 15.0, 0.0], &[100.0, 200.0, 300.0]).vs30(), 133.333333, epsilon = 1e-5);
        assert_relative_eq!(with_vs(&[5.0, 10.0, 0.0], &[100.0, 200.0, 300.0]).vs30(), 200.0, epsilon = 1e-9);
        assert_relative_eq!(with_vs(&[10.0, 10.0, 0.0], &[200.0, 50.0, 300.0]).vs30(), 105.882352, epsilon = 1e-5);
    }

    #[test]
    fn discretize_assigns_boundaries_to_layer_below() {
        let m = with_vs(&[10.0, 0.0], &[100.0, 300.0]);
        let (depth, vs) = m.discretize(20.0, 1.0, ProfileKind::Vs).unwrap();
        assert_eq!(depth.len(), 21);
        for (d, v) in depth.iter().zip(&vs) {
            assert_eq!(*v, if *d < 10.0 { 100.0 } else { 300.0 });
        }

        let m = with_vs(&[2.0, 2.0, 0.0], &[100.0, 200.0, 300.0]);
        let (_, vs) = m.discretize(5.0, 1.25, ProfileKind::Vs).unwrap();
        assert_eq!(vs, vec![100.0, 100.0, 200.0, 200.0, 300.0]);

        assert!(m.discretize(0.0, 1.0, ProfileKind::Vs).is_err());
        assert!(m.discretize(5.0, -1.0, ProfileKind::Vs).is_err());
    }

    #[test]
    fn discretize_poissons_ratio() {
        let m = gm(&[0.75, 0.0], &[200.0, 400.0], &[100.0, 200.0], &[2000.0, 2000.0]);
        let (_, pr) = m.discretize(1.5, 0.5, ProfileKind::Pr).unwrap();
        assert_eq!(pr.len(), 4);
        for v in pr {
            assert_relative_eq!(v, 1.0 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn gm2_traces_stair_steps() {
        let m = gm(&[5.0, 0.0], &[200.0, 250.0], &[100.0, 120.0], &[2000.0, 2000.0]);
        let (depth, vp) = m.gm2(ProfileKind::Vp).unwrap();
        assert_eq!(depth, vec![0.0, 5.0, 5.0, HALF_SPACE_SENTINEL]);
        assert_eq!(vp, vec![200.0, 200.0, 250.0, 250.0]);
    }

    #[test]
    fn simplify_merges_equal_neighbours() {
        let m = gm(&[4.0, 6.0, 0.0], &[200.0, 500.0, 600.0], &[100.0, 100.0, 300.0], &[2000.0; 3]);
        assert_eq!(m.simplify(ProfileKind::Vp).unwrap(), (vec![4.0, 6.0, 0.0], vec![200.0, 500.0, 600.0]));
        assert_eq!(m.simplify(ProfileKind::Vs).unwrap(), (vec![10.0, 0.0], vec![100.0, 300.0]));
        assert_eq!(m.simplify(ProfileKind::Rh).unwrap(), (vec![0.0], vec![2000.0]));
    }

    #[test]
    fn depth_thickness_conversions() {
        assert_eq!(depth_to_thick(&[0.0, 1.0, 3.0, 5.0, 8.0]), vec![1.0, 2.0, 2.0, 3.0, 0.0]);
        assert_eq!(thick_to_depth(&[1.0, 2.0, 2.0, 3.0, 0.0]), vec![0.0, 1.0, 3.0, 5.0, 8.0]);
    }

    #[test]
    fn simple_profiles_merge_on_boundary_union() {
        let m = GroundModel::from_simple_profiles(&[0.0], &[500.0], &[0.0], &[200.0], &[0.0], &[2000.0]).unwrap();
        assert_eq!(m, gm(&[0.0], &[500.0], &[200.0], &[2000.0]));

        let m = GroundModel::from_simple_profiles(
            &[4.0, 6.0, 0.0],
            &[200.0, 500.0, 600.0],
            &[5.0, 0.0],
            &[100.0, 200.0],
            &[0.0],
            &[2000.0],
        )
        .unwrap();
        assert_eq!(m.tk(), &[4.0, 1.0, 5.0, 0.0]);
        assert_eq!(m.vp(), &[200.0, 500.0, 500.0, 600.0]);
        assert_eq!(m.vs(), &[100.0, 100.0, 200.0, 200.0]);

        let m = GroundModel::from_simple_profiles(
            &[4.0, 6.0, 0.0],
            &[200.0, 500.0, 600.0],
            &[3.0, 2.0, 0.0],
            &[100.0, 200.0, 300.0],
            &[0.0],
            &[2000.0],
        )
        .unwrap();
        assert_eq!(m.tk(), &[3.0, 1.0, 1.0, 5.0, 0.0]);
        assert_eq!(m.vp(), &[200.0, 200.0, 500.0, 500.0, 600.0]);
        assert_eq!(m.vs(), &[100.0, 200.0, 200.0, 300.0, 300.0]);

        let m = GroundModel::from_simple_profiles(&[2.0, 0.0], &[300.0, 400.0], &[3.0, 2.0, 0.0], &[100.0, 150.0, 200.0], &[0.0], &[2000.0]).unwrap();
        assert_eq!(m.depth(), vec![0.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn geopsy_text_round_trips() {
        let m = gm(&[2.5, 7.5, 0.0], &[300.0, 650.0, 1400.0], &[150.0, 320.0, 700.0], &[1850.0, 1950.0, 2100.0]);
        let mut dump = m.to_geopsy_text(110, Some(0.593));
        dump.push_str(&with_vs(&[4.0, 0.0], &[180.0, 400.0]).to_geopsy_text(57, Some(0.61)));
        assert!(dump.starts_with("# Layered model 110: value=0.593\n3\n2.5 300 150 1850\n"));
        assert_eq!(GroundModel::from_geopsy(&dump, 0).unwrap(), m);
        assert_eq!(GroundModel::from_geopsy(&dump, 1).unwrap().vs(), &[180.0, 400.0]);
        assert!(matches!(GroundModel::from_geopsy(&dump, 2), Err(AppError::Format { .. })));
    }

    #[test]
    fn dump_accepts_commas_and_reports_short_blocks() {
        let text = "# Layered model 3: value=1.5\n2\n5,200,100,2000\n0,400,200,2000\n";
        let models = parse_dump(text, None).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].0, 3);
        assert_eq!(models[0].1, Some(1.5));

        let err = parse_dump("# Layered model 3: value=1.5\n3\n5 200 100 2000\n", None).unwrap_err();
        assert!(err.to_string().contains("expected 3 layer rows, found 1"));

        assert!(parse_dump("2\n5 200 100\n0 400 200 2000\n", None).is_err());
    }
}
