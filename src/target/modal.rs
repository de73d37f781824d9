//! Experimental dispersion data for one surface-wave mode.
//!
//! Points are kept sorted by increasing frequency. Uncertainty is stored as a
//! velocity standard deviation; the engine-facing slowness uncertainties are
//! derived on demand:
//!
//! - 2.10.1: `0.5 * (1/(v - σ) - 1/(v + σ))`
//! - 3.4.2:  `0.5 * ((1 + c) + 1/(1 - c))` with `c = σ/v`

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use crate::domain::{GeopsyVersion, ModeDescription, Polarization, ResampleDomain, Spacing};
use crate::error::{AppError, Result};
use crate::math::{interp_linear, lin_space, log_space};

/// Wavelength at which [`ModalTarget::vr40`] reads the velocity.
const VR40_WAVELENGTH: f64 = 40.0;

const CSV_COLUMNS: &str = "#Frequency (Hz),Velocity (m/s),Velocity Standard Deviation (m/s)";

#[derive(Debug, Clone)]
pub struct ModalTarget {
    frequency: Vec<f64>,
    velocity: Vec<f64>,
    velstd: Vec<f64>,
    description: Vec<ModeDescription>,
}

impl ModalTarget {
    /// Build a target; points are reordered by increasing frequency.
    pub fn new(
        frequency: Vec<f64>,
        velocity: Vec<f64>,
        velstd: Vec<f64>,
        description: Vec<ModeDescription>,
    ) -> Result<Self> {
        let n = frequency.len();
        if n == 0 {
            return Err(AppError::input("a modal target needs at least one point"));
        }
        if velocity.len() != n || velstd.len() != n {
            return Err(AppError::input(format!(
                "frequency, velocity and velstd must be the same size, found {n}, {} and {}",
                velocity.len(),
                velstd.len()
            )));
        }
        if description.is_empty() {
            return Err(AppError::input("a modal target needs at least one mode description"));
        }
        for i in 0..n {
            let (f, v, s) = (frequency[i], velocity[i], velstd[i]);
            if !(f.is_finite() && f > 0.0 && v.is_finite() && v > 0.0) {
                return Err(AppError::input(format!(
                    "point {i}: frequency and velocity must be > 0, found f={f}, v={v}"
                )));
            }
            if !(s.is_finite() && s >= 0.0) {
                return Err(AppError::input(format!("point {i}: velstd must be >= 0, not {s}")));
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| frequency[a].total_cmp(&frequency[b]));
        Ok(Self {
            frequency: order.iter().map(|&i| frequency[i]).collect(),
            velocity: order.iter().map(|&i| velocity[i]).collect(),
            velstd: order.iter().map(|&i| velstd[i]).collect(),
            description,
        })
    }

    /// Fundamental Rayleigh target.
    pub fn rayleigh(frequency: Vec<f64>, velocity: Vec<f64>, velstd: Vec<f64>) -> Result<Self> {
        Self::new(frequency, velocity, velstd, vec![ModeDescription::default()])
    }

    /// Build from data processed by wavelength; frequency is `v / λ`.
    pub fn from_wavelength(
        wavelength: &[f64],
        velocity: Vec<f64>,
        velstd: Vec<f64>,
        description: Vec<ModeDescription>,
    ) -> Result<Self> {
        if wavelength.len() != velocity.len() {
            return Err(AppError::input(format!(
                "wavelength and velocity must be the same size, found {} and {}",
                wavelength.len(),
                velocity.len()
            )));
        }
        if let Some(l) = wavelength.iter().find(|l| !(l.is_finite() && **l > 0.0)) {
            return Err(AppError::input(format!("wavelength must be > 0, not {l}")));
        }
        let frequency = velocity.iter().zip(wavelength).map(|(v, l)| v / l).collect();
        Self::new(frequency, velocity, velstd, description)
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

    pub fn velstd(&self) -> &[f64] {
        &self.velstd
    }

    pub fn description(&self) -> &[ModeDescription] {
        &self.description
    }

    pub fn wavelength(&self) -> Vec<f64> {
        self.velocity.iter().zip(&self.frequency).map(|(v, f)| v / f).collect()
    }

    pub fn slowness(&self) -> Vec<f64> {
        self.velocity.iter().map(|v| 1.0 / v).collect()
    }

    /// Coefficient of variation `σ / v`.
    pub fn cov(&self) -> Vec<f64> {
        self.velstd.iter().zip(&self.velocity).map(|(s, v)| s / v).collect()
    }

    pub fn is_no_velstd(&self) -> bool {
        self.velstd.iter().all(|s| *s == 0.0)
    }

    /// Slowness standard deviation (2.10.1 convention).
    pub fn slostd(&self) -> Vec<f64> {
        self.velocity
            .iter()
            .zip(&self.velstd)
            .map(|(v, s)| 0.5 * (1.0 / (v - s) - 1.0 / (v + s)))
            .collect()
    }

    /// Logarithmic slowness standard deviation (3.4.2 convention).
    pub fn logstd(&self) -> Vec<f64> {
        self.cov().iter().map(|c| 0.5 * ((1.0 + c) + 1.0 / (1.0 - c))).collect()
    }

    /// Slowness uncertainty in the convention of `version`.
    pub fn engine_std(&self, version: GeopsyVersion) -> Result<Vec<f64>> {
        if let Some((i, c)) = self.cov().into_iter().enumerate().find(|(_, c)| *c >= 1.0) {
            return Err(AppError::input(format!(
                "point {i}: velstd must be smaller than velocity to express as slowness (cov={c})"
            )));
        }
        Ok(match version {
            GeopsyVersion::V2_10_1 => self.slostd(),
            GeopsyVersion::V3_4_2 => self.logstd(),
        })
    }

    /// Replace every velstd with `cov * velocity`.
    pub fn setcov(&mut self, cov: f64) -> Result<()> {
        check_cov(cov)?;
        self.velstd = self.velocity.iter().map(|v| v * cov).collect();
        Ok(())
    }

    /// Raise velstd to `cov * velocity` wherever the current COV is lower.
    pub fn setmincov(&mut self, cov: f64) -> Result<()> {
        check_cov(cov)?;
        for (s, v) in self.velstd.iter_mut().zip(&self.velocity) {
            if *s / v < cov {
                *s = v * cov;
            }
        }
        Ok(())
    }

    /// Depth estimate `λ / depth_factor`; typical factors lie in `[2, 3]`.
    pub fn pseudo_depth(&self, depth_factor: f64) -> Vec<f64> {
        if !(2.0..=3.0).contains(&depth_factor) {
            warn!(depth_factor, "depth factor is outside the typical range [2, 3]");
        }
        self.wavelength().iter().map(|l| l / depth_factor).collect()
    }

    /// Shear-wave velocity estimate `v * velocity_factor`; typical factors lie in `[1, 1.2]`.
    pub fn pseudo_vs(&self, velocity_factor: f64) -> Vec<f64> {
        if !(1.0..=1.2).contains(&velocity_factor) {
            warn!(velocity_factor, "velocity factor is outside the typical range [1, 1.2]");
        }
        self.velocity.iter().map(|v| v * velocity_factor).collect()
    }

    fn domain_values(&self, domain: ResampleDomain) -> Vec<f64> {
        match domain {
            ResampleDomain::Frequency => self.frequency.clone(),
            ResampleDomain::Wavelength => self.wavelength(),
        }
    }

    /// Keep only points with `pmin <= x <= pmax` in `domain`.
    ///
    /// Fails without modifying the target when no point would remain.
    pub fn cut(&mut self, pmin: f64, pmax: f64, domain: ResampleDomain) -> Result<()> {
        let x = self.domain_values(domain);
        let keep: Vec<usize> = (0..x.len()).filter(|&i| x[i] >= pmin && x[i] <= pmax).collect();
        if keep.is_empty() {
            return Err(AppError::Domain(format!(
                "no {domain:?} values inside [{pmin}, {pmax}]"
            )));
        }
        self.frequency = keep.iter().map(|&i| self.frequency[i]).collect();
        self.velocity = keep.iter().map(|&i| self.velocity[i]).collect();
        self.velstd = keep.iter().map(|&i| self.velstd[i]).collect();
        Ok(())
    }

    /// Resample onto `pn` points between `pmin` and `pmax` in `domain`.
    ///
    /// Velocity and velstd are interpolated linearly against the domain
    /// values; points outside the data are rejected. Requires `pmin < pmax`.
    pub fn easy_resample(
        &self,
        pmin: f64,
        pmax: f64,
        pn: usize,
        spacing: Spacing,
        domain: ResampleDomain,
    ) -> Result<ModalTarget> {
        if !(pmin < pmax) {
            return Err(AppError::input(format!(
                "resample range must satisfy pmin < pmax, found pmin={pmin}, pmax={pmax}"
            )));
        }
        let grid = match spacing {
            Spacing::Log => log_space(pmin, pmax, pn)?,
            Spacing::Linear => lin_space(pmin, pmax, pn)?,
        };
        self.resample(&grid, domain)
    }

    fn resample(&self, grid: &[f64], domain: ResampleDomain) -> Result<ModalTarget> {
        let x = self.domain_values(domain);
        let mut order: Vec<usize> = (0..x.len()).collect();
        order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
        let xs: Vec<f64> = order.iter().map(|&i| x[i]).collect();
        let vel: Vec<f64> = order.iter().map(|&i| self.velocity[i]).collect();
        let std: Vec<f64> = order.iter().map(|&i| self.velstd[i]).collect();

        let new_vel = interp_linear(&xs, &vel, grid)?;
        let new_std = interp_linear(&xs, &std, grid)?;
        let new_frq = match domain {
            ResampleDomain::Frequency => grid.to_vec(),
            ResampleDomain::Wavelength => new_vel.iter().zip(grid).map(|(v, l)| v / l).collect(),
        };
        debug!(points = grid.len(), ?domain, "resampled modal target");
        ModalTarget::new(new_frq, new_vel, new_std, self.description.clone())
    }

    /// Velocity at a 40 m wavelength, when the data straddles it.
    pub fn vr40(&self) -> Option<f64> {
        let wavelength = self.wavelength();
        let min = wavelength.iter().copied().fold(f64::INFINITY, f64::min);
        let max = wavelength.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(min < VR40_WAVELENGTH && VR40_WAVELENGTH < max) {
            warn!(min, max, "a wavelength of 40 m is outside the data");
            return None;
        }
        self.resample(&[VR40_WAVELENGTH], ResampleDomain::Wavelength)
            .ok()
            .map(|t| t.velocity[0])
    }

    /// Dinver text: one `frequency\tslowness\tstd` line per point.
    pub fn to_txt_dinver_text(&self, version: GeopsyVersion) -> Result<String> {
        let stds = self.engine_std(version)?;
        let mut out = String::new();
        for ((f, p), s) in self.frequency.iter().zip(self.slowness()).zip(stds) {
            out.push_str(&format!("{f}\t{p}\t{s}\n"));
        }
        Ok(out)
    }

    pub fn to_txt_dinver(&self, path: &Path, version: GeopsyVersion) -> Result<()> {
        let text = self.to_txt_dinver_text(version)?;
        std::fs::write(path, text).map_err(|e| AppError::io(path, e))
    }

    pub fn from_txt_dinver_text(text: &str, version: GeopsyVersion) -> Result<Self> {
        let mut frequency = Vec::new();
        let mut velocity = Vec::new();
        let mut velstd = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(AppError::format(
                    format!("Dinver text line {}", lineno + 1),
                    "3 columns (frequency slowness std)",
                    fields.len().to_string(),
                ));
            }
            let context = format!("Dinver text line {}", lineno + 1);
            let f = parse_field(&context, fields[0])?;
            let slowness = parse_field(&context, fields[1])?;
            let std = parse_field(&context, fields[2])?;
            let v = 1.0 / slowness;
            frequency.push(f);
            velocity.push(v);
            velstd.push(velstd_from_engine(v, std, version));
        }
        if frequency.is_empty() {
            return Err(AppError::format("Dinver text", "at least 1 data line", "0"));
        }
        Self::rayleigh(frequency, velocity, velstd)
    }

    pub fn from_txt_dinver(path: &Path, version: GeopsyVersion) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Self::from_txt_dinver_text(&text, version)
    }

    /// CSV with `#swprepost` metadata, one `#<polarization> <mode>` line per
    /// description and `frequency,velocity,velstd` rows.
    pub fn to_csv_text(&self) -> String {
        let mut out = format!("#swprepost v{},,\n", env!("CARGO_PKG_VERSION"));
        out.push_str(&format!("#{} potential descriptions:,,\n", self.description.len()));
        for d in &self.description {
            out.push_str(&format!("#{} {},,\n", d.polarization.as_str(), d.mode));
        }
        out.push_str(CSV_COLUMNS);
        out.push('\n');
        for i in 0..self.len() {
            out.push_str(&format!("{},{},{}\n", self.frequency[i], self.velocity[i], self.velstd[i]));
        }
        out
    }

    pub fn to_csv(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path).map_err(|e| AppError::io(path, e))?;
        file.write_all(self.to_csv_text().as_bytes())
            .map_err(|e| AppError::io(path, e))
    }

    /// Parse CSV data; `fallback` describes the mode when the file carries
    /// no description lines. A missing std column reads as 0.
    pub fn from_csv_text(text: &str, fallback: &[ModeDescription]) -> Result<Self> {
        let mut description = Vec::new();
        for line in text.lines() {
            if let Some(d) = parse_description(line) {
                description.push(d);
            }
        }
        if description.is_empty() {
            debug!("CSV carries no mode descriptions, using the caller's");
            description = fallback.to_vec();
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut frequency = Vec::new();
        let mut velocity = Vec::new();
        let mut velstd = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record.map_err(|e| AppError::format("CSV target", "readable rows", e.to_string()))?;
            let context = format!("CSV row {}", index + 1);
            let fields: Vec<&str> = record.iter().collect();
            if fields.iter().all(|f| f.is_empty()) {
                continue;
            }
            let used = fields.iter().rposition(|f| !f.is_empty()).map_or(0, |p| p + 1);
            if !(2..=3).contains(&used) {
                return Err(AppError::format(context, "2 or 3 columns (frequency, velocity[, velstd])", used.to_string()));
            }
            frequency.push(parse_field(&context, fields[0])?);
            velocity.push(parse_field(&context, fields[1])?);
            velstd.push(match fields.get(2) {
                Some(s) if !s.is_empty() => parse_field(&context, s)?,
                _ => 0.0,
            });
        }
        if frequency.is_empty() {
            return Err(AppError::format("CSV target", "at least 1 data row", "0"));
        }
        Self::new(frequency, velocity, velstd, description)
    }

    pub fn from_csv(path: &Path, fallback: &[ModeDescription]) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Self::from_csv_text(&text, fallback)
    }
}

/// Equal when descriptions match and all values agree within `rtol = 1e-5`,
/// `atol = 1e-8`.
impl PartialEq for ModalTarget {
    fn eq(&self, other: &Self) -> bool {
        self.description == other.description
            && allclose(&self.frequency, &other.frequency)
            && allclose(&self.velocity, &other.velocity)
            && allclose(&self.velstd, &other.velstd)
    }
}

fn allclose(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= 1e-8 + 1e-5 * y.abs())
}

fn check_cov(cov: f64) -> Result<()> {
    if !(cov.is_finite() && cov >= 0.0) {
        return Err(AppError::input(format!("cov must be >= 0, not {cov}")));
    }
    Ok(())
}

/// Velocity standard deviation from an engine slowness uncertainty.
pub(crate) fn velstd_from_engine(velocity: f64, std: f64, version: GeopsyVersion) -> f64 {
    match version {
        GeopsyVersion::V2_10_1 => {
            if std == 0.0 {
                0.0
            } else {
                (-1.0 + (1.0 + 4.0 * std * std * velocity * velocity).sqrt()) / (2.0 * std)
            }
        }
        GeopsyVersion::V3_4_2 => {
            let cov = std - (std * std - 2.0 * std + 2.0).sqrt();
            cov * velocity
        }
    }
}

fn parse_field(context: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::format(context.to_string(), "a number", raw.to_string()))
}

/// `#rayleigh 0,,` style description lines.
fn parse_description(line: &str) -> Option<ModeDescription> {
    let body = line.trim().strip_prefix('#')?.trim_end_matches(',').trim();
    let (polarization, mode) = body.split_once(' ')?;
    let polarization = match polarization {
        "rayleigh" => Polarization::Rayleigh,
        "love" => Polarization::Love,
        _ => return None,
    };
    Some(ModeDescription::new(polarization, mode.trim().parse().ok()?))
}
