//! Shared workflows behind the `swprep` subcommands.
//!
//! Each workflow goes file -> library types -> file, and returns what it built
//! so the caller can focus on presentation and optional exports.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::domain::{DepthExtent, GeopsyVersion, ModeDescription, ParamRecipe, ProfileKind, ResampleDomain, Spacing};
use crate::error::{AppError, Result};
use crate::ground::{GroundModelSuite, SigmaLn};
use crate::io::StatsSummary;
use crate::math::median;
use crate::parameter::Parameterization;
use crate::target::{ModalTarget, TargetSet};

/// Outputs of `swprep param`.
#[derive(Debug, Clone)]
pub struct ParamOutput {
    pub parameterization: Parameterization,
    pub path: PathBuf,
}

/// Read a JSON parameterization recipe.
pub fn load_recipe(path: &Path) -> Result<ParamRecipe> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    serde_json::from_reader(file).map_err(|e| AppError::Config(format!("invalid recipe '{}': {e}", path.display())))
}

pub fn run_param(recipe_path: &Path, out: &Path, version: GeopsyVersion) -> Result<ParamOutput> {
    let recipe = load_recipe(recipe_path)?;
    let parameterization = Parameterization::from_recipe(&recipe)?;
    let path = parameterization.to_param(out, version)?;
    info!(path = %path.display(), %version, "wrote parameterization");
    Ok(ParamOutput { parameterization, path })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resample {
    pub pmin: f64,
    pub pmax: f64,
    pub pn: usize,
    pub domain: ResampleDomain,
    pub spacing: Spacing,
}

/// What to do with the experimental velstd.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CovPolicy {
    Keep,
    Set(f64),
    Min(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    pub csv: PathBuf,
    pub out: PathBuf,
    pub version: GeopsyVersion,
    pub fallback: ModeDescription,
    pub resample: Option<Resample>,
    pub cov: CovPolicy,
    pub dc_weight: f64,
    pub dinver_txt: Option<PathBuf>,
}

/// Outputs of `swprep target`.
#[derive(Debug, Clone)]
pub struct TargetOutput {
    pub set: TargetSet,
    pub path: PathBuf,
}

pub fn run_target(config: &TargetConfig) -> Result<TargetOutput> {
    let mut target = ModalTarget::from_csv(&config.csv, &[config.fallback])?;

    if let Some(r) = config.resample {
        target = target.easy_resample(r.pmin, r.pmax, r.pn, r.spacing, r.domain)?;
    }
    match config.cov {
        CovPolicy::Keep => {}
        CovPolicy::Set(cov) => target.setcov(cov)?,
        CovPolicy::Min(cov) => target.setmincov(cov)?,
    }
    if let Some(path) = &config.dinver_txt {
        target.to_txt_dinver(path, config.version)?;
    }

    let set = TargetSet::new(vec![target])?.with_dc_weight(config.dc_weight)?;
    let path = set.to_target(&config.out, config.version)?;
    info!(path = %path.display(), version = %config.version, "wrote target");
    Ok(TargetOutput { set, path })
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsConfig {
    pub models: PathBuf,
    pub nbest: Option<usize>,
    pub parameter: ProfileKind,
    pub dy: f64,
    pub extent: DepthExtent,
}

/// Outputs of `swprep stats`.
#[derive(Debug, Clone)]
pub struct StatsOutput {
    pub suite: GroundModelSuite,
    pub sigma: SigmaLn,
    pub vs30: Vec<f64>,
}

pub fn run_stats(config: &StatsConfig) -> Result<StatsOutput> {
    let suite = GroundModelSuite::from_geopsy_file(&config.models, config.nbest)?;
    let sigma = suite.sigma_ln(config.parameter, config.dy, config.extent)?;
    let vs30 = suite.vs30();
    Ok(StatsOutput { suite, sigma, vs30 })
}

/// JSON record of a stats run, stamped with the current time.
pub fn stats_summary(config: &StatsConfig, output: &StatsOutput) -> StatsSummary {
    StatsSummary {
        tool: "swprep".to_string(),
        generated_at: Utc::now(),
        source: config.models.clone(),
        models: output.suite.len(),
        misfit_range: output.suite.misfit_range(None).ok(),
        vs30: output.vs30.clone(),
        vs30_median: median(&output.vs30),
        sigma_ln: output.sigma.clone(),
    }
}
