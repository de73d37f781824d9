//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - turns flags into workflow configs
//! - runs the workflow in `pipeline`
//! - prints summaries and writes optional exports

use clap::Parser;

use crate::cli::{Command, DispersionArgs, ParamArgs, StatsArgs, TargetArgs};
use crate::dispersion::{DispersionLimits, DispersionSuite};
use crate::domain::{DepthExtent, ModeDescription, ResampleDomain, Spacing};
use crate::error::{AppError, Result};

pub mod pipeline;

use pipeline::{CovPolicy, Resample, StatsConfig, TargetConfig};

/// Entry point for the `swprep` binary.
pub fn run() -> Result<()> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init_logging(cli.log_level)?;

    match cli.command {
        Command::Param(args) => handle_param(args),
        Command::Target(args) => handle_target(args),
        Command::Stats(args) => handle_stats(args),
        Command::Dispersion(args) => handle_dispersion(args),
    }
}

fn handle_param(args: ParamArgs) -> Result<()> {
    let output = pipeline::run_param(&args.recipe, &args.out, args.version)?;
    println!(
        "{}",
        crate::report::format_param_summary(&output.parameterization, &output.path, args.version)
    );
    Ok(())
}

fn handle_target(args: TargetArgs) -> Result<()> {
    let config = target_config_from_args(&args)?;
    let output = pipeline::run_target(&config)?;
    println!(
        "{}",
        crate::report::format_target_summary(&output.set, &output.path, config.version)
    );
    Ok(())
}

fn handle_stats(args: StatsArgs) -> Result<()> {
    let config = stats_config_from_args(&args);
    let output = pipeline::run_stats(&config)?;

    println!(
        "{}",
        crate::report::format_stats_summary(&config.models, &output.suite, &output.sigma)
    );

    // Optional exports.
    if let Some(path) = &args.export_csv {
        crate::io::write_sigma_csv(path, &output.sigma)?;
    }
    if let Some(path) = &args.export_vs30 {
        crate::io::write_vs30_csv(
            path,
            &output.suite.identifiers(),
            &output.suite.misfits(),
            &output.vs30,
        )?;
    }
    if let Some(path) = &args.export_json {
        crate::io::write_stats_json(path, &pipeline::stats_summary(&config, &output))?;
    }

    Ok(())
}

fn handle_dispersion(args: DispersionArgs) -> Result<()> {
    let limits = DispersionLimits {
        nsets: args.nsets,
        nrayleigh: args.nrayleigh,
        nlove: args.nlove,
    };
    let suite = DispersionSuite::from_geopsy_file(&args.curves, limits)?;
    println!("{}", crate::report::format_dispersion_summary(&args.curves, &suite));
    Ok(())
}

pub fn target_config_from_args(args: &TargetArgs) -> Result<TargetConfig> {
    let resample = match args.resample.as_deref() {
        None => None,
        Some(&[pmin, pmax, pn]) => Some(resample_from_flags(pmin, pmax, pn, args.domain, args.spacing)?),
        Some(other) => {
            return Err(AppError::input(format!(
                "--resample takes PMIN PMAX PN, found {} values",
                other.len()
            )));
        }
    };
    let cov = match (args.cov, args.min_cov) {
        (Some(c), _) => CovPolicy::Set(c),
        (None, Some(c)) => CovPolicy::Min(c),
        (None, None) => CovPolicy::Keep,
    };

    Ok(TargetConfig {
        csv: args.csv.clone(),
        out: args.out.clone(),
        version: args.version,
        fallback: ModeDescription::new(args.polarization, args.mode),
        resample,
        cov,
        dc_weight: args.dc_weight,
        dinver_txt: args.dinver_txt.clone(),
    })
}

pub fn stats_config_from_args(args: &StatsArgs) -> StatsConfig {
    StatsConfig {
        models: args.models.clone(),
        nbest: args.nbest,
        parameter: args.parameter,
        dy: args.dy,
        extent: args.max_depth.map_or(DepthExtent::Shallowest, DepthExtent::Fixed),
    }
}

fn resample_from_flags(pmin: f64, pmax: f64, pn: f64, domain: ResampleDomain, spacing: Spacing) -> Result<Resample> {
    if !(pmin < pmax) {
        return Err(AppError::input(format!("--resample needs PMIN < PMAX, found {pmin} and {pmax}")));
    }
    if !(pn.is_finite() && pn.fract() == 0.0 && pn >= 2.0) {
        return Err(AppError::input(format!("PN must be a whole number >= 2, not {pn}")));
    }
    Ok(Resample {
        pmin,
        pmax,
        pn: pn as usize,
        domain,
        spacing,
    })
}
