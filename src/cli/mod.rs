//! Command-line parsing for the surface-wave pre/post-processing tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the file-format and statistics code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{GeopsyVersion, LogLevel, Polarization, ProfileKind, ResampleDomain, Spacing};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "swprep", version, about = "Surface-wave inversion pre- and post-processing for Geopsy/Dinver")]
pub struct Cli {
    /// Diagnostic log verbosity (overridden by RUST_LOG).
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a parameterization from a JSON recipe and write `<out>.param`.
    Param(ParamArgs),
    /// Build a dispersion target from CSV data and write `<out>.target`.
    Target(TargetArgs),
    /// Summarize a ground-model dump and compute its sigma_ln profile.
    Stats(StatsArgs),
    /// Summarize a theoretical dispersion dump.
    Dispersion(DispersionArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ParamArgs {
    /// JSON recipe with one layering scheme per profile (vp, pr, vs, rh).
    #[arg(long)]
    pub recipe: PathBuf,

    /// Output path prefix; `.param` is appended.
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// Geopsy release whose file schema is written.
    #[arg(long, value_enum, default_value_t = GeopsyVersion::V3_4_2)]
    pub version: GeopsyVersion,
}

#[derive(Debug, Parser, Clone)]
pub struct TargetArgs {
    /// CSV with `frequency,velocity[,velstd]` rows.
    #[arg(long)]
    pub csv: PathBuf,

    /// Output path prefix; `.target` is appended.
    #[arg(short = 'o', long)]
    pub out: PathBuf,

    /// Geopsy release whose file schema is written.
    #[arg(long, value_enum, default_value_t = GeopsyVersion::V3_4_2)]
    pub version: GeopsyVersion,

    /// Polarization assumed when the CSV carries no description lines.
    #[arg(long, value_enum, default_value_t = Polarization::Rayleigh)]
    pub polarization: Polarization,

    /// Mode number assumed when the CSV carries no description lines.
    #[arg(long, default_value_t = 0)]
    pub mode: u32,

    /// Resample onto `PN` points between `PMIN` and `PMAX`.
    #[arg(long, num_args = 3, value_names = ["PMIN", "PMAX", "PN"])]
    pub resample: Option<Vec<f64>>,

    /// Axis used by `--resample`.
    #[arg(long, value_enum, default_value_t = ResampleDomain::Wavelength)]
    pub domain: ResampleDomain,

    /// Point spacing used by `--resample`.
    #[arg(long, value_enum, default_value_t = Spacing::Log)]
    pub spacing: Spacing,

    /// Replace every velstd with `cov * velocity`.
    #[arg(long, conflicts_with = "min_cov")]
    pub cov: Option<f64>,

    /// Raise any velstd below `min_cov * velocity`.
    #[arg(long)]
    pub min_cov: Option<f64>,

    /// Weight of the dispersion misfit in the target file.
    #[arg(long, default_value_t = 1.0)]
    pub dc_weight: f64,

    /// Also write the target as Dinver text.
    #[arg(long)]
    pub dinver_txt: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct StatsArgs {
    /// Ground-model dump (`gpdc`/`gpdcreport` text format).
    #[arg(long)]
    pub models: PathBuf,

    /// Keep only the N best (leading) models.
    #[arg(long)]
    pub nbest: Option<usize>,

    /// Profile whose sigma_ln is computed.
    #[arg(long, value_enum, default_value_t = ProfileKind::Vs)]
    pub parameter: ProfileKind,

    /// Depth increment of the sigma_ln profile (m).
    #[arg(long, default_value_t = 0.5)]
    pub dy: f64,

    /// Evaluate to this depth (m) instead of the shallowest half-space.
    #[arg(long)]
    pub max_depth: Option<f64>,

    /// Write the sigma_ln profile as CSV.
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Write per-model Vs30 as CSV.
    #[arg(long)]
    pub export_vs30: Option<PathBuf>,

    /// Write a JSON summary of the run.
    #[arg(long)]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DispersionArgs {
    /// Dispersion dump (`gpdc` text format).
    #[arg(long)]
    pub curves: PathBuf,

    /// Keep at most N sets.
    #[arg(long)]
    pub nsets: Option<usize>,

    /// Keep at most N Rayleigh modes per set.
    #[arg(long)]
    pub nrayleigh: Option<usize>,

    /// Keep at most N Love modes per set.
    #[arg(long)]
    pub nlove: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_accepts_resample_triplet() {
        let cli = Cli::try_parse_from([
            "swprep", "target", "--csv", "d.csv", "-o", "out", "--version", "2", "--resample", "5", "50", "20",
            "--domain", "frequency", "--min-cov", "0.05",
        ])
        .unwrap();
        let Command::Target(args) = cli.command else {
            panic!("expected target subcommand");
        };
        assert_eq!(args.version, GeopsyVersion::V2_10_1);
        assert_eq!(args.resample, Some(vec![5.0, 50.0, 20.0]));
        assert_eq!(args.domain, ResampleDomain::Frequency);
        assert_eq!(args.min_cov, Some(0.05));
        assert_eq!(args.cov, None);
    }

    #[test]
    fn cov_and_min_cov_conflict() {
        let parsed = Cli::try_parse_from([
            "swprep", "target", "--csv", "d.csv", "-o", "out", "--cov", "0.1", "--min-cov", "0.05",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn log_level_is_global() {
        let cli = Cli::try_parse_from(["swprep", "stats", "--models", "gm.txt", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        let Command::Stats(args) = cli.command else {
            panic!("expected stats subcommand");
        };
        assert_eq!(args.parameter, ProfileKind::Vs);
        assert_eq!(args.dy, 0.5);
    }
}
