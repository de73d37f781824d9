//! Terminal summaries for each `swprep` subcommand.

use std::path::Path;

use crate::dispersion::DispersionSuite;
use crate::domain::{GeopsyVersion, Polarization, ProfileKind};
use crate::ground::{GroundModelSuite, SigmaLn};
use crate::parameter::Parameterization;
use crate::report::{profile_peak, spread};
use crate::target::TargetSet;

/// Parameterization written by `swprep param`.
pub fn format_param_summary(par: &Parameterization, path: &Path, version: GeopsyVersion) -> String {
    let mut out = String::new();

    out.push_str("=== swprep - parameterization ===\n");
    out.push_str(&format!("Written: {} (Geopsy {version})\n\n", path.display()));

    out.push_str(&format!("{:<8} {:<6} {:>7} {:>12} {:>12} {:<8}", "profile", "type", "layers", "par_min", "par_max", "linked"));
    out.push('\n');
    out.push_str(&format!("{:-<8} {:-<6} {:->7} {:->12} {:->12} {:-<8}", "", "", "", "", "", ""));
    out.push('\n');

    for kind in ProfileKind::ENGINE_ORDER {
        let p = par.get(kind);
        let lo = p.par_min().iter().copied().fold(f64::INFINITY, f64::min);
        let hi = p.par_max().iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let linked = p.linked().map(|k| k.short_name()).unwrap_or("");
        out.push_str(
            format!(
                "{:<8} {:<6} {:>7} {:>12.3} {:>12.3} {:<8}",
                kind.short_name(),
                p.lay_type(),
                p.nlayers(),
                lo,
                hi,
                linked
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Target set written by `swprep target`.
pub fn format_target_summary(set: &TargetSet, path: &Path, version: GeopsyVersion) -> String {
    let mut out = String::new();

    out.push_str("=== swprep - dispersion target ===\n");
    out.push_str(&format!("Written: {} (Geopsy {version})\n", path.display()));
    out.push_str(&format!("Targets: n={} | dc_weight={}\n", set.targets().len(), set.dc_weight()));

    for (i, t) in set.targets().iter().enumerate() {
        let modes: Vec<String> = t
            .description()
            .iter()
            .map(|d| format!("{} {}", d.polarization.as_str(), d.mode))
            .collect();
        out.push_str(&format!("\nTarget {i} ({}):\n", modes.join(", ")));
        out.push_str(&format!("- points    : {}\n", t.len()));
        if let (Some(f), Some(w), Some(v)) = (spread(t.frequency()), spread(&t.wavelength()), spread(t.velocity())) {
            out.push_str(&format!("- frequency : [{:.3}, {:.3}] Hz\n", f.min, f.max));
            out.push_str(&format!("- wavelength: [{:.2}, {:.2}] m\n", w.min, w.max));
            out.push_str(&format!("- velocity  : [{:.2}, {:.2}] m/s\n", v.min, v.max));
        }
        if t.is_no_velstd() {
            out.push_str("- velstd    : none\n");
        } else if let Some(c) = spread(&t.cov()) {
            out.push_str(&format!("- cov       : [{:.3}, {:.3}]\n", c.min, c.max));
        }
        match t.vr40() {
            Some(vr40) => out.push_str(&format!("- vr40      : {vr40:.2} m/s\n")),
            None => out.push_str("- vr40      : n/a\n"),
        }
    }

    out
}

/// Ground-model suite statistics from `swprep stats`.
pub fn format_stats_summary(source: &Path, suite: &GroundModelSuite, sigma: &SigmaLn) -> String {
    let mut out = String::new();

    out.push_str("=== swprep - ground-model statistics ===\n");
    out.push_str(&format!("Source: {}\n", source.display()));
    out.push_str(&format!(
        "Models: n={} | misfit={}\n",
        suite.len(),
        suite.misfit_repr(None).unwrap_or_else(|_| "n/a".to_string())
    ));

    if let Some(best) = suite.get(0) {
        out.push_str(&format!(
            "Best: id={} | layers={} | half-space top={:.2} m\n",
            best.identifier,
            best.item.nlayers(),
            best.item.half_space_depth()
        ));
    }

    if let Some(v) = spread(&suite.vs30()) {
        out.push_str(&format!(
            "Vs30: min={:.2} | median={:.2} | max={:.2} m/s\n",
            v.min, v.median, v.max
        ));
    }

    out.push_str(&format!("\nsigma_ln({}):\n", sigma.parameter));
    match (sigma.depth.first(), sigma.depth.last()) {
        (Some(top), Some(bottom)) => {
            out.push_str(&format!("- depth: [{top:.2}, {bottom:.2}] m ({} points)\n", sigma.depth.len()));
        }
        _ => out.push_str("- depth: empty\n"),
    }
    if let Some(s) = spread(&sigma.sigma) {
        out.push_str(&format!("- sigma: min={:.4} | median={:.4} | max={:.4}\n", s.min, s.median, s.max));
    }
    if let Some((depth, value)) = profile_peak(&sigma.depth, &sigma.sigma) {
        out.push_str(&format!("- peak : {value:.4} at {depth:.2} m\n"));
    }

    out
}

/// Theoretical dispersion suite from `swprep dispersion`.
pub fn format_dispersion_summary(source: &Path, suite: &DispersionSuite) -> String {
    let mut out = String::new();

    out.push_str("=== swprep - dispersion curves ===\n");
    out.push_str(&format!("Source: {}\n", source.display()));
    out.push_str(&format!(
        "Sets: n={} | misfit={}\n\n",
        suite.len(),
        suite.misfit_repr(None).unwrap_or_else(|_| "n/a".to_string())
    ));

    out.push_str(&format!("{:>5} {:>10} {:>10} {:>9} {:>6} {:>20}", "rank", "id", "misfit", "rayleigh", "love", "R0 frequency [Hz]"));
    out.push('\n');
    out.push_str(&format!("{:->5} {:->10} {:->10} {:->9} {:->6} {:->20}", "", "", "", "", "", ""));
    out.push('\n');

    for (rank, member) in suite.members().iter().enumerate() {
        let set = &member.item;
        let r0 = set
            .curve(Polarization::Rayleigh, 0)
            .and_then(|c| spread(c.frequency()))
            .map(|f| format!("[{:.2}, {:.2}]", f.min, f.max))
            .unwrap_or_default();
        out.push_str(
            format!(
                "{:>5} {:>10} {:>10} {:>9} {:>6} {:>20}",
                rank,
                member.identifier,
                member.misfit.map(|m| format!("{m:.4}")).unwrap_or_default(),
                set.rayleigh().len(),
                set.love().len(),
                r0
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}
