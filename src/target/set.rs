//! A set of modal targets and its Dinver `.target` file.
//!
//! `.target` archives always hold UTF-16LE text; the release only changes the
//! tar header and the XML schema of the dispersion block:
//!
//! - 2.10.1: `<ModalCurveTarget type="dispersion">`, `<StatPoint>` with slowness std
//! - 3.4.2:  `<DispersionTarget type="dispersion">`, `<RealStatisticalPoint>` with log std
//!
//! The inactive auxiliary targets the engine expects (autocorrelation,
//! ellipticity, refraction) are written after the dispersion block.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{GeopsyVersion, ModeDescription, Polarization, ResampleDomain, Spacing};
use crate::error::{AppError, Result};
use crate::io::archive::{self, TarFlavor, TextEncoding};
use crate::io::xml;
use crate::target::modal::{velstd_from_engine, ModalTarget};

#[derive(Debug, Clone, PartialEq)]
pub struct TargetSet {
    targets: Vec<ModalTarget>,
    dc_weight: f64,
}

/// Element names and misfit type of the dispersion block for one release.
struct Schema {
    block: &'static str,
    point: &'static str,
    other_point: &'static str,
    misfit_type: &'static str,
}

fn schema(version: GeopsyVersion) -> Schema {
    match version {
        GeopsyVersion::V2_10_1 => Schema {
            block: "ModalCurveTarget",
            point: "StatPoint",
            other_point: "RealStatisticalPoint",
            misfit_type: "L2_Normalized",
        },
        GeopsyVersion::V3_4_2 => Schema {
            block: "DispersionTarget",
            point: "RealStatisticalPoint",
            other_point: "StatPoint",
            misfit_type: "L2_LogNormalized",
        },
    }
}

impl TargetSet {
    pub fn new(targets: Vec<ModalTarget>) -> Result<Self> {
        if targets.is_empty() {
            return Err(AppError::input("a target set needs at least one modal target"));
        }
        Ok(Self {
            targets,
            dc_weight: 1.0,
        })
    }

    /// Misfit weight given to the dispersion target.
    pub fn with_dc_weight(mut self, dc_weight: f64) -> Result<Self> {
        if !(dc_weight.is_finite() && dc_weight >= 0.0) {
            return Err(AppError::input(format!("dispersion weight must be >= 0, not {dc_weight}")));
        }
        self.dc_weight = dc_weight;
        Ok(self)
    }

    pub fn targets(&self) -> &[ModalTarget] {
        &self.targets
    }

    pub fn dc_weight(&self) -> f64 {
        self.dc_weight
    }

    pub fn cut(&mut self, pmin: f64, pmax: f64, domain: ResampleDomain) -> Result<()> {
        let mut cut = self.targets.clone();
        for target in &mut cut {
            target.cut(pmin, pmax, domain)?;
        }
        self.targets = cut;
        Ok(())
    }

    pub fn easy_resample(
        &self,
        pmin: f64,
        pmax: f64,
        pn: usize,
        spacing: Spacing,
        domain: ResampleDomain,
    ) -> Result<TargetSet> {
        let targets = self
            .targets
            .iter()
            .map(|t| t.easy_resample(pmin, pmax, pn, spacing, domain))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            targets,
            dc_weight: self.dc_weight,
        })
    }

    pub fn setcov(&mut self, cov: f64) -> Result<()> {
        self.targets.iter_mut().try_for_each(|t| t.setcov(cov))
    }

    pub fn setmincov(&mut self, cov: f64) -> Result<()> {
        self.targets.iter_mut().try_for_each(|t| t.setmincov(cov))
    }

    /// Write `<path_prefix>.target`.
    pub fn to_target(&self, path_prefix: &Path, version: GeopsyVersion) -> Result<PathBuf> {
        let path = with_suffix(path_prefix, "target");
        archive::write_archive(
            &path,
            &self.to_xml(version)?,
            TextEncoding::Utf16Le,
            TarFlavor::for_version(version),
        )?;
        debug!(path = %path.display(), %version, targets = self.targets.len(), "wrote target set");
        Ok(path)
    }

    /// Read `<path_prefix>.target`.
    pub fn from_target(path_prefix: &Path, version: GeopsyVersion) -> Result<Self> {
        let path = with_suffix(path_prefix, "target");
        let (text, _) = archive::read_archive(&path)?;
        Self::from_xml(&text, version)
    }

    pub fn to_target_bytes(&self, version: GeopsyVersion) -> Result<Vec<u8>> {
        archive::pack(&self.to_xml(version)?, TextEncoding::Utf16Le, TarFlavor::for_version(version))
    }

    pub fn from_target_bytes(bytes: &[u8], version: GeopsyVersion) -> Result<Self> {
        let (text, _) = archive::unpack(bytes)?;
        Self::from_xml(&text, version)
    }

    /// Render the `contents.xml` body for `version`.
    pub fn to_xml(&self, version: GeopsyVersion) -> Result<String> {
        let s = schema(version);
        let v3 = version == GeopsyVersion::V3_4_2;
        let mut lines: Vec<String> = vec![
            "<Dinver>".into(),
            "  <pluginTag>DispersionCurve</pluginTag>".into(),
            "  <pluginTitle>Surface Wave Inversion</pluginTitle>".into(),
            "  <TargetList>".into(),
        ];
        if v3 {
            lines.push("    <position>0 0 0</position>".into());
        }
        lines.push(format!("    <{} type=\"dispersion\">", s.block));
        lines.push("      <selected>true</selected>".into());
        lines.push(format!("      <misfitWeight>{}</misfitWeight>", self.dc_weight));
        lines.push("      <minimumMisfit>0</minimumMisfit>".into());
        lines.push(format!("      <misfitType>{}</misfitType>", s.misfit_type));

        for target in &self.targets {
            let stds = target.engine_std(version)?;
            lines.push("      <ModalCurve>".into());
            lines.push("        <name>swprepost</name>".into());
            lines.push(format!("        <log>swprepost v{}</log>", env!("CARGO_PKG_VERSION")));
            if v3 {
                lines.push("        <enabled>true</enabled>".into());
            }
            for d in target.description() {
                lines.push("        <Mode>".into());
                if v3 {
                    lines.push("          <value>Signed</value>".into());
                }
                lines.push("          <slowness>Phase</slowness>".into());
                let tag = if v3 { "polarization" } else { "polarisation" };
                lines.push(format!("          <{tag}>{}</{tag}>", d.polarization.engine_name()));
                lines.push("          <ringIndex>0</ringIndex>".into());
                lines.push(format!("          <index>{}</index>", d.mode));
                lines.push("        </Mode>".into());
            }
            for ((x, mean), stddev) in target.frequency().iter().zip(target.slowness()).zip(stds) {
                lines.push(format!("        <{}>", s.point));
                lines.push(format!("          <x>{x}</x>"));
                lines.push(format!("          <mean>{mean}</mean>"));
                lines.push(format!("          <stddev>{stddev}</stddev>"));
                lines.push("          <weight>1</weight>".into());
                lines.push("          <valid>true</valid>".into());
                lines.push(format!("        </{}>", s.point));
            }
            lines.push("      </ModalCurve>".into());
        }
        lines.push(format!("    </{}>", s.block));

        lines.extend(inactive_block("AutocorrTarget", None, "L2_NormalizedBySigmaOnly", &[
            "      <AutocorrCurves>",
            "      </AutocorrCurves>",
        ]));
        let ellipticity_misfit = if v3 { "L2_Normalized" } else { "L2_LogNormalized" };
        lines.extend(inactive_block("ModalCurveTarget", Some("ellipticity"), ellipticity_misfit, &[]));
        if v3 {
            lines.extend([
                "    <EllipticityPeakTarget type=\"ellipticity peak\">",
                "      <minimumAmplitude>0</minimumAmplitude>",
                "      <RealStatisticalValue>",
                "        <mean>0</mean>",
                "        <stddev>0</stddev>",
                "        <weight>1</weight>",
                "        <valid>false</valid>",
                "      </RealStatisticalValue>",
                "    </EllipticityPeakTarget>",
            ]
            .map(String::from));
        } else {
            lines.extend(inactive_block("ValueTarget", Some("ellipticity peak"), "L2_Normalized", &[
                "      <StatValue>",
                "        <mean>0</mean>",
                "        <stddev>0</stddev>",
                "        <weight>1</weight>",
                "        <valid>false</valid>",
                "      </StatValue>",
            ]));
        }
        lines.extend(inactive_block("RefractionTarget", Some("Vp"), "L2_Normalized", &[]));
        lines.extend(inactive_block("RefractionTarget", Some("Vs"), "L2_Normalized", &[]));
        if v3 {
            lines.extend(inactive_block("MagnetoTelluricTarget", None, "L2_Normalized", &[]));
        }
        lines.push("  </TargetList>".into());
        lines.push("</Dinver>\n".into());
        Ok(lines.join("\n"))
    }

    /// Parse a `contents.xml` body written for `version`.
    pub fn from_xml(text: &str, version: GeopsyVersion) -> Result<Self> {
        let s = schema(version);
        let block = xml::elements(text, s.block).into_iter().next().ok_or_else(|| {
            AppError::format(format!(".target contents for Geopsy {version}"), format!("a <{}>", s.block), "none")
        })?;
        let dc_weight = match xml::first(block, "misfitWeight") {
            Some(raw) => raw
                .parse()
                .map_err(|_| AppError::format("<misfitWeight>", "a number", raw.to_string()))?,
            None => 1.0,
        };

        let curves = xml::elements(block, "ModalCurve");
        if curves.is_empty() {
            return Err(AppError::format(format!("<{}>", s.block), "at least 1 <ModalCurve>", "0"));
        }
        let targets = curves
            .iter()
            .enumerate()
            .map(|(index, curve)| parse_curve(index, curve, &s, version))
            .collect::<Result<Vec<_>>>()?;
        Self::new(targets)?.with_dc_weight(dc_weight)
    }
}

impl ModalTarget {
    /// Write a single-target `<path_prefix>.target`.
    pub fn to_target(&self, path_prefix: &Path, version: GeopsyVersion) -> Result<PathBuf> {
        TargetSet::new(vec![self.clone()])?.to_target(path_prefix, version)
    }

    /// First target of `<path_prefix>.target`.
    pub fn from_target(path_prefix: &Path, version: GeopsyVersion) -> Result<Self> {
        let mut set = TargetSet::from_target(path_prefix, version)?;
        if set.targets.len() > 1 {
            warn!(
                targets = set.targets.len(),
                "target file holds several modal targets, returning the first"
            );
        }
        Ok(set.targets.swap_remove(0))
    }
}

fn inactive_block(tag: &str, kind: Option<&str>, misfit_type: &str, body: &[&str]) -> Vec<String> {
    let open = match kind {
        Some(kind) => format!("    <{tag} type=\"{kind}\">"),
        None => format!("    <{tag}>"),
    };
    let mut lines = vec![
        open,
        "      <selected>false</selected>".into(),
        "      <misfitWeight>1</misfitWeight>".into(),
        "      <minimumMisfit>0</minimumMisfit>".into(),
        format!("      <misfitType>{misfit_type}</misfitType>"),
    ];
    lines.extend(body.iter().map(|l| l.to_string()));
    lines.push(format!("    </{tag}>"));
    lines
}

fn parse_curve(index: usize, curve: &str, s: &Schema, version: GeopsyVersion) -> Result<ModalTarget> {
    let context = format!("<ModalCurve> {index}");

    let mut description = Vec::new();
    for mode in xml::elements(curve, "Mode") {
        let polarization = xml::first(mode, "polarization")
            .or_else(|| xml::first(mode, "polarisation"))
            .ok_or_else(|| AppError::format(context.clone(), "a <polarization> in each <Mode>", "none"))?;
        let polarization: Polarization = polarization.parse().map_err(|_| {
            AppError::format(context.clone(), "Rayleigh or Love", polarization.to_string())
        })?;
        let raw = xml::first(mode, "index").unwrap_or_default();
        let mode_number = raw
            .parse()
            .map_err(|_| AppError::format(context.clone(), "a mode <index>", raw.to_string()))?;
        description.push(ModeDescription::new(polarization, mode_number));
    }
    if description.is_empty() {
        return Err(AppError::format(context, "at least 1 <Mode>", "0"));
    }

    let points = xml::elements(curve, s.point);
    if points.is_empty() {
        let found = if xml::elements(curve, s.other_point).is_empty() {
            "no points".to_string()
        } else {
            format!("<{}> points", s.other_point)
        };
        return Err(AppError::format(
            format!("{context} for Geopsy {version}"),
            format!("<{}> points", s.point),
            found,
        ));
    }

    let mut frequency = Vec::with_capacity(points.len());
    let mut velocity = Vec::with_capacity(points.len());
    let mut velstd = Vec::with_capacity(points.len());
    for point in points {
        let field = |tag: &str| -> Result<f64> {
            let raw = xml::first(point, tag)
                .ok_or_else(|| AppError::format(context.clone(), format!("<{tag}> in each <{}>", s.point), "none"))?;
            raw.parse()
                .map_err(|_| AppError::format(context.clone(), format!("a number in <{tag}>"), raw.to_string()))
        };
        let v = 1.0 / field("mean")?;
        frequency.push(field("x")?);
        velocity.push(v);
        velstd.push(velstd_from_engine(v, field("stddev")?, version));
    }
    ModalTarget::new(frequency, velocity, velstd, description)
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn set() -> TargetSet {
        let rayleigh = ModalTarget::rayleigh(vec![2.0, 5.0, 15.0], vec![320.0, 250.0, 180.0], vec![16.0, 12.5, 9.0]).unwrap();
        let love = ModalTarget::new(
            vec![3.0, 8.0],
            vec![300.0, 210.0],
            vec![0.0, 10.5],
            vec![ModeDescription::new(Polarization::Love, 0), ModeDescription::new(Polarization::Love, 1)],
        )
        .unwrap();
        TargetSet::new(vec![rayleigh, love]).unwrap().with_dc_weight(0.5).unwrap()
    }

    #[test]
    fn xml_follows_release_schema() {
        let v2 = set().to_xml(GeopsyVersion::V2_10_1).unwrap();
        assert!(v2.contains("<ModalCurveTarget type=\"dispersion\">"));
        assert!(v2.contains("<polarisation>Love</polarisation>"));
        assert!(v2.contains("<misfitWeight>0.5</misfitWeight>"));
        assert!(v2.contains("<ValueTarget type=\"ellipticity peak\">"));
        assert!(!v2.contains("RealStatisticalPoint"));

        let v3 = set().to_xml(GeopsyVersion::V3_4_2).unwrap();
        assert!(v3.contains("<position>0 0 0</position>"));
        assert!(v3.contains("<DispersionTarget type=\"dispersion\">"));
        assert!(v3.contains("<polarization>Rayleigh</polarization>"));
        assert!(v3.contains("<MagnetoTelluricTarget>"));
        assert!(v3.ends_with("</Dinver>\n"));
    }

    #[test]
    fn round_trips_in_memory_and_on_disk() {
        let original = set();
        let dir = tempfile::tempdir().unwrap();
        for version in GeopsyVersion::SUPPORTED {
            let bytes = original.to_target_bytes(version).unwrap();
            assert_eq!(TargetSet::from_target_bytes(&bytes, version).unwrap(), original);

            let prefix = dir.path().join(format!("tar_{version}"));
            let path = original.to_target(&prefix, version).unwrap();
            assert!(path.to_string_lossy().ends_with(".target"));
            assert_eq!(TargetSet::from_target(&prefix, version).unwrap(), original);
        }
    }

    #[test]
    fn reading_with_the_wrong_release_fails() {
        let bytes = set().to_target_bytes(GeopsyVersion::V3_4_2).unwrap();
        let err = TargetSet::from_target_bytes(&bytes, GeopsyVersion::V2_10_1).unwrap_err();
        assert!(matches!(err, AppError::Format { .. }));

        let text = set().to_xml(GeopsyVersion::V2_10_1).unwrap();
        let relabelled = text.replace("ModalCurveTarget type=\"dispersion\"", "DispersionTarget type=\"dispersion\"");
        let relabelled = relabelled.replacen("</ModalCurveTarget>", "</DispersionTarget>", 1);
        let err = TargetSet::from_xml(&relabelled, GeopsyVersion::V3_4_2).unwrap_err();
        assert!(err.to_string().contains("StatPoint"));
    }

    #[test]
    fn velstd_at_or_above_velocity_cannot_be_written() {
        let t = ModalTarget::rayleigh(vec![1.0], vec![100.0], vec![100.0]).unwrap();
        let set = TargetSet::new(vec![t]).unwrap();
        assert!(set.to_xml(GeopsyVersion::V3_4_2).is_err());
    }

    #[test]
    fn single_target_helpers() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("single");
        let t = set().targets()[0].clone();
        t.to_target(&prefix, GeopsyVersion::V2_10_1).unwrap();
        assert_eq!(ModalTarget::from_target(&prefix, GeopsyVersion::V2_10_1).unwrap(), t);
    }

    #[test]
    fn set_level_transforms() {
        let mut s = set();
        s.setmincov(0.05).unwrap();
        assert_eq!(s.targets()[1].velstd()[0], 15.0);
        let r = s.easy_resample(3.0, 8.0, 3, Spacing::Linear, ResampleDomain::Frequency).unwrap();
        assert_eq!(r.targets()[0].frequency(), &[3.0, 5.5, 8.0]);
        assert_eq!(r.dc_weight(), 0.5);
        assert!(s.cut(100.0, 200.0, ResampleDomain::Frequency).is_err());
        assert_eq!(s.targets()[0].len(), 3);
        s.cut(2.0, 5.0, ResampleDomain::Frequency).unwrap();
        assert_eq!(s.targets()[0].len(), 2);
        assert_eq!(s.targets()[1].len(), 1);
    }

    #[test]
    fn random_sets_round_trip() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..40 {
            let n = rng.gen_range(2..25);
            let frequency: Vec<f64> = (0..n).map(|i| 0.5 + i as f64 * rng.gen_range(0.5..2.0)).collect();
            let velocity: Vec<f64> = (0..n).map(|_| rng.gen_range(80.0..900.0)).collect();
            let velstd: Vec<f64> = velocity.iter().map(|v| v * rng.gen_range(0.0..0.3)).collect();
            let mode = rng.gen_range(0..3);
            let t = ModalTarget::new(frequency, velocity, velstd, vec![ModeDescription::new(Polarization::Rayleigh, mode)]).unwrap();
            let original = TargetSet::new(vec![t]).unwrap();
            for version in GeopsyVersion::SUPPORTED {
                let bytes = original.to_target_bytes(version).unwrap();
                assert_eq!(TargetSet::from_target_bytes(&bytes, version).unwrap(), original);
            }
        }
    }
}
