//! The four-profile parameterization and its `.param` file format.
//!
//! A `.param` file is an engine archive (see `io::archive`) whose XML body is:
//!
//! ```text
//! <Dinver>
//!   <pluginTag>DispersionCurve</pluginTag>
//!   <pluginTitle>Surface Wave Inversion</pluginTitle>
//!   <ParamGroundModel>
//!     <ParamProfile>            one each for Vp, Nu, Vs, Rho
//!       <type>..</type> <longName>..</longName> <shortName>..</shortName> ...
//!       <ParamLayer name="Vs0"> one per layer
//!         <lastParamCondition>  true when the value may NOT decrease
//!         <topMin>/<topMax>     value bounds
//!         <linkedTo>            "Vs0" style link or "Not linked"
//!         <isDepth>             layer bounds are depths (true) or thicknesses
//!         <dhMin>/<dhMax>       layer bounds
//!       </ParamLayer>
//!     </ParamProfile>
//!     <ParamSpaceScript><text>  linear(...) constraints for LN profiles
//!   </ParamGroundModel>
//! </Dinver>
//! ```
//!
//! Release 2.10.1 stores this text as UTF-8 in a GNU tar; 3.4.2 stores it as
//! UTF-16LE with a BOM in a ustar tar.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{GeopsyVersion, LayerKind, ParamRecipe, ProfileKind, ProfileRecipe};
use crate::error::{AppError, Result};
use crate::io::archive::{self, TarFlavor, TextEncoding};
use crate::io::xml;
use crate::parameter::{Layering, Parameter};

/// Fixed `<ParamProfile>` header fields the engine expects for each profile.
struct ProfileHeader {
    param_type: &'static str,
    long_name: &'static str,
    unit: &'static str,
    default_min: &'static str,
    default_max: &'static str,
    condition: &'static str,
}

fn header(kind: ProfileKind) -> ProfileHeader {
    match kind {
        ProfileKind::Vp => ProfileHeader {
            param_type: "Param",
            long_name: "Compression-wave velocity",
            unit: "m/s",
            default_min: "200",
            default_max: "5000",
            condition: "LessThan",
        },
        ProfileKind::Pr => ProfileHeader {
            param_type: "Condition",
            long_name: "Poisson's Ratio",
            unit: "",
            default_min: "0.2",
            default_max: "0.5",
            condition: "GreaterThan",
        },
        ProfileKind::Vs => ProfileHeader {
            param_type: "Param",
            long_name: "Shear-wave velocity",
            unit: "m/s",
            default_min: "150",
            default_max: "3500",
            condition: "LessThan",
        },
        ProfileKind::Rh => ProfileHeader {
            param_type: "Param",
            long_name: "Density",
            unit: "kg/m3",
            default_min: "2000",
            default_max: "2000",
            condition: "LessThan",
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameterization {
    vp: Parameter,
    pr: Parameter,
    vs: Parameter,
    rh: Parameter,
}

impl Parameterization {
    /// Bundle four parameters.
    ///
    /// A parameter linked to another profile must share that profile's layer bounds.
    pub fn new(vp: Parameter, pr: Parameter, vs: Parameter, rh: Parameter) -> Result<Self> {
        let out = Self { vp, pr, vs, rh };
        for kind in ProfileKind::ENGINE_ORDER {
            let par = out.get(kind);
            let Some(target) = par.linked() else {
                continue;
            };
            if target == kind {
                return Err(AppError::input(format!("{kind} cannot be linked to itself")));
            }
            let reference = out.get(target);
            if reference.lay_min() != par.lay_min() || reference.lay_max() != par.lay_max() {
                return Err(AppError::input(format!(
                    "{kind} is linked to {target} but their layer boundaries differ"
                )));
            }
        }
        Ok(out)
    }

    /// Build every profile from a JSON recipe; linked profiles are resolved
    /// after the profiles they copy.
    pub fn from_recipe(recipe: &ParamRecipe) -> Result<Self> {
        let mut built: [Option<Parameter>; 4] = Default::default();

        for (slot, kind) in ProfileKind::ENGINE_ORDER.iter().enumerate() {
            let par = match recipe.profile(*kind) {
                ProfileRecipe::Linked { .. } => continue,
                ProfileRecipe::Fx { value } => Parameter::from_fx(*value),
                ProfileRecipe::Ftl {
                    nlayers,
                    thickness,
                    par_min,
                    par_max,
                    par_rev,
                } => Parameter::from_ftl(*nlayers, *thickness, *par_min, *par_max, *par_rev),
                ProfileRecipe::Ln {
                    nlayers,
                    par_min,
                    par_max,
                    par_rev,
                } => Parameter::from_ln(
                    recipe.wmin,
                    recipe.wmax,
                    *nlayers,
                    *par_min,
                    *par_max,
                    *par_rev,
                    recipe.depth_factor,
                ),
                ProfileRecipe::Lr {
                    lr,
                    par_min,
                    par_max,
                    par_rev,
                } => Parameter::from_lr(
                    recipe.wmin,
                    recipe.wmax,
                    *lr,
                    *par_min,
                    *par_max,
                    *par_rev,
                    recipe.depth_factor,
                ),
                ProfileRecipe::Custom {
                    lay_min,
                    lay_max,
                    par_min,
                    par_max,
                    par_rev,
                    kind,
                } => Parameter::new(
                    lay_min.clone(),
                    lay_max.clone(),
                    par_min.clone(),
                    par_max.clone(),
                    par_rev.clone(),
                    *kind,
                ),
            }
            .map_err(|e| AppError::Config(format!("{kind}: {e}")))?;
            built[slot] = Some(par);
        }

        for (slot, kind) in ProfileKind::ENGINE_ORDER.iter().enumerate() {
            let ProfileRecipe::Linked {
                to,
                par_min,
                par_max,
                par_rev,
            } = recipe.profile(*kind)
            else {
                continue;
            };
            if matches!(recipe.profile(*to), ProfileRecipe::Linked { .. }) {
                return Err(AppError::Config(format!(
                    "{kind} links to {to}, which is itself a linked profile"
                )));
            }
            let existing = built[engine_slot(*to)]
                .as_ref()
                .ok_or_else(|| AppError::Config(format!("{kind} links to undefined profile {to}")))?;
            let par = Parameter::from_parameter_and_link(*par_min, *par_max, *par_rev, existing, *to)
                .map_err(|e| AppError::Config(format!("{kind}: {e}")))?;
            built[slot] = Some(par);
        }

        let [vp, pr, vs, rh] = built;
        match (vp, pr, vs, rh) {
            (Some(vp), Some(pr), Some(vs), Some(rh)) => Self::new(vp, pr, vs, rh),
            _ => Err(AppError::Config("linked profiles must link to an unlinked profile".into())),
        }
    }

    pub fn vp(&self) -> &Parameter {
        &self.vp
    }

    pub fn pr(&self) -> &Parameter {
        &self.pr
    }

    pub fn vs(&self) -> &Parameter {
        &self.vs
    }

    pub fn rh(&self) -> &Parameter {
        &self.rh
    }

    pub fn get(&self, kind: ProfileKind) -> &Parameter {
        match kind {
            ProfileKind::Vp => &self.vp,
            ProfileKind::Pr => &self.pr,
            ProfileKind::Vs => &self.vs,
            ProfileKind::Rh => &self.rh,
        }
    }

    /// Write `<path_prefix>.param`.
    pub fn to_param(&self, path_prefix: &Path, version: GeopsyVersion) -> Result<PathBuf> {
        let path = with_suffix(path_prefix, "param");
        let bytes = self.to_param_bytes(version)?;
        std::fs::write(&path, bytes).map_err(|e| AppError::io(&path, e))?;
        debug!(path = %path.display(), %version, "wrote parameterization");
        Ok(path)
    }

    /// Read `<path_prefix>.param`.
    pub fn from_param(path_prefix: &Path, version: GeopsyVersion) -> Result<Self> {
        let path = with_suffix(path_prefix, "param");
        let bytes = std::fs::read(&path).map_err(|e| AppError::io(&path, e))?;
        Self::from_param_bytes(&bytes, version)
    }

    pub fn to_param_bytes(&self, version: GeopsyVersion) -> Result<Vec<u8>> {
        archive::pack(&self.to_xml(), param_encoding(version), TarFlavor::for_version(version))
    }

    pub fn from_param_bytes(bytes: &[u8], version: GeopsyVersion) -> Result<Self> {
        let (text, encoding) = archive::unpack(bytes)?;
        let expected = param_encoding(version);
        if encoding != expected {
            return Err(AppError::format(
                format!(".param contents for Geopsy {version}"),
                format!("{expected:?} text"),
                format!("{encoding:?} text"),
            ));
        }
        Self::from_xml(&text)
    }

    /// Render the `contents.xml` body.
    pub fn to_xml(&self) -> String {
        let mut lines: Vec<String> = vec![
            "<Dinver>".into(),
            "  <pluginTag>DispersionCurve</pluginTag>".into(),
            "  <pluginTitle>Surface Wave Inversion</pluginTitle>".into(),
            "  <ParamGroundModel>".into(),
        ];

        for kind in ProfileKind::ENGINE_ORDER {
            let par = self.get(kind);
            let h = header(kind);
            let key = kind.short_name();
            lines.push("    <ParamProfile>".into());
            lines.push(format!("      <type>{}</type>", h.param_type));
            lines.push(format!("      <longName>{}</longName>", xml::escape(h.long_name)));
            lines.push(format!("      <shortName>{key}</shortName>"));
            lines.push(format!("      <unit>{}</unit>", h.unit));
            lines.push(format!("      <defaultMinimum>{}</defaultMinimum>", h.default_min));
            lines.push(format!("      <defaultMaximum>{}</defaultMaximum>", h.default_max));
            lines.push(format!("      <defaultCondition>{}</defaultCondition>", h.condition));

            let is_depth = match par.kind() {
                LayerKind::Depth => "true",
                LayerKind::Thickness => "false",
            };
            // A lone layer has nothing above it to reverse against.
            let lone = par.nlayers() == 1;
            for lnum in 0..par.nlayers() {
                let condition = if par.par_rev()[lnum] && !lone { "false" } else { "true" };
                let linked_to = match par.linked() {
                    Some(target) => format!("{}{lnum}", target.short_name()),
                    None => "Not linked".to_string(),
                };
                lines.push(format!("      <ParamLayer name=\"{key}{lnum}\">"));
                lines.push("        <shape>Uniform</shape>".into());
                lines.push(format!("        <lastParamCondition>{condition}</lastParamCondition>"));
                lines.push("        <nSubayers>5</nSubayers>".into());
                lines.push(format!("        <topMin>{}</topMin>", par.par_min()[lnum]));
                lines.push(format!("        <topMax>{}</topMax>", par.par_max()[lnum]));
                lines.push(format!("        <linkedTo>{linked_to}</linkedTo>"));
                lines.push(format!("        <isDepth>{is_depth}</isDepth>"));
                lines.push(format!("        <dhMin>{}</dhMin>", par.lay_min()[lnum]));
                lines.push(format!("        <dhMax>{}</dhMax>", par.lay_max()[lnum]));
                lines.push("      </ParamLayer>".into());
            }
            lines.push("    </ParamProfile>".into());
        }

        lines.push("    <ParamSpaceScript>".into());
        lines.push("      <text>".into());
        for kind in ProfileKind::ENGINE_ORDER {
            lines.extend(ln_constraints(kind, self.get(kind)));
        }
        lines.push("      </text>".into());
        lines.push("    </ParamSpaceScript>".into());
        lines.push("  </ParamGroundModel>".into());
        lines.push("</Dinver>\n".into());
        lines.join("\n")
    }

    /// Parse a `contents.xml` body.
    pub fn from_xml(text: &str) -> Result<Self> {
        if xml::elements(text, "ParamGroundModel").is_empty() {
            return Err(AppError::format(".param contents", "a <ParamGroundModel> element", "none"));
        }

        let mut parsed: [Option<Parameter>; 4] = Default::default();
        for profile in xml::elements(text, "ParamProfile") {
            let name = xml::first(profile, "shortName")
                .ok_or_else(|| AppError::format("<ParamProfile>", "a <shortName>", "none"))?;
            let kind = ProfileKind::from_short_name(name)
                .ok_or_else(|| AppError::format("<shortName>", "one of Vp, Nu, Vs, Rho", name.to_string()))?;
            let slot = engine_slot(kind);
            if parsed[slot].is_some() {
                return Err(AppError::format(
                    format!("{name} profile"),
                    "one <ParamProfile>",
                    "a duplicate",
                ));
            }
            parsed[slot] = Some(parse_profile(name, profile)?);
        }

        let found: Vec<&str> = ProfileKind::ENGINE_ORDER
            .iter()
            .zip(&parsed)
            .filter(|(_, p)| p.is_some())
            .map(|(k, _)| k.short_name())
            .collect();
        let [vp, pr, vs, rh] = parsed;
        match (vp, pr, vs, rh) {
            (Some(vp), Some(pr), Some(vs), Some(rh)) => Self::new(vp, pr, vs, rh),
            _ => Err(AppError::format(
                ".param contents",
                "4 profiles (Vp, Nu, Vs, Rho)",
                format!("{} {found:?}", found.len()),
            )),
        }
    }
}

fn engine_slot(kind: ProfileKind) -> usize {
    match kind {
        ProfileKind::Vp => 0,
        ProfileKind::Pr => 1,
        ProfileKind::Vs => 2,
        ProfileKind::Rh => 3,
    }
}

fn param_encoding(version: GeopsyVersion) -> TextEncoding {
    match version {
        GeopsyVersion::V2_10_1 => TextEncoding::Utf8,
        GeopsyVersion::V3_4_2 => TextEncoding::Utf16Le,
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Engine constraints keeping each LN layer bottom below the one above it.
fn ln_constraints(kind: ProfileKind, par: &Parameter) -> Vec<String> {
    let Layering::ByNumber { nlayers } = par.layering() else {
        return Vec::new();
    };
    if nlayers <= 2 {
        return Vec::new();
    }
    let key = kind.short_name();
    let min_thickness = (par.lay_min()[0] * 100.0).round() / 100.0;
    (0..nlayers - 2)
        .map(|lay| {
            format!(
                "linear(&quot;D{key}{}&quot;,&quot;&gt;&quot;,1,&quot;D{key}{lay}&quot;,{min_thickness});",
                lay + 1
            )
        })
        .collect()
}

const LAYER_FIELDS: [&str; 7] = [
    "lastParamCondition",
    "topMin",
    "topMax",
    "linkedTo",
    "isDepth",
    "dhMin",
    "dhMax",
];

fn parse_profile(name: &str, profile: &str) -> Result<Parameter> {
    let layers = xml::elements(profile, "ParamLayer");
    if layers.is_empty() {
        return Err(AppError::format(format!("{name} profile"), "at least 1 <ParamLayer>", "0"));
    }

    let mut lay_min = Vec::with_capacity(layers.len());
    let mut lay_max = Vec::with_capacity(layers.len());
    let mut par_min = Vec::with_capacity(layers.len());
    let mut par_max = Vec::with_capacity(layers.len());
    let mut par_rev = Vec::with_capacity(layers.len());
    let mut is_depth = Vec::with_capacity(layers.len());
    let mut linked = None;

    for (index, layer) in layers.iter().enumerate() {
        let context = format!("{name} layer {index}");
        let present = LAYER_FIELDS
            .iter()
            .filter(|field| xml::first(layer, field).is_some())
            .count();
        if present != LAYER_FIELDS.len() {
            return Err(AppError::format(
                context,
                format!("{} layer fields", LAYER_FIELDS.len()),
                present.to_string(),
            ));
        }
        let field = |tag: &str| xml::first(layer, tag).unwrap_or_default();

        par_rev.push(!parse_bool(&context, field("lastParamCondition"))?);
        par_min.push(parse_number(&context, "topMin", field("topMin"))?);
        par_max.push(parse_number(&context, "topMax", field("topMax"))?);
        is_depth.push(parse_bool(&context, field("isDepth"))?);
        lay_min.push(parse_number(&context, "dhMin", field("dhMin"))?);
        lay_max.push(parse_number(&context, "dhMax", field("dhMax"))?);

        let link = field("linkedTo");
        if link != "Not linked" {
            let target = link.trim_end_matches(|c: char| c.is_ascii_digit());
            linked = Some(ProfileKind::from_short_name(target).ok_or_else(|| {
                AppError::format(context.clone(), "<linkedTo> naming Vp, Nu, Vs or Rho", link.to_string())
            })?);
        }
    }

    // The first layer's flag is not reliable in engine-written files, so the
    // remaining layers decide when there are any.
    let decisive = if is_depth.len() > 1 { &is_depth[1..] } else { &is_depth[..] };
    let depth = decisive[0];
    if decisive.iter().any(|&d| d != depth) {
        return Err(AppError::format(
            format!("{name} profile"),
            "layers all defined by depth or all by thickness",
            "a mixture",
        ));
    }
    let kind = if depth { LayerKind::Depth } else { LayerKind::Thickness };

    let par = Parameter::new(lay_min, lay_max, par_min, par_max, par_rev, kind).map_err(|e| {
        AppError::format(format!("{name} profile"), "consistent layer bounds", e.to_string())
    })?;
    Ok(par.with_link(linked))
}

fn parse_bool(context: &str, raw: &str) -> Result<bool> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(AppError::format(context.to_string(), "true or false", other.to_string())),
    }
}

fn parse_number(context: &str, tag: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| AppError::format(format!("<{tag}> in {context}"), "a number", raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::DEFAULT_DEPTH_FACTOR;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sample() -> Parameterization {
        let vs = Parameter::from_lr(3.0, 100.0, 3.0, 100.0, 400.0, false, DEFAULT_DEPTH_FACTOR).unwrap();
        let vp = Parameter::from_parameter_and_link(200.0, 1200.0, true, &vs, ProfileKind::Vs).unwrap();
        let pr = Parameter::from_fx(0.33).unwrap();
        let rh = Parameter::from_ftl(2, 5.0, 1800.0, 2100.0, false).unwrap();
        Parameterization::new(vp, pr, vs, rh).unwrap()
    }

    #[test]
    fn xml_lists_profiles_in_engine_order() {
        let text = sample().to_xml();
        let names: Vec<&str> = xml::elements(&text, "shortName");
        assert_eq!(names, vec!["Vp", "Nu", "Vs", "Rho"]);
        assert!(text.contains("<longName>Poisson&apos;s Ratio</longName>"));
        assert!(text.contains("<linkedTo>Vs0</linkedTo>"));
        assert!(text.ends_with("</Dinver>\n"));
    }

    #[test]
    fn layering_by_number_writes_space_script() {
        let vs = Parameter::from_ln(3.0, 100.0, 4, 100.0, 400.0, false, DEFAULT_DEPTH_FACTOR).unwrap();
        let par = Parameterization::new(
            Parameter::from_fx(500.0).unwrap(),
            Parameter::from_fx(0.3).unwrap(),
            vs,
            Parameter::from_fx(2000.0).unwrap(),
        )
        .unwrap();
        let text = par.to_xml();
        assert!(text.contains("linear(&quot;DVs1&quot;,&quot;&gt;&quot;,1,&quot;DVs0&quot;,1);"));
        assert!(text.contains("linear(&quot;DVs2&quot;,&quot;&gt;&quot;,1,&quot;DVs1&quot;,1);"));
        assert!(!text.contains("DVs3&quot;,&quot;&gt;"));
    }

    #[test]
    fn single_layer_profile_is_never_reversed() {
        let vs = Parameter::from_ln(3.0, 100.0, 1, 100.0, 400.0, true, DEFAULT_DEPTH_FACTOR).unwrap();
        let vp = Parameter::from_parameter_and_link(200.0, 1200.0, true, &vs, ProfileKind::Vs).unwrap();
        let par = Parameterization::new(
            vp,
            Parameter::from_fx(0.3).unwrap(),
            vs,
            Parameter::from_fx(2000.0).unwrap(),
        )
        .unwrap();
        let text = par.to_xml();
        assert!(text.contains("<lastParamCondition>true</lastParamCondition>"));
        assert!(!text.contains("<lastParamCondition>false</lastParamCondition>"));

        let parsed = Parameterization::from_xml(&text).unwrap();
        assert_eq!(parsed.vs().par_rev(), &[false]);
        assert_eq!(parsed.vp().par_rev(), &[false]);

        let two = Parameter::from_ln(3.0, 100.0, 2, 100.0, 400.0, true, DEFAULT_DEPTH_FACTOR).unwrap();
        let text = Parameterization::new(
            Parameter::from_fx(500.0).unwrap(),
            Parameter::from_fx(0.3).unwrap(),
            two,
            Parameter::from_fx(2000.0).unwrap(),
        )
        .unwrap()
        .to_xml();
        assert!(text.contains("<lastParamCondition>false</lastParamCondition>"));
    }

    #[test]
    fn round_trips_through_both_versions() {
        let original = sample();
        for version in GeopsyVersion::SUPPORTED {
            let bytes = original.to_param_bytes(version).unwrap();
            let parsed = Parameterization::from_param_bytes(&bytes, version).unwrap();
            assert_eq!(parsed, original);
            assert_eq!(parsed.vp().linked(), Some(ProfileKind::Vs));
            assert_eq!(parsed.vs().kind(), LayerKind::Depth);
            assert_eq!(parsed.rh().kind(), LayerKind::Thickness);
        }
    }

    #[test]
    fn round_trips_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("model");
        let original = sample();
        let path = original.to_param(&prefix, GeopsyVersion::V3_4_2).unwrap();
        assert!(path.ends_with("model.param"));
        let parsed = Parameterization::from_param(&prefix, GeopsyVersion::V3_4_2).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn version_mismatch_is_a_format_error() {
        let bytes = sample().to_param_bytes(GeopsyVersion::V2_10_1).unwrap();
        let err = Parameterization::from_param_bytes(&bytes, GeopsyVersion::V3_4_2).unwrap_err();
        assert!(matches!(err, AppError::Format { .. }));
    }

    #[test]
    fn missing_profile_or_field_is_a_format_error() {
        let text = sample().to_xml();
        let start = text.find("    <ParamProfile>\n      <type>Param</type>\n      <longName>Density").unwrap();
        let without_rho = format!("{}  </ParamGroundModel>\n</Dinver>\n", &text[..start]);
        let err = Parameterization::from_xml(&without_rho).unwrap_err();
        assert!(err.to_string().contains("4 profiles"));

        let without_field = text.replacen("<dhMax>", "<dhMaxx>", 1);
        let err = Parameterization::from_xml(&without_field).unwrap_err();
        assert!(err.to_string().contains("Vp layer 0"));

        assert!(Parameterization::from_xml("<Dinver></Dinver>").is_err());
    }

    #[test]
    fn linked_layering_must_match() {
        let vs = Parameter::from_lr(3.0, 100.0, 3.0, 100.0, 400.0, false, DEFAULT_DEPTH_FACTOR).unwrap();
        let other = Parameter::from_lr(3.0, 100.0, 2.0, 100.0, 400.0, false, DEFAULT_DEPTH_FACTOR).unwrap();
        let vp = Parameter::from_parameter_and_link(200.0, 1200.0, false, &other, ProfileKind::Vs).unwrap();
        let result = Parameterization::new(vp, Parameter::from_fx(0.3).unwrap(), vs, Parameter::from_fx(2000.0).unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn recipe_builds_linked_profiles() {
        let json = r#"{
            "wmin": 3.0, "wmax": 100.0,
            "vp": {"scheme": "linked", "to": "vs", "par_min": 200, "par_max": 1000, "par_rev": true},
            "pr": {"scheme": "fx", "value": 0.33},
            "vs": {"scheme": "ln", "nlayers": 3, "par_min": 100, "par_max": 500},
            "rh": {"scheme": "fx", "value": 2000}
        }"#;
        let recipe: ParamRecipe = serde_json::from_str(json).unwrap();
        let par = Parameterization::from_recipe(&recipe).unwrap();
        assert_eq!(par.vp().lay_max(), par.vs().lay_max());
        assert_eq!(par.vp().linked(), Some(ProfileKind::Vs));

        let chained = json.replace(r#""scheme": "fx", "value": 0.33"#, r#""scheme": "linked", "to": "vp", "par_min": 0.2, "par_max": 0.4"#);
        let recipe: ParamRecipe = serde_json::from_str(&chained).unwrap();
        assert!(matches!(Parameterization::from_recipe(&recipe), Err(AppError::Config(_))));
    }

    #[test]
    fn random_parameterizations_round_trip() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let wmin = rng.gen_range(1.0..10.0);
            let wmax = wmin * rng.gen_range(5.0..30.0);
            let by_number = rng.gen_bool(0.5);
            let nlayers = rng.gen_range(1..7);
            let ratio = rng.gen_range(1.2..4.0);
            let vs_with = |rev: bool| {
                if by_number {
                    Parameter::from_ln(wmin, wmax, nlayers, 80.0, 600.0, rev, 2.0)
                } else {
                    Parameter::from_lr(wmin, wmax, ratio, 80.0, 600.0, rev, 2.0)
                }
                .unwrap()
            };
            // Lone layers are always written unreversed.
            let mut vs = vs_with(rng.gen_bool(0.5));
            if vs.nlayers() == 1 {
                vs = vs_with(false);
            }
            let vp_rev = rng.gen_bool(0.5) && vs.nlayers() > 1;
            let vp = Parameter::from_parameter_and_link(150.0, 2000.0, vp_rev, &vs, ProfileKind::Vs).unwrap();
            let pr = Parameter::from_fx(rng.gen_range(0.2..0.45)).unwrap();
            let rh = Parameter::from_ftl(rng.gen_range(1..4), rng.gen_range(1.0..8.0), 1700.0, 2200.0, false).unwrap();
            let original = Parameterization::new(vp, pr, vs, rh).unwrap();
            for version in GeopsyVersion::SUPPORTED {
                let bytes = original.to_param_bytes(version).unwrap();
                assert_eq!(Parameterization::from_param_bytes(&bytes, version).unwrap(), original);
            }
        }
    }
}
