use approx::assert_relative_eq;

use swprepost::app::pipeline::{self, CovPolicy, Resample, StatsConfig, TargetConfig};
use swprepost::dispersion::{DispersionLimits, DispersionSuite};
use swprepost::domain::{DepthExtent, GeopsyVersion, ModeDescription, Polarization, ProfileKind, ResampleDomain, Spacing};
use swprepost::ground::GroundModelSuite;
use swprepost::parameter::Parameterization;
use swprepost::target::{ModalTarget, TargetSet};

const RECIPE: &str = r#"{
    "wmin": 2.0,
    "wmax": 60.0,
    "vp": {"scheme": "linked", "to": "vs", "par_min": 200, "par_max": 1200},
    "pr": {"scheme": "fx", "value": 0.3},
    "vs": {"scheme": "ln", "nlayers": 3, "par_min": 100, "par_max": 400},
    "rh": {"scheme": "ftl", "nlayers": 2, "thickness": 5, "par_min": 1800, "par_max": 2100}
}"#;

const MODELS: &str = "\
# Layered model 21: value=0.31
3
2 300 150 1800
8 600 300 1900
0 1200 600 2100
# Layered model 5: value=0.42
3
3 320 160 1800
7 640 320 1900
0 1300 640 2100
# Layered model 14: value=0.55
3
2.5 280 140 1800
9 560 280 1900
0 1100 560 2100
";

#[test]
fn recipe_to_param_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = dir.path().join("recipe.json");
    std::fs::write(&recipe, RECIPE).unwrap();

    for version in GeopsyVersion::SUPPORTED {
        let prefix = dir.path().join(format!("par_{}", version.as_str()));
        let output = pipeline::run_param(&recipe, &prefix, version).unwrap();
        assert!(output.path.exists());

        let parsed = Parameterization::from_param(&prefix, version).unwrap();
        assert_eq!(parsed, output.parameterization);
        assert_eq!(parsed.vp().linked(), Some(ProfileKind::Vs));
        assert_eq!(parsed.vs().nlayers(), 3);
        assert_eq!(parsed.vp().lay_min(), parsed.vs().lay_min());
    }
}

#[test]
fn csv_to_target_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("data.csv");
    std::fs::write(
        &csv,
        "#rayleigh 0\n2,400,20\n4,330,16.5\n8,260,13\n16,210,10.5\n32,180,9\n",
    )
    .unwrap();

    let config = TargetConfig {
        csv,
        out: dir.path().join("site"),
        version: GeopsyVersion::V2_10_1,
        fallback: ModeDescription::default(),
        resample: Some(Resample {
            pmin: 3.0,
            pmax: 30.0,
            pn: 10,
            domain: ResampleDomain::Frequency,
            spacing: Spacing::Log,
        }),
        cov: CovPolicy::Set(0.08),
        dc_weight: 1.0,
        dinver_txt: None,
    };
    let output = pipeline::run_target(&config).unwrap();
    let written = &output.set.targets()[0];
    assert_eq!(written.len(), 10);
    assert_relative_eq!(written.frequency()[0], 3.0, max_relative = 1e-12);
    assert_relative_eq!(written.frequency()[9], 30.0, max_relative = 1e-12);
    for cov in written.cov() {
        assert_relative_eq!(cov, 0.08, max_relative = 1e-9);
    }

    let parsed = TargetSet::from_target(&config.out, config.version).unwrap();
    assert_eq!(parsed, output.set);
    assert_eq!(parsed.targets()[0].description()[0].polarization, Polarization::Rayleigh);

    let single = ModalTarget::from_target(&config.out, config.version).unwrap();
    assert_eq!(&single, written);
}

#[test]
fn ground_dump_to_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let models = dir.path().join("gm.txt");
    std::fs::write(&models, MODELS).unwrap();

    let config = StatsConfig {
        models: models.clone(),
        nbest: None,
        parameter: ProfileKind::Vs,
        dy: 0.5,
        extent: DepthExtent::Fixed(20.0),
    };
    let output = pipeline::run_stats(&config).unwrap();
    assert_eq!(output.suite.identifiers(), vec![21, 5, 14]);
    assert_eq!(output.suite.misfit_repr(None).unwrap(), "[0.31-0.55]");
    assert_eq!(output.sigma.depth.len(), 41);

    // Every half-space Vs is four times the model's top-layer Vs.
    let deep = *output.sigma.sigma.last().unwrap();
    let top = output.sigma.sigma[0];
    assert_relative_eq!(deep, top, max_relative = 1e-9);

    let json = dir.path().join("stats.json");
    swprepost::io::write_stats_json(&json, &pipeline::stats_summary(&config, &output)).unwrap();
    let summary = swprepost::io::read_stats_json(&json).unwrap();
    assert_eq!(summary.models, 3);
    assert_eq!(summary.sigma_ln, output.sigma);

    let reparsed = GroundModelSuite::from_geopsy(&output.suite.to_geopsy_text(), None).unwrap();
    assert_eq!(reparsed.identifiers(), output.suite.identifiers());
}

#[test]
fn dispersion_dump_keeps_requested_modes() {
    let text = "\
# Layered model 21: value=0.31
# 2 Rayleigh dispersion mode(s)
# CPU Time = 2 ms
# Mode 0
2 0.0025
4 0.003
8 0.0038
# Mode 1
4 0.0022
8 0.0028
# Layered model 5: value=0.42
# 1 Rayleigh dispersion mode(s)
# CPU Time = 2 ms
# Mode 0
2 0.0024
4 0.0029
";
    let limits = DispersionLimits {
        nrayleigh: Some(1),
        ..DispersionLimits::default()
    };
    let suite = DispersionSuite::from_geopsy(text, limits).unwrap();
    assert_eq!(suite.len(), 2);
    assert_eq!(suite.members()[0].item.rayleigh().len(), 1);

    let again = DispersionSuite::from_geopsy(&suite.to_geopsy_text(), DispersionLimits::default()).unwrap();
    assert_eq!(again, suite);
}
