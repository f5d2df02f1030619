use std::fs;
use std::path::PathBuf;

use snoopy::config::{
    CentralBodyConfig, ConfigError, NonCausalConfig, OrbitConfig, load_scenario, load_scenarios, parse_scenario_toml,
};
use snoopy::core::time::Epoch;
use snoopy::transfer::scenario::{self, ScenarioError};
use snoopy::transfer::{NonCausalPolicy, sweep};

fn manifest_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("configs/scenarios/earth_2018av2_2041.toml")
}

const MINIMAL: &str = r#"
name = "minimal"

[central_body]
name = "Sun"
mu_m3_s2 = 1.32712440018e20

[origin]
type = "jpl_lp"
body = "Earth"

[destination]
type = "jpl_lp"
body = "Mars"

[departure]
start = "2035-01-01"
step_days = 5.0
span_days = 20.0

[arrival]
start = "2035-09-01"
step_days = 5.0
span_days = 20.0
"#;

#[test]
fn bundled_manifest_describes_the_2041_sweep() {
    let config = load_scenario(manifest_path()).expect("load bundled scenario");
    assert_eq!(config.name, "Earth to 2018 AV2 (2041)");
    assert_eq!(config.origin, OrbitConfig::JplLp { body: "earth".into() });
    assert!(matches!(
        config.destination,
        OrbitConfig::Keplerian { epoch_jd, .. } if epoch_jd == 2_458_137.5
    ));
    assert_eq!(config.departure.span_days, 62.1);
    assert_eq!(config.non_causal, NonCausalConfig::Reject);

    let scenario = scenario::build(&config).expect("build scenario");
    assert_eq!(scenario.departure.len(), 63);
    assert_eq!(scenario.arrival.len(), 63);
    assert_eq!(scenario.non_causal, NonCausalPolicy::Reject);
}

#[test]
fn manifest_scenario_reproduces_reference_cell() {
    let mut config = load_scenario(manifest_path()).expect("load bundled scenario");
    config.departure.start = "2041-03-28".into();
    config.departure.span_days = 1.0;
    config.arrival.start = "2041-11-30".into();
    config.arrival.span_days = 1.0;

    let scenario = scenario::build(&config).expect("build scenario");
    let grid = sweep(&scenario, false).expect("single-cell sweep");
    assert_eq!(grid.dimensions(), (1, 1));
    let cell = grid.cell(0, 0).expect("cell");
    assert_eq!(cell.arrival, Epoch::parse("2041-11-30").expect("epoch"));
    assert_eq!(cell.time_of_flight_s, 21_340_800.0);
    assert!((cell.dv_total_m_s - 480.090_272_009_398_2).abs() < 1e-3);
}

#[test]
fn defaults_apply_when_optional_keys_are_missing() {
    let config = parse_scenario_toml(MINIMAL).expect("parse");
    assert_eq!(config.max_revolutions, 1);
    assert_eq!(config.non_causal, NonCausalConfig::Reject);

    let with_skip = format!("non_causal = \"skip\"\n{MINIMAL}");
    let config = parse_scenario_toml(&with_skip).expect("parse skip");
    assert_eq!(config.non_causal, NonCausalConfig::Skip);
    assert_eq!(
        scenario::build(&config).expect("build").non_causal,
        NonCausalPolicy::Skip
    );
}

#[test]
fn yaml_lists_and_directories_load_every_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    let yaml_path = dir.path().join("scenarios.yaml");
    fs::write(
        &yaml_path,
        r#"
- name: first
  central_body: { name: Sun, mu_m3_s2: 1.32712440018e20 }
  origin: { type: jpl_lp, body: earth }
  destination:
    type: state_vector
    name: sample
    epoch_jd: 2457905.5
    position_km: [-5.028580283544673e7, -1.422272856162977e8, -1.550277271285653e4]
    velocity_km_s: [2.758282089460933e1, -1.005988238736911e1, 4.542609417019783e-4]
  departure: { start: "2030-01-01", step_days: 1.0, span_days: 2.0 }
  arrival: { start: "2030-07-01", step_days: 1.0, span_days: 2.0 }
- name: second
  central_body: { name: Sun, mu_m3_s2: 1.32712440018e20 }
  origin: { type: jpl_lp, body: earth }
  destination: { type: jpl_lp, body: venus }
  departure: { start: "2030-01-01", step_days: 1.0, span_days: 2.0 }
  arrival: { start: "2030-07-01", step_days: 1.0, span_days: 2.0 }
  non_causal: attempt
"#,
    )
    .expect("write yaml");

    let scenarios = load_scenarios(&yaml_path).expect("load yaml");
    assert_eq!(scenarios.len(), 2);
    assert!(matches!(scenarios[0].destination, OrbitConfig::StateVector { .. }));
    assert_eq!(scenarios[1].non_causal, NonCausalConfig::Attempt);
    scenario::build(&scenarios[0]).expect("state-vector scenario builds");

    let err = load_scenario(&yaml_path).expect_err("two scenarios in one file");
    assert!(matches!(err, ConfigError::ScenarioCount { count: 2, .. }), "{err}");

    let toml_dir = dir.path().join("toml");
    fs::create_dir(&toml_dir).expect("mkdir");
    fs::write(toml_dir.join("b.toml"), MINIMAL.replace("minimal", "b")).expect("write b");
    fs::write(toml_dir.join("a.toml"), MINIMAL.replace("minimal", "a")).expect("write a");
    fs::write(toml_dir.join("notes.txt"), "ignored").expect("write txt");
    let names: Vec<String> = load_scenarios(&toml_dir)
        .expect("load dir")
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn build_rejects_invalid_manifests() {
    let base = parse_scenario_toml(MINIMAL).expect("parse");

    let mut config = base.clone();
    config.central_body.mu_m3_s2 = 0.0;
    assert!(matches!(
        scenario::build(&config),
        Err(ScenarioError::CentralBody { .. })
    ));

    let mut config = base.clone();
    config.central_body = CentralBodyConfig {
        name: "Earth".into(),
        mu_m3_s2: 3.986_004_418e14,
    };
    let err = scenario::build(&config).err().expect("earth mu with heliocentric bodies");
    assert!(
        matches!(
            &err,
            ScenarioError::CentralBodyMismatch { body, central, .. }
                if body == "earth" && central == "Earth"
        ),
        "{err}"
    );

    let mut config = base.clone();
    config.central_body.mu_m3_s2 *= 1.0 + 1e-12;
    scenario::build(&config).expect("mu within rounding of the solar value");

    let mut config = base.clone();
    config.arrival.span_days = 0.0;
    assert!(matches!(
        scenario::build(&config),
        Err(ScenarioError::Window { which: "arrival", .. })
    ));

    let mut config = base.clone();
    config.departure.start = "first of march".into();
    assert!(matches!(
        scenario::build(&config),
        Err(ScenarioError::Epoch { .. })
    ));

    let mut config = base;
    config.destination = OrbitConfig::JplLp {
        body: "planet nine".into(),
    };
    assert!(matches!(
        scenario::build(&config),
        Err(ScenarioError::Ephemeris(_))
    ));
}
