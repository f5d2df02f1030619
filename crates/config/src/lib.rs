//! Scenario manifests for porkchop sweeps.
//!
//! A scenario names the central body, the two orbits, and the departure/arrival
//! windows. Manifests are TOML (one scenario per file, or a directory of files) or
//! YAML (a list of scenarios).

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// One porkchop sweep.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScenarioConfig {
    pub name: String,
    pub central_body: CentralBodyConfig,
    pub origin: OrbitConfig,
    pub destination: OrbitConfig,
    pub departure: WindowConfig,
    pub arrival: WindowConfig,
    /// Highest revolution count requested from the Lambert solver. Only the
    /// zero-revolution branch is used for the grid, and the bundled solver produces no
    /// other, so values above 1 change nothing with it.
    #[serde(default = "default_max_revolutions")]
    pub max_revolutions: u32,
    #[serde(default)]
    pub non_causal: NonCausalConfig,
}

/// Central body the two orbits are expressed around.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CentralBodyConfig {
    pub name: String,
    pub mu_m3_s2: f64,
}

/// Orbit definition, tagged by `type`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrbitConfig {
    /// Planet from the JPL approximate-positions table.
    JplLp { body: String },
    /// Fixed Keplerian elements at a reference epoch.
    Keplerian {
        name: String,
        epoch_jd: f64,
        a_au: f64,
        e: f64,
        i_deg: f64,
        raan_deg: f64,
        argp_deg: f64,
        mean_anomaly_deg: f64,
    },
    /// Osculating orbit of a heliocentric state vector.
    StateVector {
        name: String,
        epoch_jd: f64,
        position_km: [f64; 3],
        velocity_km_s: [f64; 3],
    },
}

/// Evaluation window: `start`, then every `step_days` while the offset is below `span_days`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WindowConfig {
    pub start: String,
    pub step_days: f64,
    pub span_days: f64,
}

/// How cells whose arrival does not follow departure are treated.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NonCausalConfig {
    #[default]
    Reject,
    Skip,
    Attempt,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("expected exactly one scenario in {path}, found {count}")]
    ScenarioCount { path: PathBuf, count: usize },
}

fn default_max_revolutions() -> u32 {
    1
}

/// Load every scenario found at `path`.
pub fn load_scenarios<P: AsRef<Path>>(path: P) -> Result<Vec<ScenarioConfig>, ConfigError> {
    load_records(path)
}

/// Load a manifest that must describe exactly one scenario.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioConfig, ConfigError> {
    let path = path.as_ref();
    let mut scenarios = load_scenarios(path)?;
    if scenarios.len() != 1 {
        return Err(ConfigError::ScenarioCount {
            path: path.to_path_buf(),
            count: scenarios.len(),
        });
    }
    Ok(scenarios.remove(0))
}

/// Parse a single TOML scenario from memory.
pub fn parse_scenario_toml(contents: &str) -> Result<ScenarioConfig, ConfigError> {
    Ok(toml::from_str(contents)?)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}
