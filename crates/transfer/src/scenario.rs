//! Central bodies, reference orbits, and scenario assembly from manifests.

use snoopy_config::{OrbitConfig, ScenarioConfig, WindowConfig};
use snoopy_core::constants::MU_SUN_M3_S2;
use snoopy_core::time::{Epoch, TimeError};
use snoopy_core::units::{au_to_m, km_to_m, kms_to_ms};
use snoopy_ephem::{
    Ephemeris, EphemerisError, JplLowPrecision, KeplerianElements, KeplerianOrbit, StateVector,
};

use crate::porkchop::{NonCausalPolicy, PorkchopError, PorkchopRequest, TimeRange};

/// Largest relative difference allowed between an orbit's μ and the central body's.
const MU_MATCH_TOLERANCE: f64 = 1e-9;

/// Ephemeris handle stored by a scenario.
pub type DynEphemeris = dyn Ephemeris + Send + Sync;

/// Body whose gravity drives the transfer arcs.
#[derive(Debug, Clone, PartialEq)]
pub struct CentralBody {
    pub name: String,
    pub mu_m3_s2: f64,
}

/// Errors raised while turning a manifest into runtime objects.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("invalid {field} epoch: {source}")]
    Epoch {
        field: &'static str,
        #[source]
        source: TimeError,
    },
    #[error("invalid {which} window: {source}")]
    Window {
        which: &'static str,
        #[source]
        source: PorkchopError,
    },
    #[error("orbit definition rejected: {0}")]
    Ephemeris(#[from] EphemerisError),
    #[error("central body `{name}` has non-positive gravitational parameter {mu}")]
    CentralBody { name: String, mu: f64 },
    #[error(
        "orbit of `{body}` is propagated with mu {orbit_mu} m^3/s^2 \
         but central body `{central}` has mu {central_mu} m^3/s^2"
    )]
    CentralBodyMismatch {
        body: String,
        central: String,
        orbit_mu: f64,
        central_mu: f64,
    },
}

/// Everything needed to run one porkchop sweep.
pub struct TransferScenario {
    pub name: String,
    pub central_body: CentralBody,
    pub origin: Box<DynEphemeris>,
    pub destination: Box<DynEphemeris>,
    pub departure: TimeRange,
    pub arrival: TimeRange,
    pub max_revolutions: u32,
    pub non_causal: NonCausalPolicy,
}

impl TransferScenario {
    /// Borrow the scenario as an evaluator request.
    pub fn request(&self) -> PorkchopRequest<'_, DynEphemeris, DynEphemeris> {
        PorkchopRequest::new(
            &*self.origin,
            &*self.destination,
            &self.central_body,
            self.departure,
            self.arrival,
        )
        .with_max_revolutions(self.max_revolutions)
        .with_non_causal(self.non_causal)
    }
}

pub fn sun() -> CentralBody {
    CentralBody {
        name: "Sun".to_string(),
        mu_m3_s2: MU_SUN_M3_S2,
    }
}

/// Earth's heliocentric orbit osculating on JD 2457905.5 (2017-Jun-01).
pub fn earth_orbit_2017() -> Result<KeplerianOrbit, EphemerisError> {
    let position_km = [
        -5.028580283544673e7,
        -1.422272856162977e8,
        -1.550277271285653e4,
    ];
    let velocity_km_s = [2.758282089460933e1, -1.005988238736911e1, 4.542609417019783e-4];
    let state = StateVector {
        position_m: position_km.map(km_to_m),
        velocity_m_s: velocity_km_s.map(kms_to_ms),
    };
    KeplerianOrbit::from_state_vector(
        "Earth (2017)",
        &state,
        Epoch::from_julian_date(2_457_905.5),
        sun().mu_m3_s2,
    )
}

/// Near-Earth asteroid 2018 AV2, elements at JD 2458137.5.
pub fn orbit_2018_av2() -> Result<KeplerianOrbit, EphemerisError> {
    let elements = KeplerianElements::from_degrees(
        au_to_m(1.029147132),
        0.02933445,
        0.122007,
        347.610893,
        110.815416,
        19.215145973,
    );
    KeplerianOrbit::new(
        "2018 AV2",
        Epoch::from_julian_date(2_458_137.5),
        elements,
        sun().mu_m3_s2,
    )
}

/// The 2041 Earth to 2018 AV2 sweep: two 62.1-day windows sampled daily.
pub fn porkchop_2041_transfer() -> Result<TransferScenario, ScenarioError> {
    let departure_start = parse_epoch("departure start", "2041-03-01 00:00:00")?;
    let arrival_start = parse_epoch("arrival start", "2041-11-01 00:00:00")?;
    Ok(TransferScenario {
        name: "Earth to 2018 AV2 (2041)".to_string(),
        central_body: sun(),
        origin: Box::new(JplLowPrecision::earth()),
        destination: Box::new(orbit_2018_av2()?),
        departure: TimeRange::new(departure_start, 1.0, 62.1),
        arrival: TimeRange::new(arrival_start, 1.0, 62.1),
        max_revolutions: 1,
        non_causal: NonCausalPolicy::Reject,
    })
}

/// Assemble a scenario from its manifest. Windows are validated strictly here.
pub fn build(config: &ScenarioConfig) -> Result<TransferScenario, ScenarioError> {
    let mu = config.central_body.mu_m3_s2;
    if !mu.is_finite() || mu <= 0.0 {
        return Err(ScenarioError::CentralBody {
            name: config.central_body.name.clone(),
            mu,
        });
    }
    let central_body = CentralBody {
        name: config.central_body.name.clone(),
        mu_m3_s2: mu,
    };

    let origin = build_orbit(&config.origin, mu)?;
    let destination = build_orbit(&config.destination, mu)?;
    for orbit in [&origin, &destination] {
        check_central_body(&**orbit, &central_body)?;
    }

    Ok(TransferScenario {
        name: config.name.clone(),
        origin,
        destination,
        departure: build_window("departure", &config.departure)?,
        arrival: build_window("arrival", &config.arrival)?,
        central_body,
        max_revolutions: config.max_revolutions,
        non_causal: config.non_causal.into(),
    })
}

fn build_orbit(config: &OrbitConfig, mu: f64) -> Result<Box<DynEphemeris>, ScenarioError> {
    let orbit: Box<DynEphemeris> = match config {
        OrbitConfig::JplLp { body } => Box::new(JplLowPrecision::new(body)?),
        OrbitConfig::Keplerian {
            name,
            epoch_jd,
            a_au,
            e,
            i_deg,
            raan_deg,
            argp_deg,
            mean_anomaly_deg,
        } => {
            let elements = KeplerianElements::from_degrees(
                au_to_m(*a_au),
                *e,
                *i_deg,
                *raan_deg,
                *argp_deg,
                *mean_anomaly_deg,
            );
            Box::new(KeplerianOrbit::new(
                name.clone(),
                Epoch::from_julian_date(*epoch_jd),
                elements,
                mu,
            )?)
        }
        OrbitConfig::StateVector {
            name,
            epoch_jd,
            position_km,
            velocity_km_s,
        } => {
            let state = StateVector {
                position_m: position_km.map(km_to_m),
                velocity_m_s: velocity_km_s.map(kms_to_ms),
            };
            Box::new(KeplerianOrbit::from_state_vector(
                name.clone(),
                &state,
                Epoch::from_julian_date(*epoch_jd),
                mu,
            )?)
        }
    };
    Ok(orbit)
}

/// Both bodies must orbit with the μ the Lambert arcs are solved with.
fn check_central_body(orbit: &DynEphemeris, central: &CentralBody) -> Result<(), ScenarioError> {
    let orbit_mu = orbit.mu_central_m3_s2();
    if ((orbit_mu - central.mu_m3_s2) / central.mu_m3_s2).abs() <= MU_MATCH_TOLERANCE {
        return Ok(());
    }
    Err(ScenarioError::CentralBodyMismatch {
        body: orbit.name().to_string(),
        central: central.name.clone(),
        orbit_mu,
        central_mu: central.mu_m3_s2,
    })
}

fn build_window(which: &'static str, config: &WindowConfig) -> Result<TimeRange, ScenarioError> {
    let start = parse_epoch(which, &config.start)?;
    TimeRange::try_new(start, config.step_days, config.span_days)
        .map_err(|source| ScenarioError::Window { which, source })
}

fn parse_epoch(field: &'static str, text: &str) -> Result<Epoch, ScenarioError> {
    Epoch::parse(text).map_err(|source| ScenarioError::Epoch { field, source })
}
