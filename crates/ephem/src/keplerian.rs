//! Fixed-element Keplerian orbit propagated analytically from a reference epoch.

use log::trace;
use snoopy_core::time::Epoch;

use crate::{Ephemeris, EphemerisError, KeplerianElements, StateVector};

#[derive(Debug, Clone)]
pub struct KeplerianOrbit {
    name: String,
    reference_epoch: Epoch,
    elements: KeplerianElements,
    mu_central_m3_s2: f64,
}

impl KeplerianOrbit {
    pub fn new(
        name: impl Into<String>,
        reference_epoch: Epoch,
        elements: KeplerianElements,
        mu_central_m3_s2: f64,
    ) -> Result<Self, EphemerisError> {
        elements.validate()?;
        if !mu_central_m3_s2.is_finite() || mu_central_m3_s2 <= 0.0 {
            return Err(EphemerisError::InvalidElements(format!(
                "gravitational parameter must be positive, got {mu_central_m3_s2}"
            )));
        }
        Ok(Self {
            name: name.into(),
            reference_epoch,
            elements,
            mu_central_m3_s2,
        })
    }

    /// Osculating orbit of a state vector observed at `reference_epoch`.
    pub fn from_state_vector(
        name: impl Into<String>,
        state: &StateVector,
        reference_epoch: Epoch,
        mu_central_m3_s2: f64,
    ) -> Result<Self, EphemerisError> {
        let elements = KeplerianElements::from_state_vector(state, mu_central_m3_s2)?;
        Self::new(name, reference_epoch, elements, mu_central_m3_s2)
    }

    pub fn elements(&self) -> &KeplerianElements {
        &self.elements
    }

    pub fn reference_epoch(&self) -> Epoch {
        self.reference_epoch
    }

    /// Orbital period in seconds.
    pub fn period_s(&self) -> f64 {
        std::f64::consts::TAU / self.elements.mean_motion(self.mu_central_m3_s2)
    }
}

impl Ephemeris for KeplerianOrbit {
    fn name(&self) -> &str {
        &self.name
    }

    fn mu_central_m3_s2(&self) -> f64 {
        self.mu_central_m3_s2
    }

    fn state_at(&self, epoch: Epoch) -> Result<StateVector, EphemerisError> {
        let dt = epoch.seconds_since(&self.reference_epoch);
        let mean_anomaly = self.elements.mean_anomaly_rad
            + self.elements.mean_motion(self.mu_central_m3_s2) * dt;
        trace!("{}: dt = {dt} s, M = {mean_anomaly} rad", self.name);
        self.elements
            .with_mean_anomaly(mean_anomaly)
            .to_state_vector(self.mu_central_m3_s2)
    }
}
