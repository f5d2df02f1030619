//! Analytic heliocentric ephemerides built on two-body Keplerian motion.
//!
//! Every provider implements [`Ephemeris`], the only capability the porkchop sweep
//! needs: a position/velocity pair at an epoch, in a consistent inertial frame and
//! in SI units.

use snoopy_core::time::Epoch;
use snoopy_core::vector::Vector3;
use thiserror::Error;

pub mod elements;
pub mod jpl_lp;
pub mod keplerian;

pub use elements::{KeplerianElements, eccentric_from_mean};
pub use jpl_lp::JplLowPrecision;
pub use keplerian::KeplerianOrbit;

/// Position and velocity of a body at a given epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position_m: Vector3,
    pub velocity_m_s: Vector3,
}

/// Errors surfaced while evaluating an ephemeris.
#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("epoch {epoch} is outside the validity window of `{body}` ({valid})")]
    OutOfRange {
        body: String,
        epoch: Epoch,
        valid: &'static str,
    },
    #[error("Kepler's equation did not converge (M = {mean_anomaly}, e = {eccentricity})")]
    KeplerNonConvergence {
        mean_anomaly: f64,
        eccentricity: f64,
    },
    #[error("only elliptic orbits are supported (e = {eccentricity})")]
    UnsupportedOrbit { eccentricity: f64 },
    #[error("unknown body `{0}`")]
    UnknownBody(String),
    #[error("invalid orbital elements: {0}")]
    InvalidElements(String),
}

/// Ephemeris capability consumed by the grid evaluator.
pub trait Ephemeris {
    /// Human-readable body name used in logs and exports.
    fn name(&self) -> &str;

    /// Gravitational parameter of the central body the orbit is expressed around.
    fn mu_central_m3_s2(&self) -> f64;

    /// State of the body at `epoch`.
    fn state_at(&self, epoch: Epoch) -> Result<StateVector, EphemerisError>;
}

impl<T: Ephemeris + ?Sized> Ephemeris for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn mu_central_m3_s2(&self) -> f64 {
        (**self).mu_central_m3_s2()
    }

    fn state_at(&self, epoch: Epoch) -> Result<StateVector, EphemerisError> {
        (**self).state_at(epoch)
    }
}

impl<T: Ephemeris + ?Sized> Ephemeris for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn mu_central_m3_s2(&self) -> f64 {
        (**self).mu_central_m3_s2()
    }

    fn state_at(&self, epoch: Epoch) -> Result<StateVector, EphemerisError> {
        (**self).state_at(epoch)
    }
}
