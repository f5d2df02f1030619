//! Lambert solver seam and its `lambert-bate` backed implementation.

use lambert_bate::get_velocities;
use snoopy_core::vector::{self, Vector3};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LambertSolverError {
    #[error("lambert solver failed: {0}")]
    Failure(String),
    #[error("time of flight must be positive, got {0} s")]
    NonPositiveTimeOfFlight(f64),
    #[error("position vectors must be non-zero and finite")]
    DegenerateGeometry,
}

/// Velocities at both ends of one Lambert arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertSolution {
    pub revolutions: u32,
    pub v1_m_s: Vector3,
    pub v2_m_s: Vector3,
}

/// Prograde Lambert solver. Solutions are returned in order of revolution count,
/// so index 0 is always the zero-revolution arc.
pub trait LambertSolver {
    fn solve(
        &self,
        r1_m: Vector3,
        r2_m: Vector3,
        time_of_flight_s: f64,
        mu_m3_s2: f64,
        max_revolutions: u32,
    ) -> Result<Vec<LambertSolution>, LambertSolverError>;
}

impl<T: LambertSolver + ?Sized> LambertSolver for &T {
    fn solve(
        &self,
        r1_m: Vector3,
        r2_m: Vector3,
        time_of_flight_s: f64,
        mu_m3_s2: f64,
        max_revolutions: u32,
    ) -> Result<Vec<LambertSolution>, LambertSolverError> {
        (**self).solve(r1_m, r2_m, time_of_flight_s, mu_m3_s2, max_revolutions)
    }
}

/// Universal-variable solver (Bate, Mueller & White) from the `lambert-bate` crate.
///
/// Only the zero-revolution arc is available; higher revolution counts are never
/// returned regardless of `max_revolutions`.
#[derive(Debug, Clone, Copy)]
pub struct BateLambert {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for BateLambert {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 500,
        }
    }
}

impl LambertSolver for BateLambert {
    fn solve(
        &self,
        r1_m: Vector3,
        r2_m: Vector3,
        time_of_flight_s: f64,
        mu_m3_s2: f64,
        _max_revolutions: u32,
    ) -> Result<Vec<LambertSolution>, LambertSolverError> {
        if time_of_flight_s.is_nan() || time_of_flight_s <= 0.0 {
            return Err(LambertSolverError::NonPositiveTimeOfFlight(time_of_flight_s));
        }
        let (n1, n2) = (vector::norm(&r1_m), vector::norm(&r2_m));
        if !(n1.is_normal() && n2.is_normal()) {
            return Err(LambertSolverError::DegenerateGeometry);
        }

        let short = is_short_way_prograde(&r1_m, &r2_m);
        let (v1, v2) = get_velocities(
            r1_m,
            r2_m,
            time_of_flight_s,
            mu_m3_s2,
            short,
            self.tolerance,
            self.max_iterations,
        )
        .map_err(|e| LambertSolverError::Failure(format!("{e:?}")))?;

        Ok(vec![LambertSolution {
            revolutions: 0,
            v1_m_s: v1,
            v2_m_s: v2,
        }])
    }
}

/// Prograde motion sweeps less than 180° exactly when `(r1 × r2)_z` is non-negative.
pub fn is_short_way_prograde(r1: &Vector3, r2: &Vector3) -> bool {
    vector::cross(r1, r2)[2] >= 0.0
}
