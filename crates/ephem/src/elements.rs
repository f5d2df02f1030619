//! Classical orbital elements and conversions to and from Cartesian state.

use std::f64::consts::{PI, TAU};

use snoopy_core::units::deg_to_rad;
use snoopy_core::vector::{self, Vector3};

use crate::{EphemerisError, StateVector};

// Newton step size at which Kepler's equation counts as solved.
const KEPLER_TOLERANCE: f64 = 1e-14;
const KEPLER_MAX_ITERATIONS: usize = 100;
// Below this the orbit is treated as circular / equatorial when converting from state.
const SINGULARITY_EPS: f64 = 1e-12;

/// Classical Keplerian elements with the mean anomaly as the fast variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerianElements {
    pub a_m: f64,
    pub e: f64,
    pub i_rad: f64,
    pub raan_rad: f64,
    pub argp_rad: f64,
    pub mean_anomaly_rad: f64,
}

impl KeplerianElements {
    /// Build elements from angles expressed in degrees.
    pub fn from_degrees(
        a_m: f64,
        e: f64,
        i_deg: f64,
        raan_deg: f64,
        argp_deg: f64,
        mean_anomaly_deg: f64,
    ) -> Self {
        Self {
            a_m,
            e,
            i_rad: deg_to_rad(i_deg),
            raan_rad: deg_to_rad(raan_deg),
            argp_rad: deg_to_rad(argp_deg),
            mean_anomaly_rad: deg_to_rad(mean_anomaly_deg),
        }
    }

    /// Reject anything that is not a finite, bound ellipse.
    pub fn validate(&self) -> Result<(), EphemerisError> {
        let all_finite = [
            self.a_m,
            self.e,
            self.i_rad,
            self.raan_rad,
            self.argp_rad,
            self.mean_anomaly_rad,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(EphemerisError::InvalidElements(
                "elements must be finite".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.e) {
            return Err(EphemerisError::UnsupportedOrbit {
                eccentricity: self.e,
            });
        }
        if self.a_m <= 0.0 {
            return Err(EphemerisError::InvalidElements(format!(
                "semi-major axis must be positive, got {} m",
                self.a_m
            )));
        }
        Ok(())
    }

    /// Mean motion (rad/s) under the given gravitational parameter.
    pub fn mean_motion(&self, mu_m3_s2: f64) -> f64 {
        (mu_m3_s2 / (self.a_m * self.a_m * self.a_m)).sqrt()
    }

    /// Same orbit, different mean anomaly.
    pub fn with_mean_anomaly(&self, mean_anomaly_rad: f64) -> Self {
        Self {
            mean_anomaly_rad,
            ..*self
        }
    }

    /// Convert to an inertial state vector.
    pub fn to_state_vector(&self, mu_m3_s2: f64) -> Result<StateVector, EphemerisError> {
        self.validate()?;
        let a = self.a_m;
        let e = self.e;
        let ea = eccentric_from_mean(self.mean_anomaly_rad, e)?;

        // Perifocal frame.
        let b = a * (1.0 - e * e).sqrt();
        let n = (mu_m3_s2 / (a * a * a)).sqrt();
        let (sin_ea, cos_ea) = ea.sin_cos();
        let denom = 1.0 - e * cos_ea;
        let r_pqw = [a * (cos_ea - e), b * sin_ea, 0.0];
        let v_pqw = [-(a * n * sin_ea) / denom, (b * n * cos_ea) / denom, 0.0];

        // Rotation matrix PQW -> inertial.
        let (sin_raan, cos_raan) = self.raan_rad.sin_cos();
        let (sin_argp, cos_argp) = self.argp_rad.sin_cos();
        let (sin_i, cos_i) = self.i_rad.sin_cos();
        let rot = [
            [
                cos_raan * cos_argp - sin_raan * sin_argp * cos_i,
                -cos_raan * sin_argp - sin_raan * cos_argp * cos_i,
                sin_raan * sin_i,
            ],
            [
                sin_raan * cos_argp + cos_raan * sin_argp * cos_i,
                -sin_raan * sin_argp + cos_raan * cos_argp * cos_i,
                -cos_raan * sin_i,
            ],
            [sin_argp * sin_i, cos_argp * sin_i, cos_i],
        ];

        let mut r = [0.0; 3];
        let mut v = [0.0; 3];
        for j in 0..3 {
            for k in 0..3 {
                r[j] += rot[j][k] * r_pqw[k];
                v[j] += rot[j][k] * v_pqw[k];
            }
        }

        Ok(StateVector {
            position_m: r,
            velocity_m_s: v,
        })
    }

    /// Recover elliptic elements from an inertial state vector.
    ///
    /// Circular orbits report `argp = 0` and measure the anomaly from the node;
    /// equatorial orbits measure from the +x axis instead of the node.
    pub fn from_state_vector(state: &StateVector, mu_m3_s2: f64) -> Result<Self, EphemerisError> {
        let r = state.position_m;
        let v = state.velocity_m_s;
        let r_mag = vector::norm(&r);
        let v_mag = vector::norm(&v);
        if r_mag == 0.0 || !r_mag.is_finite() || !v_mag.is_finite() {
            return Err(EphemerisError::InvalidElements(
                "state vector must have a finite, non-zero position".to_string(),
            ));
        }

        let h = vector::cross(&r, &v);
        let h_mag = vector::norm(&h);
        if h_mag == 0.0 {
            return Err(EphemerisError::InvalidElements(
                "rectilinear trajectory has no orbital plane".to_string(),
            ));
        }

        let rv = vector::dot(&r, &v);
        let e_vec = vector::scale(
            &vector::sub(
                &vector::scale(&r, v_mag * v_mag - mu_m3_s2 / r_mag),
                &vector::scale(&v, rv),
            ),
            1.0 / mu_m3_s2,
        );
        let e = vector::norm(&e_vec);
        let energy = 0.5 * v_mag * v_mag - mu_m3_s2 / r_mag;
        if e >= 1.0 || energy >= 0.0 {
            return Err(EphemerisError::UnsupportedOrbit { eccentricity: e });
        }
        let a = -mu_m3_s2 / (2.0 * energy);

        let h_hat = vector::scale(&h, 1.0 / h_mag);
        let i = (h[0] * h[0] + h[1] * h[1]).sqrt().atan2(h[2]);

        let node = [-h[1], h[0], 0.0];
        let node_mag = vector::norm(&node);
        let (raan, p_hat) = if node_mag > SINGULARITY_EPS * h_mag {
            (
                node[1].atan2(node[0]).rem_euclid(TAU),
                vector::scale(&node, 1.0 / node_mag),
            )
        } else {
            (0.0, [1.0, 0.0, 0.0])
        };
        let q_hat = vector::cross(&h_hat, &p_hat);

        let latitude = vector::dot(&r, &q_hat).atan2(vector::dot(&r, &p_hat));
        let (argp, true_anomaly) = if e > SINGULARITY_EPS {
            let argp = vector::dot(&e_vec, &q_hat).atan2(vector::dot(&e_vec, &p_hat));
            (argp.rem_euclid(TAU), latitude - argp)
        } else {
            (0.0, latitude)
        };

        let (sin_nu, cos_nu) = true_anomaly.sin_cos();
        let ea = ((1.0 - e * e).sqrt() * sin_nu).atan2(e + cos_nu);
        let mean_anomaly = (ea - e * ea.sin()).rem_euclid(TAU);

        Ok(Self {
            a_m: a,
            e,
            i_rad: i,
            raan_rad: raan,
            argp_rad: argp,
            mean_anomaly_rad: mean_anomaly,
        })
    }
}

/// Solve Kepler's equation `M = E - e sin(E)` for the eccentric anomaly.
///
/// The mean anomaly is wrapped into `[-pi, pi)` first; the result lies in the same interval.
pub fn eccentric_from_mean(mean_anomaly: f64, e: f64) -> Result<f64, EphemerisError> {
    if !mean_anomaly.is_finite() || !(0.0..1.0).contains(&e) {
        return Err(EphemerisError::KeplerNonConvergence {
            mean_anomaly,
            eccentricity: e,
        });
    }
    let m = (mean_anomaly + PI).rem_euclid(TAU) - PI;
    let mut ea = if e < 0.8 { m } else { PI.copysign(m) };

    for _ in 0..KEPLER_MAX_ITERATIONS {
        let f = ea - e * ea.sin() - m;
        let fp = 1.0 - e * ea.cos();
        let delta = f / fp;
        ea -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            return Ok(ea);
        }
    }

    Err(EphemerisError::KeplerNonConvergence {
        mean_anomaly,
        eccentricity: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU: f64 = 1.327_124_400_18e20;

    #[test]
    fn kepler_solution_satisfies_equation() {
        for &e in &[0.0, 0.0167, 0.3, 0.9, 0.99] {
            for k in 0..12 {
                let m = k as f64 * 0.55;
                let ea = eccentric_from_mean(m, e).unwrap();
                let wrapped = (ea - e * ea.sin() - m).rem_euclid(TAU);
                let residual = wrapped.min(TAU - wrapped);
                assert!(residual < 1e-12, "e={e}, M={m}, residual={residual}");
            }
        }
    }

    #[test]
    fn kepler_converges_next_to_periapsis() {
        for &e in &[0.9, 0.99, 0.999] {
            for &m in &[1e-9, TAU - 1e-9, -1e-9, 4.0 * PI + 1e-7] {
                let ea = eccentric_from_mean(m, e).unwrap();
                assert!(ea.abs() < 0.1, "e={e}, M={m}, E={ea}");
                let residual = (ea - e * ea.sin() - (m + PI).rem_euclid(TAU) + PI).abs();
                assert!(residual < 1e-14, "e={e}, M={m}, residual={residual}");
            }
        }
    }

    #[test]
    fn kepler_rejects_hyperbolic_eccentricity() {
        assert!(matches!(
            eccentric_from_mean(1.0, 1.2),
            Err(EphemerisError::KeplerNonConvergence { .. })
        ));
    }

    #[test]
    fn state_round_trip_preserves_elements() {
        let elements = KeplerianElements::from_degrees(1.5e11, 0.2, 12.0, 40.0, 75.0, 130.0);
        let state = elements.to_state_vector(MU).unwrap();
        let back = KeplerianElements::from_state_vector(&state, MU).unwrap();
        assert!((back.a_m - elements.a_m).abs() / elements.a_m < 1e-10);
        assert!((back.e - elements.e).abs() < 1e-10);
        assert!((back.i_rad - elements.i_rad).abs() < 1e-10);
        assert!((back.raan_rad - elements.raan_rad).abs() < 1e-10);
        assert!((back.argp_rad - elements.argp_rad).abs() < 1e-10);
        assert!((back.mean_anomaly_rad - elements.mean_anomaly_rad).abs() < 1e-10);
    }

    #[test]
    fn hyperbolic_state_is_rejected() {
        let state = StateVector {
            position_m: [1.5e11, 0.0, 0.0],
            velocity_m_s: [0.0, 60_000.0, 0.0],
        };
        assert!(matches!(
            KeplerianElements::from_state_vector(&state, MU),
            Err(EphemerisError::UnsupportedOrbit { .. })
        ));
    }
}
