use snoopy::core::constants::{AU_M, MU_SUN_M3_S2};
use snoopy::core::vector;
use snoopy::impulsive::{BateLambert, LambertSolver, LambertSolverError};

#[test]
fn lambert_quarter_orbit_matches_circular_velocity() {
    let r1 = [AU_M, 0.0, 0.0];
    let r2 = [0.0, AU_M, 0.0];
    let tof = (std::f64::consts::PI / 2.0) * (AU_M.powi(3) / MU_SUN_M3_S2).sqrt();

    let solutions = BateLambert::default()
        .solve(r1, r2, tof, MU_SUN_M3_S2, 1)
        .expect("lambert solve");
    assert_eq!(solutions.len(), 1, "only the zero-revolution arc is produced");
    let arc = solutions[0];
    assert_eq!(arc.revolutions, 0);

    let v1_mag = vector::norm(&arc.v1_m_s);
    let v2_mag = vector::norm(&arc.v2_m_s);
    let expected_speed = (MU_SUN_M3_S2 / AU_M).sqrt();

    assert!(
        vector::dot(&arc.v1_m_s, &[0.0, 1.0, 0.0]) / v1_mag > 0.99,
        "expected prograde tangential velocity at departure: {:?}",
        arc.v1_m_s
    );
    assert!(
        vector::dot(&arc.v2_m_s, &[-1.0, 0.0, 0.0]) / v2_mag > 0.99,
        "expected prograde tangential velocity at arrival: {:?}",
        arc.v2_m_s
    );
    assert!((v1_mag - expected_speed).abs() < 5.0, "|v1| = {v1_mag}");
    assert!((v2_mag - expected_speed).abs() < 5.0, "|v2| = {v2_mag}");
}

#[test]
fn revolution_limit_does_not_change_the_single_branch() {
    let r1 = [AU_M, 0.0, 0.0];
    let r2 = [0.0, AU_M, 0.0];
    let tof = 4.0 * (AU_M.powi(3) / MU_SUN_M3_S2).sqrt();
    let solver = BateLambert::default();

    let zero = solver.solve(r1, r2, tof, MU_SUN_M3_S2, 0).expect("limit 0");
    let three = solver.solve(r1, r2, tof, MU_SUN_M3_S2, 3).expect("limit 3");
    assert_eq!(zero.len(), 1);
    assert_eq!(three.len(), 1);
    assert_eq!(three[0].revolutions, 0);
    assert_eq!(zero[0].v1_m_s, three[0].v1_m_s);
    assert_eq!(zero[0].v2_m_s, three[0].v2_m_s);
}

#[test]
fn transfers_past_half_a_revolution_stay_prograde() {
    let r1 = [AU_M, 0.0, 0.0];
    let r2 = [0.0, -AU_M, 0.0];
    let tof = (3.0 * std::f64::consts::PI / 2.0) * (AU_M.powi(3) / MU_SUN_M3_S2).sqrt();

    let solutions = BateLambert::default()
        .solve(r1, r2, tof, MU_SUN_M3_S2, 0)
        .expect("lambert solve");
    let arc = solutions[0];
    let h = vector::cross(&r1, &arc.v1_m_s);
    assert!(h[2] > 0.0, "angular momentum should point north, got {h:?}");
}

#[test]
fn solver_rejects_degenerate_inputs() {
    let solver = BateLambert::default();
    let r1 = [AU_M, 0.0, 0.0];
    let r2 = [0.0, AU_M, 0.0];

    for tof in [0.0, -86_400.0, f64::NAN] {
        let err = solver
            .solve(r1, r2, tof, MU_SUN_M3_S2, 0)
            .expect_err("non-positive time of flight");
        assert!(
            matches!(err, LambertSolverError::NonPositiveTimeOfFlight(_)),
            "{err}"
        );
    }

    let err = solver
        .solve([0.0; 3], r2, 86_400.0, MU_SUN_M3_S2, 0)
        .expect_err("zero radius");
    assert!(matches!(err, LambertSolverError::DegenerateGeometry), "{err}");
}
