//! Impulsive transfer utilities: the Lambert boundary-value problem.

pub mod lambert;

pub use lambert::{BateLambert, LambertSolution, LambertSolver, LambertSolverError};
