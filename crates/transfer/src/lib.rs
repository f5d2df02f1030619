//! Porkchop sweeps and launch-window analysis over analytic ephemerides.

pub mod porkchop;
pub mod scenario;
pub mod window;

pub use facade::*;
pub use snoopy_ephem as ephem;
pub use snoopy_impulsive as impulsive;

mod facade;
