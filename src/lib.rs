//! Porkchop-plot calculator for impulsive heliocentric transfers.
//!
//! The facade re-exports the member crates so front-ends and integration tests can
//! depend on a single library.

pub use snoopy_config as config;
pub use snoopy_core as core;
pub use snoopy_ephem as ephem;
pub use snoopy_export as export;
pub use snoopy_impulsive as impulsive;
pub use snoopy_transfer as transfer;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
