//! Re-exported APIs for consumers of the transfer crate.

pub use crate::porkchop::{
    GridCell, GridRow, NonCausalPolicy, PorkchopError, PorkchopGrid, PorkchopRequest, TimeRange,
    evaluate, evaluate_parallel,
};
pub use crate::scenario::{CentralBody, DynEphemeris, ScenarioError, TransferScenario};
pub use crate::window::{
    WindowDataset, WindowError, WindowSample, WindowSuggestion, analyze_departure,
    load_window_dataset, save_window_dataset,
};
pub use snoopy_impulsive::{BateLambert, LambertSolver};

use log::warn;

/// Run a scenario end to end with the default Lambert backend.
pub fn sweep(scenario: &TransferScenario, parallel: bool) -> Result<PorkchopGrid, PorkchopError> {
    let solver = BateLambert::default();
    if scenario.max_revolutions > 1 {
        warn!(
            "{}: max_revolutions = {} has no effect; the default Lambert backend \
             only solves the zero-revolution arc",
            scenario.name, scenario.max_revolutions
        );
    }
    let request = scenario.request();
    if parallel {
        evaluate_parallel(&request, &solver)
    } else {
        evaluate(&request, &solver)
    }
}
