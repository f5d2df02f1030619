//! Porkchop grid evaluation: sweep departure/arrival epochs and record the impulsive
//! delta-v of the zero-revolution Lambert arc connecting each pair.

use std::cmp::Ordering;

use log::{debug, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use snoopy_core::time::Epoch;
use snoopy_core::vector;
use snoopy_ephem::{Ephemeris, EphemerisError, StateVector};
use snoopy_impulsive::{LambertSolver, LambertSolverError};

use crate::scenario::CentralBody;

/// Two epochs closer than this (in days) are considered the same grid coordinate.
const EPOCH_MATCH_TOLERANCE_DAYS: f64 = 1e-6;

/// Upper bound on the number of epochs a single [`TimeRange`] may produce.
pub const MAX_RANGE_EPOCHS: usize = 1_000_000;

/// Half-open sequence of epochs `start + k * step_days` for every integer `k` with
/// `k * step_days < span_days`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Epoch,
    pub step_days: f64,
    pub span_days: f64,
}

impl TimeRange {
    /// Build a range without validation. A non-positive step or span, or one that would
    /// produce more than [`MAX_RANGE_EPOCHS`] epochs, yields no epochs.
    pub fn new(start: Epoch, step_days: f64, span_days: f64) -> Self {
        Self {
            start,
            step_days,
            span_days,
        }
    }

    /// Build a range, rejecting a non-positive or non-finite step or span and any range
    /// longer than [`MAX_RANGE_EPOCHS`].
    pub fn try_new(start: Epoch, step_days: f64, span_days: f64) -> Result<Self, PorkchopError> {
        let range = Self::new(start, step_days, span_days);
        if range.is_well_formed() {
            Ok(range)
        } else {
            Err(PorkchopError::InvalidRange {
                step_days,
                span_days,
            })
        }
    }

    fn is_well_formed(&self) -> bool {
        self.step_days.is_finite()
            && self.step_days > 0.0
            && self.span_days.is_finite()
            && self.span_days > 0.0
            && (self.span_days / self.step_days).ceil() <= MAX_RANGE_EPOCHS as f64
    }

    /// Number of epochs in the range, never more than [`MAX_RANGE_EPOCHS`].
    pub fn len(&self) -> usize {
        if !self.is_well_formed() {
            return 0;
        }
        // The ratio is finite and capped here; the loops only fix rounding at the edge.
        let mut count = (self.span_days / self.step_days).ceil() as usize;
        while count > 0 && (count - 1) as f64 * self.step_days >= self.span_days {
            count -= 1;
        }
        while count < MAX_RANGE_EPOCHS && (count as f64) * self.step_days < self.span_days {
            count += 1;
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Day offsets from `start`, computed as `k * step` rather than by repeated addition.
    pub fn offsets(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(move |k| k as f64 * self.step_days)
    }

    pub fn epochs(&self) -> impl Iterator<Item = Epoch> + '_ {
        self.offsets().map(move |offset| self.start.add_days(offset))
    }
}

/// What to do with a cell whose arrival does not come after its departure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NonCausalPolicy {
    /// Abort the sweep with [`PorkchopError::NonPositiveTimeOfFlight`].
    #[default]
    Reject,
    /// Leave the cell out of its row.
    Skip,
    /// Hand the non-positive time of flight to the Lambert solver anyway.
    Attempt,
}

impl From<snoopy_config::NonCausalConfig> for NonCausalPolicy {
    fn from(value: snoopy_config::NonCausalConfig) -> Self {
        match value {
            snoopy_config::NonCausalConfig::Reject => NonCausalPolicy::Reject,
            snoopy_config::NonCausalConfig::Skip => NonCausalPolicy::Skip,
            snoopy_config::NonCausalConfig::Attempt => NonCausalPolicy::Attempt,
        }
    }
}

/// One (departure, arrival) evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub arrival: Epoch,
    pub time_of_flight_s: f64,
    pub dv_total_m_s: f64,
    pub dv_departure_m_s: f64,
    pub dv_arrival_m_s: f64,
}

/// All arrivals evaluated for one departure epoch, in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub departure: Epoch,
    pub cells: Vec<GridCell>,
}

/// Result grid: outer index is the departure epoch, inner index the arrival epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PorkchopGrid {
    rows: Vec<GridRow>,
}

impl PorkchopGrid {
    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, widest row)`.
    pub fn dimensions(&self) -> (usize, usize) {
        let columns = self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0);
        (self.rows.len(), columns)
    }

    pub fn cell(&self, departure_idx: usize, arrival_idx: usize) -> Option<&GridCell> {
        self.rows.get(departure_idx)?.cells.get(arrival_idx)
    }

    /// Look a cell up by its epochs.
    pub fn find(&self, departure: Epoch, arrival: Epoch) -> Option<&GridCell> {
        let row = self.rows.iter().find(|row| {
            (row.departure.mjd2000() - departure.mjd2000()).abs() < EPOCH_MATCH_TOLERANCE_DAYS
        })?;
        row.cells.iter().find(|cell| {
            (cell.arrival.mjd2000() - arrival.mjd2000()).abs() < EPOCH_MATCH_TOLERANCE_DAYS
        })
    }

    /// Every cell paired with its departure epoch, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (Epoch, &GridCell)> + '_ {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter().map(move |cell| (row.departure, cell)))
    }

    /// Cheapest transfer in the grid; NaN totals never win.
    pub fn best(&self) -> Option<(Epoch, &GridCell)> {
        self.cells()
            .filter(|(_, cell)| !cell.dv_total_m_s.is_nan())
            .min_by(|(_, a), (_, b)| {
                a.dv_total_m_s
                    .partial_cmp(&b.dv_total_m_s)
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl From<Vec<GridRow>> for PorkchopGrid {
    fn from(rows: Vec<GridRow>) -> Self {
        Self { rows }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PorkchopError {
    #[error(
        "invalid time range: step {step_days} d, span {span_days} d \
         (both must be positive and yield at most {} epochs)",
        MAX_RANGE_EPOCHS
    )]
    InvalidRange { step_days: f64, span_days: f64 },
    #[error("ephemeris of `{body}` failed at {epoch}: {source}")]
    Ephemeris {
        body: String,
        epoch: Epoch,
        #[source]
        source: EphemerisError,
    },
    #[error("lambert solve failed for departure {departure}, arrival {arrival}: {source}")]
    Lambert {
        departure: Epoch,
        arrival: Epoch,
        #[source]
        source: LambertSolverError,
    },
    #[error("no zero-revolution solution for departure {departure}, arrival {arrival}")]
    MissingZeroRevolution { departure: Epoch, arrival: Epoch },
    #[error("arrival {arrival} does not follow departure {departure}")]
    NonPositiveTimeOfFlight { departure: Epoch, arrival: Epoch },
}

/// Inputs to one porkchop sweep. Orbits are borrowed read-only for the whole sweep.
pub struct PorkchopRequest<'a, O: ?Sized, D: ?Sized> {
    pub origin: &'a O,
    pub destination: &'a D,
    pub central_body: &'a CentralBody,
    pub departure: TimeRange,
    pub arrival: TimeRange,
    /// Passed to [`LambertSolver::solve`]; the grid always keeps the zero-revolution arc.
    pub max_revolutions: u32,
    pub non_causal: NonCausalPolicy,
}

impl<'a, O, D> PorkchopRequest<'a, O, D>
where
    O: Ephemeris + ?Sized,
    D: Ephemeris + ?Sized,
{
    /// Request up to one revolution and reject non-causal cells.
    pub fn new(
        origin: &'a O,
        destination: &'a D,
        central_body: &'a CentralBody,
        departure: TimeRange,
        arrival: TimeRange,
    ) -> Self {
        Self {
            origin,
            destination,
            central_body,
            departure,
            arrival,
            max_revolutions: 1,
            non_causal: NonCausalPolicy::default(),
        }
    }

    pub fn with_non_causal(mut self, policy: NonCausalPolicy) -> Self {
        self.non_causal = policy;
        self
    }

    pub fn with_max_revolutions(mut self, max_revolutions: u32) -> Self {
        self.max_revolutions = max_revolutions;
        self
    }
}

/// Arrival epochs with the destination state pre-sampled for every column that
/// at least one departure will evaluate.
struct ArrivalColumn {
    epoch: Epoch,
    state: Option<StateVector>,
}

/// Sweep the full grid on the calling thread. Any collaborator failure aborts the
/// sweep and no partial grid is returned.
pub fn evaluate<O, D, L>(
    request: &PorkchopRequest<'_, O, D>,
    solver: &L,
) -> Result<PorkchopGrid, PorkchopError>
where
    O: Ephemeris + ?Sized,
    D: Ephemeris + ?Sized,
    L: LambertSolver + ?Sized,
{
    let departures: Vec<Epoch> = request.departure.epochs().collect();
    let columns = sample_arrivals(request, &departures)?;

    let rows = departures
        .iter()
        .map(|&departure| evaluate_row(request, solver, departure, &columns))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PorkchopGrid { rows })
}

/// Same sweep as [`evaluate`], with rows spread across the rayon pool. Row and
/// column order match the sequential result exactly.
pub fn evaluate_parallel<O, D, L>(
    request: &PorkchopRequest<'_, O, D>,
    solver: &L,
) -> Result<PorkchopGrid, PorkchopError>
where
    O: Ephemeris + Sync + ?Sized,
    D: Ephemeris + Sync + ?Sized,
    L: LambertSolver + Sync + ?Sized,
{
    let departures: Vec<Epoch> = request.departure.epochs().collect();
    let columns = sample_arrivals(request, &departures)?;

    let rows = departures
        .par_iter()
        .map(|&departure| evaluate_row(request, solver, departure, &columns))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PorkchopGrid { rows })
}

fn sample_arrivals<O, D>(
    request: &PorkchopRequest<'_, O, D>,
    departures: &[Epoch],
) -> Result<Vec<ArrivalColumn>, PorkchopError>
where
    O: Ephemeris + ?Sized,
    D: Ephemeris + ?Sized,
{
    debug!(
        "porkchop {} -> {}: {} departures x {} arrivals",
        request.origin.name(),
        request.destination.name(),
        departures.len(),
        request.arrival.len()
    );

    let Some(first_departure) = departures.first() else {
        return Ok(Vec::new());
    };

    request
        .arrival
        .epochs()
        .map(|epoch| -> Result<ArrivalColumn, PorkchopError> {
            let used = request.non_causal != NonCausalPolicy::Skip
                || epoch.seconds_since(first_departure) > 0.0;
            let state = if used {
                Some(state_of(request.destination, epoch)?)
            } else {
                None
            };
            Ok(ArrivalColumn { epoch, state })
        })
        .collect()
}

fn evaluate_row<O, D, L>(
    request: &PorkchopRequest<'_, O, D>,
    solver: &L,
    departure: Epoch,
    columns: &[ArrivalColumn],
) -> Result<GridRow, PorkchopError>
where
    O: Ephemeris + ?Sized,
    D: Ephemeris + ?Sized,
    L: LambertSolver + ?Sized,
{
    let mut origin_state: Option<StateVector> = None;
    let mut cells = Vec::with_capacity(columns.len());

    for column in columns {
        let arrival = column.epoch;
        let time_of_flight_s = arrival.seconds_since(&departure);
        if time_of_flight_s <= 0.0 {
            match request.non_causal {
                NonCausalPolicy::Reject => {
                    return Err(PorkchopError::NonPositiveTimeOfFlight { departure, arrival });
                }
                NonCausalPolicy::Skip => continue,
                NonCausalPolicy::Attempt => {}
            }
        }

        let dep_state = match origin_state {
            Some(state) => state,
            None => {
                let state = state_of(request.origin, departure)?;
                origin_state = Some(state);
                state
            }
        };
        let arr_state = match column.state {
            Some(state) => state,
            None => state_of(request.destination, arrival)?,
        };

        cells.push(evaluate_cell(
            request,
            solver,
            departure,
            arrival,
            time_of_flight_s,
            &dep_state,
            &arr_state,
        )?);
    }

    trace!("row {departure}: {} cells", cells.len());
    Ok(GridRow { departure, cells })
}

fn evaluate_cell<O, D, L>(
    request: &PorkchopRequest<'_, O, D>,
    solver: &L,
    departure: Epoch,
    arrival: Epoch,
    time_of_flight_s: f64,
    dep_state: &StateVector,
    arr_state: &StateVector,
) -> Result<GridCell, PorkchopError>
where
    O: Ephemeris + ?Sized,
    D: Ephemeris + ?Sized,
    L: LambertSolver + ?Sized,
{
    let solutions = solver
        .solve(
            dep_state.position_m,
            arr_state.position_m,
            time_of_flight_s,
            request.central_body.mu_m3_s2,
            request.max_revolutions,
        )
        .map_err(|source| PorkchopError::Lambert {
            departure,
            arrival,
            source,
        })?;

    let zero_rev = solutions
        .iter()
        .find(|solution| solution.revolutions == 0)
        .ok_or(PorkchopError::MissingZeroRevolution { departure, arrival })?;

    let dv_departure_m_s = vector::distance(&dep_state.velocity_m_s, &zero_rev.v1_m_s);
    let dv_arrival_m_s = vector::distance(&arr_state.velocity_m_s, &zero_rev.v2_m_s);

    Ok(GridCell {
        arrival,
        time_of_flight_s,
        dv_total_m_s: dv_departure_m_s + dv_arrival_m_s,
        dv_departure_m_s,
        dv_arrival_m_s,
    })
}

fn state_of<E: Ephemeris + ?Sized>(body: &E, epoch: Epoch) -> Result<StateVector, PorkchopError> {
    body.state_at(epoch).map_err(|source| PorkchopError::Ephemeris {
        body: body.name().to_string(),
        epoch,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_length_matches_half_open_loop() {
        let start = Epoch::from_mjd2000(0.0);
        assert_eq!(TimeRange::new(start, 1.0, 62.1).len(), 63);
        assert_eq!(TimeRange::new(start, 1.0, 62.0).len(), 62);
        assert_eq!(TimeRange::new(start, 0.1, 0.3).len(), 3);
        assert_eq!(TimeRange::new(start, 2.5, 10.0).len(), 4);
        assert_eq!(TimeRange::new(start, 5.0, 1.0).len(), 1);
    }

    #[test]
    fn degenerate_ranges_are_empty() {
        let start = Epoch::from_mjd2000(0.0);
        assert!(TimeRange::new(start, 1.0, 0.0).is_empty());
        assert!(TimeRange::new(start, 1.0, -3.0).is_empty());
        assert!(TimeRange::new(start, 0.0, 10.0).is_empty());
        assert!(TimeRange::new(start, -1.0, 10.0).is_empty());
        assert!(TimeRange::new(start, f64::NAN, 10.0).is_empty());
    }

    #[test]
    fn strict_constructor_rejects_degenerate_ranges() {
        let start = Epoch::from_mjd2000(0.0);
        assert!(TimeRange::try_new(start, 1.0, 10.0).is_ok());
        assert!(matches!(
            TimeRange::try_new(start, 0.0, 10.0),
            Err(PorkchopError::InvalidRange { .. })
        ));
        assert!(matches!(
            TimeRange::try_new(start, 1.0, 0.0),
            Err(PorkchopError::InvalidRange { .. })
        ));
    }

    #[test]
    fn oversized_ranges_are_capped_without_overflow() {
        let start = Epoch::from_mjd2000(0.0);
        let tiny_step = TimeRange::new(start, 1e-300, 1.0);
        assert!(tiny_step.is_empty());
        assert_eq!(tiny_step.epochs().count(), 0);
        assert!(TimeRange::new(start, f64::MIN_POSITIVE, f64::MAX).is_empty());
        assert!(matches!(
            TimeRange::try_new(start, 1e-300, 1.0),
            Err(PorkchopError::InvalidRange { .. })
        ));

        let at_cap = TimeRange::try_new(start, 1.0, MAX_RANGE_EPOCHS as f64).unwrap();
        assert_eq!(at_cap.len(), MAX_RANGE_EPOCHS);
        assert!(TimeRange::try_new(start, 1.0, MAX_RANGE_EPOCHS as f64 + 1.0).is_err());
    }

    #[test]
    fn epochs_are_index_based() {
        let range = TimeRange::new(Epoch::from_mjd2000(100.0), 0.1, 100.0);
        let last = range.epochs().last().unwrap();
        assert_eq!(range.len(), 1000);
        assert_eq!(last.mjd2000(), 100.0 + 999.0 * 0.1);
    }
}
