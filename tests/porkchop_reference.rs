use snoopy::core::time::Epoch;
use snoopy::transfer::scenario::porkchop_2041_transfer;
use snoopy::transfer::{BateLambert, GridCell, PorkchopGrid, evaluate, evaluate_parallel, sweep};

const TOLERANCE: f64 = 1e-3;

fn reference_grid() -> PorkchopGrid {
    let scenario = porkchop_2041_transfer().expect("2041 scenario");
    sweep(&scenario, false).expect("2041 sweep")
}

fn lookup<'a>(grid: &'a PorkchopGrid, departure: &str, arrival: &str) -> &'a GridCell {
    let departure = Epoch::parse(departure).expect("departure epoch");
    let arrival = Epoch::parse(arrival).expect("arrival epoch");
    grid.find(departure, arrival)
        .unwrap_or_else(|| panic!("no cell for {departure} -> {arrival}"))
}

fn assert_close(label: &str, actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < TOLERANCE,
        "{label}: expected {expected}, got {actual}"
    );
}

#[test]
fn grid_has_one_row_per_departure_day() {
    let grid = reference_grid();
    assert_eq!(grid.dimensions(), (63, 63));
    for row in grid.rows() {
        assert_eq!(row.cells.len(), 63, "row {} is ragged", row.departure);
    }

    let first = &grid.rows()[0];
    assert_eq!(first.departure.to_string(), "2041-Mar-01 00:00:00");
    assert_eq!(first.cells[0].arrival.to_string(), "2041-Nov-01 00:00:00");
    let last = &grid.rows()[62];
    assert_eq!(last.departure.to_string(), "2041-May-02 00:00:00");
    assert_eq!(last.cells[62].arrival.to_string(), "2042-Jan-02 00:00:00");
}

#[test]
fn late_march_departure_matches_reference() {
    let grid = reference_grid();
    let cell = lookup(&grid, "2041-03-28", "2041-11-30");

    assert_eq!(cell.time_of_flight_s, 21_340_800.0);
    assert_close("total dv", cell.dv_total_m_s, 480.090_272_009_398_2);
    assert_close("departure dv", cell.dv_departure_m_s, 192.937_420_833_875);
    assert_close("arrival dv", cell.dv_arrival_m_s, 287.152_851_175_523_15);
}

#[test]
fn early_april_departure_matches_reference() {
    let grid = reference_grid();
    let cell = lookup(&grid, "2041-04-09", "2041-12-07");

    assert_eq!(cell.time_of_flight_s, 20_908_800.0);
    assert_close("total dv", cell.dv_total_m_s, 465.410_659_561_673);
    assert_close("departure dv", cell.dv_departure_m_s, 174.426_754_383_455_46);
    assert_close("arrival dv", cell.dv_arrival_m_s, 290.983_905_178_217_6);
}

#[test]
fn cell_totals_are_sum_of_both_burns() {
    let grid = reference_grid();
    for (departure, cell) in grid.cells() {
        assert!(cell.dv_departure_m_s >= 0.0 && cell.dv_arrival_m_s >= 0.0);
        assert_eq!(
            cell.dv_total_m_s,
            cell.dv_departure_m_s + cell.dv_arrival_m_s,
            "total mismatch at {departure} -> {}",
            cell.arrival
        );
        assert_eq!(cell.time_of_flight_s, cell.arrival.seconds_since(&departure));
    }

    let (_, best) = grid.best().expect("non-empty grid");
    assert!(best.dv_total_m_s <= 465.410_659_561_673 + TOLERANCE);
}

#[test]
fn repeated_sweeps_are_bit_identical() {
    let scenario = porkchop_2041_transfer().expect("2041 scenario");
    let request = scenario.request();
    let solver = BateLambert::default();

    let first = evaluate(&request, &solver).expect("first sweep");
    let second = evaluate(&request, &solver).expect("second sweep");
    assert_eq!(first, second);
}

#[test]
fn parallel_sweep_matches_sequential_order_and_values() {
    let scenario = porkchop_2041_transfer().expect("2041 scenario");
    let request = scenario.request();
    let solver = BateLambert::default();

    let sequential = evaluate(&request, &solver).expect("sequential sweep");
    let parallel = evaluate_parallel(&request, &solver).expect("parallel sweep");
    assert_eq!(sequential, parallel);
}
