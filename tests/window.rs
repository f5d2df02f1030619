use snoopy::core::time::Epoch;
use snoopy::transfer::{
    GridCell, GridRow, PorkchopGrid, TimeRange, WindowDataset, WindowError, analyze_departure,
    load_window_dataset, save_window_dataset,
};

fn day(offset: f64) -> Epoch {
    Epoch::parse("2041-03-01").expect("epoch").add_days(offset)
}

fn cell(departure: f64, arrival: f64, dv: f64) -> GridCell {
    GridCell {
        arrival: day(arrival),
        time_of_flight_s: (arrival - departure) * 86_400.0,
        dv_total_m_s: dv,
        dv_departure_m_s: dv - 300.0,
        dv_arrival_m_s: 300.0,
    }
}

/// Five departures whose cheapest arrivals cost 900, 700, 500, 650, 1200 m/s.
fn dataset() -> WindowDataset {
    let costs = [900.0, 700.0, 500.0, 650.0, 1200.0];
    let rows = costs
        .iter()
        .enumerate()
        .map(|(i, &best)| {
            let d = i as f64;
            GridRow {
                departure: day(d),
                cells: vec![
                    cell(d, 200.0, best + 40.0),
                    cell(d, 201.0, best),
                    cell(d, 202.0, f64::NAN),
                ],
            }
        })
        .collect::<Vec<_>>();
    let grid = PorkchopGrid::from(rows);
    WindowDataset::from_grid(
        "earth",
        "2018 AV2",
        TimeRange::new(day(0.0), 1.0, 5.0),
        TimeRange::new(day(200.0), 1.0, 3.0),
        &grid,
    )
}

#[test]
fn dataset_keeps_cheapest_arrival_per_departure() {
    let dataset = dataset();
    assert_eq!(dataset.samples.len(), 5);
    assert_eq!(dataset.min_dv_total_m_s, Some(500.0));
    for sample in &dataset.samples {
        assert_eq!(sample.arrival, day(201.0));
    }
    assert_eq!(dataset.samples[2].departure, day(2.0));
}

#[test]
fn dataset_round_trips_through_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested/window.json");
    let dataset = dataset();

    save_window_dataset(&path, &dataset).expect("save");
    let loaded = load_window_dataset(&path).expect("load");
    assert_eq!(loaded, dataset);
}

#[test]
fn unknown_dataset_version_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("window.json");
    let mut dataset = dataset();
    dataset.version = 99;
    save_window_dataset(&path, &dataset).expect("save");

    let err = load_window_dataset(&path).expect_err("version mismatch");
    assert!(matches!(err, WindowError::Version { found: 99 }), "{err}");
}

#[test]
fn acceptable_departures_get_no_suggestion() {
    let dataset = dataset();
    assert!(analyze_departure(&dataset, day(3.0), 650.0, 1.5).is_none());
}

#[test]
fn expensive_departure_is_pointed_at_a_cheaper_later_date() {
    let dataset = dataset();
    let suggestion = analyze_departure(&dataset, day(1.0), 1_000.0, 1.5).expect("suggestion");

    assert_eq!(suggestion.baseline.dv_total_m_s, 500.0);
    assert_eq!(suggestion.threshold_dv_m_s, 750.0);
    assert_eq!(suggestion.user_total_dv_m_s, 1_000.0);
    assert_eq!(suggestion.recommended.departure, day(2.0));
}

#[test]
fn late_departure_falls_back_to_latest_earlier_candidate() {
    let dataset = dataset();
    let suggestion = analyze_departure(&dataset, day(4.0), 1_200.0, 1.2).expect("suggestion");

    assert_eq!(suggestion.threshold_dv_m_s, 600.0);
    assert_eq!(suggestion.recommended.departure, day(2.0));

    let suggestion = analyze_departure(&dataset, day(4.0), 1_200.0, 1.5).expect("suggestion");
    assert_eq!(suggestion.recommended.departure, day(3.0));
}
