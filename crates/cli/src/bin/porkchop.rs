use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use log::{LevelFilter, info};
use snoopy::config::load_scenario;
use snoopy::core::time::Epoch;
use snoopy::ephem::Ephemeris;
use snoopy::export::porkchop as export_porkchop;
use snoopy::transfer::scenario::{self, TransferScenario};
use snoopy::transfer::{TimeRange, WindowDataset, save_window_dataset, sweep};

/// Sweep departure and arrival epochs and write the Lambert Δv grid as CSV.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Porkchop CSV generator (zero-revolution Lambert, two-impulse Δv)"
)]
struct Cli {
    /// Scenario manifest (TOML, or YAML holding a single scenario)
    #[arg(long, conflicts_with = "preset")]
    scenario: Option<PathBuf>,

    /// Built-in scenario, used when no manifest is given
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// Override the departure window start (YYYY-MM-DD[ HH:MM:SS])
    #[arg(long)]
    depart_start: Option<String>,

    /// Override the arrival window start (YYYY-MM-DD[ HH:MM:SS])
    #[arg(long)]
    arrive_start: Option<String>,

    /// Override the grid step of both windows, in days
    #[arg(long)]
    step_days: Option<f64>,

    /// Override the span of both windows, in days
    #[arg(long)]
    span_days: Option<f64>,

    /// Output CSV file (use '-' for stdout)
    #[arg(long, default_value = "artifacts/pork.csv")]
    output: PathBuf,

    /// Also write the grid as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Also write the per-departure minimum-Δv dataset
    #[arg(long)]
    window_dataset: Option<PathBuf>,

    /// Spread departure rows over the rayon thread pool
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Earth to asteroid 2018 AV2, March and November 2041 windows
    #[value(name = "2041-av2")]
    EarthAv2,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose)?;

    let mut scenario = load(&cli)?;
    apply_overrides(&cli, &mut scenario)?;

    info!(
        "{}: {} -> {} around {}, {} x {} cells",
        scenario.name,
        scenario.origin.name(),
        scenario.destination.name(),
        scenario.central_body.name,
        scenario.departure.len(),
        scenario.arrival.len()
    );

    let grid = sweep(&scenario, cli.parallel)
        .with_context(|| format!("porkchop sweep for '{}' failed", scenario.name))?;

    let mut writer = export_porkchop::writer_for_path(&cli.output)?;
    export_porkchop::write_grid_csv(&mut writer, &grid)?;
    drop(writer);

    if let Some(path) = &cli.json {
        let writer = export_porkchop::writer_for_path(path)?;
        export_porkchop::write_grid_json(
            writer,
            scenario.origin.name(),
            scenario.destination.name(),
            &scenario.central_body.name,
            &grid,
        )?;
        info!("wrote JSON grid to {}", path.display());
    }

    if let Some(path) = &cli.window_dataset {
        let dataset = WindowDataset::from_grid(
            scenario.origin.name(),
            scenario.destination.name(),
            scenario.departure,
            scenario.arrival,
            &grid,
        );
        save_window_dataset(path, &dataset)?;
        info!(
            "wrote window dataset ({} samples) to {}",
            dataset.samples.len(),
            path.display()
        );
    }

    let (rows, cols) = grid.dimensions();
    match grid.best() {
        Some((departure, cell)) => eprintln!(
            "{rows}x{cols} grid; minimum Δv {:.3} m/s departing {} arriving {} (tof {:.1} d, dep {:.3} m/s, arr {:.3} m/s)",
            cell.dv_total_m_s,
            departure,
            cell.arrival,
            cell.time_of_flight_s / 86_400.0,
            cell.dv_departure_m_s,
            cell.dv_arrival_m_s
        ),
        None => eprintln!("{rows}x{cols} grid; no cells evaluated"),
    }

    Ok(())
}

fn init_logger(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.try_init()?;
    Ok(())
}

fn load(cli: &Cli) -> anyhow::Result<TransferScenario> {
    if let Some(path) = &cli.scenario {
        let config = load_scenario(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?;
        return Ok(scenario::build(&config)?);
    }
    match cli.preset.unwrap_or(Preset::EarthAv2) {
        Preset::EarthAv2 => Ok(scenario::porkchop_2041_transfer()?),
    }
}

fn apply_overrides(cli: &Cli, scenario: &mut TransferScenario) -> anyhow::Result<()> {
    scenario.departure = override_range(
        scenario.departure,
        cli.depart_start.as_deref(),
        cli.step_days,
        cli.span_days,
    )
    .context("invalid departure window")?;
    scenario.arrival = override_range(
        scenario.arrival,
        cli.arrive_start.as_deref(),
        cli.step_days,
        cli.span_days,
    )
    .context("invalid arrival window")?;
    Ok(())
}

fn override_range(
    range: TimeRange,
    start: Option<&str>,
    step_days: Option<f64>,
    span_days: Option<f64>,
) -> anyhow::Result<TimeRange> {
    if start.is_none() && step_days.is_none() && span_days.is_none() {
        return Ok(range);
    }
    let start = match start {
        Some(text) => Epoch::parse(text)?,
        None => range.start,
    };
    Ok(TimeRange::try_new(
        start,
        step_days.unwrap_or(range.step_days),
        span_days.unwrap_or(range.span_days),
    )?)
}
