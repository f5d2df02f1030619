//! Launch-window summaries distilled from a porkchop grid.
//!
//! A [`WindowDataset`] keeps the cheapest arrival for every departure date, which is
//! what a caller needs to judge whether a proposed departure is close to optimal.

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use snoopy_core::time::Epoch;

use crate::porkchop::{GridCell, PorkchopGrid, TimeRange};

pub const WINDOW_DATASET_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSample {
    pub departure: Epoch,
    pub arrival: Epoch,
    pub time_of_flight_s: f64,
    pub dv_total_m_s: f64,
    pub dv_departure_m_s: f64,
    pub dv_arrival_m_s: f64,
}

impl WindowSample {
    fn from_cell(departure: Epoch, cell: &GridCell) -> Self {
        Self {
            departure,
            arrival: cell.arrival,
            time_of_flight_s: cell.time_of_flight_s,
            dv_total_m_s: cell.dv_total_m_s,
            dv_departure_m_s: cell.dv_departure_m_s,
            dv_arrival_m_s: cell.dv_arrival_m_s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowDataset {
    pub version: u32,
    pub origin: String,
    pub destination: String,
    pub departure: TimeRange,
    pub arrival: TimeRange,
    pub min_dv_total_m_s: Option<f64>,
    pub samples: Vec<WindowSample>,
}

impl WindowDataset {
    /// Keep the cheapest arrival of every departure row. Rows without a usable cell are dropped.
    pub fn from_grid(
        origin: &str,
        destination: &str,
        departure: TimeRange,
        arrival: TimeRange,
        grid: &PorkchopGrid,
    ) -> Self {
        let samples: Vec<WindowSample> = grid
            .rows()
            .iter()
            .filter_map(|row| {
                row.cells
                    .iter()
                    .filter(|cell| !cell.dv_total_m_s.is_nan())
                    .min_by(|a, b| {
                        a.dv_total_m_s
                            .partial_cmp(&b.dv_total_m_s)
                            .unwrap_or(Ordering::Equal)
                    })
                    .map(|cell| WindowSample::from_cell(row.departure, cell))
            })
            .collect();

        let min_dv = samples
            .iter()
            .map(|s| s.dv_total_m_s)
            .fold(None, |acc, dv| match acc {
                Some(current) if dv >= current => Some(current),
                _ => Some(dv),
            });

        Self {
            version: WINDOW_DATASET_VERSION,
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure,
            arrival,
            min_dv_total_m_s: min_dv,
            samples,
        }
    }

    fn baseline_sample(&self) -> Option<&WindowSample> {
        self.samples.iter().min_by(|a, b| {
            a.dv_total_m_s
                .partial_cmp(&b.dv_total_m_s)
                .unwrap_or(Ordering::Equal)
        })
    }
}

#[derive(Debug, Clone)]
pub struct WindowSuggestion {
    pub baseline: WindowSample,
    pub recommended: WindowSample,
    pub user_total_dv_m_s: f64,
    pub threshold_dv_m_s: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported window dataset version {found} (expected {})", WINDOW_DATASET_VERSION)]
    Version { found: u32 },
}

pub fn save_window_dataset(path: &Path, dataset: &WindowDataset) -> Result<(), WindowError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, dataset)?;
    writer.flush()?;
    Ok(())
}

pub fn load_window_dataset(path: &Path) -> Result<WindowDataset, WindowError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let dataset: WindowDataset = serde_json::from_reader(reader)?;
    if dataset.version != WINDOW_DATASET_VERSION {
        return Err(WindowError::Version {
            found: dataset.version,
        });
    }
    Ok(dataset)
}

/// Suggest a better departure when `total_dv_m_s` exceeds `threshold_factor` times the
/// dataset's minimum.
///
/// The suggestion is the cheapest sample departing on or after `departure` that is
/// under the threshold, else the latest earlier one under the threshold, else the
/// global minimum. Returns `None` when the proposed cost is already acceptable.
pub fn analyze_departure(
    dataset: &WindowDataset,
    departure: Epoch,
    total_dv_m_s: f64,
    threshold_factor: f64,
) -> Option<WindowSuggestion> {
    let baseline = dataset.baseline_sample()?.clone();
    let threshold = baseline.dv_total_m_s * threshold_factor;
    if total_dv_m_s <= threshold {
        return None;
    }

    let mut forward_candidate: Option<&WindowSample> = None;
    let mut backward_candidate: Option<&WindowSample> = None;

    for sample in &dataset.samples {
        if sample.dv_total_m_s > threshold {
            continue;
        }

        if sample.departure.mjd2000() >= departure.mjd2000() {
            match forward_candidate {
                Some(best) if sample.dv_total_m_s >= best.dv_total_m_s => {}
                _ => forward_candidate = Some(sample),
            }
        } else {
            match backward_candidate {
                Some(best) if sample.departure.mjd2000() <= best.departure.mjd2000() => {}
                _ => backward_candidate = Some(sample),
            }
        }
    }

    let recommended = forward_candidate
        .or(backward_candidate)
        .cloned()
        .unwrap_or_else(|| baseline.clone());

    Some(WindowSuggestion {
        baseline,
        recommended,
        user_total_dv_m_s: total_dv_m_s,
        threshold_dv_m_s: threshold,
    })
}
