//! Export helpers for CSV and JSON porkchop artifacts.

pub mod porkchop {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    use serde::Serialize;
    use snoopy_transfer::{GridRow, PorkchopGrid};
    use thiserror::Error;

    pub const HEADER: [&str; 9] = [
        "depart_mjd2000",
        "arrive_mjd2000",
        "depart_utc",
        "arrive_utc",
        "tof_s",
        "tof_days",
        "dv_total_m_s",
        "dv_depart_m_s",
        "dv_arrive_m_s",
    ];

    #[derive(Debug, Error)]
    pub enum ExportError {
        #[error("I/O error: {0}")]
        Io(#[from] io::Error),
        #[error("CSV error: {0}")]
        Csv(#[from] csv::Error),
        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),
    }

    /// Create a writer for the target path, handling stdout (`-`) by convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    /// CSV row emitted by the porkchop exporter, in [`HEADER`] order.
    #[derive(Debug, Clone, Serialize)]
    pub struct Record {
        pub depart_mjd2000: f64,
        pub arrive_mjd2000: f64,
        pub depart_utc: String,
        pub arrive_utc: String,
        pub tof_s: f64,
        pub tof_days: f64,
        pub dv_total_m_s: f64,
        pub dv_depart_m_s: f64,
        pub dv_arrive_m_s: f64,
    }

    /// Flatten a grid into CSV records, row-major.
    pub fn records(grid: &PorkchopGrid) -> impl Iterator<Item = Record> + '_ {
        grid.cells().map(|(departure, cell)| Record {
            depart_mjd2000: departure.mjd2000(),
            arrive_mjd2000: cell.arrival.mjd2000(),
            depart_utc: departure.to_string(),
            arrive_utc: cell.arrival.to_string(),
            tof_s: cell.time_of_flight_s,
            tof_days: cell.time_of_flight_s / 86_400.0,
            dv_total_m_s: cell.dv_total_m_s,
            dv_depart_m_s: cell.dv_departure_m_s,
            dv_arrive_m_s: cell.dv_arrival_m_s,
        })
    }

    /// Write the header plus one line per grid cell.
    pub fn write_grid_csv<W: Write>(writer: W, grid: &PorkchopGrid) -> Result<(), ExportError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(HEADER)?;
        for record in records(grid) {
            csv_writer.serialize(record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    #[derive(Serialize)]
    struct GridDocument<'a> {
        origin: &'a str,
        destination: &'a str,
        central_body: &'a str,
        rows: &'a [GridRow],
    }

    /// Write the grid as pretty JSON, rows in departure order.
    pub fn write_grid_json<W: Write>(
        mut writer: W,
        origin: &str,
        destination: &str,
        central_body: &str,
        grid: &PorkchopGrid,
    ) -> Result<(), ExportError> {
        let document = GridDocument {
            origin,
            destination,
            central_body,
            rows: grid.rows(),
        };
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.flush()?;
        Ok(())
    }
}
