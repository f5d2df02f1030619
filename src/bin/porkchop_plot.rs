use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use csv::ReaderBuilder;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use snoopy::core::time::Epoch;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Render a porkchop heatmap from the porkchop CSV (any dv or tof column)"
)]
struct Cli {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value = "artifacts/pork.png")]
    output: PathBuf,
    /// Column to colour by; `dv_total`, `dv_depart`, `dv_arrive` and `tof` are accepted aliases.
    #[arg(long, default_value = "dv_total_m_s")]
    metric: String,
    #[arg(long, default_value_t = 1200)]
    width: u32,
    #[arg(long, default_value_t = 900)]
    height: u32,
    /// Values above `min * factor` share the top colour.
    #[arg(long, default_value_t = 2.0)]
    high_clip_factor: f64,
}

#[derive(Debug, Clone)]
struct Cell {
    depart_mjd2000: f64,
    arrive_mjd2000: f64,
    metric_value: f64,
}

/// Cells resampled onto the departure/arrival lattice, indexed `[arrival][departure]`.
struct Heatmap {
    metric_column: String,
    depart_origin: f64,
    arrive_origin: f64,
    dep_coords: Vec<f64>,
    arr_coords: Vec<f64>,
    values: Vec<Vec<f64>>,
    min_value: f64,
    high_clip: f64,
    min_pos: (usize, usize),
}

impl Heatmap {
    fn depart_span(&self) -> f64 {
        self.dep_coords.last().copied().unwrap_or(0.0).max(1.0)
    }

    fn arrive_span(&self) -> f64 {
        self.arr_coords.last().copied().unwrap_or(0.0).max(1.0)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (cells, metric_column) = read_cells(&cli.input, &cli.metric)?;
    if cells.is_empty() {
        return Err(anyhow::anyhow!("No finite '{}' values in the provided CSV", metric_column));
    }
    let heatmap = build_heatmap(&cells, metric_column, cli.high_clip_factor)?;

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if let Err(err) = render(&cli, &heatmap, true) {
        eprintln!("warning: labelled render failed ({err}); retrying without text");
        render(&cli, &heatmap, false)?;
    }
    Ok(())
}

fn render(cli: &Cli, heatmap: &Heatmap, with_text: bool) -> anyhow::Result<()> {
    let output_str = cli
        .output
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Output path contains invalid UTF-8"))?;
    let root = BitMapBackend::new(output_str, (cli.width, cli.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let font_family = select_font_family();
    let caption_font = FontDesc::new(font_family, 24.0, FontStyle::Bold);
    let label_font = FontDesc::new(font_family, 18.0, FontStyle::Normal);

    let legend_width = 140i32;
    let (plot_area, legend_area) =
        root.split_horizontally((cli.width as i32 - legend_width).max(200));

    let min_value = heatmap.min_value;
    let high_clip = heatmap.high_clip;
    let depart_span = heatmap.depart_span();
    let arrive_span = heatmap.arrive_span();

    {
        let mut builder = ChartBuilder::on(&plot_area);
        builder.margin(20);
        if with_text {
            builder
                .caption("Porkchop heatmap".to_string(), caption_font)
                .x_label_area_size(60)
                .y_label_area_size(90);
        }
        let mut chart = builder.build_cartesian_2d(0.0..depart_span, 0.0..arrive_span)?;

        if with_text {
            let depart_origin = heatmap.depart_origin;
            let arrive_origin = heatmap.arrive_origin;
            chart
                .configure_mesh()
                .x_desc("Departure Date")
                .y_desc("Arrival Date")
                .label_style(label_font.clone())
                .x_labels(6)
                .y_labels(6)
                .x_label_formatter(&|d| fmt_date_label(depart_origin + d))
                .y_label_formatter(&|d| fmt_date_label(arrive_origin + d))
                .draw()?;
        }

        for (arr_idx, row) in heatmap.values.iter().enumerate() {
            let (y0, y1) = cell_bounds(&heatmap.arr_coords, arr_idx);
            for (dep_idx, &value) in row.iter().enumerate() {
                if !value.is_finite() {
                    continue;
                }
                let (x0, x1) = cell_bounds(&heatmap.dep_coords, dep_idx);
                let color = jet_color(normalized(value, min_value, high_clip));
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(x0, y0), (x1, y1)],
                    color.filled(),
                )))?;
            }
        }

        let clamped: Vec<Vec<f64>> = heatmap
            .values
            .iter()
            .map(|row| row.iter().map(|v| v.clamp(min_value, high_clip)).collect())
            .collect();
        let levels: Vec<f64> = (0..30)
            .map(|i| min_value + (i as f64 / 29.0) * (high_clip - min_value))
            .collect();
        draw_contours(
            &mut chart,
            &clamped,
            &heatmap.dep_coords,
            &heatmap.arr_coords,
            &levels,
        )?;

        let (min_dep_idx, min_arr_idx) = heatmap.min_pos;
        let x = heatmap.dep_coords[min_dep_idx];
        let y = heatmap.arr_coords[min_arr_idx];
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, 0.0), (x, arrive_span)],
            ShapeStyle::from(&BLACK.mix(0.5)).stroke_width(1),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(0.0, y), (depart_span, y)],
            ShapeStyle::from(&BLACK.mix(0.5)).stroke_width(1),
        )))?;
        let marker_color = RGBColor(210, 100, 20);
        let cross_half_width = depart_span * 0.02;
        let cross_half_height = arrive_span * 0.02;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x - cross_half_width, y), (x + cross_half_width, y)],
            ShapeStyle::from(&marker_color).stroke_width(3),
        )))?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, y - cross_half_height), (x, y + cross_half_height)],
            ShapeStyle::from(&marker_color).stroke_width(3),
        )))?;
        if with_text {
            let (prefix, suffix) = metric_annotation(&heatmap.metric_column);
            let text = format!("{prefix}{min_value:.2}{suffix}");
            let text_pos = (x + 0.02 * depart_span, y + 0.02 * arrive_span);
            chart.draw_series(std::iter::once(Text::new(
                text,
                text_pos,
                label_font.clone().color(&marker_color),
            )))?;
        }
    }

    {
        let mut builder = ChartBuilder::on(&legend_area);
        builder
            .margin_left(20)
            .margin_right(20)
            .margin_top(30)
            .margin_bottom(30)
            .x_label_area_size(0);
        if with_text {
            builder.y_label_area_size(70);
        }
        let mut chart = builder.build_cartesian_2d(0.0..1.0, min_value..high_clip)?;

        for i in 0..300 {
            let t0 = i as f64 / 300.0;
            let t1 = (i + 1) as f64 / 300.0;
            let v0 = min_value + (high_clip - min_value) * t0;
            let v1 = min_value + (high_clip - min_value) * t1;
            chart.draw_series(std::iter::once(Rectangle::new(
                [(0.0, v0), (1.0, v1)],
                jet_color(t0).filled(),
            )))?;
        }

        if with_text {
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(0)
                .y_labels(6)
                .y_desc(metric_axis_label(&heatmap.metric_column))
                .y_label_style(label_font.clone())
                .axis_desc_style(label_font.clone())
                .y_label_formatter(&|v| format!("{v:.0}"))
                .draw()?;
        }
    }

    root.present()?;
    Ok(())
}

fn select_font_family() -> FontFamily<'static> {
    if cfg!(target_os = "macos") {
        FontFamily::Name("Helvetica")
    } else if cfg!(target_os = "windows") {
        FontFamily::Name("Arial")
    } else {
        FontFamily::Name("DejaVu Sans")
    }
}

fn read_cells(path: &Path, metric_name: &str) -> anyhow::Result<(Vec<Cell>, String)> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow::anyhow!("CSV missing '{}' column", name))
    };
    let depart_idx = column("depart_mjd2000")?;
    let arrive_idx = column("arrive_mjd2000")?;
    let metric_idx = resolve_metric_column(&headers, metric_name)
        .ok_or_else(|| anyhow::anyhow!("CSV missing metric column matching '{}'", metric_name))?;
    let metric_column = headers
        .get(metric_idx)
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid metric column index"))?;

    let parse = |record: &csv::StringRecord, idx: usize| -> f64 {
        record
            .get(idx)
            .and_then(|field| field.trim().parse().ok())
            .unwrap_or(f64::NAN)
    };

    let mut cells = Vec::new();
    for rec in rdr.records() {
        let r = rec?;
        let cell = Cell {
            depart_mjd2000: parse(&r, depart_idx),
            arrive_mjd2000: parse(&r, arrive_idx),
            metric_value: parse(&r, metric_idx),
        };
        if cell.depart_mjd2000.is_finite()
            && cell.arrive_mjd2000.is_finite()
            && cell.metric_value.is_finite()
        {
            cells.push(cell);
        }
    }
    Ok((cells, metric_column))
}

fn build_heatmap(
    cells: &[Cell],
    metric_column: String,
    high_clip_factor: f64,
) -> anyhow::Result<Heatmap> {
    let mut dep_vals: Vec<f64> = cells.iter().map(|c| c.depart_mjd2000).collect();
    let mut arr_vals: Vec<f64> = cells.iter().map(|c| c.arrive_mjd2000).collect();
    dep_vals.sort_by(f64::total_cmp);
    dep_vals.dedup();
    arr_vals.sort_by(f64::total_cmp);
    arr_vals.dedup();

    let depart_origin = *dep_vals
        .first()
        .ok_or_else(|| anyhow::anyhow!("No departure epochs in the provided CSV"))?;
    let arrive_origin = *arr_vals
        .first()
        .ok_or_else(|| anyhow::anyhow!("No arrival epochs in the provided CSV"))?;

    let mut values = vec![vec![f64::NAN; dep_vals.len()]; arr_vals.len()];
    for cell in cells {
        let Ok(dep_idx) = dep_vals.binary_search_by(|x| x.total_cmp(&cell.depart_mjd2000)) else {
            continue;
        };
        let Ok(arr_idx) = arr_vals.binary_search_by(|x| x.total_cmp(&cell.arrive_mjd2000)) else {
            continue;
        };
        let slot = &mut values[arr_idx][dep_idx];
        if !slot.is_finite() || cell.metric_value < *slot {
            *slot = cell.metric_value;
        }
    }

    let mut min_value = f64::INFINITY;
    let mut max_value = f64::NEG_INFINITY;
    let mut min_pos = None;
    for (arr_idx, row) in values.iter().enumerate() {
        for (dep_idx, &v) in row.iter().enumerate() {
            if !v.is_finite() {
                continue;
            }
            if v < min_value {
                min_value = v;
                min_pos = Some((dep_idx, arr_idx));
            }
            max_value = max_value.max(v);
        }
    }
    let min_pos = min_pos.ok_or_else(|| anyhow::anyhow!("No finite entries in the provided CSV"))?;

    let mut high_clip = (min_value * high_clip_factor).min(max_value);
    if !high_clip.is_finite() || high_clip <= min_value {
        high_clip = max_value.max(min_value + min_value.abs().max(1.0) * 1e-3);
    }

    Ok(Heatmap {
        metric_column,
        depart_origin,
        arrive_origin,
        dep_coords: dep_vals.iter().map(|d| d - depart_origin).collect(),
        arr_coords: arr_vals.iter().map(|d| d - arrive_origin).collect(),
        values,
        min_value,
        high_clip,
        min_pos,
    })
}

fn fmt_date_label(mjd2000: f64) -> String {
    match Epoch::from_mjd2000(mjd2000).to_calendar() {
        Ok(datetime) => datetime.format("%Y-%m-%d").to_string(),
        Err(_) => format!("{mjd2000:.0}"),
    }
}

fn normalized(value: f64, min_value: f64, high_clip: f64) -> f64 {
    if (high_clip - min_value).abs() < f64::EPSILON {
        0.0
    } else {
        (value.clamp(min_value, high_clip) - min_value) / (high_clip - min_value)
    }
}

fn jet_color(t_in: f64) -> RGBColor {
    let t = t_in.clamp(0.0, 1.0);
    fn comp(v: f64) -> f64 {
        (1.0 - (v - 1.0).abs()).clamp(0.0, 1.0)
    }
    let r = comp(1.5 - 4.0 * (t - 0.75).abs());
    let g = comp(1.5 - 4.0 * (t - 0.5).abs());
    let b = comp(1.5 - 4.0 * (t - 0.25).abs());
    RGBColor((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

fn draw_contours<DB: DrawingBackend>(
    chart: &mut ChartContext<DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    grid: &[Vec<f64>],
    dep_coords: &[f64],
    arr_coords: &[f64],
    levels: &[f64],
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    if dep_coords.len() < 2 || arr_coords.len() < 2 {
        return Ok(());
    }
    let min_level = levels.first().copied().unwrap_or(0.0);
    let max_level = levels.last().copied().unwrap_or(1.0);
    for &level in levels {
        let color = jet_color(normalized(level, min_level, max_level));
        for i in 0..arr_coords.len() - 1 {
            for j in 0..dep_coords.len() - 1 {
                let corners = [grid[i][j], grid[i][j + 1], grid[i + 1][j + 1], grid[i + 1][j]];
                if corners.iter().any(|v| !v.is_finite()) {
                    continue;
                }
                let coords = [
                    (dep_coords[j], arr_coords[i]),
                    (dep_coords[j + 1], arr_coords[i]),
                    (dep_coords[j + 1], arr_coords[i + 1]),
                    (dep_coords[j], arr_coords[i + 1]),
                ];
                for (p1, p2) in marching_square_segments(corners, coords, level) {
                    chart.draw_series(std::iter::once(PathElement::new(
                        vec![p1, p2],
                        ShapeStyle::from(&color).stroke_width(1),
                    )))?;
                }
            }
        }
    }
    Ok(())
}

/// Edges are numbered 0..4 clockwise from the (0,1) edge; each case lists the edge pairs to join.
fn marching_square_segments(
    values: [f64; 4],
    coords: [(f64, f64); 4],
    level: f64,
) -> Vec<((f64, f64), (f64, f64))> {
    let idx = values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v >= level)
        .fold(0u8, |acc, (bit, _)| acc | (1 << bit));

    let edges: &[(usize, usize)] = match idx {
        1 | 14 => &[(3, 0)],
        2 | 13 => &[(0, 1)],
        3 | 12 => &[(3, 1)],
        4 | 11 => &[(1, 2)],
        5 => &[(3, 2), (0, 1)],
        6 | 9 => &[(0, 2)],
        7 | 8 => &[(3, 2)],
        10 => &[(3, 0), (1, 2)],
        _ => &[],
    };

    let edge_point = |edge: usize| -> (f64, f64) {
        let a = edge;
        let b = (edge + 1) % 4;
        let (va, vb) = (values[a], values[b]);
        let ((xa, ya), (xb, yb)) = (coords[a], coords[b]);
        if (vb - va).abs() < f64::EPSILON {
            return ((xa + xb) * 0.5, (ya + yb) * 0.5);
        }
        let t = (level - va) / (vb - va);
        (xa + t * (xb - xa), ya + t * (yb - ya))
    };

    edges
        .iter()
        .map(|&(e1, e2)| (edge_point(e1), edge_point(e2)))
        .collect()
}

fn resolve_metric_column(headers: &csv::StringRecord, metric_name: &str) -> Option<usize> {
    let direct = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(metric_name));
    if direct.is_some() {
        return direct;
    }
    let metric_lower = metric_name.to_lowercase();
    let fallback = match metric_lower.as_str() {
        "dv_total" => "dv_total_m_s",
        "dv_depart" => "dv_depart_m_s",
        "dv_arrive" => "dv_arrive_m_s",
        "tof" => "tof_days",
        other => other,
    };
    headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(fallback))
}

fn metric_annotation(metric_column: &str) -> (String, String) {
    match metric_column.to_lowercase().as_str() {
        "dv_total_m_s" | "dv_depart_m_s" | "dv_arrive_m_s" => {
            ("Δv = ".to_string(), " m/s".to_string())
        }
        "tof_days" => ("TOF = ".to_string(), " d".to_string()),
        other => (format!("{other} = "), String::new()),
    }
}

fn metric_axis_label(metric_column: &str) -> String {
    match metric_column.to_lowercase().as_str() {
        "dv_total_m_s" => "Total Δv (m/s)".to_string(),
        "dv_depart_m_s" => "Departure Δv (m/s)".to_string(),
        "dv_arrive_m_s" => "Arrival Δv (m/s)".to_string(),
        "tof_days" => "Time of flight (days)".to_string(),
        other => other.to_string(),
    }
}

fn cell_bounds(coords: &[f64], idx: usize) -> (f64, f64) {
    let center = coords[idx];
    let prev = idx.checked_sub(1).and_then(|i| coords.get(i)).copied();
    let next = coords.get(idx + 1).copied();

    let left = match (prev, next) {
        (Some(prev), _) => 0.5 * (prev + center),
        (None, Some(next)) => center - 0.5 * (next - center),
        (None, None) => center - 0.5,
    };

    let right = match (prev, next) {
        (_, Some(next)) => 0.5 * (center + next),
        (Some(prev), None) => center + 0.5 * (center - prev),
        (None, None) => center + 0.5,
    };

    (left, right)
}
