//! Chart rendering on the plotters bitmap backend.
//!
//! All charts are 1024x768 PNG line charts. Rendering never returns image
//! bytes; the file path is the product.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;

use crate::plot::PlotError;

const DIMENSIONS: (u32, u32) = (1024, 768);

pub(crate) fn render_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}

/// Maps a caller-supplied color name onto a drawable color, falling back
/// to `default` for unknown names.
pub(crate) fn parse_color(name: Option<&str>, default: RGBColor) -> RGBColor {
    match name.map(|n| n.to_ascii_lowercase()).as_deref() {
        Some("blue") => BLUE,
        Some("red") => RED,
        Some("green") => GREEN,
        Some("black") => BLACK,
        Some("magenta") => MAGENTA,
        Some("cyan") => CYAN,
        Some("yellow") => YELLOW,
        Some("orange") => RGBColor(255, 140, 0),
        Some("purple") => RGBColor(128, 0, 128),
        Some("gray") | Some("grey") => RGBColor(96, 96, 96),
        _ => default,
    }
}

fn date_range(points: &[(NaiveDate, f64)]) -> (NaiveDate, NaiveDate) {
    let first = points.first().map(|(d, _)| *d).unwrap_or_default();
    let last = points.last().map(|(d, _)| *d).unwrap_or(first);
    if first == last {
        (first - Duration::days(1), last + Duration::days(1))
    } else {
        (first, last)
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

/// Renders a single-axis line chart.
pub(crate) fn render_line(
    path: &Path,
    title: &str,
    y_label: &str,
    points: &[(NaiveDate, f64)],
    color: RGBColor,
) -> Result<(), PlotError> {
    if points.is_empty() {
        return Err(PlotError::EmptyPlot {
            what: title.to_string(),
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let (x_min, x_max) = date_range(points);
    let (y_min, y_max) = value_range(points.iter().map(|(_, v)| *v));

    let root = BitMapBackend::new(path, DIMENSIONS).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption(title, ("sans-serif", 28))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .x_labels(8)
        .y_desc(y_label)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), color))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Renders two series on independent left/right axes, aligned on the
/// caller-provided point sets.
pub(crate) fn render_dual(
    path: &Path,
    title: &str,
    left_label: &str,
    right_label: &str,
    left: &[(NaiveDate, f64)],
    right: &[(NaiveDate, f64)],
    left_color: RGBColor,
    right_color: RGBColor,
) -> Result<(), PlotError> {
    if left.is_empty() || right.is_empty() {
        return Err(PlotError::EmptyPlot {
            what: title.to_string(),
        });
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut all_dates: Vec<(NaiveDate, f64)> = left.to_vec();
    all_dates.extend_from_slice(right);
    all_dates.sort_by_key(|(d, _)| *d);
    let (x_min, x_max) = date_range(&all_dates);
    let (l_min, l_max) = value_range(left.iter().map(|(_, v)| *v));
    let (r_min, r_max) = value_range(right.iter().map(|(_, v)| *v));

    let root = BitMapBackend::new(path, DIMENSIONS).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(12)
        .caption(title, ("sans-serif", 28))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, l_min..l_max)
        .map_err(render_err)?
        .set_secondary_coord(x_min..x_max, r_min..r_max);

    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .x_labels(8)
        .y_desc(left_label)
        .draw()
        .map_err(render_err)?;
    chart
        .configure_secondary_axes()
        .y_desc(right_label)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(LineSeries::new(left.iter().copied(), left_color))
        .map_err(render_err)?
        .label(left_label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], left_color));
    chart
        .draw_secondary_series(LineSeries::new(right.iter().copied(), right_color))
        .map_err(render_err)?
        .label(right_label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], right_color));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}
