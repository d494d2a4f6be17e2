//! SVG line chart of hourly temperatures.

use std::path::Path;

use anyhow::{Result, ensure};
use chrono::{Duration, NaiveDateTime};
use plotters::coord::types::RangedDateTime;
use plotters::prelude::*;

const SIZE: (u32, u32) = (1024, 576);
const LINE_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);

/// Draw `temperatures` against `timestamps` and write the chart to `path`.
pub fn render(
    path: &Path,
    timestamps: &[NaiveDateTime],
    temperatures: &[f64],
    label: &str,
    unit: &str,
) -> Result<()> {
    ensure!(!timestamps.is_empty(), "no hourly data to chart");
    ensure!(
        timestamps.len() == temperatures.len(),
        "got {} timestamps but {} temperatures",
        timestamps.len(),
        temperatures.len()
    );

    let (mut start, mut end) = (timestamps[0], timestamps[timestamps.len() - 1]);
    if start == end {
        start -= Duration::hours(1);
        end += Duration::hours(1);
    }

    let min_temp = temperatures.iter().fold(f64::MAX, |a, b| a.min(*b));
    let max_temp = temperatures.iter().fold(f64::MIN, |a, b| a.max(*b));
    // Flat series still get a visible band.
    let pad = if (max_temp - min_temp).abs() > 1e-6 {
        (max_temp - min_temp) * 0.1
    } else {
        1.0
    };

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Temperature for {label}"), ("sans-serif", 24))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .build_cartesian_2d(
            RangedDateTime::from(start..end),
            (min_temp - pad)..(max_temp + pad),
        )?;

    chart
        .configure_mesh()
        .x_desc("Date / Time")
        .y_desc(format!("Temperature ({unit})"))
        .x_labels(8)
        .x_label_formatter(&|dt: &NaiveDateTime| dt.format("%b %d %H:%M").to_string())
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    let temps = temperatures.iter().copied();
    let points = timestamps.iter().copied().zip(temps);
    let line = LineSeries::new(points.clone(), LINE_COLOR.stroke_width(2));
    let markers = points.map(|p| Circle::new(p, 3, LINE_COLOR.filled()));
    chart.draw_series(line)?;
    chart.draw_series(markers)?;

    root.present()?;
    tracing::debug!(path = %path.display(), points = timestamps.len(), "Chart rendered");
    Ok(())
}
