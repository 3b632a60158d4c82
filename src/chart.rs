use crate::traffic::DailyTrafficRow;
use anyhow::{Result, anyhow, bail};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const CHART_WIDTH: u32 = 1400;
const CHART_HEIGHT: u32 = 1000;
// Past this many rows, date labels overcrowd the axis and get thinned.
const MAX_X_LABELS: usize = 20;

pub fn chart_path(output_dir: &Path, repo: &str) -> PathBuf {
    output_dir.join(format!("{repo}_traffic-data.png"))
}

/// Render the reconciled history as two stacked panels, views above clones,
/// one solid line for the total and one dashed line for uniques per panel.
pub fn render(rows: &[DailyTrafficRow], path: &Path) -> Result<()> {
    if rows.is_empty() {
        bail!("traffic history is empty, nothing to chart");
    }

    let root = BitMapBackend::new(path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|err| anyhow!("failed to clear chart canvas: {err}"))?;
    let (views_area, clones_area) = root.split_vertically((CHART_HEIGHT / 2) as i32);

    draw_panel(
        &views_area,
        "Views Count and Uniques Over Time",
        rows,
        |row| row.views_count,
        |row| row.views_uniques,
        ("Views Count", BLUE),
        ("Views Uniques", RED),
    )?;
    draw_panel(
        &clones_area,
        "Clones Count and Uniques Over Time",
        rows,
        |row| row.clones_count,
        |row| row.clones_uniques,
        ("Clones Count", GREEN),
        ("Clones Uniques", MAGENTA),
    )?;

    root.present()
        .map_err(|err| anyhow!("failed to write chart image {}: {err}", path.display()))?;
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    title: &str,
    rows: &[DailyTrafficRow],
    count: impl Fn(&DailyTrafficRow) -> u64,
    uniques: impl Fn(&DailyTrafficRow) -> u64,
    count_series: (&str, RGBColor),
    uniques_series: (&str, RGBColor),
) -> Result<()> {
    let y_max = rows
        .iter()
        .map(|row| count(row).max(uniques(row)))
        .max()
        .unwrap_or(0);
    let y_top = (y_max as f64 * 1.05).max(1.0);

    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .caption(title, ("sans-serif", 26))
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(0..rows.len(), 0f64..y_top)
        .map_err(|err| anyhow!("failed to lay out panel {title}: {err}"))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Count")
        .x_labels(rows.len().min(MAX_X_LABELS))
        .x_label_formatter(&|idx| {
            rows.get(*idx)
                .map(|row| row.date.to_string())
                .unwrap_or_default()
        })
        .draw()
        .map_err(|err| anyhow!("failed to draw axes for panel {title}: {err}"))?;

    let (count_label, count_color) = count_series;
    chart
        .draw_series(LineSeries::new(
            rows.iter()
                .enumerate()
                .map(|(idx, row)| (idx, count(row) as f64)),
            count_color.stroke_width(2),
        ))
        .map_err(|err| anyhow!("failed to draw series {count_label}: {err}"))?
        .label(count_label)
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 18, y)], count_color.stroke_width(2))
        });

    let (uniques_label, uniques_color) = uniques_series;
    chart
        .draw_series(DashedLineSeries::new(
            rows.iter()
                .enumerate()
                .map(|(idx, row)| (idx, uniques(row) as f64)),
            6,
            4,
            uniques_color.stroke_width(2),
        ))
        .map_err(|err| anyhow!("failed to draw series {uniques_label}: {err}"))?
        .label(uniques_label)
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 18, y)], uniques_color.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|err| anyhow!("failed to draw legend for panel {title}: {err}"))?;

    Ok(())
}
