//! PNG charts of the aggregates in a [`Summary`].

use anyhow::{Context, Result};
use log::{info, warn};
use plotters::{element::Pie, prelude::*};

use std::{
    fmt::Display,
    fs,
    ops::Range,
    path::{Path, PathBuf},
};

use crate::{
    aggregate::{Summary, Totals},
    usd::Usd,
};

pub const TOP_PRODUCTS_FILE: &str = "top_products_revenue.png";
pub const CATEGORY_FILE: &str = "revenue_by_category.png";
pub const MONTHLY_FILE: &str = "monthly_sales_trend.png";
pub const SEGMENT_FILE: &str = "revenue_by_customer_segment.png";

const FONT: &str = "sans-serif";
const REVENUE_AXIS: &str = "Total Revenue ($)";
const BAR_COLOR: RGBColor = RGBColor(72, 120, 170);
const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const PASTEL: [RGBColor; 10] = [
    RGBColor(161, 201, 244),
    RGBColor(255, 180, 130),
    RGBColor(141, 229, 161),
    RGBColor(255, 159, 155),
    RGBColor(208, 187, 255),
    RGBColor(222, 187, 155),
    RGBColor(250, 176, 228),
    RGBColor(207, 207, 207),
    RGBColor(255, 254, 163),
    RGBColor(185, 242, 240),
];

/// One chart's data, flattened to labels and plot values.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl<K: Display> From<&Totals<K, Usd>> for Series {
    fn from(totals: &Totals<K, Usd>) -> Self {
        Self {
            labels: totals.keys().map(ToString::to_string).collect(),
            values: totals.values().map(Usd::to_f64).collect(),
        }
    }
}

impl Series {
    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Category positions on the x axis. Segmented integer ranges include
    /// their end, so one slot per value ends at `len - 1`.
    fn slots(&self) -> Range<usize> {
        0..self.values.len().saturating_sub(1)
    }

    /// Label area below a bar chart with labels turned upright.
    fn label_area(&self) -> u32 {
        let longest = self.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        u32::try_from(longest).unwrap_or(u32::MAX).saturating_mul(8).clamp(40, 200) + 30
    }

    /// Upper bound of the value axis, leaving headroom above the tallest bar.
    fn axis_max(&self) -> f64 {
        let max = self.values.iter().copied().fold(0.0, f64::max);
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    }

    fn label(&self, x: &SegmentValue<usize>) -> String {
        match x {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                self.labels.get(*i).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        }
    }
}

/// Writes the four summary charts into `out_dir`, creating it if needed.
///
/// A chart whose aggregate has no entries is skipped with a warning.
/// Returns the paths of the files written.
///
/// # Errors
///
/// Returns any errors from creating `out_dir` or drawing a chart.
pub fn render_all(summary: &Summary, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let mut written = Vec::new();

    let top = Series::from(&summary.top_products);
    let title = format!("Top {} Products by Total Revenue", summary.top_n);
    let path = out_dir.join(TOP_PRODUCTS_FILE);
    if check(&top, &path) {
        bar_chart(&path, (1000, 600), &title, "Product Name", &top)?;
        written.push(path);
    }

    let categories = Series::from(&summary.revenue_by_category);
    let path = out_dir.join(CATEGORY_FILE);
    if check(&categories, &path) {
        bar_chart(
            &path,
            (800, 500),
            "Total Revenue by Product Category",
            "Product Category",
            &categories,
        )?;
        written.push(path);
    }

    let months = Series::from(&summary.monthly_revenue);
    let path = out_dir.join(MONTHLY_FILE);
    if check(&months, &path) {
        line_chart(&path, (1000, 500), "Monthly Sales Trend (Total Revenue)", "Month", &months)?;
        written.push(path);
    }

    let segments = Series::from(&summary.revenue_by_segment);
    let path = out_dir.join(SEGMENT_FILE);
    if check(&segments, &path) {
        pie_chart(
            &path,
            (700, 700),
            "Revenue Distribution by Customer Segment",
            &segments,
        )?;
        written.push(path);
    }
    Ok(written)
}

fn check(series: &Series, path: &Path) -> bool {
    if series.is_empty() {
        warn!("no data for {}, skipping", path.display());
        return false;
    }
    true
}

fn bar_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    x_desc: &str,
    series: &Series,
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 24))
        .margin(20)
        .x_label_area_size(series.label_area())
        .y_label_area_size(90)
        .build_cartesian_2d(series.slots().into_segmented(), 0f64..series.axis_max())?;
    // plotters only turns text in quarter turns, so labels stand upright.
    let upright = (FONT, 14).into_font().transform(FontTransform::Rotate90);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc(REVENUE_AXIS)
        .x_labels(series.values.len())
        .x_label_style(upright)
        .x_label_formatter(&|x| series.label(x))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;
    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR_COLOR.filled())
            .margin(12)
            .data(series.values.iter().copied().enumerate()),
    )?;
    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    info!("saved {}", path.display());
    Ok(())
}

fn line_chart(
    path: &Path,
    size: (u32, u32),
    title: &str,
    x_desc: &str,
    series: &Series,
) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 24))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(90)
        .build_cartesian_2d(series.slots().into_segmented(), 0f64..series.axis_max())?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(REVENUE_AXIS)
        .x_labels(series.values.len())
        .x_label_formatter(&|x| series.label(x))
        .y_label_formatter(&|y| format!("{y:.0}"))
        .draw()?;
    let points: Vec<(SegmentValue<usize>, f64)> = series
        .values
        .iter()
        .enumerate()
        .map(|(i, v)| (SegmentValue::CenterOf(i), *v))
        .collect();
    chart.draw_series(LineSeries::new(
        points.iter().cloned(),
        LINE_COLOR.stroke_width(2),
    ))?;
    chart.draw_series(
        points
            .iter()
            .cloned()
            .map(|p| Circle::new(p, 5, LINE_COLOR.filled())),
    )?;
    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    info!("saved {}", path.display());
    Ok(())
}

fn pie_chart(path: &Path, size: (u32, u32), title: &str, series: &Series) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, (FONT, 24))?;
    let (width, height) = root.dim_in_pixel();
    let center = (i32::try_from(width / 2)?, i32::try_from(height / 2)?);
    let radius = f64::from(width.min(height)) * 0.35;
    let colors: Vec<RGBColor> = (0..series.values.len())
        .map(|i| PASTEL[i % PASTEL.len()])
        .collect();
    if series.values.iter().sum::<f64>() > 0.0 {
        let mut pie = Pie::new(&center, &radius, &series.values, &colors, &series.labels);
        // -90 degrees is twelve o'clock in screen coordinates.
        pie.start_angle(-90.0);
        pie.label_style((FONT, 18).into_font().color(&BLACK));
        pie.percentages((FONT, 16).into_font().color(&BLACK));
        root.draw(&pie)?;
    } else {
        warn!("all segment revenue is zero, drawing {} without slices", path.display());
    }
    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    info!("saved {}", path.display());
    Ok(())
}
