//! Static Chart Renderer
//! Renders the cohort charts to PNG with plotters.
//!
//! Charts:
//! 1. Bar: headcount per program (sky blue)
//! 2. Pie: predicate distribution with percentage labels
//! 3. Bar: mean GPA per program (orange)

use anyhow::{ensure, Result};
use plotters::prelude::*;
use std::path::Path;

const BAR_SIZE: (u32, u32) = (1000, 600);
const PIE_SIZE: (u32, u32) = (800, 800);
/// First slice starts 140° counter-clockwise from three o'clock.
const PIE_START_ANGLE: f64 = 360.0 - 140.0;

pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const ORANGE: RGBColor = RGBColor(255, 165, 0);
const GRID: RGBColor = RGBColor(200, 200, 200);

/// Pastel palette for pie slices.
const SET3: [RGBColor; 12] = [
    RGBColor(141, 211, 199),
    RGBColor(255, 255, 179),
    RGBColor(190, 186, 218),
    RGBColor(251, 128, 114),
    RGBColor(128, 177, 211),
    RGBColor(253, 180, 98),
    RGBColor(179, 222, 105),
    RGBColor(252, 205, 229),
    RGBColor(217, 217, 217),
    RGBColor(188, 128, 189),
    RGBColor(204, 235, 197),
    RGBColor(255, 237, 111),
];

/// Text and color of one bar chart.
pub struct BarChartStyle<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
    pub color: RGBColor,
    /// Decimal places of the value printed above each bar.
    pub precision: usize,
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Vertical bar chart, one bar per `(label, value)` in input order.
    pub fn render_bar_chart(
        bars: &[(String, f64)],
        style: &BarChartStyle,
        path: &Path,
    ) -> Result<()> {
        ensure!(!bars.is_empty(), "no data for chart '{}'", style.title);

        let labels: Vec<String> = bars.iter().map(|(label, _)| label.clone()).collect();
        let y_max = Self::y_axis_max(bars.iter().map(|(_, v)| *v));

        let root = BitMapBackend::new(path, BAR_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(style.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d((0..bars.len()).into_segmented(), 0f64..y_max)?;

        let label_of = |v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(idx) => labels.get(*idx).cloned().unwrap_or_default(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(GRID.mix(0.7).stroke_width(1))
            .light_line_style(TRANSPARENT)
            .x_labels(bars.len())
            .x_label_formatter(&label_of)
            .x_label_style(("sans-serif", 14))
            .x_desc(style.x_desc)
            .y_desc(style.y_desc)
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(idx, (_, value))| {
            let mut bar: Rectangle<(SegmentValue<usize>, f64)> = Rectangle::new(
                [
                    (SegmentValue::Exact(idx), 0.0),
                    (SegmentValue::Exact(idx + 1), *value),
                ],
                style.color.filled(),
            );
            bar.set_margin(0, 0, 12, 12);
            bar
        }))?;

        chart.draw_series(bars.iter().enumerate().map(|(idx, (_, value))| {
            Text::new(
                format!("{:.*}", style.precision, value),
                (SegmentValue::CenterOf(idx), *value),
                ("sans-serif", 14).into_font().color(&BLACK),
            )
        }))?;

        root.present()?;
        Ok(())
    }

    /// Pie chart of `(label, count)` slices, labelled with percentages.
    pub fn render_pie_chart(slices: &[(String, f64)], title: &str, path: &Path) -> Result<()> {
        ensure!(!slices.is_empty(), "no data for chart '{}'", title);

        let root = BitMapBackend::new(path, PIE_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        let area = root.titled(title, ("sans-serif", 28))?;

        let (width, height) = area.dim_in_pixel();
        let center = ((width / 2) as i32, (height / 2) as i32);
        let radius = f64::from(width.min(height)) * 0.33;

        let sizes: Vec<f64> = slices.iter().map(|(_, count)| *count).collect();
        let labels: Vec<String> = slices.iter().map(|(label, _)| label.clone()).collect();
        let colors: Vec<RGBColor> = (0..slices.len()).map(|i| SET3[i % SET3.len()]).collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        // Screen y points down, so angles run clockwise.
        pie.start_angle(PIE_START_ANGLE);
        pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 15).into_font().color(&BLACK));
        area.draw(&pie)?;

        root.present()?;
        Ok(())
    }

    /// Upper bound of the value axis: 15% headroom, never below 1.
    fn y_axis_max(values: impl Iterator<Item = f64>) -> f64 {
        let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
        (max * 1.15).max(1.0)
    }
}
