//! Charts module - PNG chart rendering for the cohort report

mod renderer;

pub use renderer::{BarChartStyle, ChartRenderer, ORANGE, SKY_BLUE};

use crate::data::PREDICATE_COL;
use crate::error::{CohortError, Result};
use crate::report::ReportBundle;
use crate::stats::{StatsCalculator, COUNT_COL, FREQUENCY_COL};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const COUNTS_CHART: &str = "jumlah_per_prodi.png";
pub const PREDICATE_CHART: &str = "distribusi_predikat.png";
pub const MEAN_GPA_CHART: &str = "rata_ipk_per_prodi.png";

/// Render the three report charts into `dir`, returning the written paths.
pub fn render_report_charts(bundle: &ReportBundle, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let program = bundle.columns.program.as_str();
    let chart_failed = |e: anyhow::Error| CohortError::Unexpected(format!("chart rendering: {:#}", e));

    let counts_path = dir.join(COUNTS_CHART);
    let counts = StatsCalculator::labelled_values(&bundle.program_counts, program, COUNT_COL)?;
    ChartRenderer::render_bar_chart(
        &counts,
        &BarChartStyle {
            title: "Jumlah Wisudawan per Program Studi",
            x_desc: program,
            y_desc: COUNT_COL,
            color: SKY_BLUE,
            precision: 0,
        },
        &counts_path,
    )
    .map_err(chart_failed)?;

    let predicate_path = dir.join(PREDICATE_CHART);
    let distribution =
        StatsCalculator::labelled_values(&bundle.predicate_distribution, PREDICATE_COL, FREQUENCY_COL)?;
    ChartRenderer::render_pie_chart(&distribution, "Distribusi Predikat Wisuda", &predicate_path)
        .map_err(chart_failed)?;

    let mean_path = dir.join(MEAN_GPA_CHART);
    let means = StatsCalculator::labelled_values(
        &bundle.program_mean_gpa,
        program,
        bundle.columns.gpa.as_str(),
    )?;
    ChartRenderer::render_bar_chart(
        &means,
        &BarChartStyle {
            title: "Rata-rata IPK per Program Studi",
            x_desc: program,
            y_desc: "Rata-rata IPK",
            color: ORANGE,
            precision: 2,
        },
        &mean_path,
    )
    .map_err(chart_failed)?;

    info!("Charts written to {}", dir.display());
    Ok(vec![counts_path, predicate_path, mean_path])
}
