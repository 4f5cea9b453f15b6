//! Cohort Report - Graduation cohort classification & summary
//!
//! Reads the graduate spreadsheet, assigns grades and graduation predicates,
//! aggregates per program, prints a summary, writes the results workbook and
//! renders the charts.

mod charts;
mod config;
mod data;
mod error;
mod report;
mod stats;
mod xlsx;

use config::Config;
use error::Result;
use report::ReportBundle;
use std::process::ExitCode;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let config = match Config::load_default() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.verbose);
    info!("Cohort Report v{}", env!("CARGO_PKG_VERSION"));

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {:?}", e);
            eprintln!("\n❌ Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Logging was already initialised");
    }
}

/// Run the whole report: pipeline, console summary, workbook, charts.
fn run(config: &Config) -> Result<()> {
    let bundle = ReportBundle::process(&config.source, &config.columns, config.top_n)?;

    bundle.print_summary(config.preview_rows);

    bundle.write_workbook(&config.output)?;
    println!(
        "\n✅ File hasil berhasil disimpan sebagai: {}",
        config.output.display()
    );

    let Some(chart_dir) = &config.chart_dir else {
        return Ok(());
    };
    if bundle.students.height() == 0 {
        warn!("No students left after cleaning; skipping charts");
        return Ok(());
    }

    let chart_paths = charts::render_report_charts(&bundle, chart_dir)?;
    if config.open_charts {
        for path in &chart_paths {
            if let Err(e) = open::that(path) {
                warn!("Could not open {}: {}", path.display(), e);
            }
        }
    }
    Ok(())
}
