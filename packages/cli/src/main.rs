#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the police stop report.
//!
//! `stop_report run` downloads every registered dataset, answers its
//! questions and writes the artifacts plus `summary.md`. Downloads go to a
//! temporary directory unless `--work-dir` is given; either way each archive
//! is deleted once it has been read into memory.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use stop_report::{ReportContext, paths};
use stop_report_cli_utils::IndicatifProgress;
use stop_report_source::registry::all_datasets;

#[derive(Parser)]
#[command(name = "stop_report", about = "Police stop report for Hartford, CT and Owensboro, KY")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, analyze and render every dataset (the default)
    Run {
        /// Directory artifacts are written to (default: `output/` in the
        /// project root)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Directory downloads are staged in (default: a temporary directory)
        #[arg(long)]
        work_dir: Option<PathBuf>,
    },
    /// List the registered datasets
    Datasets,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = stop_report_cli_utils::init_logger();
    let cli = Cli::parse();

    let (output_dir, work_dir) = match cli.command {
        Some(Commands::Datasets) => {
            for def in all_datasets() {
                println!("{:<12} {} ({})", def.id, def.name, def.place_name());
                println!("{:<12} stops: {}", "", def.stops.url);
                println!(
                    "{:<12} {}: {}",
                    "", def.boundaries.description, def.boundaries.url
                );
            }
            return Ok(());
        }
        Some(Commands::Run {
            output_dir,
            work_dir,
        }) => (output_dir, work_dir),
        None => (None, None),
    };

    let output_dir = output_dir.unwrap_or_else(paths::default_output_dir);
    let scratch = tempfile::tempdir()?;
    let work_dir = work_dir.unwrap_or_else(|| scratch.path().to_path_buf());

    let ctx = ReportContext::new(&output_dir, &work_dir);
    let start = Instant::now();

    let summary = stop_report::run(&ctx, IndicatifProgress::download_bars(&multi)).await?;

    log::info!(
        "Report written to {} in {:.1}s",
        summary.display(),
        start.elapsed().as_secs_f64()
    );
    println!("{}", summary.display());

    Ok(())
}
