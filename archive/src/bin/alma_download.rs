//! Query the ALMA archive and download the matching FITS products.
//!
//! Without selection flags the default star and disk formation selection is
//! used. Each target's products land in `<output-dir>/<source name>/`.
//!
//! Usage:
//! ```
//! cargo run --bin alma_download -- --output-dir data --specific cont
//! ```

use anyhow::{Context, Result};
use archive::args::{SelectionArgs, SharedArchiveArgs};
use archive::download::{download_files, DownloadOptions, DEFAULT_EXTRACT_PATTERN};
use archive::selection::build_data_table;
use archive::spreadsheet::write_xlsx;
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ALMA Download",
    about = "Query the ALMA archive and download matching image products",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    archive: SharedArchiveArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Root directory for downloads (default: stored download_root or ./data)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Only download files whose URL contains one of these substrings
    #[arg(long)]
    specific: Vec<String>,

    /// Also download calibrator products
    #[arg(long, default_value_t = false)]
    keep_calibration: bool,

    /// Regex for tar members to extract
    #[arg(long, default_value = DEFAULT_EXTRACT_PATTERN)]
    extract_pattern: String,

    /// Keep tarballs after extraction
    #[arg(long, default_value_t = false)]
    keep_archives: bool,

    /// Write the observation table to this XLSX file
    #[arg(long)]
    table: Option<PathBuf>,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Only query and list targets
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.archive.resolve_config()?;
    let client = args.archive.connect()?;

    let query = args.selection.to_query()?;
    let (targets, table) =
        build_data_table(&client, &query, &args.selection.excluded_categories())?;

    if let Some(path) = &args.table {
        write_xlsx(path, &table)
            .with_context(|| format!("Failed to write table to {}", path.display()))?;
    }

    if args.dry_run {
        for target in &targets {
            println!("{target}");
        }
        return Ok(());
    }

    let root = args
        .output_dir
        .clone()
        .or(config.download_root)
        .unwrap_or_else(|| PathBuf::from("data"));

    let options = DownloadOptions {
        remove_calibration: !args.keep_calibration,
        keep_archives: args.keep_archives,
        ..DownloadOptions::default()
    }
    .with_specific(args.specific.clone())
    .with_extract_pattern(&args.extract_pattern)?;

    info!("Downloading {} targets into {}", targets.len(), root.display());
    let report = download_files(&client, &targets, &root, &options);

    for target in &report.unavailable {
        warn!("No products available for {target}");
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    println!(
        "Downloaded {} files ({} FITS extracted); {} unavailable, {} failed",
        report.downloaded.len(),
        report.extracted.len(),
        report.unavailable.len(),
        report.failed.len()
    );
    Ok(())
}
