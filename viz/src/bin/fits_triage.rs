//! Quick-look triage of downloaded ALMA continuum images.
//!
//! Finds FITS files below a data directory, keeps those whose names match the
//! include/exclude filters (continuum images, no masks, by default) and writes
//! one two-panel PNG per image. With `--download` the default archive
//! selection is fetched into the data directory first.
//!
//! Usage:
//! ```
//! RUST_LOG=info cargo run --bin fits_triage -- data --output-dir plots
//! ```

use anyhow::{Context, Result};
use archive::args::{SelectionArgs, SharedArchiveArgs};
use archive::download::{download_files, DownloadOptions};
use archive::fits_finder::{filter_names, find_fits};
use archive::selection::build_data_table;
use clap::Parser;
use log::{info, warn};
use shared::image_proc::{read_fits_plane, DEFAULT_PATCH_FRACTION};
use std::path::{Path, PathBuf};
use viz::pixel_histogram::{HistogramConfig, PixelHistogram, Scale};
use viz::triage::{render_triage, TriageOptions};

#[derive(Parser, Debug)]
#[command(
    name = "FITS Triage",
    about = "Render intensity map and contour plots for ALMA continuum images",
    long_about = None
)]
struct Args {
    /// Directory searched recursively for FITS files
    data_dir: PathBuf,

    /// Download the selected observations into the data directory first
    #[arg(long, default_value_t = false)]
    download: bool,

    #[command(flatten)]
    archive: SharedArchiveArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Substrings the file name must contain
    #[arg(long, default_value = "cont")]
    include: Vec<String>,

    /// Substrings the file name must not contain
    #[arg(long, default_value = "mask")]
    exclude: Vec<String>,

    /// Sigma multiplier for the black contours
    #[arg(long, default_value_t = 3.0)]
    sigma: f64,

    /// Noise patch side relative to the shorter image axis
    #[arg(long, default_value_t = DEFAULT_PATCH_FRACTION)]
    patch_fraction: f64,

    /// Directory for the PNG figures
    #[arg(long, default_value = "plots")]
    output_dir: PathBuf,

    /// Figure width in pixels
    #[arg(long, default_value_t = 1500)]
    width: u32,

    /// Figure height in pixels
    #[arg(long, default_value_t = 500)]
    height: u32,

    /// Print a pixel histogram of each image
    #[arg(long, default_value_t = false)]
    histogram: bool,
}

fn download(args: &Args) -> Result<()> {
    let client = args.archive.connect()?;
    let query = args.selection.to_query()?;
    let (targets, _) = build_data_table(&client, &query, &args.selection.excluded_categories())?;

    let options = DownloadOptions::default().with_specific(args.include.clone());
    let report = download_files(&client, &targets, &args.data_dir, &options);
    info!(
        "Download finished: {} files, {} unavailable targets, {} failures",
        report.downloaded.len(),
        report.unavailable.len(),
        report.failed.len()
    );
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn triage_file(path: &Path, args: &Args) -> Result<PathBuf> {
    let plane = read_fits_plane(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = file_name(path);
    let object = plane.object.as_deref().unwrap_or("unknown object");
    let (rows, cols) = plane.data.dim();
    info!("{name}: {object}, {cols}x{rows} pixels");

    if args.histogram {
        let hist = PixelHistogram::from_image(&plane.data.view(), 30)?.with_config(HistogramConfig {
            title: Some(format!(
                "{name} ({object}) [{}]",
                plane.unit.as_deref().unwrap_or("unknown unit")
            )),
            scale: Scale::Log10,
            ..HistogramConfig::default()
        });
        hist.print()?;
    }

    let options = TriageOptions {
        sigma: args.sigma,
        patch_fraction: args.patch_fraction,
        title: Some(name.clone()),
        width: args.width,
        height: args.height,
    };
    let output = args.output_dir.join(format!("{name}.png"));
    render_triage(&plane.data.view(), &output, &options)?;
    Ok(output)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.download {
        download(&args)?;
    }

    let files = find_fits(&args.data_dir)
        .with_context(|| format!("Failed to scan {}", args.data_dir.display()))?;
    let files = filter_names(files, &args.include, &args.exclude);
    info!("Found {} matching FITS files", files.len());

    let mut written = 0;
    for path in &files {
        match triage_file(path, &args) {
            Ok(output) => {
                written += 1;
                info!("{} -> {}", path.display(), output.display());
            }
            Err(e) => warn!("Skipping {}: {e:#}", path.display()),
        }
    }

    println!(
        "Wrote {written} of {} triage figures to {}",
        files.len(),
        args.output_dir.display()
    );
    Ok(())
}
