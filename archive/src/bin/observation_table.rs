//! Export an archive query result as a spreadsheet.
//!
//! The format follows the output extension: `.csv` writes CSV, anything else
//! writes XLSX.

use anyhow::{Context, Result};
use archive::args::{SelectionArgs, SharedArchiveArgs};
use archive::selection::build_data_table;
use archive::spreadsheet::{write_csv, write_xlsx};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Observation Table",
    about = "Query the ALMA archive and export the observation table",
    long_about = None
)]
struct Args {
    #[command(flatten)]
    archive: SharedArchiveArgs,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Output file (.xlsx or .csv)
    #[arg(short, long, default_value = "observations.xlsx")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let client = args.archive.connect()?;
    let query = args.selection.to_query()?;
    let (targets, table) =
        build_data_table(&client, &query, &args.selection.excluded_categories())?;

    let is_csv = args
        .output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        write_csv(&args.output, &table)
    } else {
        write_xlsx(&args.output, &table)
    }
    .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "{} observations of {} targets written to {}",
        table.len(),
        targets.len(),
        args.output.display()
    );
    Ok(())
}
