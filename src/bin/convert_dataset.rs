//! Rewrite a factbook dataset in another format, e.g. CSV to Parquet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use factbook::config::init_logger;
use factbook::data::loader::load_file;
use factbook::data::writer::write_file;

/// Convert a factbook dataset between .csv, .json and .parquet
#[derive(Parser)]
#[command(name = "convert_dataset", version)]
struct Args {
    /// Source dataset
    input: PathBuf,

    /// Destination; the format follows the extension
    output: PathBuf,

    /// Print progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.verbose.then_some(LevelFilter::Info))?;

    let factbook = load_file(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    write_file(&factbook, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {} rows from {} to {}",
        factbook.len(),
        args.input.display(),
        args.output.display()
    );
    Ok(())
}
