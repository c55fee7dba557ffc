use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use factbook::config::{
    AGGREGATE_ROWS, DATA_PATH_ENV, DEFAULT_DATA_PATH, DEFAULT_PREVIEW_ROWS, EXCLUDE_ENV,
    init_logger,
};
use factbook::{ExcludeNames, Extremum, Field, Predicate, QueryEngine, report, walkthrough};

/// Exploratory queries over the CIA World Factbook
#[derive(Parser)]
#[command(name = "factbook", version, long_about = None)]
struct Cli {
    /// Dataset file (.csv, .json or .parquet)
    #[arg(long, global = true, env = DATA_PATH_ENV, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Row names left out of aggregates, e.g. --exclude World
    #[arg(long, global = true, env = EXCLUDE_ENV, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Log level for this tool (overrides RUST_LOG)
    #[arg(long, global = true, value_parser = parse_level)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the columns of the facts table
    Schema,

    /// Show the first rows in load order
    Head {
        #[arg(short = 'n', long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        rows: usize,
    },

    /// Min, max, mean and count of one or more fields
    Stats {
        #[arg(required = true)]
        fields: Vec<Field>,
    },

    /// Rows holding the minimum and/or maximum of a field
    Extremes {
        field: Field,

        /// Only the minimum
        #[arg(long, conflicts_with = "max")]
        min: bool,

        /// Only the maximum
        #[arg(long)]
        max: bool,
    },

    /// Average of one or more fields
    Average {
        #[arg(required = true)]
        fields: Vec<Field>,
    },

    /// Rows matching every predicate, e.g. --where "area < avg(area)"
    Filter {
        #[arg(long = "where", required = true)]
        predicates: Vec<String>,
    },

    /// Above-average population and below-average area
    Dense,

    /// Replay the guided exploration
    Walkthrough,
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("'{s}' is not one of off, error, warn, info, debug, trace"))
}

/// The guided queries need some notion of aggregate rows; fall back to the
/// known ones when the user named none.
fn aggregates(exclude: ExcludeNames) -> ExcludeNames {
    if exclude.is_empty() {
        AGGREGATE_ROWS.iter().map(|s| s.to_string()).collect()
    } else {
        exclude
    }
}

fn run(cli: Cli) -> Result<()> {
    let engine = QueryEngine::load(&cli.data)?;
    let exclude: ExcludeNames = cli
        .exclude
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Schema => writeln!(out, "{}", report::render_schema(engine.schema())?)?,
        Command::Head { rows } => {
            writeln!(out, "{}", report::render_records(engine.fetch_all(Some(rows)))?)?
        }
        Command::Stats { fields } => {
            let stats = engine.summary(&fields, &exclude)?;
            writeln!(out, "{}", report::render_summary(&stats)?)?;
        }
        Command::Extremes { field, min, max } => {
            let wanted = match (min, max) {
                (true, _) => vec![Extremum::Min],
                (_, true) => vec![Extremum::Max],
                _ => vec![Extremum::Min, Extremum::Max],
            };
            for which in wanted {
                let rows = engine.records_at_extremum(field, which)?;
                writeln!(out, "{which:?} {field}:")?;
                writeln!(out, "{}", report::render_records(rows)?)?;
            }
        }
        Command::Average { fields } => {
            let labels: Vec<String> = fields.iter().map(|f| format!("avg_{f}")).collect();
            let values = fields
                .iter()
                .map(|&f| engine.average(f, &exclude))
                .collect::<factbook::Result<Vec<_>>>()?;
            let pairs: Vec<(&str, f64)> = labels.iter().map(String::as_str).zip(values).collect();
            writeln!(out, "{}", report::render_scalars(&pairs)?)?;
        }
        Command::Filter { predicates } => {
            let predicates = predicates
                .iter()
                .map(|p| Predicate::parse_with_exclusions(p, &exclude))
                .collect::<factbook::Result<Vec<_>>>()?;
            let rows = engine.filter_by_threshold(&predicates)?;
            writeln!(out, "{}", report::render_records(rows.iter().copied())?)?;
            let shown: Vec<String> = predicates.iter().map(ToString::to_string).collect();
            writeln!(out, "{} rows where {}", rows.len(), shown.join(" and "))?;
        }
        Command::Dense => {
            let rows = walkthrough::densely_populated(&engine, &aggregates(exclude))?;
            writeln!(out, "{}", report::render_records(rows.iter().copied())?)?;
            writeln!(out, "{} densely populated rows", rows.len())?;
        }
        Command::Walkthrough => walkthrough::run(&engine, &aggregates(exclude), &mut out)?,
    }

    out.flush().context("flushing stdout")?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logger(cli.log_level) {
        eprintln!("warning: logger already initialised: {err}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
