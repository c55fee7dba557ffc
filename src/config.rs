//! Defaults shared by the binaries.

use log::LevelFilter;

/// Dataset used when neither `--data` nor `FACTBOOK_DATA` is given.
pub const DEFAULT_DATA_PATH: &str = "data/factbook.csv";
pub const DATA_PATH_ENV: &str = "FACTBOOK_DATA";
/// Comma separated row names to exclude from aggregates.
pub const EXCLUDE_ENV: &str = "FACTBOOK_EXCLUDE";

/// Rows shown by a preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Known non-country rows of the factbook. Callers opt into excluding
/// them; the engine never does it on its own.
pub const AGGREGATE_ROWS: &[&str] = &["World"];

/// Initialise `env_logger`. `RUST_LOG` is honoured unless `level` is given,
/// in which case it wins for this crate.
pub fn init_logger(level: Option<LevelFilter>) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_module("parquet", LevelFilter::Warn);
    builder.filter_module("arrow", LevelFilter::Warn);
    if let Some(level) = level {
        builder.filter_module("factbook", level);
        builder.filter_module("convert_dataset", level);
    }
    builder.try_init()
}
