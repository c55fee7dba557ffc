//! Exploratory queries over the CIA World Factbook demographic table.
//!
//! Load a dataset once, wrap it in a [`QueryEngine`] and ask it read-only
//! questions: previews, ranges, outlier rows, averages and threshold filters.
//!
//! ```no_run
//! use std::path::Path;
//! use factbook::{Comparator, Field, Predicate, QueryEngine, Threshold, exclude};
//!
//! let engine = QueryEngine::load(Path::new("data/factbook.csv"))?;
//! let countries = exclude(["World"]);
//! let dense = engine.filter_by_threshold(&[
//!     Predicate::new(
//!         Field::Population,
//!         Comparator::Gt,
//!         Threshold::average(Field::Population, countries.clone()),
//!     ),
//!     Predicate::new(Field::Area, Comparator::Lt, Threshold::average(Field::Area, countries)),
//! ])?;
//! println!("{} densely populated countries", dense.len());
//! # Ok::<(), factbook::FactbookError>(())
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod report;
pub mod walkthrough;

pub use data::filter::{Aggregate, Comparator, ExcludeNames, Predicate, Threshold, exclude};
pub use data::model::{ColumnInfo, ColumnKind, CountryRecord, Factbook, Field};
pub use engine::{Extremum, FieldSummary, MinMax, QueryEngine};
pub use error::{FactbookError, Result};
