use std::path::PathBuf;

use arrow::error::ArrowError;
use thiserror::Error;

use crate::data::model::Field;

/// Errors surfaced by the dataset and query APIs.
#[derive(Error, Debug)]
pub enum FactbookError {
    /// An aggregate was requested over zero non-null values.
    #[error("no values of '{field}' left to aggregate")]
    EmptyDataset { field: Field },

    /// A query referenced a column that is not part of the schema.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// Predicate text could not be parsed.
    #[error("invalid predicate '{input}': {reason}")]
    InvalidPredicate { input: String, reason: String },

    /// The source table is missing or malformed.
    #[error("failed to load dataset from {}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// Building a result table failed.
    #[error("failed to render table")]
    Render(#[from] ArrowError),
}

pub type Result<T, E = FactbookError> = std::result::Result<T, E>;
