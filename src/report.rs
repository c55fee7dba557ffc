//! Text tables for query results, built as Arrow batches and printed with
//! `arrow::util::pretty`.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{Field as ArrowField, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;

use crate::data::model::{ColumnInfo, CountryRecord};
use crate::data::writer::record_batch;
use crate::engine::{FieldSummary, MinMax};
use crate::error::Result;

fn to_table(batch: RecordBatch) -> Result<String> {
    Ok(pretty_format_batches(&[batch])?.to_string())
}

fn batch_of(columns: Vec<(&str, ArrayRef)>) -> Result<RecordBatch> {
    let fields: Vec<ArrowField> = columns
        .iter()
        .map(|(name, col)| ArrowField::new(*name, col.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, col)| col).collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Records as a table with every column of the schema. NULL cells are blank.
pub fn render_records<'a, I>(records: I) -> Result<String>
where
    I: IntoIterator<Item = &'a CountryRecord>,
{
    to_table(record_batch(records)?)
}

pub fn render_schema(columns: &[ColumnInfo]) -> Result<String> {
    to_table(batch_of(vec![
        (
            "column",
            Arc::new(StringArray::from_iter_values(columns.iter().map(|c| c.name))) as ArrayRef,
        ),
        (
            "type",
            Arc::new(StringArray::from_iter_values(
                columns.iter().map(|c| c.kind.to_string()),
            )) as ArrayRef,
        ),
        (
            "nullable",
            Arc::new(BooleanArray::from(
                columns.iter().map(|c| c.nullable).collect::<Vec<_>>(),
            )) as ArrayRef,
        ),
    ])?)
}

/// A single labelled row of scalar values.
pub fn render_scalars(values: &[(&str, f64)]) -> Result<String> {
    to_table(batch_of(
        values
            .iter()
            .map(|(label, v)| (*label, Arc::new(Float64Array::from(vec![*v])) as ArrayRef))
            .collect(),
    )?)
}

pub fn render_min_max(label: &str, range: &MinMax) -> Result<String> {
    let min = format!("min_{label}");
    let max = format!("max_{label}");
    render_scalars(&[(min.as_str(), range.min), (max.as_str(), range.max)])
}

pub fn render_summary(summaries: &[FieldSummary]) -> Result<String> {
    to_table(batch_of(vec![
        (
            "field",
            Arc::new(StringArray::from_iter_values(
                summaries.iter().map(|s| s.field.as_str()),
            )) as ArrayRef,
        ),
        (
            "count",
            Arc::new(UInt64Array::from_iter_values(
                summaries.iter().map(|s| s.count as u64),
            )) as ArrayRef,
        ),
        (
            "min",
            Arc::new(Float64Array::from_iter_values(summaries.iter().map(|s| s.min))) as ArrayRef,
        ),
        (
            "max",
            Arc::new(Float64Array::from_iter_values(summaries.iter().map(|s| s.max))) as ArrayRef,
        ),
        (
            "mean",
            Arc::new(Float64Array::from_iter_values(summaries.iter().map(|s| s.mean))) as ArrayRef,
        ),
    ])?)
}
