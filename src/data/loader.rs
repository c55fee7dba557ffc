use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CountryRecord, Factbook, Field};

/// On-disk layouts the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    Parquet,
}

impl Format {
    /// Pick a format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "parquet" | "pq" => Ok(Format::Parquet),
            other => bail!("Unsupported file extension: .{other}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the facts table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the column names, empty cells are NULL
/// * `.json`    – `[{ "name": "...", "area": ..., ... }, ...]`
/// * `.parquet` – one column per field (recommended for large extracts)
pub fn load_file(path: &Path) -> Result<Factbook> {
    let format = Format::from_path(path)?;
    debug!("loading {} as {format:?}", path.display());

    let records = match format {
        Format::Csv => load_csv(path),
        Format::Json => load_json(path),
        Format::Parquet => load_parquet(path),
    }?;

    info!("loaded {} rows from {}", records.len(), path.display());
    Ok(Factbook::from_records(records))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Columns are matched by header name, so order does not matter and
/// unknown columns (`id`, `code`, timestamps) are ignored.
fn load_csv(path: &Path) -> Result<Vec<CountryRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;

    let headers = reader.headers().context("reading CSV headers")?;
    if !headers.iter().any(|h| h == "name") {
        bail!("CSV missing 'name' column");
    }

    reader
        .deserialize::<CountryRecord>()
        .enumerate()
        .map(|(row_no, result)| result.with_context(|| format!("CSV row {row_no}")))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "name": "Japan", "area": 377915, "population": 126919659, ... },
///   { "name": "World", "area": null, "population": 7256490011, ... }
/// ]
/// ```
///
/// Missing keys and `null` both read as NULL.
fn load_json(path: &Path) -> Result<Vec<CountryRecord>> {
    let file = File::open(path).context("opening JSON file")?;
    let records: Vec<CountryRecord> =
        serde_json::from_reader(BufReader::new(file)).context("parsing JSON")?;
    Ok(records)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file holding the facts table.
///
/// Expected schema:
/// - `name`: Utf8 or LargeUtf8
/// - one numeric column per [`Field`]; any integer or float width, nullable
///
/// Missing numeric columns read as all-NULL. Works with files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<CountryRecord>> {
    let file = File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        append_batch(&batch, &mut records)?;
    }
    Ok(records)
}

fn append_batch(batch: &RecordBatch, records: &mut Vec<CountryRecord>) -> Result<()> {
    let offset = records.len();
    let names = batch
        .column_by_name("name")
        .context("Parquet file missing 'name' column")?;
    let names = cast(names, &DataType::Utf8).context("'name' column is not text")?;
    let names = names.as_string::<i32>();

    for row in 0..batch.num_rows() {
        if names.is_null(row) {
            bail!("Row {}: 'name' is null", offset + row);
        }
        records.push(CountryRecord::named(names.value(row)));
    }

    for field in Field::ALL {
        let Some(col) = batch.column_by_name(field.as_str()) else {
            continue;
        };
        // Float population columns (pandas with NaN) go through the
        // whole-number check in `set_real`.
        if field == Field::Population && col.data_type().is_integer() {
            let values = numeric_column(col, &DataType::Int64, field)?;
            let values = values.as_primitive::<Int64Type>();
            for (row, rec) in records[offset..].iter_mut().enumerate() {
                rec.population = values.is_valid(row).then(|| values.value(row));
            }
        } else {
            let values = numeric_column(col, &DataType::Float64, field)?;
            let values = values.as_primitive::<Float64Type>();
            for (row, rec) in records[offset..].iter_mut().enumerate() {
                rec.set_real(field, values.is_valid(row).then(|| values.value(row)))
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("Row {}: column '{field}'", offset + row))?;
            }
        }
    }
    Ok(())
}

/// Normalise an integer or float column of any width to `target`.
fn numeric_column(col: &ArrayRef, target: &DataType, field: Field) -> Result<ArrayRef> {
    if !col.data_type().is_numeric() {
        bail!(
            "Column '{field}' has type {:?}, expected a numeric column",
            col.data_type()
        );
    }
    cast(col, target).with_context(|| format!("converting column '{field}' to {target:?}"))
}
