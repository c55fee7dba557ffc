use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field as ArrowField, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;

use super::loader::Format;
use super::model::{CountryRecord, Factbook, Field};

/// Arrow schema of the facts table; `population` is the only integer column.
pub fn arrow_schema() -> SchemaRef {
    let mut fields = vec![ArrowField::new("name", DataType::Utf8, false)];
    fields.extend(Field::ALL.iter().map(|f| {
        let dtype = match f {
            Field::Population => DataType::Int64,
            _ => DataType::Float64,
        };
        ArrowField::new(f.as_str(), dtype, true)
    }));
    Arc::new(Schema::new(fields))
}

/// Columnar copy of `records`, in the given order.
pub fn record_batch<'a, I>(records: I) -> Result<RecordBatch, ArrowError>
where
    I: IntoIterator<Item = &'a CountryRecord>,
{
    let rows: Vec<&CountryRecord> = records.into_iter().collect();

    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(
        rows.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
    ))];
    for field in Field::ALL {
        let column: ArrayRef = match field {
            Field::Population => Arc::new(Int64Array::from(
                rows.iter().map(|r| r.population).collect::<Vec<_>>(),
            )),
            _ => Arc::new(Float64Array::from(
                rows.iter().map(|r| r.value(field)).collect::<Vec<_>>(),
            )),
        };
        columns.push(column);
    }

    RecordBatch::try_new(arrow_schema(), columns)
}

/// Write the dataset in the format implied by the extension of `path`.
/// The output reads back through [`super::loader::load_file`].
pub fn write_file(factbook: &Factbook, path: &Path) -> Result<()> {
    match Format::from_path(path)? {
        Format::Csv => write_csv(factbook, path),
        Format::Json => write_json(factbook, path),
        Format::Parquet => write_parquet(factbook, path),
    }?;
    info!("wrote {} rows to {}", factbook.len(), path.display());
    Ok(())
}

fn write_csv(factbook: &Factbook, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    if factbook.is_empty() {
        // serialize() only emits headers alongside the first row
        let schema = arrow_schema();
        let headers: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        writer.write_record(headers).context("writing CSV headers")?;
    }
    for (row_no, rec) in factbook.records().iter().enumerate() {
        writer
            .serialize(rec)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_json(factbook: &Factbook, path: &Path) -> Result<()> {
    let file = File::create(path).context("creating JSON file")?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, factbook.records()).context("writing JSON")?;
    out.flush().context("flushing JSON file")?;
    Ok(())
}

fn write_parquet(factbook: &Factbook, path: &Path) -> Result<()> {
    let batch = record_batch(factbook.records()).context("building record batch")?;
    let file = File::create(path).context("creating parquet file")?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use arrow::array::Array;

    use super::*;
    use crate::data::loader::load_file;

    fn sample() -> Factbook {
        let mut japan = CountryRecord::named("Japan");
        japan.area = Some(377_915.0);
        japan.area_land = Some(364_485.0);
        japan.area_water = Some(13_430.0);
        japan.population = Some(126_919_659);
        japan.population_growth = Some(0.16);
        japan.birth_rate = Some(7.93);
        japan.death_rate = Some(9.51);
        japan.migration_rate = Some(0.0);

        let mut antarctica = CountryRecord::named("Antarctica");
        antarctica.area = Some(14_000_000.0);
        antarctica.population = Some(0);

        let mut bahamas = CountryRecord::named("Bahamas, The");
        bahamas.migration_rate = Some(-2.5);

        Factbook::from_records(vec![japan, antarctica, bahamas])
    }

    #[test]
    fn batch_matches_schema() {
        let factbook = sample();
        let batch = record_batch(factbook.records()).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 9);
        assert_eq!(batch.schema().field(4).name(), "population");
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn every_format_reads_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let factbook = sample();
        for name in ["facts.csv", "facts.json", "facts.parquet"] {
            let path = dir.path().join(name);
            write_file(&factbook, &path).unwrap();
            assert_eq!(load_file(&path).unwrap(), factbook, "{name}");
        }
    }

    #[test]
    fn empty_csv_keeps_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_file(&Factbook::default(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("name,area,area_land"));
        assert!(load_file(&path).unwrap().is_empty());
    }
}
