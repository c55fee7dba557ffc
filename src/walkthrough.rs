//! The guided exploration: a fixed sequence of queries, each printed with a
//! heading, a one-line reading of the result and the result table.

use std::io::Write;

use anyhow::Result;
use log::debug;

use crate::config::DEFAULT_PREVIEW_ROWS;
use crate::data::filter::{Comparator, ExcludeNames, Predicate, Threshold};
use crate::data::model::{CountryRecord, Field};
use crate::engine::{Extremum, QueryEngine};
use crate::report;

/// Above-average population and below-average area, both averages taken
/// without the `aggregates` rows.
pub fn dense_predicates(aggregates: &ExcludeNames) -> [Predicate; 2] {
    [
        Predicate::new(
            Field::Population,
            Comparator::Gt,
            Threshold::average(Field::Population, aggregates.clone()),
        ),
        Predicate::new(
            Field::Area,
            Comparator::Lt,
            Threshold::average(Field::Area, aggregates.clone()),
        ),
    ]
}

pub fn densely_populated<'a>(
    engine: &'a QueryEngine,
    aggregates: &ExcludeNames,
) -> crate::Result<Vec<&'a CountryRecord>> {
    engine.filter_by_threshold(&dense_predicates(aggregates))
}

fn names(records: &[&CountryRecord]) -> String {
    records
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn section<W: Write>(out: &mut W, title: &str, narration: &str, table: &str) -> Result<()> {
    writeln!(out, "## {title}")?;
    writeln!(out)?;
    if !narration.is_empty() {
        writeln!(out, "{narration}")?;
        writeln!(out)?;
    }
    writeln!(out, "{table}")?;
    writeln!(out)?;
    Ok(())
}

/// Replay the exploration against `engine`, treating `aggregates` as the
/// non-country rows to leave out of the later statistics.
pub fn run<W: Write>(engine: &QueryEngine, aggregates: &ExcludeNames, out: &mut W) -> Result<()> {
    let everything = ExcludeNames::new();
    let excluded = aggregates.iter().cloned().collect::<Vec<_>>().join(", ");
    debug!("walkthrough over {} rows, aggregates: {excluded}", engine.factbook().len());

    writeln!(out, "# Exploring the Factbook")?;
    writeln!(out)?;

    section(
        out,
        "Tables",
        "",
        &report::render_schema(engine.schema())?,
    )?;

    let preview = engine.fetch_all(Some(DEFAULT_PREVIEW_ROWS));
    section(
        out,
        "Data overview",
        &format!("First {} of {} rows.", preview.len(), engine.factbook().len()),
        &report::render_records(preview)?,
    )?;

    let stat_fields = [Field::Population, Field::PopulationGrowth];
    let stats = engine.summary(&stat_fields, &everything)?;
    section(
        out,
        "Population statistics",
        &format!(
            "Population ranges from {} to {}; growth from {}% to {}%.",
            stats[0].min, stats[0].max, stats[1].min, stats[1].max
        ),
        &report::render_summary(&stats)?,
    )?;

    for (which, label) in [(Extremum::Min, "Smallest"), (Extremum::Max, "Largest")] {
        let rows = engine.records_at_extremum(Field::Population, which)?;
        let value = rows
            .first()
            .and_then(|r| r.population)
            .map(|p| p.to_string())
            .unwrap_or_default();
        section(
            out,
            &format!("{label} population"),
            &format!("{} at {value}.", names(&rows)),
            &report::render_records(rows.iter().copied())?,
        )?;
    }

    if aggregates.is_empty() {
        return Ok(());
    }

    let stats = engine.summary(&stat_fields, aggregates)?;
    section(
        out,
        &format!("Statistics without {excluded}"),
        &format!("The most populous remaining row has {} people.", stats[0].max),
        &report::render_summary(&stats)?,
    )?;

    let avg_pop = engine.average(Field::Population, aggregates)?;
    let avg_area = engine.average(Field::Area, aggregates)?;
    section(
        out,
        "Average population and area",
        &format!(
            "Average population is {:.1} million; average area is {:.0} km².",
            avg_pop / 1.0e6,
            avg_area
        ),
        &report::render_scalars(&[("avg_population", avg_pop), ("avg_area", avg_area)])?,
    )?;

    let dense = densely_populated(engine, aggregates)?;
    section(
        out,
        "Densely populated countries",
        &format!(
            "{} rows have above-average population and below-average area.",
            dense.len()
        ),
        &report::render_records(dense.iter().copied())?,
    )?;

    Ok(())
}
