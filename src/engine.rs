use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::data::filter::{Aggregate, ExcludeNames, Predicate, Threshold, filtered_indices};
use crate::data::loader::load_file;
use crate::data::model::{ColumnInfo, CountryRecord, Factbook, Field, SCHEMA};
use crate::error::{FactbookError, Result};

// ---------------------------------------------------------------------------
// Result shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

/// Which end of a field's range to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremum {
    Min,
    Max,
}

/// Per-field statistics as produced by [`QueryEngine::summary`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: Field,
    /// Non-null values that took part.
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

// ---------------------------------------------------------------------------
// QueryEngine
// ---------------------------------------------------------------------------

/// Read-only queries over one loaded [`Factbook`].
///
/// Every method is a linear scan with no hidden state, so repeated calls
/// with the same arguments return identical results. Aggregate rows such as
/// "World" are never dropped implicitly; pass them in an exclusion set.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    factbook: Factbook,
}

impl QueryEngine {
    pub fn new(factbook: Factbook) -> Self {
        QueryEngine { factbook }
    }

    /// Load `path` and wrap it in an engine.
    pub fn load(path: &Path) -> Result<Self> {
        let factbook = load_file(path).map_err(|err| FactbookError::Load {
            path: path.to_path_buf(),
            source: err.into(),
        })?;
        Ok(QueryEngine::new(factbook))
    }

    pub fn factbook(&self) -> &Factbook {
        &self.factbook
    }

    /// Column names and types of the facts table.
    pub fn schema(&self) -> &'static [ColumnInfo] {
        &SCHEMA
    }

    /// All records, or the first `limit`, in load order.
    pub fn fetch_all(&self, limit: Option<usize>) -> &[CountryRecord] {
        let records = self.factbook.records();
        match limit {
            Some(n) => &records[..n.min(records.len())],
            None => records,
        }
    }

    /// Every row carrying exactly this name.
    pub fn find_by_name(&self, name: &str) -> Vec<&CountryRecord> {
        self.factbook
            .records()
            .iter()
            .filter(|r| r.name == name)
            .collect()
    }

    /// Non-null values of `field`, skipping excluded names.
    fn values<'a>(
        &'a self,
        field: Field,
        exclude: &'a ExcludeNames,
    ) -> impl Iterator<Item = f64> + 'a {
        self.factbook
            .records()
            .iter()
            .filter(move |r| !exclude.contains(&r.name))
            .filter_map(move |r| r.value(field))
    }

    pub fn min_max(&self, field: Field, exclude: &ExcludeNames) -> Result<MinMax> {
        debug!("min_max({field}) excluding {exclude:?}");
        self.values(field, exclude)
            .fold(None, |acc: Option<MinMax>, v| {
                Some(match acc {
                    None => MinMax { min: v, max: v },
                    Some(mm) => MinMax {
                        min: mm.min.min(v),
                        max: mm.max.max(v),
                    },
                })
            })
            .ok_or(FactbookError::EmptyDataset { field })
    }

    /// All records sitting at the global minimum or maximum of `field`.
    /// Ties are all returned, in load order.
    pub fn records_at_extremum(&self, field: Field, which: Extremum) -> Result<Vec<&CountryRecord>> {
        let range = self.min_max(field, &ExcludeNames::new())?;
        let target = match which {
            Extremum::Min => range.min,
            Extremum::Max => range.max,
        };
        debug!("records_at_extremum({field}, {which:?}) -> {target}");
        Ok(self
            .factbook
            .records()
            .iter()
            .filter(|r| r.value(field) == Some(target))
            .collect())
    }

    /// Arithmetic mean of `field` over records not named in `exclude`.
    pub fn average(&self, field: Field, exclude: &ExcludeNames) -> Result<f64> {
        let (sum, count) = self
            .values(field, exclude)
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        debug!("average({field}) over {count} values excluding {exclude:?}");
        if count == 0 {
            return Err(FactbookError::EmptyDataset { field });
        }
        Ok(sum / count as f64)
    }

    /// Min, max, mean and count for several fields at once.
    pub fn summary(&self, fields: &[Field], exclude: &ExcludeNames) -> Result<Vec<FieldSummary>> {
        fields
            .iter()
            .map(|&field| {
                let MinMax { min, max } = self.min_max(field, exclude)?;
                Ok(FieldSummary {
                    field,
                    count: self.values(field, exclude).count(),
                    min,
                    max,
                    mean: self.average(field, exclude)?,
                })
            })
            .collect()
    }

    /// Concrete value of a threshold against this dataset.
    pub fn resolve(&self, threshold: &Threshold) -> Result<f64> {
        match threshold {
            Threshold::Literal(v) => Ok(*v),
            Threshold::Derived {
                aggregate,
                field,
                exclude,
            } => match aggregate {
                Aggregate::Avg => self.average(*field, exclude),
                Aggregate::Min => Ok(self.min_max(*field, exclude)?.min),
                Aggregate::Max => Ok(self.min_max(*field, exclude)?.max),
            },
        }
    }

    /// Records satisfying every predicate. Derived thresholds are computed
    /// once, before the scan.
    pub fn filter_by_threshold(&self, predicates: &[Predicate]) -> Result<Vec<&CountryRecord>> {
        let resolved = predicates
            .iter()
            .map(|p| Ok(p.resolved(self.resolve(&p.threshold)?)))
            .collect::<Result<Vec<_>>>()?;
        for p in &resolved {
            debug!("filter {} {} {}", p.field, p.comparator.symbol(), p.value);
        }

        let records = self.factbook.records();
        Ok(filtered_indices(&self.factbook, &resolved)
            .into_iter()
            .map(|i| &records[i])
            .collect())
    }
}
