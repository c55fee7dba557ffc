use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::model::{CountryRecord, Factbook, Field};
use crate::error::FactbookError;

// ---------------------------------------------------------------------------
// Exclusion sets
// ---------------------------------------------------------------------------

/// Row names to leave out of an aggregate (e.g. the "World" total).
pub type ExcludeNames = BTreeSet<String>;

/// Build an [`ExcludeNames`] from anything string-like.
pub fn exclude<I, S>(names: I) -> ExcludeNames
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

// ---------------------------------------------------------------------------
// Predicate: field <comparator> threshold
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparator {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Eq => lhs == rhs,
            Comparator::Ne => lhs != rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Eq => "=",
            Comparator::Ne => "!=",
        }
    }
}

/// Aggregates usable as a derived threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Avg,
    Min,
    Max,
}

impl Aggregate {
    fn keyword(self) -> &'static str {
        match self {
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
    Literal(f64),
    /// An aggregate of `field` over the rows not named in `exclude`,
    /// resolved against the dataset when the query runs.
    Derived {
        aggregate: Aggregate,
        field: Field,
        exclude: ExcludeNames,
    },
}

impl Threshold {
    pub fn average(field: Field, exclude: ExcludeNames) -> Self {
        Threshold::Derived {
            aggregate: Aggregate::Avg,
            field,
            exclude,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Literal(v) => write!(f, "{v}"),
            Threshold::Derived {
                aggregate, field, ..
            } => write!(f, "{}({field})", aggregate.keyword()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: Field,
    pub comparator: Comparator,
    pub threshold: Threshold,
}

impl Predicate {
    pub fn new(field: Field, comparator: Comparator, threshold: Threshold) -> Self {
        Predicate {
            field,
            comparator,
            threshold,
        }
    }

    /// Parse `<field> <op> <threshold>`, where the threshold is a number or
    /// `avg(field)` / `min(field)` / `max(field)`. Derived thresholds take
    /// `exclude` as their exclusion set.
    pub fn parse_with_exclusions(input: &str, exclude: &ExcludeNames) -> Result<Self, FactbookError> {
        let invalid = |reason: &str| FactbookError::InvalidPredicate {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let op_start = input
            .find(['<', '>', '=', '!'])
            .ok_or_else(|| invalid("missing comparison operator"))?;
        let (lhs, rest) = input.split_at(op_start);

        let (comparator, op_len) = [
            ("<=", Comparator::Le),
            (">=", Comparator::Ge),
            ("!=", Comparator::Ne),
            ("<>", Comparator::Ne),
            ("==", Comparator::Eq),
            ("<", Comparator::Lt),
            (">", Comparator::Gt),
            ("=", Comparator::Eq),
        ]
        .iter()
        .find(|(sym, _)| rest.starts_with(sym))
        .map(|(sym, cmp)| (*cmp, sym.len()))
        .ok_or_else(|| invalid("unrecognised comparison operator"))?;

        let lhs = lhs.trim();
        if lhs.is_empty() {
            return Err(invalid("missing field name"));
        }
        let field: Field = lhs.parse()?;

        let rhs = rest[op_len..].trim();
        if rhs.is_empty() {
            return Err(invalid("missing threshold"));
        }
        let threshold = parse_threshold(rhs, exclude).map_err(|err| match err {
            ThresholdError::Field(e) => e,
            ThresholdError::Syntax(reason) => invalid(reason),
        })?;

        Ok(Predicate::new(field, comparator, threshold))
    }

    /// Bind the threshold to a concrete value.
    pub fn resolved(&self, value: f64) -> ResolvedPredicate {
        ResolvedPredicate {
            field: self.field,
            comparator: self.comparator,
            value,
        }
    }
}

impl FromStr for Predicate {
    type Err = FactbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Predicate::parse_with_exclusions(s, &ExcludeNames::new())
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.field,
            self.comparator.symbol(),
            self.threshold
        )
    }
}

enum ThresholdError {
    Field(FactbookError),
    Syntax(&'static str),
}

fn parse_threshold(rhs: &str, exclude: &ExcludeNames) -> Result<Threshold, ThresholdError> {
    if let Ok(v) = rhs.parse::<f64>() {
        if v.is_nan() {
            return Err(ThresholdError::Syntax("threshold cannot be NaN"));
        }
        return Ok(Threshold::Literal(v));
    }

    let (func, arg) = rhs
        .strip_suffix(')')
        .and_then(|body| body.split_once('('))
        .ok_or(ThresholdError::Syntax(
            "threshold must be a number or avg(field), min(field), max(field)",
        ))?;

    let aggregate = match func.trim().to_ascii_lowercase().as_str() {
        "avg" => Aggregate::Avg,
        "min" => Aggregate::Min,
        "max" => Aggregate::Max,
        _ => return Err(ThresholdError::Syntax("unknown aggregate function")),
    };
    let field = arg.parse::<Field>().map_err(ThresholdError::Field)?;

    Ok(Threshold::Derived {
        aggregate,
        field,
        exclude: exclude.clone(),
    })
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// A predicate whose threshold has already been computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPredicate {
    pub field: Field,
    pub comparator: Comparator,
    pub value: f64,
}

impl ResolvedPredicate {
    /// A missing value never satisfies a comparison.
    pub fn matches(&self, record: &CountryRecord) -> bool {
        record
            .value(self.field)
            .is_some_and(|v| self.comparator.holds(v, self.value))
    }
}

/// Return indices of records that pass every predicate.
///
/// An empty predicate list passes every record.
pub fn filtered_indices(dataset: &Factbook, predicates: &[ResolvedPredicate]) -> Vec<usize> {
    dataset
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| predicates.iter().all(|p| p.matches(rec)))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, population: Option<i64>, area: Option<f64>) -> CountryRecord {
        let mut rec = CountryRecord::named(name);
        rec.population = population;
        rec.area = area;
        rec
    }

    #[test]
    fn parses_literal_threshold() {
        let p: Predicate = "population >= 1000000".parse().unwrap();
        assert_eq!(p.field, Field::Population);
        assert_eq!(p.comparator, Comparator::Ge);
        assert_eq!(p.threshold, Threshold::Literal(1_000_000.0));
    }

    #[test]
    fn parses_derived_threshold_without_spaces() {
        let ex = exclude(["World"]);
        let p = Predicate::parse_with_exclusions("area<avg(area)", &ex).unwrap();
        assert_eq!(p.comparator, Comparator::Lt);
        assert_eq!(p.threshold, Threshold::average(Field::Area, ex));
        assert_eq!(p.to_string(), "area < avg(area)");
    }

    #[test]
    fn parses_every_operator() {
        let cases = [
            ("birth_rate < 1", Comparator::Lt),
            ("birth_rate <= 1", Comparator::Le),
            ("birth_rate > 1", Comparator::Gt),
            ("birth_rate >= 1", Comparator::Ge),
            ("birth_rate = 1", Comparator::Eq),
            ("birth_rate == 1", Comparator::Eq),
            ("birth_rate != 1", Comparator::Ne),
            ("birth_rate <> 1", Comparator::Ne),
        ];
        for (text, cmp) in cases {
            assert_eq!(text.parse::<Predicate>().unwrap().comparator, cmp, "{text}");
        }
    }

    #[test]
    fn rejects_malformed_predicates() {
        for text in ["population", "> 5", "population >", "population > avg(", "area < sum(area)"] {
            let err = text.parse::<Predicate>().unwrap_err();
            assert!(
                matches!(err, FactbookError::InvalidPredicate { .. }),
                "{text}: {err}"
            );
        }
        let err = "gdp > 5".parse::<Predicate>().unwrap_err();
        assert!(matches!(err, FactbookError::UnknownField(_)));
        let err = "area > max(gdp)".parse::<Predicate>().unwrap_err();
        assert!(matches!(err, FactbookError::UnknownField(_)));
    }

    #[test]
    fn missing_values_never_match() {
        let p = ResolvedPredicate {
            field: Field::Area,
            comparator: Comparator::Ne,
            value: 1.0,
        };
        assert!(!p.matches(&record("World", Some(7), None)));
        assert!(p.matches(&record("Malta", Some(7), Some(316.0))));
    }

    #[test]
    fn filtered_indices_is_a_conjunction() {
        let dataset = Factbook::from_records(vec![
            record("A", Some(10), Some(5.0)),
            record("B", Some(50), Some(5.0)),
            record("C", Some(50), Some(500.0)),
            record("D", None, Some(1.0)),
        ]);
        let preds = [
            ResolvedPredicate {
                field: Field::Population,
                comparator: Comparator::Gt,
                value: 20.0,
            },
            ResolvedPredicate {
                field: Field::Area,
                comparator: Comparator::Lt,
                value: 100.0,
            },
        ];
        assert_eq!(filtered_indices(&dataset, &preds), vec![1]);
        assert_eq!(filtered_indices(&dataset, &[]), vec![0, 1, 2, 3]);
    }
}
