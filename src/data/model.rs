use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FactbookError;

// ---------------------------------------------------------------------------
// Field – a numeric column of the facts table
// ---------------------------------------------------------------------------

/// The numeric columns a query can aggregate or filter on.
///
/// `name` is deliberately absent: it is a text column and only takes part
/// in queries through exclusion sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Area,
    AreaLand,
    AreaWater,
    Population,
    PopulationGrowth,
    BirthRate,
    DeathRate,
    MigrationRate,
}

impl Field {
    /// All fields in storage order.
    pub const ALL: [Field; 8] = [
        Field::Area,
        Field::AreaLand,
        Field::AreaWater,
        Field::Population,
        Field::PopulationGrowth,
        Field::BirthRate,
        Field::DeathRate,
        Field::MigrationRate,
    ];

    /// Column name as it appears in the source table.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Area => "area",
            Field::AreaLand => "area_land",
            Field::AreaWater => "area_water",
            Field::Population => "population",
            Field::PopulationGrowth => "population_growth",
            Field::BirthRate => "birth_rate",
            Field::DeathRate => "death_rate",
            Field::MigrationRate => "migration_rate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = FactbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Field::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FactbookError::UnknownField(wanted.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Schema description
// ---------------------------------------------------------------------------

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Text => f.write_str("text"),
            ColumnKind::Integer => f.write_str("integer"),
            ColumnKind::Real => f.write_str("real"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

const fn column(name: &'static str, kind: ColumnKind, nullable: bool) -> ColumnInfo {
    ColumnInfo {
        name,
        kind,
        nullable,
    }
}

/// Columns of the facts table in storage order.
pub const SCHEMA: [ColumnInfo; 9] = [
    column("name", ColumnKind::Text, false),
    column("area", ColumnKind::Real, true),
    column("area_land", ColumnKind::Real, true),
    column("area_water", ColumnKind::Real, true),
    column("population", ColumnKind::Integer, true),
    column("population_growth", ColumnKind::Real, true),
    column("birth_rate", ColumnKind::Real, true),
    column("death_rate", ColumnKind::Real, true),
    column("migration_rate", ColumnKind::Real, true),
];

// ---------------------------------------------------------------------------
// CountryRecord – one row of the facts table
// ---------------------------------------------------------------------------

/// One row of the factbook. Any numeric cell may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    /// Total land and sea area, km².
    pub area: Option<f64>,
    pub area_land: Option<f64>,
    pub area_water: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub population: Option<i64>,
    /// Percent per year.
    pub population_growth: Option<f64>,
    /// Per 1,000 people per year.
    pub birth_rate: Option<f64>,
    pub death_rate: Option<f64>,
    pub migration_rate: Option<f64>,
}

impl CountryRecord {
    /// A record with only a name; every numeric cell missing.
    pub fn named(name: impl Into<String>) -> Self {
        CountryRecord {
            name: name.into(),
            area: None,
            area_land: None,
            area_water: None,
            population: None,
            population_growth: None,
            birth_rate: None,
            death_rate: None,
            migration_rate: None,
        }
    }

    /// Value of `field` as `f64`. NaN counts as missing.
    pub fn value(&self, field: Field) -> Option<f64> {
        let raw = match field {
            Field::Area => self.area,
            Field::AreaLand => self.area_land,
            Field::AreaWater => self.area_water,
            Field::Population => self.population.map(|p| p as f64),
            Field::PopulationGrowth => self.population_growth,
            Field::BirthRate => self.birth_rate,
            Field::DeathRate => self.death_rate,
            Field::MigrationRate => self.migration_rate,
        };
        raw.filter(|v| !v.is_nan())
    }

    /// Mutable access used by the columnar loader. Population goes through
    /// the same whole-number rule as the row-oriented formats.
    pub(crate) fn set_real(&mut self, field: Field, value: Option<f64>) -> Result<(), String> {
        match field {
            Field::Area => self.area = value,
            Field::AreaLand => self.area_land = value,
            Field::AreaWater => self.area_water = value,
            Field::Population => self.population = value.map(whole_count).transpose()?.flatten(),
            Field::PopulationGrowth => self.population_growth = value,
            Field::BirthRate => self.birth_rate = value,
            Field::DeathRate => self.death_rate = value,
            Field::MigrationRate => self.migration_rate = value,
        }
        Ok(())
    }
}

/// Largest magnitude a count may have when it arrives as a float.
const MAX_FLOAT_COUNT: f64 = 9.0e15;

/// Interpret a float as a population count. NaN is missing.
pub(crate) fn whole_count(f: f64) -> Result<Option<i64>, String> {
    if f.is_nan() {
        Ok(None)
    } else if !f.is_finite() || f.abs() >= MAX_FLOAT_COUNT {
        Err(format!("population {f} is out of range"))
    } else if f.fract() != 0.0 {
        Err(format!("population {f} is not a whole number"))
    } else {
        Ok(Some(f as i64))
    }
}

/// Population counts arrive as integers, as integral floats (pandas
/// promotes integer columns holding NaN to float64) or as text.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Int(i64),
        Float(f64),
        Text(String),
    }

    fn from_float<E: serde::de::Error>(f: f64) -> Result<Option<i64>, E> {
        whole_count(f).map_err(E::custom)
    }

    match Option::<RawCount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCount::Int(i)) => Ok(Some(i)),
        Some(RawCount::Float(f)) => from_float(f),
        Some(RawCount::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Some(i));
            }
            match s.parse::<f64>() {
                Ok(f) => from_float(f),
                Err(_) => Err(serde::de::Error::custom(format!(
                    "population '{s}' is not a number"
                ))),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Factbook – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full dataset in load order. Never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Factbook {
    records: Vec<CountryRecord>,
}

impl Factbook {
    pub fn from_records(records: Vec<CountryRecord>) -> Self {
        Factbook { records }
    }

    pub fn records(&self) -> &[CountryRecord] {
        &self.records
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
