/// Data layer: core types, loading, writing and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Factbook
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Factbook  │  Vec<CountryRecord>, load order, read-only
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  resolved predicates → matching indices
///   └──────────┘
/// ```
///
/// `writer` goes the other way and emits any supported format.

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
