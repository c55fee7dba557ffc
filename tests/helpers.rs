//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use factbook::{ExcludeNames, QueryEngine, exclude};

/// The curated factbook extract shipped in `data/`.
pub fn dataset_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data/factbook.csv")
}

pub fn engine() -> QueryEngine {
    QueryEngine::load(&dataset_path()).expect("shipped dataset loads")
}

pub fn world() -> ExcludeNames {
    exclude(["World"])
}

pub fn names<'a>(records: impl IntoIterator<Item = &'a factbook::CountryRecord>) -> Vec<&'a str> {
    records.into_iter().map(|r| r.name.as_str()).collect()
}
