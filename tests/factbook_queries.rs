//! Queries from the guided exploration, run against the shipped dataset.

mod helpers;

use factbook::{
    Comparator, ExcludeNames, Extremum, FactbookError, Field, Predicate, Threshold, exclude,
};
use helpers::{engine, names, world};

#[test]
fn shipped_dataset_loads_in_order() {
    let engine = engine();
    assert_eq!(engine.factbook().len(), 36);
    assert_eq!(
        names(engine.fetch_all(Some(5))),
        ["Afghanistan", "Albania", "Andorra", "Antarctica", "Bahamas, The"]
    );
    assert_eq!(engine.fetch_all(None).last().unwrap().name, "World");
}

#[test]
fn population_extremes_are_antarctica_and_world() {
    let engine = engine();
    let range = engine.min_max(Field::Population, &ExcludeNames::new()).unwrap();
    assert_eq!(range.min, 0.0);
    assert_eq!(range.max, 7_256_490_011.0);

    let lows = engine.records_at_extremum(Field::Population, Extremum::Min).unwrap();
    assert_eq!(names(lows), ["Antarctica"]);
    let highs = engine.records_at_extremum(Field::Population, Extremum::Max).unwrap();
    assert_eq!(names(highs), ["World"]);
}

#[test]
fn excluding_world_changes_the_range() {
    let engine = engine();
    let range = engine.min_max(Field::Population, &world()).unwrap();
    assert_eq!(range.min, 0.0);
    assert_eq!(range.max, 168_957_745.0);

    let growth = engine.min_max(Field::PopulationGrowth, &world()).unwrap();
    assert_eq!(growth.min, 0.09);
    assert_eq!(growth.max, 3.07);
}

#[test]
fn extremum_ties_are_all_returned() {
    let engine = engine();
    let lows = engine.records_at_extremum(Field::MigrationRate, Extremum::Min).unwrap();
    assert_eq!(names(lows), ["Andorra", "Bahamas, The", "Japan", "Thailand"]);
}

#[test]
fn averages_without_world() {
    let engine = engine();
    let pop = engine.average(Field::Population, &world()).unwrap();
    assert!((pop - 27_517_124.828_571_43).abs() < 1e-3, "{pop}");

    // World has no area, so excluding it only matters for population.
    let area = engine.average(Field::Area, &world()).unwrap();
    assert_eq!(area, engine.average(Field::Area, &ExcludeNames::new()).unwrap());
    assert!((area - 569_182.6).abs() < 1e-6, "{area}");
}

#[test]
fn removing_the_high_outlier_lowers_the_average() {
    let engine = engine();
    let with_world = engine.average(Field::Population, &ExcludeNames::new()).unwrap();
    let without = engine.average(Field::Population, &world()).unwrap();
    assert!(without < with_world);
}

#[test]
fn exactly_seven_densely_populated_countries() {
    let engine = engine();
    let preds = [
        Predicate::new(
            Field::Population,
            Comparator::Gt,
            Threshold::average(Field::Population, world()),
        ),
        Predicate::new(Field::Area, Comparator::Lt, Threshold::average(Field::Area, world())),
    ];
    let dense = engine.filter_by_threshold(&preds).unwrap();
    assert_eq!(
        names(dense),
        [
            "Bangladesh",
            "Germany",
            "Japan",
            "Philippines",
            "Thailand",
            "United Kingdom",
            "Vietnam"
        ]
    );
}

#[test]
fn textual_predicates_match_typed_ones() {
    let engine = engine();
    let parsed = [
        Predicate::parse_with_exclusions("population > avg(population)", &world()).unwrap(),
        Predicate::parse_with_exclusions("area < avg(area)", &world()).unwrap(),
    ];
    assert_eq!(engine.filter_by_threshold(&parsed).unwrap().len(), 7);
}

#[test]
fn literal_and_min_max_thresholds() {
    let engine = engine();
    let tiny = engine
        .filter_by_threshold(&["area < 500".parse().unwrap()])
        .unwrap();
    assert_eq!(names(tiny), ["Andorra", "Malta", "Monaco", "Tuvalu"]);

    let largest = engine
        .filter_by_threshold(&["area >= max(area)".parse().unwrap()])
        .unwrap();
    assert_eq!(names(largest), ["Antarctica"]);
}

#[test]
fn queries_are_idempotent() {
    let engine = engine();
    let first = engine.average(Field::BirthRate, &world()).unwrap();
    let second = engine.average(Field::BirthRate, &world()).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());

    let a = engine.summary(&Field::ALL, &world()).unwrap();
    let b = engine.summary(&Field::ALL, &world()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn min_never_exceeds_max() {
    let engine = engine();
    for field in Field::ALL {
        let range = engine.min_max(field, &ExcludeNames::new()).unwrap();
        assert!(range.min <= range.max, "{field}");
    }
}

#[test]
fn averaging_nothing_is_an_error() {
    let engine = engine();
    let everyone = exclude(engine.fetch_all(None).iter().map(|r| r.name.clone()));
    let err = engine.average(Field::Population, &everyone).unwrap_err();
    assert!(matches!(err, FactbookError::EmptyDataset { field: Field::Population }));
}

#[test]
fn duplicate_names_are_found() {
    let engine = engine();
    assert_eq!(engine.find_by_name("Japan").len(), 1);
    assert!(engine.find_by_name("Atlantis").is_empty());
}

#[test]
fn missing_dataset_is_a_load_error() {
    let err = factbook::QueryEngine::load(std::path::Path::new("no/such/factbook.csv")).unwrap_err();
    assert!(matches!(err, FactbookError::Load { .. }));
    assert!(err.to_string().contains("no/such/factbook.csv"));
}
