//! Integration tests for executing relations and batch-preloading attribute values.
//!
//! A single `vehicles` table holds Cars and Bikes (STI on `type`); their values
//! live in `vehicle_string_values` and `vehicle_integer_values`.

use hydraguard::{
    EntityAttributes, EntityDef, HydraExecutor, HydraRecord, HydraResult, PreloadGrouper, Record,
    Relation, Row, StaticRegistry, ValueCategory,
};
use sea_query::{Value, Values};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fixtures
// ============================================================================

/// Answers each query with the rows of the first matching fragment and keeps
/// everything it was asked
#[derive(Default)]
struct ScriptedExecutor {
    responses: Vec<(&'static str, Vec<Row>)>,
    captured: Mutex<Vec<(String, Values)>>,
}

impl ScriptedExecutor {
    fn new() -> Self {
        Self::default()
    }

    fn respond_to(mut self, fragment: &'static str, rows: Vec<Row>) -> Self {
        self.responses.push((fragment, rows));
        self
    }

    fn captured_sql(&self) -> Vec<String> {
        self.captured.lock().unwrap().iter().map(|(sql, _)| sql.clone()).collect()
    }

    fn captured_values(&self) -> Vec<Values> {
        self.captured.lock().unwrap().iter().map(|(_, values)| values.clone()).collect()
    }

    fn count_matching(&self, fragment: &str) -> usize {
        self.captured_sql().iter().filter(|sql| sql.contains(fragment)).count()
    }
}

impl HydraExecutor for ScriptedExecutor {
    fn query_all(&self, sql: &str, values: &Values) -> HydraResult<Vec<Row>> {
        self.captured.lock().unwrap().push((sql.to_string(), values.clone()));
        Ok(self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}

fn registry() -> Arc<StaticRegistry> {
    Arc::new(
        StaticRegistry::new()
            .register(
                "Car",
                EntityAttributes::new()
                    .attribute("model", ValueCategory::String)
                    .attribute("seats", ValueCategory::Integer)
                    .with_conventional_tables("vehicle"),
            )
            .register(
                "Bike",
                EntityAttributes::new()
                    .attribute("model", ValueCategory::String)
                    .with_conventional_tables("vehicle"),
            ),
    )
}

fn vehicles() -> Relation {
    Relation::new(EntityDef::new("Vehicle", "vehicles"), registry())
}

fn vehicle_row(id: i64, entity_type: &str) -> Row {
    Row::from_pairs([
        ("id", Value::from(id)),
        ("type", Value::from(entity_type)),
    ])
}

fn value_row(entity_id: i64, name: &str, value: Value) -> Row {
    Row::from_pairs([
        ("entity_id", Value::from(entity_id)),
        ("name", Value::from(name)),
        ("value", value),
    ])
}

/// 6 Cars (ids 1-6) and 4 Bikes (ids 7-10)
fn fleet() -> Vec<Row> {
    (1..=10)
        .map(|id| vehicle_row(id, if id <= 6 { "Car" } else { "Bike" }))
        .collect()
}

const STRING_VALUES: &str = r#"FROM "vehicle_string_values""#;
const INTEGER_VALUES: &str = r#"FROM "vehicle_integer_values""#;

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_mixed_batch_preloads_once_per_type_and_category() {
    let executor = ScriptedExecutor::new()
        .respond_to(
            STRING_VALUES,
            vec![
                value_row(1, "model", Value::from("Golf")),
                value_row(8, "model", Value::from("Brompton")),
            ],
        )
        .respond_to(INTEGER_VALUES, vec![value_row(1, "seats", Value::from(5i64))])
        .respond_to(r#"FROM "vehicles""#, fleet());

    let records: Vec<Record> = vehicles().all(&executor).unwrap();

    assert_eq!(records.len(), 10);
    assert_eq!(executor.captured_sql().len(), 1 + 3);
    assert_eq!(executor.count_matching(STRING_VALUES), 2);
    assert_eq!(executor.count_matching(INTEGER_VALUES), 1);

    assert_eq!(records[0].entity_type(), "Car");
    assert_eq!(records[0].attribute("model"), Some(&Value::from("Golf")));
    assert_eq!(records[0].attribute("seats"), Some(&Value::from(5i64)));
    assert_eq!(records[7].entity_type(), "Bike");
    assert_eq!(records[7].attribute("model"), Some(&Value::from("Brompton")));
    assert!(!records[7].is_category_loaded(ValueCategory::Integer));
    assert!(records[1].is_category_loaded(ValueCategory::String));
    assert_eq!(records[1].attribute("model"), None);
}

#[test]
fn test_value_queries_are_scoped_to_base_type_and_batch() {
    let executor = ScriptedExecutor::new().respond_to(r#"FROM "vehicles""#, fleet());
    let _: Vec<Record> = vehicles().all(&executor).unwrap();

    let sql = executor.captured_sql();
    let bikes = sql
        .iter()
        .zip(executor.captured_values())
        .filter(|(sql, _)| sql.contains(STRING_VALUES))
        .map(|(_, values)| values)
        .nth(1)
        .unwrap();
    // entity_type plus the four bike ids
    assert_eq!(bikes.0.len(), 5);
    assert_eq!(bikes.0[0], Value::from("Vehicle"));
    assert!(bikes.0.contains(&Value::from(7i64)));
    assert!(!bikes.0.contains(&Value::from(1i64)));
}

#[test]
fn test_single_record_triggers_no_preload() {
    let executor = ScriptedExecutor::new().respond_to(r#"FROM "vehicles""#, vec![vehicle_row(1, "Car")]);
    let records: Vec<Record> = vehicles().all(&executor).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(executor.captured_sql().len(), 1);
    assert_eq!(records[0].loaded_categories().count(), 0);
}

#[test]
fn test_unknown_types_are_left_alone() {
    let executor = ScriptedExecutor::new().respond_to(
        r#"FROM "vehicles""#,
        vec![vehicle_row(1, "Boat"), vehicle_row(2, "Boat")],
    );
    let records: Vec<Record> = vehicles().all(&executor).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(executor.captured_sql().len(), 1);
}

#[test]
fn test_grouping_a_loaded_batch_is_a_no_op() {
    let executor = ScriptedExecutor::new().respond_to(r#"FROM "vehicles""#, fleet());
    let mut records: Vec<Record> = vehicles().all(&executor).unwrap();

    let groups = PreloadGrouper::new(registry()).group(&records).unwrap();
    assert!(groups.is_empty());

    records.push(Record::new("Car", 11i64));
    let groups = PreloadGrouper::new(registry()).group(&records).unwrap();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.indices == [10]));
}
