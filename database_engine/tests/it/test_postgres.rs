use std::sync::Arc;

use database_engine::arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use database_engine::arrow::datatypes::DataType;
use database_engine::config::ConnectionConfig;
use database_engine::engine::DataBaseEngine;
use database_engine::handle::{self, DatabaseHandle};
use database_engine::postgres::{PostgresConnection, PostgresDriver};
use database_engine::types::{DbType, TableRef};

use crate::util::{batch, config_from_url, init_logger, orders};

fn init() -> (PostgresDriver, ConnectionConfig) {
    init_logger();
    let config = config_from_url(DbType::Postgres, "POSTGRES_URL").with_schema("public");
    (PostgresDriver::default(), config)
}

fn recreate(handle: &mut DatabaseHandle<PostgresConnection>, table: &str) {
    let client = handle.conn().unwrap().inner_mut();
    client
        .batch_execute(&format!(
            "DROP TABLE IF EXISTS \"{table}\";
            CREATE TABLE \"{table}\" (id INT4 PRIMARY KEY, name TEXT, amount NUMERIC(10, 2));"
        ))
        .unwrap();
}

#[test]
fn test_connection() {
    let (driver, config) = init();
    assert!(handle::test_connection(&driver, &config));
}

#[test]
fn engine_insert_and_upsert() {
    let table = "engine_insert_and_upsert";
    let (driver, config) = init();
    let mut handle = handle::connect(&driver, &config).unwrap();
    recreate(&mut handle, table);

    let engine = DataBaseEngine::new(driver, config, TableRef::new(table));
    let mut conn = engine.connect().unwrap();

    // Int64 and Float64 are coerced into INT4 and NUMERIC
    let summary = conn.batch_insert(&orders(7), 3).unwrap();
    assert_eq!((summary.rows, summary.chunks), (7, 3));

    let rows = batch(vec![
        ("id", DataType::Int64, Arc::new(Int64Array::from(vec![7, 8])) as ArrayRef),
        ("name", DataType::Utf8, Arc::new(StringArray::from(vec!["renamed", "new"]))),
        ("amount", DataType::Float64, Arc::new(Float64Array::from(vec![0.5, 1.25]))),
    ]);
    conn.upsert(&rows, 0).unwrap();
    conn.dispose();

    let client = handle.conn().unwrap().inner_mut();
    let count: i64 = client
        .query_one(&format!("SELECT COUNT(*) FROM \"{table}\""), &[])
        .unwrap()
        .get(0);
    assert_eq!(count, 8);

    let name: String = client
        .query_one(&format!("SELECT name FROM \"{table}\" WHERE id = 7"), &[])
        .unwrap()
        .get(0);
    assert_eq!(name, "renamed");
}

#[test]
fn introspects_columns_and_primary_key() {
    use database_engine::api::Connection;

    let table = "introspection";
    let (driver, config) = init();
    let mut handle = handle::connect(&driver, &config).unwrap();
    recreate(&mut handle, table);

    let conn = handle.conn().unwrap();
    assert_eq!(
        conn.table_columns(table, Some("public")).unwrap(),
        vec!["id", "name", "amount"]
    );
    assert_eq!(conn.primary_key(table, None).unwrap(), vec!["id"]);
    assert!(conn.table_columns("does_not_exist", None).unwrap().is_empty());
}
