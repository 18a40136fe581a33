use std::sync::Arc;

use database_engine::arrow::array::{ArrayRef, Int64Array, StringArray};
use database_engine::arrow::datatypes::DataType;
use database_engine::handle::{self, DatabaseHandle};
use database_engine::insert::{self, BatchSize, InsertOptions, InsertSummary, Progress};
use database_engine::types::{DbType, Mode, TableRef, UpsertOptions};
use database_engine::util::Value;
use database_engine::{ConnectorError, Error, InsertError, SchemaError};
use insta::assert_snapshot;
use rstest::rstest;

use crate::fake::{FakeConnection, FakeDriver};
use crate::util::{batch, config, init_logger, orders};

fn driver() -> FakeDriver {
    FakeDriver::default().with_table("orders", &["id", "name", "amount"], &["id"])
}

fn open(driver: &FakeDriver) -> DatabaseHandle<FakeConnection> {
    init_logger();
    handle::connect(driver, &config(DbType::MySql)).unwrap()
}

#[rstest]
#[case::remainder(7, BatchSize::Rows(3), vec![3, 3, 1])]
#[case::exact(6, BatchSize::Rows(3), vec![3, 3])]
#[case::all(7, BatchSize::All, vec![7])]
#[case::zero_is_all(7, BatchSize::from(0), vec![7])]
#[case::larger_than_input(7, BatchSize::Rows(100), vec![7])]
#[case::auto(250, BatchSize::Auto, vec![2; 125])]
fn chunking(#[case] rows: usize, #[case] batch_size: BatchSize, #[case] expected: Vec<usize>) {
    let driver = driver();
    let mut handle = open(&driver);

    let summary = insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(rows),
        &InsertOptions::insert(batch_size),
    )
    .unwrap();

    assert_eq!(
        summary,
        InsertSummary {
            rows,
            chunks: expected.len()
        }
    );
    drop(handle);
    assert_eq!(driver.committed_chunks(), expected);
}

#[test]
fn chunks_keep_input_order() {
    let driver = driver();
    let mut handle = open(&driver);

    insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(7),
        &InsertOptions::insert(3),
    )
    .unwrap();
    drop(handle);

    let ids: Vec<Value> = driver
        .state()
        .committed
        .iter()
        .flat_map(|e| e.rows.iter().map(|r| r[0].clone()))
        .collect();
    assert_eq!(ids, (1..=7).map(Value::Int).collect::<Vec<_>>());
}

#[test]
fn failing_chunk_stops_insert() {
    let driver = driver().fail_on_chunk(2);
    let mut handle = open(&driver);

    let err = insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(7),
        &InsertOptions::insert(3),
    )
    .unwrap_err();

    assert_snapshot!(err.to_string(), @"insert chunk 2 (rows 3..6): duplicate key");
    let Error::Insert(InsertError { chunk, rows, .. }) = err else {
        panic!("expected an insert error");
    };
    assert_eq!(chunk, 2);
    assert_eq!(rows, 3..6);

    drop(handle);
    let state = driver.state();
    // chunk 3 is never attempted
    assert_eq!(state.attempts, 2);
    assert_eq!(state.rollbacks, 1);
    // chunk 1 stays committed
    assert_eq!(state.committed.len(), 1);
    assert_eq!(state.committed[0].rows.len(), 3);
}

#[test]
fn failing_commit_stops_insert() {
    let driver = driver().fail_commit_on_chunk(2);
    let mut handle = open(&driver);

    let err = insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(7),
        &InsertOptions::insert(3),
    )
    .unwrap_err();

    assert_snapshot!(err.to_string(), @"insert chunk 2 (rows 3..6): lock wait timeout");
    let Error::Insert(InsertError { chunk, rows, .. }) = err else {
        panic!("expected an insert error");
    };
    assert_eq!(chunk, 2);
    assert_eq!(rows, 3..6);

    drop(handle);
    let state = driver.state();
    assert_eq!(state.attempts, 2);
    assert_eq!(state.rollbacks, 1);
    assert_eq!(state.committed.len(), 1);
    let ids: Vec<_> = state.committed[0].rows.iter().map(|r| r[0].clone()).collect();
    assert_eq!(ids, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn empty_input() {
    let driver = driver();
    let mut handle = open(&driver);

    let summary = insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(0),
        &InsertOptions::insert(3),
    )
    .unwrap();

    assert_eq!(summary, InsertSummary { rows: 0, chunks: 0 });
    drop(handle);
    assert_eq!(driver.state().attempts, 0);
}

#[test]
fn progress_after_each_chunk() {
    let driver = driver();
    let mut handle = open(&driver);

    let mut reported = Vec::new();
    insert::batch_insert_with_progress(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(7),
        &InsertOptions::insert(3),
        |p| reported.push(*p),
    )
    .unwrap();

    similar_asserts::assert_eq!(
        reported,
        vec![
            Progress { chunk: 1, chunks: 3, rows_sent: 3, rows_total: 7 },
            Progress { chunk: 2, chunks: 3, rows_sent: 6, rows_total: 7 },
            Progress { chunk: 3, chunks: 3, rows_sent: 7, rows_total: 7 },
        ]
    );
}

#[test]
fn values_are_bound_in_statement_order() {
    let driver = driver();
    let mut handle = open(&driver);

    // same columns as the table, but in a different order
    let rows = batch(vec![
        ("name", DataType::Utf8, Arc::new(StringArray::from(vec!["a"])) as ArrayRef),
        ("id", DataType::Int64, Arc::new(Int64Array::from(vec![10]))),
    ]);

    insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &rows,
        &InsertOptions::default(),
    )
    .unwrap();
    drop(handle);

    let state = driver.state();
    let executed = &state.committed[0];
    assert_snapshot!(executed.sql, @"INSERT INTO `orders` (`id`, `name`) VALUES (?, ?)");
    assert_eq!(executed.rows, vec![vec![Value::Int(10), Value::Text("a".into())]]);
}

#[test]
fn explicit_columns() {
    let driver = FakeDriver::default();
    let mut handle = open(&driver);

    let target = TableRef::new("orders").with_columns(["amount", "id"]);
    insert::batch_insert(
        &mut handle,
        DbType::Postgres,
        &target,
        &orders(2),
        &InsertOptions::default(),
    )
    .unwrap();
    drop(handle);

    let state = driver.state();
    assert_eq!(state.introspections, 0);
    assert_snapshot!(state.committed[0].sql, @r###"INSERT INTO "orders" ("amount", "id") VALUES ($1, $2)"###);
    assert_eq!(state.committed[0].rows[1], vec![Value::Float(3.0), Value::Int(2)]);
}

#[test]
fn explicit_column_missing_from_data() {
    let driver = FakeDriver::default();
    let mut handle = open(&driver);

    let target = TableRef::new("orders").with_columns(["id", "email"]);
    let err = insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &target,
        &orders(2),
        &InsertOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Schema(SchemaError::MissingColumn { column }) if column == "email"
    ));
}

#[test]
fn data_column_missing_from_table() {
    let driver = FakeDriver::default().with_table("orders", &["id", "name"], &["id"]);
    let mut handle = open(&driver);

    let err = insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(2),
        &InsertOptions::default(),
    )
    .unwrap_err();

    assert_snapshot!(err.to_string(), @"build: column `amount` of the inserted data does not exist in table `orders`");
    drop(handle);
    assert_eq!(driver.state().attempts, 0);
}

#[test]
fn table_columns_with_defaults_can_be_omitted() {
    let driver =
        FakeDriver::default().with_table("orders", &["id", "name", "amount", "created_at"], &["id"]);
    let mut handle = open(&driver);

    insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(1),
        &InsertOptions::default(),
    )
    .unwrap();
    drop(handle);

    assert_snapshot!(driver.state().committed[0].sql, @"INSERT INTO `orders` (`id`, `name`, `amount`) VALUES (?, ?, ?)");
}

#[test]
fn table_not_found() {
    let driver = FakeDriver::default();
    let mut handle = open(&driver);

    let err = insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("nope"),
        &orders(1),
        &InsertOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        Error::Schema(SchemaError::TableNotFound { table }) if table == "nope"
    ));
}

#[test]
fn upsert_uses_primary_key() {
    let driver = FakeDriver::default().with_table("orders", &["id", "name", "amount"], &["name"]);
    let mut handle = open(&driver);

    insert::batch_insert(
        &mut handle,
        DbType::Postgres,
        &TableRef::new("orders").with_schema("sales"),
        &orders(1),
        &InsertOptions::upsert(0),
    )
    .unwrap();
    drop(handle);

    assert_snapshot!(driver.state().committed[0].sql, @r###"INSERT INTO "sales"."orders" ("id", "name", "amount") VALUES ($1, $2, $3) ON CONFLICT ("name") DO UPDATE SET "id"=EXCLUDED."id", "amount"=EXCLUDED."amount""###);
}

#[test]
fn upsert_without_primary_key_uses_first_column() {
    let driver = FakeDriver::default().with_table("orders", &["id", "name", "amount"], &[]);
    let mut handle = open(&driver);

    insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(1),
        &InsertOptions::upsert(0),
    )
    .unwrap();
    drop(handle);

    assert_snapshot!(driver.state().committed[0].sql, @"INSERT INTO `orders` (`id`, `name`, `amount`) VALUES (?, ?, ?) ON DUPLICATE KEY UPDATE `name`=VALUES(`name`), `amount`=VALUES(`amount`)");
}

#[test]
fn upsert_with_excluded_columns() {
    let driver = driver();
    let mut handle = open(&driver);

    let options = InsertOptions {
        mode: Mode::Upsert(UpsertOptions {
            excluded: vec!["amount".to_string()],
        }),
        batch_size: BatchSize::All,
    };
    insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(1),
        &options,
    )
    .unwrap();
    drop(handle);

    assert_snapshot!(driver.state().committed[0].sql, @"INSERT INTO `orders` (`id`, `name`, `amount`) VALUES (?, ?, ?) ON DUPLICATE KEY UPDATE `name`=VALUES(`name`)");
}

#[test]
fn closed_handle() {
    let driver = driver();
    let mut handle = open(&driver);
    handle.dispose();
    assert!(!handle.is_open());

    let err = insert::batch_insert(
        &mut handle,
        DbType::MySql,
        &TableRef::new("orders"),
        &orders(1),
        &InsertOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Connection(ConnectorError::HandleClosed)));
}

#[test]
fn dispose_is_idempotent() {
    let driver = driver();
    let mut handle = open(&driver);

    handle.dispose();
    handle.dispose();
    drop(handle);

    let state = driver.state();
    assert_eq!(state.opened, 1);
    assert_eq!(state.open, 0);
}

#[test]
fn dispose_swallows_close_errors() {
    let driver = driver().fail_close();
    let mut handle = open(&driver);

    handle.dispose();
    assert!(!handle.is_open());
    drop(handle);
    assert_eq!(driver.state().open, 0);
}
