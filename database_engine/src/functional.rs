//! Stateless entry point. Every call opens a connection and closes it before returning.
//!
//! Produces the same statements and chunking as [crate::engine].

use arrow::record_batch::RecordBatch;

use crate::api::{Connection, Driver};
use crate::config::ConnectionConfig;
use crate::errors::Error;
use crate::handle::{self, DatabaseHandle};
use crate::insert::{self, BatchSize, InsertOptions, InsertSummary};
use crate::statement::build_insert_statement;
use crate::types::{DbType, Mode, TableRef};

/// Rows per chunk when no batch size is given.
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// Open a connection. It is closed when the returned handle is dropped or disposed.
pub fn create_conn<D: Driver>(
    driver: &D,
    config: &ConnectionConfig,
) -> Result<DatabaseHandle<D::Conn>, Error> {
    handle::connect(driver, config)
}

/// Build the statement for inserting into `table`, reading its columns from the catalog.
pub fn sql_for_insert<C: Connection>(
    handle: &mut DatabaseHandle<C>,
    db_type: DbType,
    table: &TableRef,
    mode: &Mode,
) -> Result<String, Error> {
    let conn = handle.conn().map_err(Error::Connection)?;
    let table = insert::describe_table(conn, table, mode, None)?;

    Ok(build_insert_statement(
        &table.name,
        table.schema.as_deref(),
        &table.columns,
        &table.key_columns,
        db_type,
        mode,
    )?)
}

/// Connect, insert all rows in chunks and disconnect.
///
/// The connection is closed on success and on failure alike.
pub fn batch_insert<D: Driver>(
    rows: &RecordBatch,
    driver: &D,
    config: &ConnectionConfig,
    table: &TableRef,
    batch_size: Option<BatchSize>,
) -> Result<InsertSummary, Error> {
    let batch_size = batch_size.unwrap_or(BatchSize::Rows(DEFAULT_BATCH_SIZE));
    run(rows, driver, config, table, &InsertOptions::insert(batch_size))
}

/// Like [batch_insert], but rows that collide with an existing key overwrite it.
pub fn batch_upsert<D: Driver>(
    rows: &RecordBatch,
    driver: &D,
    config: &ConnectionConfig,
    table: &TableRef,
    batch_size: Option<BatchSize>,
) -> Result<InsertSummary, Error> {
    let batch_size = batch_size.unwrap_or(BatchSize::Rows(DEFAULT_BATCH_SIZE));
    run(rows, driver, config, table, &InsertOptions::upsert(batch_size))
}

fn run<D: Driver>(
    rows: &RecordBatch,
    driver: &D,
    config: &ConnectionConfig,
    table: &TableRef,
    options: &InsertOptions,
) -> Result<InsertSummary, Error> {
    let mut target = table.clone();
    if target.schema.is_none() {
        target.schema = config.schema.clone();
    }

    let mut handle = create_conn(driver, config)?;
    let res = insert::batch_insert(&mut handle, config.db_type, &target, rows, options);
    handle.dispose();
    res
}
