//! Chunked insertion of a [RecordBatch] into a table.

use std::ops::Range;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use crate::api::Connection;
use crate::errors::{Error, InsertError, SchemaError};
use crate::handle::DatabaseHandle;
use crate::statement::build_insert_statement;
use crate::types::{DbType, Mode, TableDescriptor, TableRef};
use crate::util::project_by_name;

/// Number of rows sent per executed statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchSize {
    /// All rows in a single chunk.
    #[default]
    All,

    /// At most this many rows per chunk. `Rows(0)` behaves like [BatchSize::All].
    Rows(usize),

    /// A hundredth of the rows per chunk, but at least one row.
    Auto,
}

impl BatchSize {
    /// Rows per chunk, for an input of `total` rows.
    pub fn chunk_len(&self, total: usize) -> usize {
        match *self {
            BatchSize::All | BatchSize::Rows(0) => total.max(1),
            BatchSize::Rows(n) => n,
            BatchSize::Auto => (total / 100).max(1),
        }
    }
}

impl From<usize> for BatchSize {
    fn from(value: usize) -> Self {
        match value {
            0 => BatchSize::All,
            n => BatchSize::Rows(n),
        }
    }
}

/// Consecutive ranges of rows covering `0..total`.
pub fn chunk_ranges(total: usize, batch_size: BatchSize) -> Vec<Range<usize>> {
    let len = batch_size.chunk_len(total);
    (0..total)
        .step_by(len)
        .map(|start| start..(start + len).min(total))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOptions {
    pub mode: Mode,
    pub batch_size: BatchSize,
}

impl InsertOptions {
    pub fn insert(batch_size: impl Into<BatchSize>) -> Self {
        InsertOptions {
            mode: Mode::Insert,
            batch_size: batch_size.into(),
        }
    }

    pub fn upsert(batch_size: impl Into<BatchSize>) -> Self {
        InsertOptions {
            mode: Mode::upsert(),
            batch_size: batch_size.into(),
        }
    }
}

/// Reported after each committed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the chunk that was just committed.
    pub chunk: usize,
    pub chunks: usize,
    pub rows_sent: usize,
    pub rows_total: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub rows: usize,
    pub chunks: usize,
}

/// Insert all rows of `rows` into the target table.
///
/// See [batch_insert_with_progress].
pub fn batch_insert<C: Connection>(
    handle: &mut DatabaseHandle<C>,
    db_type: DbType,
    target: &TableRef,
    rows: &RecordBatch,
    options: &InsertOptions,
) -> Result<InsertSummary, Error> {
    batch_insert_with_progress(handle, db_type, target, rows, options, |_| {})
}

/// Insert all rows of `rows` into the target table, calling `on_progress` after each chunk.
///
/// Rows are split into chunks of [InsertOptions::batch_size], in input order.
/// Each chunk is executed and committed on its own, so a failing chunk does not
/// undo the chunks before it. Chunks after a failing chunk are not sent.
pub fn batch_insert_with_progress<C, F>(
    handle: &mut DatabaseHandle<C>,
    db_type: DbType,
    target: &TableRef,
    rows: &RecordBatch,
    options: &InsertOptions,
    mut on_progress: F,
) -> Result<InsertSummary, Error>
where
    C: Connection,
    F: FnMut(&Progress),
{
    let conn = handle.conn().map_err(Error::Connection)?;

    let schema = rows.schema();
    let table = describe_table(conn, target, &options.mode, Some(schema.as_ref()))?;
    let rows = project_by_name(rows, &table.columns, &table.name, false)?;

    let sql = build_insert_statement(
        &table.name,
        table.schema.as_deref(),
        &table.columns,
        &table.key_columns,
        db_type,
        &options.mode,
    )?;

    let total = rows.num_rows();
    let ranges = chunk_ranges(total, options.batch_size);
    let chunks = ranges.len();
    log::info!(
        "inserting {total} rows into {} in {chunks} chunks",
        table.name
    );

    let mut rows_sent = 0;
    for (index, range) in ranges.into_iter().enumerate() {
        let chunk = rows.slice(range.start, range.len());

        let res = conn
            .execute_many(&sql, &chunk)
            .and_then(|_| conn.commit());

        if let Err(source) = res {
            log::error!(
                "chunk {} of {chunks} (rows {}..{}) failed: {source}",
                index + 1,
                range.start,
                range.end
            );
            if let Err(e) = conn.rollback() {
                log::warn!("rollback failed: {e}");
            }
            return Err(InsertError {
                chunk: index + 1,
                rows: range,
                source,
            }
            .into());
        }

        rows_sent += range.len();
        let progress = Progress {
            chunk: index + 1,
            chunks,
            rows_sent,
            rows_total: total,
        };
        log::info!("{}: {rows_sent}/{total} rows", table.name);
        on_progress(&progress);
    }

    Ok(InsertSummary {
        rows: rows_sent,
        chunks,
    })
}

/// Resolve the columns and keys of the target table.
///
/// Columns that were not given are read from the catalog. When `data` is given,
/// catalog columns are narrowed down to the columns present in the data, and a data
/// column that the table does not have is an error.
pub fn describe_table<C: Connection>(
    conn: &mut C,
    target: &TableRef,
    mode: &Mode,
    data: Option<&Schema>,
) -> Result<TableDescriptor, SchemaError> {
    if target.name.is_empty() {
        return Err(SchemaError::EmptyTableName);
    }
    let schema = target.schema.as_deref();

    let columns = match &target.columns {
        Some(columns) => columns.clone(),
        None => {
            log::debug!("reading columns of {}", target.name);
            let table_columns = conn
                .table_columns(&target.name, schema)
                .map_err(SchemaError::Introspection)?;
            if table_columns.is_empty() {
                return Err(SchemaError::TableNotFound {
                    table: target.name.clone(),
                });
            }
            log::info!("columns of {}: {table_columns:?}", target.name);

            match data {
                Some(data) => narrow_to_data(table_columns, data, &target.name)?,
                None => table_columns,
            }
        }
    };
    if columns.is_empty() {
        return Err(SchemaError::EmptyColumns {
            table: target.name.clone(),
        });
    }

    let key_columns = match (&target.key_columns, mode) {
        (Some(keys), _) => keys.clone(),
        (None, Mode::Upsert(_)) => {
            log::debug!("reading primary key of {}", target.name);
            let keys = conn
                .primary_key(&target.name, schema)
                .map_err(SchemaError::Introspection)?;
            log::info!("primary key of {}: {keys:?}", target.name);
            keys
        }
        (None, Mode::Insert) => Vec::new(),
    };

    Ok(TableDescriptor {
        name: target.name.clone(),
        schema: target.schema.clone(),
        columns,
        key_columns,
    })
}

fn narrow_to_data(
    table_columns: Vec<String>,
    data: &Schema,
    table: &str,
) -> Result<Vec<String>, SchemaError> {
    if let Some(unknown) = data
        .fields()
        .iter()
        .find(|f| !table_columns.contains(f.name()))
    {
        return Err(SchemaError::UnknownColumn {
            column: unknown.name().clone(),
            table: table.to_string(),
        });
    }

    Ok(table_columns
        .into_iter()
        .filter(|c| data.field_with_name(c).is_ok())
        .collect())
}
