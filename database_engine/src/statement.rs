//! Construction of INSERT and UPSERT statements.

use itertools::Itertools;

use crate::errors::SchemaError;
use crate::types::{DbType, Mode};
use crate::util::escape::{qualified_table, quote_ident};

/// Build an INSERT statement with one placeholder per column.
///
/// In [Mode::Upsert], rows that collide on `key_columns` overwrite every other column,
/// except the ones in [crate::types::UpsertOptions::excluded].
/// When `key_columns` is empty, the first column is assumed to be the key.
///
/// Values must be bound in the order of `columns`.
pub fn build_insert_statement(
    table: &str,
    schema: Option<&str>,
    columns: &[String],
    key_columns: &[String],
    db_type: DbType,
    mode: &Mode,
) -> Result<String, SchemaError> {
    if table.is_empty() {
        return Err(SchemaError::EmptyTableName);
    }
    if columns.is_empty() {
        return Err(SchemaError::EmptyColumns {
            table: table.to_string(),
        });
    }

    let table_name = qualified_table(db_type, schema, table);
    let col_names = columns.iter().map(|c| quote_ident(db_type, c)).join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| placeholder(db_type, i))
        .join(", ");

    let insert = format!("INSERT INTO {table_name} ({col_names}) VALUES ({placeholders})");

    let Mode::Upsert(options) = mode else {
        log::debug!("insert statement: {insert}");
        return Ok(insert);
    };

    let keys: Vec<&String> = if key_columns.is_empty() {
        vec![&columns[0]]
    } else {
        key_columns.iter().collect()
    };
    if let Some(unknown) = keys.iter().find(|k| !columns.contains(**k)) {
        return Err(SchemaError::UnknownKey {
            column: unknown.to_string(),
        });
    }

    let update_cols = columns
        .iter()
        .filter(|c| !keys.contains(c) && !options.excluded.contains(*c))
        .map(|c| quote_ident(db_type, c))
        .collect_vec();

    let conflict = match db_type {
        DbType::MySql => {
            let assignments = if update_cols.is_empty() {
                // MySQL has no DO NOTHING, assigning the key to itself is a no-op
                let key = quote_ident(db_type, keys[0]);
                format!("{key}={key}")
            } else {
                update_cols
                    .iter()
                    .map(|c| format!("{c}=VALUES({c})"))
                    .join(", ")
            };
            format!("ON DUPLICATE KEY UPDATE {assignments}")
        }
        DbType::Postgres => {
            let keys = keys.iter().map(|k| quote_ident(db_type, k)).join(", ");
            if update_cols.is_empty() {
                format!("ON CONFLICT ({keys}) DO NOTHING")
            } else {
                let assignments = update_cols
                    .iter()
                    .map(|c| format!("{c}=EXCLUDED.{c}"))
                    .join(", ");
                format!("ON CONFLICT ({keys}) DO UPDATE SET {assignments}")
            }
        }
    };

    let upsert = format!("{insert} {conflict}");
    log::debug!("upsert statement: {upsert}");
    Ok(upsert)
}

/// Placeholder of the `index`-th (1-based) parameter.
pub fn placeholder(db_type: DbType, index: usize) -> String {
    match db_type {
        DbType::MySql => "?".to_string(),
        DbType::Postgres => format!("${index}"),
    }
}
