use itertools::Itertools;

use crate::types::DbType;

/// Quote an identifier with backticks, MySQL style.
pub fn escaped_ident_bt(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote an identifier with double quotes, ANSI style.
pub fn escaped_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn quote_ident(db_type: DbType, ident: &str) -> String {
    match db_type {
        DbType::MySql => escaped_ident_bt(ident),
        DbType::Postgres => escaped_ident(ident),
    }
}

/// Table name, qualified with schema when one is given.
pub fn qualified_table(db_type: DbType, schema: Option<&str>, table: &str) -> String {
    schema
        .filter(|s| !s.is_empty())
        .map(|s| quote_ident(db_type, s))
        .into_iter()
        .chain(std::iter::once(quote_ident(db_type, table)))
        .join(".")
}
