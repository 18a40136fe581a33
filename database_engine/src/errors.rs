use std::ops::Range;

use thiserror::Error;

/// Errors that can be raised from this library.
///
/// Each variant names the stage that failed, so the message alone tells
/// whether configuration, connecting, building the statement or inserting went wrong.
#[derive(Error, Debug)]
pub enum Error {
    #[error("config: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("connect: {0}")]
    Connection(#[source] ConnectorError),

    #[error("build: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Insert(#[from] InsertError),
}

/// Errors raised by the database drivers.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("database handle has already been closed")]
    HandleClosed,

    #[error("cannot bind values of type {data_type} (column `{column}`)")]
    UnsupportedType {
        column: String,
        data_type: arrow::datatypes::DataType,
    },

    #[error("When converting values from Arrow into database types, it fell out of supported range.")]
    DataOutOfRange,

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "src_mysql")]
    #[error(transparent)]
    MySQL(#[from] mysql::Error),

    #[cfg(feature = "src_postgres")]
    #[error(transparent)]
    Postgres(#[from] postgres::Error),

    /// Failure reported by a [crate::api::Driver] implemented outside of this crate.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("environment variable `{name}` is not set or empty")]
    Missing { name: String },

    #[error("environment variable `{name}` contains an invalid port: `{value}`")]
    InvalidPort { name: String, value: String },

    #[error("environment variable `{name}` contains an invalid url: {reason}")]
    InvalidUrl {
        name: String,
        #[source]
        reason: url::ParseError,
    },

    #[error("unknown environment `{0}`, expected one of: dev, staging, prod")]
    UnknownEnvironment(String),

    #[error("unknown database type `{0}`, expected one of: mysql, postgres")]
    UnknownDbType(String),
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("no columns to insert into table `{table}`")]
    EmptyColumns { table: String },

    #[error("table name must be a non-empty string")]
    EmptyTableName,

    #[error("key column `{column}` is not one of the inserted columns")]
    UnknownKey { column: String },

    #[error("column `{column}` is missing from the inserted data")]
    MissingColumn { column: String },

    #[error("column `{column}` of the inserted data does not exist in table `{table}`")]
    UnknownColumn { column: String, table: String },

    #[error("no columns found for table `{table}`, check that it exists and the user can read it")]
    TableNotFound { table: String },

    #[error("cannot read table metadata: {0}")]
    Introspection(#[source] ConnectorError),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Failure of a single chunk of a batch insert.
///
/// Chunks before `chunk` have already been committed, chunks after it were never sent.
#[derive(Error, Debug)]
#[error("insert chunk {chunk} (rows {}..{}): {source}", .rows.start, .rows.end)]
pub struct InsertError {
    /// 1-based index of the failed chunk.
    pub chunk: usize,

    /// Rows of the input that were in the failed chunk.
    pub rows: Range<usize>,

    pub source: ConnectorError,
}

/// Failure to compute surrogate keys.
#[derive(Error, Debug)]
pub enum SurrogateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Connector(#[from] ConnectorError),
}
