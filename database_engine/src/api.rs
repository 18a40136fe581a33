//! Database client interface that the batch inserter is written against.
//!
//! The important traits are:
//! - [Driver], which opens connections from a [ConnectionConfig],
//! - [Connection], providing the small set of capabilities needed to insert
//!   [RecordBatch]es and to introspect table metadata.
//!
//! Implementations for the `mysql` and `postgres` crates live in [crate::mysql]
//! and [crate::postgres]. Anything else implementing these traits can be used
//! with [crate::engine] and [crate::functional] too.

use arrow::record_batch::RecordBatch;

use crate::config::ConnectionConfig;
use crate::errors::ConnectorError;

/// Opens connections to a data store.
pub trait Driver {
    type Conn: Connection;

    /// Open a new session. Blocks until the server accepts or rejects it.
    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Conn, ConnectorError>;
}

/// A connection to a data store.
pub trait Connection {
    /// Execute a statement that has no parameters and discard its result.
    fn execute(&mut self, sql: &str) -> Result<(), ConnectorError>;

    /// Prepare `sql` and execute it once per row of `rows`.
    ///
    /// Columns of `rows` are bound to the placeholders of `sql` in order.
    /// Rows are written in a transaction that is kept open until [Connection::commit]
    /// or [Connection::rollback]. Returns the number of rows written.
    fn execute_many(&mut self, sql: &str, rows: &RecordBatch) -> Result<u64, ConnectorError>;

    fn commit(&mut self) -> Result<(), ConnectorError>;

    fn rollback(&mut self) -> Result<(), ConnectorError>;

    /// Names of the columns of a table, in their ordinal order.
    /// Returns an empty vec if the table does not exist.
    fn table_columns(
        &mut self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<String>, ConnectorError>;

    /// Names of the columns that make the primary key of a table.
    fn primary_key(&mut self, table: &str, schema: Option<&str>)
        -> Result<Vec<String>, ConnectorError>;

    /// Close the session.
    fn close(self) -> Result<(), ConnectorError>
    where
        Self: Sized;
}
