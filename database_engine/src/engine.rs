//! Stateful entry point: configure once, connect, insert repeatedly.
//!
//! ```no_run
//! # #[cfg(feature = "src_postgres")]
//! # fn main() -> Result<(), database_engine::Error> {
//! use database_engine::config::{ConfigResolver, EnvVars};
//! use database_engine::engine::DataBaseEngine;
//! use database_engine::postgres::PostgresDriver;
//! use database_engine::types::{DbType, Environment, TableRef};
//! # let batch: database_engine::arrow::record_batch::RecordBatch = unimplemented!();
//!
//! let resolver = ConfigResolver::new(EnvVars::from_process());
//! let engine = DataBaseEngine::from_env(
//!     PostgresDriver::default(),
//!     &resolver,
//!     DbType::Postgres,
//!     Environment::Dev,
//!     "shop",
//!     TableRef::new("orders").with_schema("sales"),
//! )?;
//!
//! let mut conn = engine.connect()?;
//! conn.batch_insert(&batch, 500)?;
//! conn.dispose();
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "src_postgres"))]
//! # fn main() {}
//! ```

use arrow::record_batch::RecordBatch;

use crate::api::Driver;
use crate::config::{ConfigResolver, ConnectionConfig};
use crate::errors::{Error, SchemaError};
use crate::handle::{self, DatabaseHandle};
use crate::insert::{self, BatchSize, InsertOptions, InsertSummary, Progress};
use crate::types::{DbType, Environment, Mode, TableRef};

/// A database configuration together with a default target table.
///
/// Does not hold a connection. Use [DataBaseEngine::connect] to obtain a
/// [ConnectedEngine], which owns one.
pub struct DataBaseEngine<D: Driver> {
    driver: D,
    config: ConnectionConfig,
    table: TableRef,
}

impl<D: Driver> DataBaseEngine<D> {
    pub fn new(driver: D, config: ConnectionConfig, table: TableRef) -> Self {
        DataBaseEngine {
            driver,
            config,
            table,
        }
    }

    /// Resolve the connection config from environment variables.
    ///
    /// The schema of `table` is used as the schema of the connection.
    pub fn from_env(
        driver: D,
        resolver: &ConfigResolver,
        db_type: DbType,
        environment: Environment,
        database: &str,
        table: TableRef,
    ) -> Result<Self, Error> {
        let config = resolver.resolve(db_type, environment, database, table.schema.as_deref())?;
        Ok(Self::new(driver, config, table))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Check that a connection can be opened. Does not keep it open.
    pub fn test_connection(&self) -> bool {
        handle::test_connection(&self.driver, &self.config)
    }

    pub fn connect(&self) -> Result<ConnectedEngine<'_, D>, Error> {
        let handle = handle::connect(&self.driver, &self.config)?;
        Ok(ConnectedEngine {
            engine: self,
            handle,
            table: self.table.clone(),
        })
    }
}

/// An engine with an open connection.
///
/// Table metadata is read anew on every insert, so changes to the table
/// between calls are picked up.
pub struct ConnectedEngine<'e, D: Driver> {
    engine: &'e DataBaseEngine<D>,
    handle: DatabaseHandle<D::Conn>,
    table: TableRef,
}

impl<'e, D: Driver> ConnectedEngine<'e, D> {
    pub fn db_type(&self) -> DbType {
        self.engine.config.db_type
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Change the target table of subsequent inserts.
    ///
    /// Column lists of the previous table are dropped. The schema is kept.
    pub fn set_table(&mut self, name: &str) -> Result<(), SchemaError> {
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        log::info!("table name changed from {} to {name}", self.table.name);

        self.table = TableRef {
            name: name.to_string(),
            schema: self.table.schema.clone(),
            columns: None,
            key_columns: None,
        };
        Ok(())
    }

    /// Replace the target table, including its columns and keys.
    pub fn set_table_ref(&mut self, table: TableRef) -> Result<(), SchemaError> {
        if table.name.trim().is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        self.table = table;
        Ok(())
    }

    pub fn batch_insert(
        &mut self,
        rows: &RecordBatch,
        batch_size: impl Into<BatchSize>,
    ) -> Result<InsertSummary, Error> {
        self.insert_with(rows, &InsertOptions::insert(batch_size), |_| {})
    }

    /// Like [ConnectedEngine::batch_insert], but rows that collide with an existing
    /// key overwrite the existing row.
    pub fn upsert(
        &mut self,
        rows: &RecordBatch,
        batch_size: impl Into<BatchSize>,
    ) -> Result<InsertSummary, Error> {
        self.insert_with(rows, &InsertOptions::upsert(batch_size), |_| {})
    }

    pub fn insert_with<F>(
        &mut self,
        rows: &RecordBatch,
        options: &InsertOptions,
        on_progress: F,
    ) -> Result<InsertSummary, Error>
    where
        F: FnMut(&Progress),
    {
        let target = self.target();
        let db_type = self.db_type();
        insert::batch_insert_with_progress(
            &mut self.handle,
            db_type,
            &target,
            rows,
            options,
            on_progress,
        )
    }

    /// INSERT or UPSERT statement that would be used for the current table.
    pub fn statement(&mut self, mode: &Mode) -> Result<String, Error> {
        let target = self.target();
        let db_type = self.db_type();
        let conn = self.handle.conn().map_err(Error::Connection)?;

        let table = insert::describe_table(conn, &target, mode, None)?;
        Ok(crate::statement::build_insert_statement(
            &table.name,
            table.schema.as_deref(),
            &table.columns,
            &table.key_columns,
            db_type,
            mode,
        )?)
    }

    /// Close the connection. The engine it was opened from can connect again.
    pub fn dispose(mut self) {
        self.handle.dispose();
    }

    fn target(&self) -> TableRef {
        let mut target = self.table.clone();
        if target.schema.is_none() {
            target.schema = self.engine.config.schema.clone();
        }
        target
    }
}
