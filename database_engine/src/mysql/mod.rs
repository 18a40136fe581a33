//! Provides `database_engine` traits for [mysql crate](https://docs.rs/mysql).
//!
//! ```no_run
//! use database_engine::config::ConnectionConfig;
//! use database_engine::mysql::MySqlDriver;
//! use database_engine::types::DbType;
//!
//! let config = ConnectionConfig::new(DbType::MySql, "localhost", "root", "secret", "shop");
//! let handle = database_engine::handle::connect(&MySqlDriver::default(), &config).unwrap();
//! ```

mod types;

use std::time::Duration;

use arrow::record_batch::RecordBatch;
use mysql::prelude::*;
use mysql::{OptsBuilder, Params};

use crate::api::{Connection, Driver};
use crate::config::ConnectionConfig;
use crate::util::value;
use crate::ConnectorError;

/// Opens [mysql::Conn]s.
#[derive(Debug, Clone, Default)]
pub struct MySqlDriver {
    /// Timeout for establishing the TCP connection. Unbounded when `None`.
    pub connect_timeout: Option<Duration>,
}

impl Driver for MySqlDriver {
    type Conn = MySQLConnection<mysql::Conn>;

    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Conn, ConnectorError> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.as_str()))
            .tcp_port(config.port)
            .user(Some(config.user.as_str()))
            .pass(Some(config.password.as_str()))
            .db_name(Some(config.database.as_str()))
            .tcp_connect_timeout(self.connect_timeout);

        let conn = mysql::Conn::new(opts)?;
        Ok(MySQLConnection::new(conn))
    }
}

pub struct MySQLConnection<Q: Queryable> {
    queryable: Q,
    in_transaction: bool,
}

impl<Q: Queryable> MySQLConnection<Q> {
    pub fn new(conn: Q) -> Self {
        MySQLConnection {
            queryable: conn,
            in_transaction: false,
        }
    }

    pub fn unwrap(self) -> Q {
        self.queryable
    }

    pub fn inner_mut(&mut self) -> &mut Q {
        &mut self.queryable
    }
}

impl<Q: Queryable> Connection for MySQLConnection<Q> {
    fn execute(&mut self, sql: &str) -> Result<(), ConnectorError> {
        log::debug!("execute: {sql}");
        self.queryable.query_drop(sql)?;
        Ok(())
    }

    fn execute_many(&mut self, sql: &str, rows: &RecordBatch) -> Result<u64, ConnectorError> {
        if !self.in_transaction {
            self.queryable.query_drop("START TRANSACTION;")?;
            self.in_transaction = true;
        }

        let params = value::rows(rows)
            .map(|row| {
                let row = row?;
                let row: Vec<mysql::Value> = row.into_iter().map(mysql::Value::from).collect();
                Ok(Params::from(row))
            })
            .collect::<Result<Vec<_>, ConnectorError>>()?;

        self.queryable.exec_batch(sql, params)?;
        Ok(rows.num_rows() as u64)
    }

    fn commit(&mut self) -> Result<(), ConnectorError> {
        self.queryable.query_drop("COMMIT;")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ConnectorError> {
        if self.in_transaction {
            self.in_transaction = false;
            self.queryable.query_drop("ROLLBACK;")?;
        }
        Ok(())
    }

    fn table_columns(
        &mut self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<String>, ConnectorError> {
        let columns = self.queryable.exec_map(
            "SELECT COLUMN_NAME FROM information_schema.COLUMNS \
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
            ORDER BY ORDINAL_POSITION",
            (schema, table),
            |(name,): (String,)| name,
        )?;
        Ok(columns)
    }

    fn primary_key(
        &mut self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<String>, ConnectorError> {
        let columns = self.queryable.exec_map(
            "SELECT k.COLUMN_NAME \
            FROM information_schema.TABLE_CONSTRAINTS t \
            JOIN information_schema.KEY_COLUMN_USAGE k \
              USING (CONSTRAINT_NAME, TABLE_SCHEMA, TABLE_NAME) \
            WHERE t.CONSTRAINT_TYPE = 'PRIMARY KEY' \
              AND t.TABLE_SCHEMA = COALESCE(?, DATABASE()) AND t.TABLE_NAME = ? \
            ORDER BY k.ORDINAL_POSITION",
            (schema, table),
            |(name,): (String,)| name,
        )?;
        Ok(columns)
    }

    fn close(self) -> Result<(), ConnectorError> {
        // the session ends when the connection is dropped
        drop(self.queryable);
        Ok(())
    }
}
