//! Provides `database_engine` traits for [postgres crate](https://docs.rs/postgres).
//!
//! ```no_run
//! use database_engine::config::ConnectionConfig;
//! use database_engine::postgres::PostgresDriver;
//! use database_engine::types::DbType;
//!
//! let config = ConnectionConfig::new(DbType::Postgres, "localhost", "postgres", "secret", "shop")
//!     .with_schema("sales");
//! let handle = database_engine::handle::connect(&PostgresDriver::default(), &config).unwrap();
//! ```

mod types;

use std::time::Duration;

use arrow::record_batch::RecordBatch;
use postgres::types::ToSql;
use postgres::{Client, NoTls};

use crate::api::{Connection, Driver};
use crate::config::ConnectionConfig;
use crate::util::escape::escaped_ident;
use crate::util::value;
use crate::ConnectorError;

/// Opens [postgres::Client]s without TLS.
///
/// When the config names a schema, it is set as the `search_path` of the session.
#[derive(Debug, Clone, Default)]
pub struct PostgresDriver {
    pub connect_timeout: Option<Duration>,
}

impl Driver for PostgresDriver {
    type Conn = PostgresConnection;

    fn connect(&self, config: &ConnectionConfig) -> Result<Self::Conn, ConnectorError> {
        let mut pg = postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .user(&config.user)
            .password(&config.password)
            .dbname(&config.database);
        if let Some(timeout) = self.connect_timeout {
            pg.connect_timeout(timeout);
        }

        let client = pg.connect(NoTls)?;
        let mut conn = PostgresConnection::new(client);

        if let Some(schema) = &config.schema {
            conn.execute(&format!("SET search_path TO {}", escaped_ident(schema)))?;
        }
        Ok(conn)
    }
}

pub struct PostgresConnection {
    client: Client,
    in_transaction: bool,
}

impl PostgresConnection {
    pub fn new(client: Client) -> Self {
        PostgresConnection {
            client,
            in_transaction: false,
        }
    }

    pub fn unwrap(self) -> Client {
        self.client
    }

    pub fn inner_mut(&mut self) -> &mut Client {
        &mut self.client
    }
}

impl Connection for PostgresConnection {
    fn execute(&mut self, sql: &str) -> Result<(), ConnectorError> {
        log::debug!("execute: {sql}");
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn execute_many(&mut self, sql: &str, rows: &RecordBatch) -> Result<u64, ConnectorError> {
        if !self.in_transaction {
            self.client.batch_execute("BEGIN")?;
            self.in_transaction = true;
        }

        let stmt = self.client.prepare(sql)?;

        let mut affected = 0;
        for row in value::rows(rows) {
            let row = row?;
            let params: Vec<&(dyn ToSql + Sync)> =
                row.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
            affected += self.client.execute(&stmt, &params)?;
        }
        Ok(affected)
    }

    fn commit(&mut self) -> Result<(), ConnectorError> {
        self.client.batch_execute("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ConnectorError> {
        if self.in_transaction {
            self.in_transaction = false;
            self.client.batch_execute("ROLLBACK")?;
        }
        Ok(())
    }

    fn table_columns(
        &mut self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<String>, ConnectorError> {
        let rows = self.client.query(
            "SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema::text = COALESCE($1, current_schema()::text)
              AND table_name::text = $2
            ORDER BY ordinal_position",
            &[&schema, &table],
        )?;
        Ok(rows.into_iter().map(|r| r.get(0)).collect())
    }

    fn primary_key(
        &mut self,
        table: &str,
        schema: Option<&str>,
    ) -> Result<Vec<String>, ConnectorError> {
        let rows = self.client.query(
            "SELECT kcu.column_name::text
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
             AND tc.table_schema = kcu.table_schema
             AND tc.table_name = kcu.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema::text = COALESCE($1, current_schema()::text)
              AND tc.table_name::text = $2
            ORDER BY kcu.ordinal_position",
            &[&schema, &table],
        )?;
        Ok(rows.into_iter().map(|r| r.get(0)).collect())
    }

    fn close(self) -> Result<(), ConnectorError> {
        self.client.close()?;
        Ok(())
    }
}
