//! Configuration-driven batch inserts of Apache Arrow data into MySQL and PostgreSQL.
//!
//! The drivers this crate talks to are described in [api] module.
//!
//! Capabilities:
//! - **Configuration**: Resolve connection parameters from per-environment variables.
//! - **Connections**: Open, test and deterministically close driver connections.
//! - **Statements**: Build INSERT and UPSERT statements from table metadata.
//! - **Batch insert**: Write [arrow::record_batch::RecordBatch] into tables, in committed chunks.
//!
//! There are two ways in. The [engine] holds a configuration and a target table
//! and hands out connected engines. The [functional] module opens a connection
//! for every call and closes it before returning.
//!
//! ```no_run
//! # #[cfg(feature = "src_mysql")]
//! # fn main() -> Result<(), database_engine::Error> {
//! use database_engine::config::ConnectionConfig;
//! use database_engine::functional;
//! use database_engine::mysql::MySqlDriver;
//! use database_engine::types::{DbType, TableRef};
//! # let batch: database_engine::arrow::record_batch::RecordBatch = unimplemented!();
//!
//! let config = ConnectionConfig::new(DbType::MySql, "localhost", "root", "secret", "shop");
//!
//! let summary = functional::batch_insert(
//!     &batch,
//!     &MySqlDriver::default(),
//!     &config,
//!     &TableRef::new("orders"),
//!     None,
//! )?;
//! log::info!("inserted {} rows in {} chunks", summary.rows, summary.chunks);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "src_mysql"))]
//! # fn main() {}
//! ```
//!
//! ## Transitive dependency on arrow
//!
//! If you depend on `database_engine`, it is recommended not to depend on `arrow`
//! directly, but use re-export from this crate instead.
//!
//! ```
//! use database_engine::arrow;
//! ```

pub mod api;
pub mod config;
pub mod engine;
mod errors;
pub mod functional;
pub mod handle;
pub mod insert;
pub mod statement;
pub mod types;
pub mod util;

#[cfg(feature = "src_mysql")]
pub mod mysql;
#[cfg(feature = "src_postgres")]
pub mod postgres;

pub use arrow;
pub use errors::*;
