//! Opening and closing of connections.

use crate::api::{Connection, Driver};
use crate::config::ConnectionConfig;
use crate::errors::{ConnectorError, Error};

/// An open connection, owned by whoever opened it.
///
/// The connection is closed by [DatabaseHandle::dispose] or when the handle is dropped,
/// whichever comes first. A closed handle cannot be reopened; every further use
/// fails with [ConnectorError::HandleClosed].
pub struct DatabaseHandle<C: Connection> {
    conn: Option<C>,
}

impl<C: Connection> DatabaseHandle<C> {
    pub fn new(conn: C) -> Self {
        DatabaseHandle { conn: Some(conn) }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn conn(&mut self) -> Result<&mut C, ConnectorError> {
        self.conn.as_mut().ok_or(ConnectorError::HandleClosed)
    }

    /// Close the connection.
    ///
    /// Calling this on a closed handle does nothing. Errors raised while closing
    /// are logged and otherwise ignored, since this usually runs on cleanup paths.
    pub fn dispose(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        match conn.close() {
            Ok(()) => log::info!("connection closed"),
            Err(e) => log::warn!("connection close failed: {e}"),
        }
    }
}

impl<C: Connection> Drop for DatabaseHandle<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Open a connection.
pub fn connect<D: Driver>(
    driver: &D,
    config: &ConnectionConfig,
) -> Result<DatabaseHandle<D::Conn>, Error> {
    log::info!(
        "connecting to {} at {}:{}/{} as {}",
        config.db_type,
        config.host,
        config.port,
        config.database,
        config.user
    );

    let conn = driver.connect(config).map_err(Error::Connection)?;
    Ok(DatabaseHandle::new(conn))
}

/// Check that a connection can be opened. The connection is closed right away.
pub fn test_connection<D: Driver>(driver: &D, config: &ConnectionConfig) -> bool {
    match connect(driver, config) {
        Ok(mut handle) => {
            handle.dispose();
            log::info!("test connection: connection configured successfully");
            true
        }
        Err(e) => {
            log::error!("test connection failed: {e}");
            false
        }
    }
}
