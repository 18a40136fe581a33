//! In-memory driver that records everything that is sent to it.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;

use database_engine::api::{Connection, Driver};
use database_engine::arrow::record_batch::RecordBatch;
use database_engine::config::ConnectionConfig;
use database_engine::util::{value, Value};
use database_engine::ConnectorError;

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub columns: Vec<String>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub tables: HashMap<String, FakeTable>,

    pub fail_connect: bool,
    pub fail_close: bool,
    /// 1-based index of the `execute_many` call (per connection) that fails.
    pub fail_on_chunk: Option<usize>,
    /// 1-based index of the chunk whose commit fails.
    pub fail_commit_on_chunk: Option<usize>,

    /// Number of connections opened so far.
    pub opened: usize,
    /// Number of connections currently open.
    pub open: usize,

    pub attempts: usize,
    pub committed: Vec<Executed>,
    pub rollbacks: usize,
    pub introspections: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Rc<RefCell<FakeState>>,
}

impl FakeDriver {
    pub fn with_table(self, name: &str, columns: &[&str], primary_key: &[&str]) -> Self {
        self.state_mut().tables.insert(
            name.to_string(),
            FakeTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
            },
        );
        self
    }

    pub fn fail_on_chunk(self, chunk: usize) -> Self {
        self.state_mut().fail_on_chunk = Some(chunk);
        self
    }

    pub fn fail_commit_on_chunk(self, chunk: usize) -> Self {
        self.state_mut().fail_commit_on_chunk = Some(chunk);
        self
    }

    pub fn fail_connect(self) -> Self {
        self.state_mut().fail_connect = true;
        self
    }

    pub fn fail_close(self) -> Self {
        self.state_mut().fail_close = true;
        self
    }

    pub fn state(&self) -> Ref<'_, FakeState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, FakeState> {
        self.state.borrow_mut()
    }

    /// Number of rows in each committed chunk.
    pub fn committed_chunks(&self) -> Vec<usize> {
        self.state().committed.iter().map(|e| e.rows.len()).collect()
    }
}

impl Driver for FakeDriver {
    type Conn = FakeConnection;

    fn connect(&self, _config: &ConnectionConfig) -> Result<Self::Conn, ConnectorError> {
        let mut state = self.state_mut();
        if state.fail_connect {
            return Err(ConnectorError::Driver("connection refused".into()));
        }
        state.opened += 1;
        state.open += 1;

        Ok(FakeConnection {
            state: self.state.clone(),
            pending: Vec::new(),
            chunks: 0,
        })
    }
}

pub struct FakeConnection {
    state: Rc<RefCell<FakeState>>,
    pending: Vec<Executed>,
    chunks: usize,
}

impl Connection for FakeConnection {
    fn execute(&mut self, sql: &str) -> Result<(), ConnectorError> {
        self.pending.push(Executed {
            sql: sql.to_string(),
            rows: Vec::new(),
        });
        Ok(())
    }

    fn execute_many(&mut self, sql: &str, rows: &RecordBatch) -> Result<u64, ConnectorError> {
        self.chunks += 1;
        let mut state = self.state.borrow_mut();
        state.attempts += 1;

        if state.fail_on_chunk == Some(self.chunks) {
            return Err(ConnectorError::Driver("duplicate key".into()));
        }

        let rows = value::rows(rows).collect::<Result<Vec<_>, _>>()?;
        let affected = rows.len() as u64;
        self.pending.push(Executed {
            sql: sql.to_string(),
            rows,
        });
        Ok(affected)
    }

    fn commit(&mut self) -> Result<(), ConnectorError> {
        let mut state = self.state.borrow_mut();
        if state.fail_commit_on_chunk == Some(self.chunks) {
            return Err(ConnectorError::Driver("lock wait timeout".into()));
        }
        state.committed.append(&mut self.pending);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), ConnectorError> {
        self.pending.clear();
        self.state.borrow_mut().rollbacks += 1;
        Ok(())
    }

    fn table_columns(
        &mut self,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<String>, ConnectorError> {
        let mut state = self.state.borrow_mut();
        state.introspections += 1;
        Ok(state
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    fn primary_key(
        &mut self,
        table: &str,
        _schema: Option<&str>,
    ) -> Result<Vec<String>, ConnectorError> {
        let state = self.state.borrow();
        Ok(state
            .tables
            .get(table)
            .map(|t| t.primary_key.clone())
            .unwrap_or_default())
    }

    fn close(self) -> Result<(), ConnectorError> {
        let mut state = self.state.borrow_mut();
        state.open -= 1;
        if state.fail_close {
            return Err(ConnectorError::Driver("broken pipe".into()));
        }
        Ok(())
    }
}
