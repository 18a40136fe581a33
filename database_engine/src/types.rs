use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigurationError;

/// Database flavour. Selects the driver, default port, identifier quoting,
/// placeholder style and the conflict clause of upserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    MySql,
    Postgres,
}

impl DbType {
    pub fn default_port(&self) -> u16 {
        match self {
            DbType::MySql => 3306,
            DbType::Postgres => 5432,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::MySql => "mysql",
            DbType::Postgres => "postgres",
        }
    }
}

impl FromStr for DbType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(DbType::MySql),
            "postgres" | "postgresql" => Ok(DbType::Postgres),
            _ => Err(ConfigurationError::UnknownDbType(s.to_string())),
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment. Picks which set of variables holds the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    /// Prefix of the environment variables for this environment, ie. `DEV` in `DEV_DATABASE_URL`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Environment::Dev => "DEV",
            Environment::Staging => "STAGING",
            Environment::Prod => "PROD",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "staging" | "homo" => Ok(Environment::Staging),
            "prod" => Ok(Environment::Prod),
            _ => Err(ConfigurationError::UnknownEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        })
    }
}

/// What happens when an inserted row collides with an existing key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    /// Plain insert, a conflict is an error.
    #[default]
    Insert,

    /// Insert, or overwrite the non-key columns of the conflicting row.
    Upsert(UpsertOptions),
}

impl Mode {
    pub fn upsert() -> Self {
        Mode::Upsert(UpsertOptions::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Columns that are never overwritten on conflict.
    pub excluded: Vec<String>,
}

/// Table that is the target of an insert.
///
/// `columns` and `key_columns` are looked up in the catalog when not provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Option<Vec<String>>,
    pub key_columns: Option<Vec<String>>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        TableRef {
            name: name.into(),
            schema: None,
            columns: None,
            key_columns: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_key_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// Fully resolved description of a table, valid for a single insert call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<String>,
    pub key_columns: Vec<String>,
}
