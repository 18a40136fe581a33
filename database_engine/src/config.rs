//! Resolution of connection parameters from environment variables.
//!
//! Variables are read from an [EnvVars] snapshot instead of the live process
//! environment, so a resolver always sees the same values.
//!
//! For environment `dev` the following variables are looked up:
//!
//! | variable            | fallback        |                                        |
//! |---------------------|-----------------|----------------------------------------|
//! | `DEV_DATABASE_URL`  | `DATABASE_URL`  | host, `host:port` or `mysql://host:port` |
//! | `DEV_DATABASE_USER` | `DATABASE_USER` |                                        |
//! | `DEV_DATABASE_PASS` | `DATABASE_PASS` |                                        |
//! | `DEV_DATABASE_PORT` | `DATABASE_PORT` | optional                               |

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::errors::ConfigurationError;
use crate::types::{DbType, Environment};

const VAR_URL: &str = "DATABASE_URL";
const VAR_USER: &str = "DATABASE_USER";
const VAR_PASS: &str = "DATABASE_PASS";
const VAR_PORT: &str = "DATABASE_PORT";

const DEFAULT_POSTGRES_SCHEMA: &str = "public";

/// Snapshot of environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvVars {
    vars: HashMap<String, String>,
}

impl EnvVars {
    /// Capture the variables of the current process.
    pub fn from_process() -> Self {
        std::env::vars().collect()
    }

    /// Value of a variable. Empty values count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvVars {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        EnvVars {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parameters needed to open a connection.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub db_type: DbType,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub port: u16,
    pub schema: Option<String>,
}

impl ConnectionConfig {
    pub fn new(
        db_type: DbType,
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        ConnectionConfig {
            db_type,
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            port: db_type.default_port(),
            schema: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Builds [ConnectionConfig]s from an [EnvVars] snapshot.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    env: EnvVars,
}

impl ConfigResolver {
    pub fn new(env: EnvVars) -> Self {
        ConfigResolver { env }
    }

    pub fn resolve(
        &self,
        db_type: DbType,
        environment: Environment,
        database: &str,
        schema: Option<&str>,
    ) -> Result<ConnectionConfig, ConfigurationError> {
        let (url_var, url) = self.require(environment, VAR_URL)?;
        let (_, user) = self.require(environment, VAR_USER)?;
        let (_, password) = self.require(environment, VAR_PASS)?;

        if database.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                name: "database".to_string(),
            });
        }

        let (host, url_port) = parse_host(&url_var, url)?;

        let port = match self.lookup(environment, VAR_PORT) {
            Some((name, value)) => parse_port(&name, value)?,
            None => url_port.unwrap_or_else(|| db_type.default_port()),
        };

        let schema = match (schema, db_type) {
            (Some(s), _) if !s.is_empty() => Some(s.to_string()),
            (_, DbType::Postgres) => Some(DEFAULT_POSTGRES_SCHEMA.to_string()),
            (_, DbType::MySql) => None,
        };

        log::debug!("resolved {db_type} connection for {environment} from {url_var}");

        Ok(ConnectionConfig {
            db_type,
            host,
            user: user.to_string(),
            password: password.to_string(),
            database: database.to_string(),
            port,
            schema,
        })
    }

    /// Look up `{PREFIX}_{key}`, falling back to plain `{key}`.
    fn lookup(&self, environment: Environment, key: &str) -> Option<(String, &str)> {
        let prefixed = format!("{}_{key}", environment.prefix());
        if let Some(value) = self.env.get(&prefixed) {
            return Some((prefixed, value));
        }
        self.env.get(key).map(|value| (key.to_string(), value))
    }

    fn require(
        &self,
        environment: Environment,
        key: &str,
    ) -> Result<(String, &str), ConfigurationError> {
        self.lookup(environment, key)
            .ok_or_else(|| ConfigurationError::Missing {
                name: format!("{}_{key}", environment.prefix()),
            })
    }
}

fn parse_host(name: &str, value: &str) -> Result<(String, Option<u16>), ConfigurationError> {
    let value = value.trim();

    if value.contains("://") {
        let url = Url::parse(value).map_err(|reason| ConfigurationError::InvalidUrl {
            name: name.to_string(),
            reason,
        })?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigurationError::InvalidUrl {
                name: name.to_string(),
                reason: url::ParseError::EmptyHost,
            })?;
        return Ok((host.to_string(), url.port()));
    }

    match value.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Ok((host.to_string(), Some(parse_port(name, port)?))),
        Some(_) => Err(ConfigurationError::Missing {
            name: name.to_string(),
        }),
        None => Ok((value.to_string(), None)),
    }
}

fn parse_port(name: &str, value: &str) -> Result<u16, ConfigurationError> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigurationError::InvalidPort {
            name: name.to_string(),
            value: value.to_string(),
        })
}
