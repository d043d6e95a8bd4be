//! The database seams: an [`Instance`] is one live database, a [`Connector`]
//! hands out instances for connection parameters.
//!
//! `pull` only talks to the database through these traits. The Postgres
//! implementation lives in [`crate::postgres`].

use crate::Result;
use pgtree_config::DirConfig;
use pgtree_db_schema::Schema;
use std::fmt;
use std::sync::Arc;

/// Port used when the configuration does not set one.
pub const DEFAULT_PORT: u16 = 5432;

/// One live database.
#[allow(async_fn_in_trait)]
pub trait Instance {
    /// Human-readable name, for log lines.
    fn name(&self) -> &str;

    /// Every non-system schema, in a stable order.
    async fn schema_names(&self) -> Result<Vec<String>>;

    /// Snapshot of a schema, `None` if it does not exist.
    async fn schema(&self, name: &str) -> Result<Option<Schema>>;

    /// Canonical definition text of one table.
    async fn show_create_table(&self, schema: &str, table: &str) -> Result<String>;

    /// Create an empty schema.
    async fn create_schema(&self, name: &str) -> Result<()>;

    /// Drop a schema and everything in it. Dropping a missing schema is not
    /// an error.
    async fn drop_schema(&self, name: &str) -> Result<()>;

    /// Run `sql` with `schema` as the only schema on the search path.
    /// Either every statement applies or none does.
    async fn execute_in_schema(&self, schema: &str, sql: &str) -> Result<()>;
}

/// Opens (and caches) instances.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Instance: Instance;

    /// Connect to the instance `params` describes. Connecting twice with the
    /// same parameters returns the same instance.
    async fn connect(&self, params: &ConnectParams) -> Result<Arc<Self::Instance>>;
}

/// Everything needed to reach one database.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ConnectParams {
    /// Connection parameters from an effective directory config.
    ///
    /// Returns `None` when no `host` is configured. The password falls back
    /// to `PGPASSWORD`.
    pub fn from_config(config: &DirConfig) -> Option<ConnectParams> {
        let host = config.host.clone()?;
        Some(ConnectParams {
            host,
            port: config.port.unwrap_or(DEFAULT_PORT),
            user: config.user.clone(),
            password: config
                .password
                .clone()
                .or_else(|| std::env::var("PGPASSWORD").ok()),
            database: config.database.clone(),
        })
    }

    /// Cache key: everything except the password.
    pub fn key(&self) -> String {
        format!(
            "host={} port={} user={} dbname={}",
            self.host,
            self.port,
            self.user.as_deref().unwrap_or(""),
            self.database.as_deref().unwrap_or("")
        )
    }
}

impl fmt::Display for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        write!(f, "{}:{}", self.host, self.port)?;
        if let Some(db) = &self.database {
            write!(f, "/{}", db)?;
        }
        Ok(())
    }
}

// Keeps the password out of logs.
impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_host() {
        assert!(ConnectParams::from_config(&DirConfig::for_schema("app")).is_none());
    }

    #[test]
    fn test_from_config_defaults_port() {
        let config = DirConfig {
            host: Some("db".to_string()),
            user: Some("admin".to_string()),
            password: Some("hunter2".to_string()),
            database: Some("shop".to_string()),
            ..Default::default()
        };
        let params = ConnectParams::from_config(&config).unwrap();
        assert_eq!(params.port, 5432);
        assert_eq!(params.to_string(), "admin@db:5432/shop");
        assert_eq!(params.key(), "host=db port=5432 user=admin dbname=shop");
        assert!(!format!("{:?}", params).contains("hunter2"));
    }
}
