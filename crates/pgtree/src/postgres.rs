//! [`Instance`] and [`Connector`] backed by `tokio-postgres`.

use crate::instance::{ConnectParams, Connector, Instance};
use crate::introspect;
use crate::traced::ConnectionExt;
use crate::{Error, Result};
use pgtree_db_schema::{Schema, quote_ident, table_definition_sql};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, warn};

/// Connects to Postgres, at most once per set of connection parameters.
#[derive(Default)]
pub struct PgConnector {
    instances: Mutex<HashMap<String, Arc<PgInstance>>>,
}

impl PgConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connector for PgConnector {
    type Instance = PgInstance;

    async fn connect(&self, params: &ConnectParams) -> Result<Arc<PgInstance>> {
        let mut instances = self.instances.lock().await;
        let key = params.key();
        if let Some(instance) = instances.get(&key) {
            return Ok(instance.clone());
        }

        debug!("Connecting to {}", params);
        let mut config = tokio_postgres::Config::new();
        config.host(&params.host).port(params.port);
        if let Some(user) = &params.user {
            config.user(user);
        }
        if let Some(password) = &params.password {
            config.password(password);
        }
        if let Some(database) = &params.database {
            config.dbname(database);
        }

        let (client, connection) = config.connect(NoTls).await?;

        // Spawn connection handler
        let name = params.to_string();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("Database connection to {} failed: {}", name, e);
            }
        });

        let instance = Arc::new(PgInstance {
            name: params.to_string(),
            client,
        });
        instances.insert(key, instance.clone());
        Ok(instance)
    }
}

/// A connected Postgres database.
pub struct PgInstance {
    name: String,
    client: Client,
}

impl Instance for PgInstance {
    fn name(&self) -> &str {
        &self.name
    }

    async fn schema_names(&self) -> Result<Vec<String>> {
        introspect::schema_names(&self.client).await
    }

    async fn schema(&self, name: &str) -> Result<Option<Schema>> {
        introspect::load_schema(&self.client, name).await
    }

    async fn show_create_table(&self, schema: &str, table: &str) -> Result<String> {
        let Some(table) = introspect::load_table(&self.client, schema, table).await? else {
            return Err(Error::Introspection(format!(
                "table {}.{} does not exist",
                schema, table
            )));
        };
        if let Some(reason) = &table.unsupported {
            return Err(Error::UnsupportedDiff {
                table: table.name.clone(),
                reason: reason.clone(),
            });
        }
        Ok(table_definition_sql(&table))
    }

    async fn create_schema(&self, name: &str) -> Result<()> {
        let sql = format!("CREATE SCHEMA {}", quote_ident(name));
        self.client.traced().batch_execute(&sql).await?;
        Ok(())
    }

    async fn drop_schema(&self, name: &str) -> Result<()> {
        let sql = format!("DROP SCHEMA IF EXISTS {} CASCADE", quote_ident(name));
        self.client.traced().batch_execute(&sql).await?;
        Ok(())
    }

    async fn execute_in_schema(&self, schema: &str, sql: &str) -> Result<()> {
        let conn = self.client.traced();
        let batch = format!(
            "BEGIN;\nSET LOCAL search_path TO {};\n{}\n;\nCOMMIT;",
            quote_ident(schema),
            sql
        );
        if let Err(e) = conn.batch_execute(&batch).await {
            // The failed statement leaves the session inside an aborted transaction
            if let Err(rollback) = conn.batch_execute("ROLLBACK").await {
                warn!("ROLLBACK on {} failed: {}", self.name, rollback);
            }
            return Err(e.into());
        }
        Ok(())
    }
}
