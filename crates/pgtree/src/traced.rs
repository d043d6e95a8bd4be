//! Statement logging for the Postgres side of pgtree.
//!
//! Catalog reads and staging batches go through [`TracedConn`], so running
//! with `RUST_LOG=pgtree=debug` shows every statement sent to an instance.

use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Error, Row};
use tracing::Instrument;

/// Borrowed client that opens a `debug` span per statement.
///
/// Staging runs whole `.sql` files through [`TracedConn::batch_execute`];
/// introspection uses the row-returning calls.
///
/// ```ignore
/// use pgtree::ConnectionExt;
///
/// let rows = client
///     .traced()
///     .query("SELECT nspname FROM pg_namespace", &[])
///     .await?;
/// ```
pub struct TracedConn<'a> {
    client: &'a Client,
}

impl<'a> TracedConn<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Send a parameterless batch, such as one staged table definition
    /// wrapped in its transaction.
    pub async fn batch_execute(&self, sql: &str) -> Result<(), Error> {
        let span = tracing::debug_span!("pg.batch", sql = %sql);
        self.client.batch_execute(sql).instrument(span).await
    }

    /// Catalog query; the span records how many rows came back.
    pub async fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Error> {
        let span = catalog_span(sql, params.len());
        let rows = self
            .client
            .query(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", rows.len());
        Ok(rows)
    }

    /// Like [`TracedConn::query`], for lookups expecting zero or one row.
    pub async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Error> {
        let span = catalog_span(sql, params.len());
        let row = self
            .client
            .query_opt(sql, params)
            .instrument(span.clone())
            .await?;
        span.record("rows", usize::from(row.is_some()));
        Ok(row)
    }
}

fn catalog_span(sql: &str, params: usize) -> tracing::Span {
    tracing::debug_span!(
        "pg.catalog",
        sql = %sql,
        params,
        rows = tracing::field::Empty,
    )
}

/// `client.traced()` as shorthand for [`TracedConn::new`].
pub trait ConnectionExt {
    fn traced(&self) -> TracedConn<'_>;
}

impl ConnectionExt for Client {
    fn traced(&self) -> TracedConn<'_> {
        TracedConn::new(self)
    }
}
