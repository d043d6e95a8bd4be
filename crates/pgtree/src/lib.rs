//! Keep a directory tree of `CREATE TABLE` files in sync with live Postgres
//! databases.
//!
//! # Layout
//!
//! A checkout is a tree of directories, each optionally carrying a
//! `.pgtree.styx` file:
//!
//! ```text
//! shop/                 .pgtree.styx: host "db.internal" database "shop"
//! ├── billing/          .pgtree.styx: schema "billing"
//! │   ├── invoice.sql
//! │   └── payment.sql
//! └── public/           .pgtree.styx: schema "public"
//!     └── orders.sql
//! ```
//!
//! A directory naming a `schema` is a *leaf*: it holds one file per table,
//! each containing that table's canonical definition. A directory naming a
//! `host` describes an *instance*.
//!
//! # Pulling
//!
//! [`Puller::run`] walks the tree and writes changes made directly in the
//! database back to disk:
//!
//! ```ignore
//! let puller = Puller::new(PgConnector::new());
//! let report = puller.run("shop").await?;
//! for mutation in report.iter() {
//!     println!("{}", mutation);
//! }
//! ```
//!
//! At each leaf the `.sql` files are staged into a temporary schema, the
//! staged copy is diffed against the live schema, and every differing table
//! has its file rewritten or deleted. Leaves whose schema was dropped are
//! deleted; schemas that appeared on an instance get a new directory.

mod apply;
mod diff;
mod dir;
mod discover;
mod error;
mod init;
mod instance;
mod introspect;
mod postgres;
mod pull;
mod report;
mod sqlfile;
mod target;
mod temp_schema;
mod traced;

pub use apply::apply;
pub use diff::{Change, SchemaDiff, TableDiff};
pub use dir::Dir;
pub use discover::{discover, populate_schema_dir};
pub use error::Error;
pub use init::init;
pub use instance::{ConnectParams, Connector, DEFAULT_PORT, Instance};
pub use postgres::{PgConnector, PgInstance};
pub use pull::Puller;
pub use report::{Mutation, PullReport, WriteReason};
pub use sqlfile::{SqlFile, sql_files};
pub use target::Target;
pub use temp_schema::TemporarySchema;
pub use traced::{ConnectionExt, TracedConn};

// Re-export the building blocks callers need to implement `Instance`
pub use pgtree_config::{self, DirConfig};
pub use pgtree_db_schema::{self, Schema, Table, table_definition_sql};

pub type Result<T> = std::result::Result<T, Error>;
