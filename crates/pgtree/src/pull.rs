//! The `pull` walk: bring a directory tree in line with live databases.
//!
//! Leaves are diffed and rewritten file by file. Instance directories first
//! get a subdirectory for every schema that is new on the database side.
//! Every physical directory is visited once, however many symlinks lead to
//! it.

use crate::apply::apply;
use crate::diff::SchemaDiff;
use crate::dir::Dir;
use crate::discover::discover;
use crate::instance::{Connector, Instance};
use crate::report::{Mutation, PullReport};
use crate::target::Target;
use crate::temp_schema::TemporarySchema;
use crate::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use tracing::{debug, error, info};

/// Runs `pull` against instances obtained from a [`Connector`].
pub struct Puller<C> {
    connector: C,
}

impl<C: Connector> Puller<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Pull the tree rooted at `root`.
    pub async fn run(&self, root: impl AsRef<Utf8Path>) -> Result<PullReport> {
        let dir = Dir::open(root)?;
        let mut seen = HashSet::new();
        let mut report = PullReport::default();
        self.pull(&dir, &mut seen, &mut report).await?;
        Ok(report)
    }

    async fn pull(
        &self,
        dir: &Dir,
        seen: &mut HashSet<Utf8PathBuf>,
        report: &mut PullReport,
    ) -> Result<()> {
        seen.insert(dir.canonical_path().to_owned());

        if dir.is_leaf() {
            return self.pull_leaf(dir, report).await;
        }

        let mut subdirs = dir.subdirs()?;
        if dir.is_instance_with_leaf_subdirs(&subdirs) {
            let target = Target::resolve(&self.connector, dir).await?;
            discover(dir, &subdirs, &target, report).await?;
            subdirs = dir.subdirs()?;
        }

        for subdir in &subdirs {
            if seen.contains(subdir.canonical_path()) {
                debug!("Skipping {}: already visited", subdir.path());
                continue;
            }
            Box::pin(self.pull(subdir, seen, report)).await?;
        }

        Ok(())
    }

    async fn pull_leaf(&self, dir: &Dir, report: &mut PullReport) -> Result<()> {
        info!("Updating {}...", dir.path());

        let target = Target::resolve(&self.connector, dir).await?;
        let instance = &*target.instance;
        let schema = target.schema.as_deref().unwrap_or_default();

        let Some(to) = instance.schema(schema).await? else {
            dir.delete()?;
            let mutation = Mutation::DeletedDir {
                path: dir.path().to_owned(),
            };
            info!("    {}", mutation);
            report.push(mutation);
            return Ok(());
        };

        let temp = TemporarySchema::acquire(instance, &target.temp_schema, dir.path()).await?;
        let applied = apply_leaf(dir, &temp, &to, instance, report).await;
        let released = temp.release().await;

        match (applied, released) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(cleanup)) => Err(cleanup),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup)) => {
                error!("{}", cleanup);
                Err(err)
            }
        }
    }
}

async fn apply_leaf<I: Instance>(
    dir: &Dir,
    temp: &TemporarySchema<'_, I>,
    to: &pgtree_db_schema::Schema,
    instance: &I,
    report: &mut PullReport,
) -> Result<()> {
    let from = instance.schema(temp.name()).await?.ok_or_else(|| {
        Error::Introspection(format!("temporary schema {} disappeared", temp.name()))
    })?;

    let diff = SchemaDiff::new(&from, to);
    for table_diff in &diff.table_diffs {
        let mutation = apply(dir.path(), table_diff, to, instance).await?;
        report.push(mutation);
    }
    Ok(())
}
