//! Creating directories for schemas that only exist in the database.

use crate::dir::Dir;
use crate::instance::Instance;
use crate::report::{Mutation, PullReport, WriteReason};
use crate::sqlfile::{SqlFile, check_name};
use crate::target::Target;
use crate::{Error, Result};
use camino::Utf8Path;
use pgtree_config::{DirConfig, FILE_NAME};
use std::collections::HashSet;
use std::fs;
use tracing::info;

/// Populate a subdirectory of `dir` for every live schema none of `subdirs`
/// declares.
///
/// Schemas populated before a failure are left in place.
pub async fn discover<I: Instance>(
    dir: &Dir,
    subdirs: &[Dir],
    target: &Target<I>,
    report: &mut PullReport,
) -> Result<()> {
    let known: HashSet<&str> = subdirs
        .iter()
        .filter_map(|d| d.own_config().schema.as_deref())
        .collect();

    for schema in target.schema_names().await? {
        if known.contains(schema.as_str()) {
            continue;
        }
        let mutations = populate_schema_dir(&schema, &*target.instance, dir.path(), true).await?;
        report.extend(mutations);
    }

    Ok(())
}

/// Write the directory for `schema`: a `.pgtree.styx` naming it, plus one
/// `<table>.sql` per table.
///
/// With `as_subdir` the directory is `parent/<schema>`, created if needed;
/// otherwise `parent` itself is used. Fails with [`Error::AlreadyExists`] if
/// the directory already has a config file.
pub async fn populate_schema_dir<I: Instance>(
    schema: &str,
    instance: &I,
    parent: &Utf8Path,
    as_subdir: bool,
) -> Result<Vec<Mutation>> {
    let dir = if as_subdir {
        check_name("schema", schema)?;
        parent.join(schema)
    } else {
        parent.to_owned()
    };

    write_schema_dir(schema, instance, &dir, &DirConfig::for_schema(schema)).await
}

/// Populate `dir` with the tables of `schema`, writing `config` as its
/// `.pgtree.styx`.
pub(crate) async fn write_schema_dir<I: Instance>(
    schema: &str,
    instance: &I,
    dir: &Utf8Path,
    config: &DirConfig,
) -> Result<Vec<Mutation>> {
    let config_path = dir.join(FILE_NAME);
    if config_path.exists() {
        return Err(Error::AlreadyExists(dir.to_owned()));
    }

    let Some(live) = instance.schema(schema).await? else {
        return Err(Error::Introspection(format!(
            "schema {} does not exist on {}",
            schema,
            instance.name()
        )));
    };

    info!("Populating {}...", dir);
    let mut mutations = Vec::new();

    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(|e| Error::io("create", dir, e))?;
        mutations.push(Mutation::CreatedDir {
            path: dir.to_owned(),
        });
    }

    let config = config.to_styx();
    fs::write(&config_path, &config).map_err(|e| Error::io("write", &config_path, e))?;
    mutations.push(Mutation::WroteFile {
        path: config_path,
        bytes: config.len(),
        reason: WriteReason::NewSchema,
    });

    for table in live.iter_tables() {
        let text = instance.show_create_table(schema, &table.name).await?;
        let bytes = SqlFile::write(dir, &table.name, &text)?;
        let mutation = Mutation::WroteFile {
            path: SqlFile::path(dir, &table.name),
            bytes,
            reason: WriteReason::NewTable,
        };
        info!("    {}", mutation);
        mutations.push(mutation);
    }

    Ok(mutations)
}
