//! `pgtree init`: create a checkout from a live database.

use crate::discover::{populate_schema_dir, write_schema_dir};
use crate::instance::{ConnectParams, Connector};
use crate::report::{Mutation, PullReport, WriteReason};
use crate::{Error, Result};
use camino::Utf8Path;
use pgtree_config::{DirConfig, FILE_NAME};
use std::fs;
use tracing::info;

/// Write `config` into `dir` and populate it from the instance it names.
///
/// Without a `schema` in `config`, every live schema becomes a subdirectory
/// and `dir` becomes an instance directory, ready for `pull`. With one,
/// that schema's tables are written into `dir` itself.
pub async fn init<C: Connector>(
    connector: &C,
    dir: &Utf8Path,
    config: &DirConfig,
) -> Result<PullReport> {
    let config_path = dir.join(FILE_NAME);
    let params = ConnectParams::from_config(config)
        .ok_or_else(|| Error::config(&config_path, "no host configured"))?;
    if config_path.exists() {
        return Err(Error::AlreadyExists(dir.to_owned()));
    }

    let instance = connector.connect(&params).await?;
    let mut report = PullReport::default();

    if let Some(schema) = &config.schema {
        report.extend(write_schema_dir(schema, &*instance, dir, config).await?);
        return Ok(report);
    }

    if !dir.is_dir() {
        fs::create_dir_all(dir).map_err(|e| Error::io("create", dir, e))?;
        report.push(Mutation::CreatedDir {
            path: dir.to_owned(),
        });
    }

    let styx = config.to_styx();
    fs::write(&config_path, &styx).map_err(|e| Error::io("write", &config_path, e))?;
    info!("Wrote {} for {}", config_path, params);
    report.push(Mutation::WroteFile {
        path: config_path,
        bytes: styx.len(),
        reason: WriteReason::NewSchema,
    });

    let temp_schema = config.temp_schema();
    for schema in instance.schema_names().await? {
        if schema == temp_schema {
            continue;
        }
        report.extend(populate_schema_dir(&schema, &*instance, dir, true).await?);
    }

    Ok(report)
}
