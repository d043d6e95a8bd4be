use crate::diff::TableDiff;
use crate::instance::Instance;
use crate::report::{Mutation, WriteReason};
use crate::sqlfile::SqlFile;
use crate::{Error, Result};
use camino::Utf8Path;
use pgtree_db_schema::Schema;
use tracing::{debug, info};

/// Bring the `.sql` file of one table in `dir` in line with `to`.
///
/// Only `<table>.sql` is ever touched. Renames and unsupported tables are
/// refused before anything is written.
pub async fn apply<I: Instance>(
    dir: &Utf8Path,
    diff: &TableDiff,
    to: &Schema,
    instance: &I,
) -> Result<Mutation> {
    match diff {
        TableDiff::Create(table) => {
            let text = instance.show_create_table(&to.name, &table.name).await?;
            write(dir, &table.name, &text, WriteReason::NewTable)
        }
        TableDiff::Drop(table) => {
            SqlFile::delete(dir, &table.name)?;
            let mutation = Mutation::DeletedFile {
                path: SqlFile::path(dir, &table.name),
            };
            info!("    {}", mutation);
            Ok(mutation)
        }
        TableDiff::Alter { table, changes } => {
            for change in changes {
                debug!("{}: {}", table.name, change);
            }
            let text = instance.show_create_table(&to.name, &table.name).await?;
            write(dir, &table.name, &text, WriteReason::Altered)
        }
        TableDiff::Rename { from, to } => Err(Error::RenameUnsupported {
            from: from.clone(),
            to: to.clone(),
        }),
        TableDiff::Unsupported { table, reason } => Err(Error::UnsupportedDiff {
            table: table.clone(),
            reason: reason.clone(),
        }),
    }
}

fn write(dir: &Utf8Path, table: &str, text: &str, reason: WriteReason) -> Result<Mutation> {
    let bytes = SqlFile::write(dir, table, text)?;
    let mutation = Mutation::WroteFile {
        path: SqlFile::path(dir, table),
        bytes,
        reason,
    };
    info!("    {}", mutation);
    Ok(mutation)
}
