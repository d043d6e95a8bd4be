//! Scratch schema the on-disk definitions are staged into.

use crate::instance::Instance;
use crate::sqlfile::{SqlFile, sql_files};
use crate::{Error, Result};
use camino::Utf8Path;
use tracing::{debug, error, warn};

/// A staged copy of a leaf directory's `.sql` files.
///
/// Must be given back with [`TemporarySchema::release`]. Dropping the guard
/// without releasing it only logs a warning; the schema is then cleared by
/// the next acquisition.
pub struct TemporarySchema<'a, I: Instance> {
    instance: &'a I,
    name: String,
    released: bool,
}

impl<'a, I: Instance> TemporarySchema<'a, I> {
    /// Recreate schema `name` and apply every `*.sql` file in `dir` into it.
    ///
    /// Files are applied in file name order. Files failing on a pass are
    /// retried on the next one, as long as each pass applies at least one
    /// more file; foreign keys may reference tables that come later.
    pub async fn acquire(instance: &'a I, name: &str, dir: &Utf8Path) -> Result<Self> {
        instance.drop_schema(name).await?;
        instance.create_schema(name).await?;
        let guard = TemporarySchema {
            instance,
            name: name.to_string(),
            released: false,
        };

        match stage(instance, name, dir).await {
            Ok(()) => Ok(guard),
            Err(err) => {
                if let Err(cleanup) = guard.release().await {
                    error!("{}", cleanup);
                }
                Err(err)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drop the schema. A failure comes back as [`Error::Cleanup`].
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        debug!("Dropping temporary schema {}", self.name);
        self.instance
            .drop_schema(&self.name)
            .await
            .map_err(|e| Error::Cleanup {
                schema: self.name.clone(),
                source: Box::new(e),
            })
    }
}

impl<I: Instance> Drop for TemporarySchema<'_, I> {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                "Temporary schema {} on {} was not released",
                self.name,
                self.instance.name()
            );
        }
    }
}

async fn stage<I: Instance>(instance: &I, schema: &str, dir: &Utf8Path) -> Result<()> {
    let mut pending: Vec<SqlFile> = sql_files(dir)?;

    while !pending.is_empty() {
        let before = pending.len();
        let mut failed = Vec::new();
        let mut first_error = None;

        for file in pending {
            match instance.execute_in_schema(schema, &file.contents).await {
                Ok(()) => debug!("Staged {}", file.path),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some((file.path.clone(), e.to_string()));
                    }
                    failed.push(file);
                }
            }
        }

        if failed.len() == before
            && let Some((file, message)) = first_error
        {
            return Err(Error::Staging { file, message });
        }
        pending = failed;
    }

    Ok(())
}
