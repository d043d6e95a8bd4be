//! Directories of a pgtree checkout and the configuration bound to them.

use crate::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use pgtree_config::{DirConfig, FILE_NAME};
use std::fs;

/// A directory together with its own and effective configuration.
#[derive(Debug, Clone)]
pub struct Dir {
    path: Utf8PathBuf,
    canonical: Utf8PathBuf,
    own: DirConfig,
    config: DirConfig,
}

impl Dir {
    /// Open `path`, inheriting configuration from its ancestors.
    ///
    /// Ancestors are read up to the nearest one containing `.git`, or up to
    /// the filesystem root.
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Dir> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize_utf8()
            .map_err(|e| Error::io("resolve", path, e))?;

        let mut ancestors = Vec::new();
        for ancestor in canonical.ancestors().skip(1) {
            ancestors.push(ancestor);
            if ancestor.join(".git").exists() {
                break;
            }
        }

        let mut inherited = DirConfig::default();
        for ancestor in ancestors.into_iter().rev() {
            let own = read_config(ancestor)?;
            inherited = DirConfig::inherit(&inherited, &own);
        }

        Self::with_parent_config(path.to_owned(), canonical, &inherited)
    }

    fn with_parent_config(
        path: Utf8PathBuf,
        canonical: Utf8PathBuf,
        parent: &DirConfig,
    ) -> Result<Dir> {
        let own = read_config(&path)?;
        let config = DirConfig::inherit(parent, &own);
        Ok(Dir {
            path,
            canonical,
            own,
            config,
        })
    }

    /// Open a subdirectory, inheriting this directory's effective config.
    pub fn child(&self, name: &str) -> Result<Dir> {
        let path = self.path.join(name);
        let canonical = path
            .canonicalize_utf8()
            .map_err(|e| Error::io("resolve", &path, e))?;
        Self::with_parent_config(path, canonical, &self.config)
    }

    /// The path this directory was reached through.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The symlink-free absolute path, unique per physical directory.
    pub fn canonical_path(&self) -> &Utf8Path {
        &self.canonical
    }

    /// Contents of this directory's own `.pgtree.styx` (empty if none).
    pub fn own_config(&self) -> &DirConfig {
        &self.own
    }

    /// Own config overlaid on the parent's effective config.
    pub fn config(&self) -> &DirConfig {
        &self.config
    }

    pub fn config_path(&self) -> Utf8PathBuf {
        self.path.join(FILE_NAME)
    }

    /// Immediate subdirectories, sorted by name. Hidden entries are skipped;
    /// symlinks to directories are followed.
    pub fn subdirs(&self) -> Result<Vec<Dir>> {
        let entries = self
            .path
            .read_dir_utf8()
            .map_err(|e| Error::io("list", &self.path, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io("list", &self.path, e))?;
            if entry.file_name().starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            names.push(entry.file_name().to_string());
        }
        names.sort();

        names.iter().map(|name| self.child(name)).collect()
    }

    /// A leaf mirrors exactly one schema.
    pub fn is_leaf(&self) -> bool {
        self.config.schema.is_some()
    }

    /// An instance directory whose subdirectories each mirror one schema.
    ///
    /// The directory itself names a host, does not name a schema, and every
    /// subdirectory declares its own `schema`.
    pub fn is_instance_with_leaf_subdirs(&self, subdirs: &[Dir]) -> bool {
        self.own.has_instance()
            && self.config.schema.is_none()
            && subdirs.iter().all(|d| d.own.schema.is_some())
    }

    /// Remove the directory and everything below it.
    ///
    /// The physical directory is removed, so a directory reached through a
    /// symlink does not survive under its real name. The link itself goes too.
    pub fn delete(&self) -> Result<()> {
        fs::remove_dir_all(&self.canonical).map_err(|e| Error::io("delete", &self.path, e))?;
        let is_link = fs::symlink_metadata(&self.path)
            .map(|meta| meta.file_type().is_symlink())
            .unwrap_or(false);
        if is_link {
            fs::remove_file(&self.path).map_err(|e| Error::io("delete", &self.path, e))?;
        }
        Ok(())
    }
}

fn read_config(dir: &Utf8Path) -> Result<DirConfig> {
    let path = dir.join(FILE_NAME);
    if !path.is_file() {
        return Ok(DirConfig::default());
    }
    let content = fs::read_to_string(&path).map_err(|e| Error::io("read", &path, e))?;
    facet_styx::from_str(&content).map_err(|e| Error::config(&path, e.to_string()))
}
