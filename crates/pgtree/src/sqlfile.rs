//! `<table>.sql` files: one canonical `CREATE TABLE` per file.

use crate::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Extension of table definition files.
pub const EXTENSION: &str = "sql";

/// Refuse database names that would not stay a single path component:
/// separators, `.`/`..`, NUL, or nothing at all.
pub fn check_name(kind: &'static str, name: &str) -> Result<()> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if unsafe_name {
        return Err(Error::UnsafeName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// A table definition file read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFile {
    pub path: Utf8PathBuf,
    /// Table name, from the file stem
    pub table: String,
    pub contents: String,
}

impl SqlFile {
    /// Path of the file holding `table` inside `dir`.
    pub fn path(dir: &Utf8Path, table: &str) -> Utf8PathBuf {
        dir.join(format!("{}.{}", table, EXTENSION))
    }

    /// Create or truncate the file for `table`, returning the bytes written.
    pub fn write(dir: &Utf8Path, table: &str, contents: &str) -> Result<usize> {
        check_name("table", table)?;
        let path = Self::path(dir, table);
        fs::write(&path, contents).map_err(|e| Error::io("write", &path, e))?;
        Ok(contents.len())
    }

    /// Delete the file for `table`. A missing file is an error.
    pub fn delete(dir: &Utf8Path, table: &str) -> Result<()> {
        check_name("table", table)?;
        let path = Self::path(dir, table);
        fs::remove_file(&path).map_err(|e| Error::io("delete", &path, e))
    }

    pub fn read(path: &Utf8Path) -> Result<SqlFile> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io("read", path, e))?;
        Ok(SqlFile {
            path: path.to_owned(),
            table: path.file_stem().unwrap_or_default().to_string(),
            contents,
        })
    }
}

/// Every `*.sql` file directly inside `dir`, sorted by file name.
pub fn sql_files(dir: &Utf8Path) -> Result<Vec<SqlFile>> {
    let entries = dir
        .read_dir_utf8()
        .map_err(|e| Error::io("list", dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("list", dir, e))?;
        let path = entry.path();
        if path.extension() == Some(EXTENSION) && path.is_file() {
            paths.push(path.to_owned());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    paths.iter().map(|p| SqlFile::read(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_write_truncates() {
        let (_tmp, dir) = tempdir();
        assert_eq!(SqlFile::write(&dir, "orders", "a long first version").unwrap(), 20);
        assert_eq!(SqlFile::write(&dir, "orders", "short").unwrap(), 5);
        assert_eq!(fs::read_to_string(dir.join("orders.sql")).unwrap(), "short");
    }

    #[test]
    fn test_delete_missing_is_an_error() {
        let (_tmp, dir) = tempdir();
        let err = SqlFile::delete(&dir, "ghost").unwrap_err();
        match err {
            Error::Io { action, path, .. } => {
                assert_eq!(action, "delete");
                assert_eq!(path, dir.join("ghost.sql"));
            }
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_sql_files_sorted_and_filtered() {
        let (_tmp, dir) = tempdir();
        SqlFile::write(&dir, "b", "B").unwrap();
        SqlFile::write(&dir, "a", "A").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.join("nested.sql")).unwrap();

        let files = sql_files(&dir).unwrap();
        let tables: Vec<&str> = files.iter().map(|f| f.table.as_str()).collect();
        assert_eq!(tables, vec!["a", "b"]);
        assert_eq!(files[0].contents, "A");
    }

    #[test]
    fn test_table_names_must_stay_inside_dir() {
        let (_tmp, root) = tempdir();
        let dir = root.join("app");
        fs::create_dir(&dir).unwrap();

        for name in ["../escaped", "a/b", "..", "", "back\\slash"] {
            match SqlFile::write(&dir, name, "x") {
                Err(Error::UnsafeName { kind, name: rejected }) => {
                    assert_eq!(kind, "table");
                    assert_eq!(rejected, name);
                }
                other => panic!("expected {:?} to be rejected, got {:?}", name, other),
            }
        }
        assert!(!root.join("escaped.sql").exists());
        assert!(matches!(
            SqlFile::delete(&dir, "../escaped"),
            Err(Error::UnsafeName { .. })
        ));

        // Dots inside a name are fine
        assert!(SqlFile::write(&dir, "v1.2", "x").is_ok());
    }
}
