use camino::Utf8PathBuf;
use std::fmt;

/// Why a file was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteReason {
    /// The table exists live but had no file.
    NewTable,
    /// The file no longer matched the live table.
    Altered,
    /// The `.pgtree.styx` of a newly populated schema directory.
    NewSchema,
}

impl fmt::Display for WriteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteReason::NewTable => write!(f, "new table"),
            WriteReason::Altered => write!(f, "updated file to reflect table alterations"),
            WriteReason::NewSchema => write!(f, "new schema"),
        }
    }
}

/// One change made to the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    WroteFile {
        path: Utf8PathBuf,
        bytes: usize,
        reason: WriteReason,
    },
    DeletedFile {
        path: Utf8PathBuf,
    },
    CreatedDir {
        path: Utf8PathBuf,
    },
    DeletedDir {
        path: Utf8PathBuf,
    },
}

impl Mutation {
    pub fn path(&self) -> &Utf8PathBuf {
        match self {
            Mutation::WroteFile { path, .. }
            | Mutation::DeletedFile { path }
            | Mutation::CreatedDir { path }
            | Mutation::DeletedDir { path } => path,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::WroteFile {
                path,
                bytes,
                reason,
            } => write!(f, "Wrote {} ({} bytes) -- {}", path, bytes, reason),
            Mutation::DeletedFile { path } => {
                write!(f, "Deleted {} -- table no longer exists", path)
            }
            Mutation::CreatedDir { path } => write!(f, "Created directory {}", path),
            Mutation::DeletedDir { path } => {
                write!(f, "Deleted directory {} -- schema no longer exists", path)
            }
        }
    }
}

/// Everything a run changed on disk, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    pub mutations: Vec<Mutation>,
}

impl PullReport {
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn extend(&mut self, mutations: impl IntoIterator<Item = Mutation>) {
        self.mutations.extend(mutations);
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations.iter()
    }

    /// Number of files written.
    pub fn files_written(&self) -> usize {
        self.iter()
            .filter(|m| matches!(m, Mutation::WroteFile { .. }))
            .count()
    }

    /// Number of files and directories deleted.
    pub fn deletions(&self) -> usize {
        self.iter()
            .filter(|m| matches!(m, Mutation::DeletedFile { .. } | Mutation::DeletedDir { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_lines() {
        let wrote = Mutation::WroteFile {
            path: "app/orders.sql".into(),
            bytes: 42,
            reason: WriteReason::NewTable,
        };
        assert_eq!(wrote.to_string(), "Wrote app/orders.sql (42 bytes) -- new table");

        let deleted = Mutation::DeletedDir { path: "gone".into() };
        assert_eq!(
            deleted.to_string(),
            "Deleted directory gone -- schema no longer exists"
        );
    }

    #[test]
    fn test_counts() {
        let mut report = PullReport::default();
        report.push(Mutation::CreatedDir { path: "c".into() });
        report.push(Mutation::WroteFile {
            path: "c/t.sql".into(),
            bytes: 1,
            reason: WriteReason::NewTable,
        });
        report.push(Mutation::DeletedFile {
            path: "a/legacy.sql".into(),
        });
        assert_eq!(report.len(), 3);
        assert_eq!(report.files_written(), 1);
        assert_eq!(report.deletions(), 1);
    }
}
