use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {message}")]
    Config { path: Utf8PathBuf, message: String },

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("unable to apply {file} to temporary schema: {message}")]
    Staging { file: Utf8PathBuf, message: String },

    #[error("introspection failed: {0}")]
    Introspection(String),

    #[error("table renames are not supported ({from} -> {to})")]
    RenameUnsupported { from: String, to: String },

    #[error("unsupported diff for table {table}: {reason}")]
    UnsupportedDiff { table: String, reason: String },

    #[error("unable to clean up temporary schema {schema}: {source}")]
    Cleanup {
        schema: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{kind} name {name:?} cannot be used as a file name")]
    UnsafeName { kind: &'static str, name: String },

    #[error("{0} is already initialized")]
    AlreadyExists(Utf8PathBuf),
}

impl Error {
    pub(crate) fn io(action: &'static str, path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Error::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Conditions that must stop the whole run: continuing would leave the
    /// tree inconsistent with the database.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::RenameUnsupported { .. } | Error::UnsupportedDiff { .. }
        )
    }
}
