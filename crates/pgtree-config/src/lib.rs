//! Facet types for `.pgtree.styx`, the per-directory configuration file.
//!
//! Every directory of a pgtree checkout may carry one. A directory that sets
//! `host` describes an instance; one that sets `schema` is a leaf holding
//! one `<table>.sql` file per table. Everything except `schema` is inherited
//! by subdirectories.

use facet::Facet;
use std::fmt::Write as _;

/// File name of the per-directory configuration.
pub const FILE_NAME: &str = ".pgtree.styx";

/// Temporary schema used when `temp_schema` is not configured.
pub const DEFAULT_TEMP_SCHEMA: &str = "_pgtree_tmp";

/// Contents of a `.pgtree.styx` file.
#[derive(Facet, Debug, Clone, Default, PartialEq)]
pub struct DirConfig {
    /// Database server host name
    #[facet(default)]
    pub host: Option<String>,

    /// Database server port
    #[facet(default)]
    pub port: Option<u16>,

    /// Role to connect as
    #[facet(default)]
    pub user: Option<String>,

    /// Password (prefer `PGPASSWORD` over storing it here)
    #[facet(default)]
    pub password: Option<String>,

    /// Database to connect to
    #[facet(default)]
    pub database: Option<String>,

    /// Schema this directory mirrors
    #[facet(default)]
    pub schema: Option<String>,

    /// Scratch schema used to stage on-disk definitions
    #[facet(default)]
    pub temp_schema: Option<String>,
}

impl DirConfig {
    /// Config for a leaf directory mirroring `schema`.
    pub fn for_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            ..Default::default()
        }
    }

    /// Overlay a directory's own file on top of its parent's effective config.
    ///
    /// `schema` is never inherited: a subdirectory of a leaf is not itself a
    /// leaf unless it says so.
    pub fn inherit(parent: &DirConfig, own: &DirConfig) -> DirConfig {
        DirConfig {
            host: own.host.clone().or_else(|| parent.host.clone()),
            port: own.port.or(parent.port),
            user: own.user.clone().or_else(|| parent.user.clone()),
            password: own.password.clone().or_else(|| parent.password.clone()),
            database: own.database.clone().or_else(|| parent.database.clone()),
            schema: own.schema.clone(),
            temp_schema: own
                .temp_schema
                .clone()
                .or_else(|| parent.temp_schema.clone()),
        }
    }

    /// Whether this config names a database server.
    pub fn has_instance(&self) -> bool {
        self.host.is_some()
    }

    /// The configured temporary schema, or [`DEFAULT_TEMP_SCHEMA`].
    pub fn temp_schema(&self) -> &str {
        self.temp_schema.as_deref().unwrap_or(DEFAULT_TEMP_SCHEMA)
    }

    /// Render as styx, one `key value` line per set field.
    pub fn to_styx(&self) -> String {
        let mut out = String::new();
        if let Some(host) = &self.host {
            let _ = writeln!(out, "host {}", quote(host));
        }
        if let Some(port) = self.port {
            let _ = writeln!(out, "port {}", port);
        }
        let strings = [
            ("user", &self.user),
            ("password", &self.password),
            ("database", &self.database),
            ("schema", &self.schema),
            ("temp_schema", &self.temp_schema),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                let _ = writeln!(out, "{} {}", key, quote(value));
            }
        }
        out
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_not_inherited() {
        let parent = DirConfig {
            host: Some("db.internal".to_string()),
            port: Some(5433),
            schema: Some("app".to_string()),
            ..Default::default()
        };
        let own = DirConfig {
            user: Some("reader".to_string()),
            ..Default::default()
        };

        let effective = DirConfig::inherit(&parent, &own);
        assert_eq!(effective.host.as_deref(), Some("db.internal"));
        assert_eq!(effective.port, Some(5433));
        assert_eq!(effective.user.as_deref(), Some("reader"));
        assert_eq!(effective.schema, None);
    }

    #[test]
    fn test_own_values_win() {
        let parent = DirConfig {
            host: Some("a".to_string()),
            temp_schema: Some("_scratch".to_string()),
            ..Default::default()
        };
        let own = DirConfig {
            host: Some("b".to_string()),
            ..Default::default()
        };

        let effective = DirConfig::inherit(&parent, &own);
        assert_eq!(effective.host.as_deref(), Some("b"));
        assert_eq!(effective.temp_schema(), "_scratch");
    }

    #[test]
    fn test_default_temp_schema() {
        assert_eq!(DirConfig::default().temp_schema(), "_pgtree_tmp");
    }

    #[test]
    fn test_to_styx() {
        let config = DirConfig {
            host: Some("localhost".to_string()),
            port: Some(5432),
            database: Some("shop".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.to_styx(),
            "host \"localhost\"\nport 5432\ndatabase \"shop\"\n"
        );
        assert_eq!(
            DirConfig::for_schema("we\"ird").to_styx(),
            "schema \"we\\\"ird\"\n"
        );
    }
}
