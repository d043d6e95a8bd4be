//! Schema diffing - compare two snapshots of the same schema.
//!
//! [`SchemaDiff::new`] takes a "from" snapshot and a "to" snapshot and lists,
//! table by table, what would turn the first into the second. For `pull`,
//! "from" is the temporary schema built out of the `.sql` files and "to" is
//! the live schema.
//!
//! ## Rename Detection
//!
//! A table that only exists in "from" and a table that only exists in "to"
//! are reported as a rename instead of a drop + create when they look alike.
//! The similarity score combines:
//! - **Name similarity (30%)**: plural/singular pairs like `users`→`user`,
//!   `categories`→`category`, `post_tags`→`post_tag`
//! - **Column overlap (70%)**: Jaccard similarity of the column name sets
//!
//! Only plural/singular pairs scoring ≥ 0.6 are rename candidates: column
//! overlap alone never pairs tables with unrelated names. The best matches
//! are assigned greedily so that every table takes part in at most one
//! rename.

use pgtree_db_schema::{
    AutoGenerated, CheckConstraint, Column, ForeignKey, Index, PgType, Schema, Table,
};
use std::collections::HashSet;
use std::fmt;

/// A diff between two schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaDiff {
    /// One entry per table that differs, sorted by table name.
    pub table_diffs: Vec<TableDiff>,
}

/// The difference for a single table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableDiff {
    /// The table only exists in "to". Carries the "to" definition.
    Create(Table),
    /// The table only exists in "from". Carries the "from" definition.
    Drop(Table),
    /// The table exists on both sides with a different structure.
    Alter {
        /// The "to" definition.
        table: Table,
        changes: Vec<Change>,
    },
    /// A "from" table seems to have been renamed in "to".
    Rename { from: String, to: String },
    /// The table differs, but uses constructs the snapshot types can't model.
    Unsupported { table: String, reason: String },
}

impl TableDiff {
    /// Name of the affected table (the new name, for renames).
    pub fn table_name(&self) -> &str {
        match self {
            TableDiff::Create(t) | TableDiff::Drop(t) | TableDiff::Alter { table: t, .. } => {
                &t.name
            }
            TableDiff::Rename { to, .. } => to,
            TableDiff::Unsupported { table, .. } => table,
        }
    }
}

/// A single structural change inside an altered table.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Add a new column.
    AddColumn(Column),
    /// Drop an existing column.
    DropColumn(String),
    /// Change a column's type.
    AlterColumnType {
        name: String,
        from: PgType,
        to: PgType,
    },
    /// Change a column's nullability.
    AlterColumnNullable { name: String, from: bool, to: bool },
    /// Change a column's default value.
    AlterColumnDefault {
        name: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// Change a column's serial/identity generation.
    AlterColumnAuto {
        name: String,
        from: Option<AutoGenerated>,
        to: Option<AutoGenerated>,
    },
    /// Add a primary key.
    AddPrimaryKey(Vec<String>),
    /// Drop a primary key.
    DropPrimaryKey,
    /// Add a foreign key.
    AddForeignKey(ForeignKey),
    /// Drop a foreign key.
    DropForeignKey(ForeignKey),
    /// Add an index.
    AddIndex(Index),
    /// Drop an index.
    DropIndex(String),
    /// Add a unique constraint.
    AddUnique(String),
    /// Drop a unique constraint.
    DropUnique(String),
    /// Add a CHECK constraint.
    AddCheck(CheckConstraint),
    /// Drop a CHECK constraint.
    DropCheck(String),
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::AddColumn(col) => {
                let nullable = if col.nullable { " (nullable)" } else { "" };
                write!(f, "+ {}: {}{}", col.name, col.pg_type, nullable)
            }
            Change::DropColumn(name) => write!(f, "- {}", name),
            Change::AlterColumnType { name, from, to } => {
                write!(f, "~ {}: {} -> {}", name, from, to)
            }
            Change::AlterColumnNullable { name, from, to } => {
                let from_str = if *from { "nullable" } else { "not null" };
                let to_str = if *to { "nullable" } else { "not null" };
                write!(f, "~ {}: {} -> {}", name, from_str, to_str)
            }
            Change::AlterColumnDefault { name, from, to } => {
                let from_str = from.as_deref().unwrap_or("(none)");
                let to_str = to.as_deref().unwrap_or("(none)");
                write!(f, "~ {} default: {} -> {}", name, from_str, to_str)
            }
            Change::AlterColumnAuto { name, from, to } => {
                write!(f, "~ {} generation: {:?} -> {:?}", name, from, to)
            }
            Change::AddPrimaryKey(cols) => write!(f, "+ PRIMARY KEY ({})", cols.join(", ")),
            Change::DropPrimaryKey => write!(f, "- PRIMARY KEY"),
            Change::AddForeignKey(fk) => {
                write!(
                    f,
                    "+ FOREIGN KEY ({}) -> {}.{}",
                    fk.columns.join(", "),
                    fk.references_table,
                    fk.references_columns.join(", ")
                )
            }
            Change::DropForeignKey(fk) => {
                write!(
                    f,
                    "- FOREIGN KEY ({}) -> {}.{}",
                    fk.columns.join(", "),
                    fk.references_table,
                    fk.references_columns.join(", ")
                )
            }
            Change::AddIndex(idx) => {
                let unique = if idx.unique { "UNIQUE " } else { "" };
                let cols: Vec<&str> = idx.columns.iter().map(|c| c.name.as_str()).collect();
                write!(f, "+ {}INDEX {} ({})", unique, idx.name, cols.join(", "))
            }
            Change::DropIndex(name) => write!(f, "- INDEX {}", name),
            Change::AddUnique(col) => write!(f, "+ UNIQUE ({})", col),
            Change::DropUnique(col) => write!(f, "- UNIQUE ({})", col),
            Change::AddCheck(check) => write!(f, "+ CHECK {} ({})", check.name, check.expr),
            Change::DropCheck(name) => write!(f, "- CHECK {}", name),
        }
    }
}

impl fmt::Display for TableDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableDiff::Create(t) => write!(f, "+ table {}", t.name),
            TableDiff::Drop(t) => write!(f, "- table {}", t.name),
            TableDiff::Alter { table, changes } => {
                write!(f, "~ table {}", table.name)?;
                for change in changes {
                    write!(f, "\n    {}", change)?;
                }
                Ok(())
            }
            TableDiff::Rename { from, to } => write!(f, "~ rename {} -> {}", from, to),
            TableDiff::Unsupported { table, reason } => {
                write!(f, "! table {}: {}", table, reason)
            }
        }
    }
}

impl SchemaDiff {
    /// Compare `from` against `to`.
    ///
    /// The resulting entries describe how to turn `from` into `to`: a table
    /// only present in `to` is a [`TableDiff::Create`], and so on.
    pub fn new(from: &Schema, to: &Schema) -> SchemaDiff {
        let mut table_diffs = Vec::new();

        let added_tables: Vec<&Table> = to
            .iter_tables()
            .filter(|t| !from.tables.contains_key(&t.name))
            .collect();

        let dropped_tables: Vec<&Table> = from
            .iter_tables()
            .filter(|t| !to.tables.contains_key(&t.name))
            .collect();

        let renames = detect_renames(&added_tables, &dropped_tables);
        let renamed_from: HashSet<&str> = renames.iter().map(|(f, _)| f.as_str()).collect();
        let renamed_to: HashSet<&str> = renames.iter().map(|(_, t)| t.as_str()).collect();

        for (from_name, to_name) in &renames {
            table_diffs.push(TableDiff::Rename {
                from: from_name.clone(),
                to: to_name.clone(),
            });
        }

        for table in &added_tables {
            if renamed_to.contains(table.name.as_str()) {
                continue;
            }
            table_diffs.push(match &table.unsupported {
                Some(reason) => TableDiff::Unsupported {
                    table: table.name.clone(),
                    reason: reason.clone(),
                },
                None => TableDiff::Create((*table).clone()),
            });
        }

        for table in &dropped_tables {
            if !renamed_from.contains(table.name.as_str()) {
                table_diffs.push(TableDiff::Drop((*table).clone()));
            }
        }

        for to_table in to.iter_tables() {
            let Some(from_table) = from.get_table(&to_table.name) else {
                continue;
            };
            let changes = diff_table(from_table, to_table);
            let unsupported = to_table
                .unsupported
                .as_ref()
                .or(from_table.unsupported.as_ref());

            if let Some(reason) = unsupported {
                if !changes.is_empty() || from_table.unsupported != to_table.unsupported {
                    table_diffs.push(TableDiff::Unsupported {
                        table: to_table.name.clone(),
                        reason: reason.clone(),
                    });
                }
            } else if !changes.is_empty() {
                table_diffs.push(TableDiff::Alter {
                    table: to_table.clone(),
                    changes,
                });
            }
        }

        // Sort by table name for consistent output
        table_diffs.sort_by(|a, b| a.table_name().cmp(b.table_name()));

        SchemaDiff { table_diffs }
    }

    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.table_diffs.is_empty()
    }
}

impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            writeln!(f, "No changes detected.")?;
        } else {
            for table_diff in &self.table_diffs {
                writeln!(f, "{}", table_diff)?;
            }
        }
        Ok(())
    }
}

/// Check if two names are likely plural/singular variants of each other.
///
/// Recognizes common English plural patterns:
/// - Basic 's' suffix: `users` ↔ `user`, `posts` ↔ `post`
/// - 'ies' → 'y': `categories` ↔ `category`, `entries` ↔ `entry`
/// - Compound names: `post_tags` ↔ `post_tag`, `post_categories` ↔ `post_category`
///
/// Irregular plurals (e.g., `people`/`person`) are not detected.
fn is_plural_singular_pair(a: &str, b: &str) -> bool {
    // Ensure a is the longer one (likely plural)
    let (plural, singular) = if a.len() > b.len() { (a, b) } else { (b, a) };

    if plural == format!("{}s", singular) {
        return true;
    }

    if plural.ends_with("ies") && singular.ends_with('y') {
        let plural_stem = &plural[..plural.len() - 3];
        let singular_stem = &singular[..singular.len() - 1];
        if plural_stem == singular_stem {
            return true;
        }
    }

    // Compare the last `_` segment, then require identical prefixes
    if let (Some(plural_last), Some(singular_last)) =
        (plural.rsplit('_').next(), singular.rsplit('_').next())
    {
        let plural_prefix = &plural[..plural.len() - plural_last.len()];
        let singular_prefix = &singular[..singular.len() - singular_last.len()];
        if plural_prefix != singular_prefix {
            return false;
        }
        if plural_last == format!("{}s", singular_last) {
            return true;
        }
        if plural_last.ends_with("ies")
            && singular_last.ends_with('y')
            && plural_last[..plural_last.len() - 3] == singular_last[..singular_last.len() - 1]
        {
            return true;
        }
    }

    false
}

/// Similarity score between two tables (0.0 to 1.0).
///
/// Adds 0.3 for plural/singular names, plus 0.7 × the Jaccard similarity of
/// the column name sets.
fn table_similarity(a: &Table, b: &Table) -> f64 {
    let mut score = 0.0;

    if is_plural_singular_pair(&a.name, &b.name) {
        score += 0.3;
    }

    let a_cols: HashSet<&str> = a.columns.iter().map(|c| c.name.as_str()).collect();
    let b_cols: HashSet<&str> = b.columns.iter().map(|c| c.name.as_str()).collect();

    let intersection = a_cols.intersection(&b_cols).count();
    let union = a_cols.union(&b_cols).count();

    if union > 0 {
        let jaccard = intersection as f64 / union as f64;
        score += 0.7 * jaccard;
    }

    score
}

/// Pair up tables that only exist in "to" (added) with tables that only
/// exist in "from" (dropped) when they are similar enough to be a rename.
///
/// Returns `(old_name, new_name)` pairs.
fn detect_renames(added: &[&Table], dropped: &[&Table]) -> Vec<(String, String)> {
    const RENAME_THRESHOLD: f64 = 0.6;

    let mut renames = Vec::new();
    let mut used_added: HashSet<&str> = HashSet::new();
    let mut used_dropped: HashSet<&str> = HashSet::new();

    let mut candidates: Vec<(f64, &str, &str)> = Vec::new();
    for dropped_table in dropped {
        for added_table in added {
            if !is_plural_singular_pair(&dropped_table.name, &added_table.name) {
                continue;
            }
            let sim = table_similarity(dropped_table, added_table);
            if sim >= RENAME_THRESHOLD {
                candidates.push((sim, &dropped_table.name, &added_table.name));
            }
        }
    }

    // Sort by similarity descending
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    for (_, from, to) in candidates {
        if !used_dropped.contains(from) && !used_added.contains(to) {
            renames.push((from.to_string(), to.to_string()));
            used_dropped.insert(from);
            used_added.insert(to);
        }
    }

    renames
}

/// Diff two tables with the same name.
fn diff_table(from: &Table, to: &Table) -> Vec<Change> {
    let mut changes = Vec::new();
    changes.extend(diff_columns(&from.columns, &to.columns));
    changes.extend(diff_primary_key(&from.columns, &to.columns));
    changes.extend(diff_checks(&from.check_constraints, &to.check_constraints));
    changes.extend(diff_foreign_keys(&from.foreign_keys, &to.foreign_keys));
    changes.extend(diff_indices(&from.indices, &to.indices));
    changes
}

fn diff_columns(from: &[Column], to: &[Column]) -> Vec<Change> {
    let mut changes = Vec::new();

    let from_names: HashSet<&str> = from.iter().map(|c| c.name.as_str()).collect();
    let to_names: HashSet<&str> = to.iter().map(|c| c.name.as_str()).collect();

    for col in to {
        if !from_names.contains(col.name.as_str()) {
            changes.push(Change::AddColumn(col.clone()));
        }
    }

    for col in from {
        if !to_names.contains(col.name.as_str()) {
            changes.push(Change::DropColumn(col.name.clone()));
        }
    }

    for to_col in to {
        let Some(from_col) = from.iter().find(|c| c.name == to_col.name) else {
            continue;
        };

        if to_col.pg_type != from_col.pg_type {
            changes.push(Change::AlterColumnType {
                name: to_col.name.clone(),
                from: from_col.pg_type,
                to: to_col.pg_type,
            });
        }

        if to_col.nullable != from_col.nullable {
            changes.push(Change::AlterColumnNullable {
                name: to_col.name.clone(),
                from: from_col.nullable,
                to: to_col.nullable,
            });
        }

        if to_col.default != from_col.default {
            changes.push(Change::AlterColumnDefault {
                name: to_col.name.clone(),
                from: from_col.default.clone(),
                to: to_col.default.clone(),
            });
        }

        if to_col.auto != from_col.auto {
            changes.push(Change::AlterColumnAuto {
                name: to_col.name.clone(),
                from: from_col.auto,
                to: to_col.auto,
            });
        }

        if to_col.unique != from_col.unique {
            if to_col.unique {
                changes.push(Change::AddUnique(to_col.name.clone()));
            } else {
                changes.push(Change::DropUnique(to_col.name.clone()));
            }
        }
    }

    changes
}

fn diff_primary_key(from: &[Column], to: &[Column]) -> Vec<Change> {
    let pk = |cols: &[Column]| -> Vec<String> {
        cols.iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.clone())
            .collect()
    };
    let (from_pk, to_pk) = (pk(from), pk(to));
    if from_pk == to_pk {
        return Vec::new();
    }

    let mut changes = Vec::new();
    if !from_pk.is_empty() {
        changes.push(Change::DropPrimaryKey);
    }
    if !to_pk.is_empty() {
        changes.push(Change::AddPrimaryKey(to_pk));
    }
    changes
}

fn diff_checks(from: &[CheckConstraint], to: &[CheckConstraint]) -> Vec<Change> {
    let mut changes = Vec::new();

    for check in to {
        if !from.contains(check) {
            changes.push(Change::AddCheck(check.clone()));
        }
    }

    for check in from {
        if !to.contains(check) {
            changes.push(Change::DropCheck(check.name.clone()));
        }
    }

    changes
}

fn diff_foreign_keys(from: &[ForeignKey], to: &[ForeignKey]) -> Vec<Change> {
    let mut changes = Vec::new();

    // Constraint names are not compared
    let fk_key = |fk: &ForeignKey| -> String {
        format!(
            "{}->{}.{}({}) {:?}/{:?}",
            fk.columns.join(","),
            fk.references_schema.as_deref().unwrap_or(""),
            fk.references_table,
            fk.references_columns.join(","),
            fk.on_delete,
            fk.on_update
        )
    };

    let from_keys: HashSet<String> = from.iter().map(fk_key).collect();
    let to_keys: HashSet<String> = to.iter().map(fk_key).collect();

    for fk in to {
        if !from_keys.contains(&fk_key(fk)) {
            changes.push(Change::AddForeignKey(fk.clone()));
        }
    }

    for fk in from {
        if !to_keys.contains(&fk_key(fk)) {
            changes.push(Change::DropForeignKey(fk.clone()));
        }
    }

    changes
}

fn diff_indices(from: &[Index], to: &[Index]) -> Vec<Change> {
    let mut changes = Vec::new();

    // Compare by definition, not name
    let idx_key = |idx: &Index| -> String {
        let cols: Vec<String> = idx
            .columns
            .iter()
            .map(pgtree_db_schema::index_column_to_sql)
            .collect();
        format!(
            "{}:{}:{}",
            if idx.unique { "U" } else { "" },
            cols.join(","),
            idx.where_clause.as_deref().unwrap_or("")
        )
    };

    let from_keys: HashSet<String> = from.iter().map(idx_key).collect();
    let to_keys: HashSet<String> = to.iter().map(idx_key).collect();

    for idx in to {
        if !from_keys.contains(&idx_key(idx)) {
            changes.push(Change::AddIndex(idx.clone()));
        }
    }

    for idx in from {
        if !to_keys.contains(&idx_key(idx)) {
            changes.push(Change::DropIndex(idx.name.clone()));
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_column(name: &str, pg_type: PgType, nullable: bool) -> Column {
        let mut col = Column::new(name, pg_type);
        col.nullable = nullable;
        col
    }

    fn make_table(name: &str, columns: Vec<Column>) -> Table {
        let mut table = Table::new(name);
        table.columns = columns;
        table
    }

    fn schema(tables: Vec<Table>) -> Schema {
        let mut schema = Schema::new("app");
        for table in tables {
            schema.insert(table);
        }
        schema
    }

    #[test]
    fn test_diff_empty_schemas() {
        let diff = SchemaDiff::new(&Schema::new("a"), &Schema::new("b"));
        assert!(diff.is_empty());
    }

    #[test]
    fn test_diff_create_table() {
        let from = schema(vec![]);
        let to = schema(vec![make_table(
            "orders",
            vec![make_column("id", PgType::BigInt, false)],
        )]);

        let diff = SchemaDiff::new(&from, &to);
        assert_eq!(diff.table_diffs.len(), 1);
        assert!(matches!(&diff.table_diffs[0], TableDiff::Create(t) if t.name == "orders"));
    }

    #[test]
    fn test_diff_drop_table() {
        let from = schema(vec![make_table(
            "legacy",
            vec![make_column("id", PgType::BigInt, false)],
        )]);
        let to = schema(vec![]);

        let diff = SchemaDiff::new(&from, &to);
        assert_eq!(diff.table_diffs.len(), 1);
        assert!(matches!(&diff.table_diffs[0], TableDiff::Drop(t) if t.name == "legacy"));
    }

    #[test]
    fn test_diff_alter_carries_to_definition() {
        let from = schema(vec![make_table(
            "users",
            vec![make_column("id", PgType::BigInt, false)],
        )]);
        let to = schema(vec![make_table(
            "users",
            vec![
                make_column("id", PgType::BigInt, false),
                make_column("email", PgType::Text, false),
            ],
        )]);

        let diff = SchemaDiff::new(&from, &to);
        assert_eq!(diff.table_diffs.len(), 1);
        match &diff.table_diffs[0] {
            TableDiff::Alter { table, changes } => {
                assert_eq!(table.columns.len(), 2);
                assert!(matches!(&changes[0], Change::AddColumn(c) if c.name == "email"));
            }
            other => panic!("expected alter, got {:?}", other),
        }
    }

    #[test]
    fn test_diff_alter_column_type_and_nullable() {
        let from = schema(vec![make_table(
            "users",
            vec![make_column("age", PgType::Integer, true)],
        )]);
        let to = schema(vec![make_table(
            "users",
            vec![make_column("age", PgType::BigInt, false)],
        )]);

        let diff = SchemaDiff::new(&from, &to);
        let TableDiff::Alter { changes, .. } = &diff.table_diffs[0] else {
            panic!("expected alter");
        };
        assert_eq!(
            changes,
            &vec![
                Change::AlterColumnType {
                    name: "age".to_string(),
                    from: PgType::Integer,
                    to: PgType::BigInt,
                },
                Change::AlterColumnNullable {
                    name: "age".to_string(),
                    from: true,
                    to: false,
                },
            ]
        );
    }

    #[test]
    fn test_diff_primary_key_change() {
        let mut id = make_column("id", PgType::BigInt, false);
        id.primary_key = true;
        let from = schema(vec![make_table("t", vec![make_column("id", PgType::BigInt, false)])]);
        let to = schema(vec![make_table("t", vec![id])]);

        let diff = SchemaDiff::new(&from, &to);
        let TableDiff::Alter { changes, .. } = &diff.table_diffs[0] else {
            panic!("expected alter");
        };
        assert_eq!(changes, &vec![Change::AddPrimaryKey(vec!["id".to_string()])]);
    }

    #[test]
    fn test_diff_no_changes() {
        let tables = vec![make_table(
            "users",
            vec![
                make_column("id", PgType::BigInt, false),
                make_column("email", PgType::Text, false),
            ],
        )];
        let diff = SchemaDiff::new(&schema(tables.clone()), &schema(tables));
        assert!(diff.is_empty());
    }

    #[test]
    fn test_diff_sorted_by_table_name() {
        let from = schema(vec![make_table(
            "zebra",
            vec![make_column("stripes", PgType::Integer, true)],
        )]);
        let to = schema(vec![
            make_table("mango", vec![make_column("ripe", PgType::Boolean, true)]),
            make_table("apple", vec![make_column("crisp", PgType::Boolean, true)]),
        ]);

        let diff = SchemaDiff::new(&from, &to);
        let names: Vec<&str> = diff.table_diffs.iter().map(|d| d.table_name()).collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_unsupported_table_is_reported_when_it_differs() {
        let mut live = make_table("moods", vec![make_column("id", PgType::BigInt, false)]);
        live.unsupported = Some("column feeling has unsupported type mood".to_string());

        // Created live: cannot be rendered
        let diff = SchemaDiff::new(&schema(vec![]), &schema(vec![live.clone()]));
        assert!(matches!(&diff.table_diffs[0], TableDiff::Unsupported { table, .. } if table == "moods"));

        // Identical on both sides: nothing to do
        let diff = SchemaDiff::new(&schema(vec![live.clone()]), &schema(vec![live.clone()]));
        assert!(diff.is_empty());

        // Dropping it needs no rendering
        let diff = SchemaDiff::new(&schema(vec![live]), &schema(vec![]));
        assert!(matches!(&diff.table_diffs[0], TableDiff::Drop(_)));
    }

    #[test]
    fn test_plural_singular_detection() {
        assert!(is_plural_singular_pair("users", "user"));
        assert!(is_plural_singular_pair("categories", "category"));
        assert!(is_plural_singular_pair("post_tags", "post_tag"));
        assert!(is_plural_singular_pair("post_categories", "post_category"));

        assert!(!is_plural_singular_pair("users", "posts"));
        assert!(!is_plural_singular_pair("user", "category"));
        assert!(!is_plural_singular_pair("foo", "bar"));
    }

    #[test]
    fn test_table_similarity() {
        let cols = || {
            vec![
                make_column("id", PgType::BigInt, false),
                make_column("email", PgType::Text, false),
                make_column("name", PgType::Text, false),
            ]
        };
        let users = make_table("users", cols());
        let user = make_table("user", cols());
        let posts = make_table(
            "posts",
            vec![
                make_column("id", PgType::BigInt, false),
                make_column("title", PgType::Text, false),
            ],
        );

        let sim = table_similarity(&users, &user);
        assert!(sim > 0.9, "Expected high similarity, got {}", sim);

        let sim_different = table_similarity(&users, &posts);
        assert!(sim_different < 0.5, "Expected low similarity, got {}", sim_different);
    }

    #[test]
    fn test_diff_detects_rename() {
        let cols = || {
            vec![
                make_column("id", PgType::BigInt, false),
                make_column("email", PgType::Text, false),
            ]
        };
        let from = schema(vec![make_table("users", cols())]);
        let to = schema(vec![make_table("user", cols())]);

        let diff = SchemaDiff::new(&from, &to);
        assert_eq!(
            diff.table_diffs,
            vec![TableDiff::Rename {
                from: "users".to_string(),
                to: "user".to_string(),
            }]
        );
    }

    #[test]
    fn test_same_columns_under_unrelated_names_is_drop_and_create() {
        let cols = || {
            vec![
                make_column("id", PgType::BigInt, false),
                make_column("name", PgType::Text, false),
            ]
        };
        let from = schema(vec![make_table("tags", cols())]);
        let to = schema(vec![make_table("labels", cols())]);

        let diff = SchemaDiff::new(&from, &to);
        assert_eq!(
            diff.table_diffs,
            vec![
                TableDiff::Create(make_table("labels", cols())),
                TableDiff::Drop(make_table("tags", cols())),
            ]
        );
    }
}
