//! Database schema types for pgtree.
//!
//! A [`Schema`] is a snapshot of one Postgres namespace: the live schema, or
//! the temporary schema the on-disk definitions were staged into. Both sides
//! are built the same way (catalog introspection) so they can be compared
//! field by field.
//!
//! This crate also owns the canonical rendering of a table as SQL, see
//! [`table_definition_sql`]. That rendering is what ends up in `<table>.sql`.

use indexmap::IndexMap;
use std::fmt;

/// Postgres column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgType {
    /// SMALLINT (2 bytes)
    SmallInt,
    /// INTEGER (4 bytes)
    Integer,
    /// BIGINT (8 bytes)
    BigInt,
    /// REAL (4 bytes floating point)
    Real,
    /// DOUBLE PRECISION (8 bytes floating point)
    DoublePrecision,
    /// NUMERIC, with optional (precision, scale)
    Numeric(Option<(u32, u32)>),
    /// BOOLEAN
    Boolean,
    /// TEXT
    Text,
    /// VARCHAR, with optional length
    Varchar(Option<u32>),
    /// CHAR, with optional length
    Char(Option<u32>),
    /// BYTEA (binary)
    Bytea,
    /// TIMESTAMP (without time zone)
    Timestamp,
    /// TIMESTAMPTZ
    Timestamptz,
    /// DATE
    Date,
    /// TIME
    Time,
    /// UUID
    Uuid,
    /// JSON
    Json,
    /// JSONB
    Jsonb,
    /// TEXT[] (array of text)
    TextArray,
    /// BIGINT[] (array of bigint)
    BigIntArray,
    /// INTEGER[] (array of integer)
    IntegerArray,
}

impl PgType {
    /// Parse the output of Postgres' `format_type()`.
    ///
    /// Returns `None` for anything outside the supported set (user-defined
    /// types, domains, precision-qualified timestamps, ...).
    pub fn from_sql_name(name: &str) -> Option<PgType> {
        let name = name.trim();
        let (base, args) = match name.find('(') {
            Some(open) if name.ends_with(')') => {
                (name[..open].trim(), Some(&name[open + 1..name.len() - 1]))
            }
            _ => (name, None),
        };

        let single_arg = |args: Option<&str>| -> Option<Option<u32>> {
            match args {
                None => Some(None),
                Some(a) => a.trim().parse().ok().map(Some),
            }
        };

        let ty = match base {
            "smallint" => PgType::SmallInt,
            "integer" => PgType::Integer,
            "bigint" => PgType::BigInt,
            "real" => PgType::Real,
            "double precision" => PgType::DoublePrecision,
            "numeric" => match args {
                None => PgType::Numeric(None),
                Some(a) => {
                    let (p, s) = a.split_once(',')?;
                    PgType::Numeric(Some((p.trim().parse().ok()?, s.trim().parse().ok()?)))
                }
            },
            "boolean" => PgType::Boolean,
            "text" => PgType::Text,
            "character varying" => PgType::Varchar(single_arg(args)?),
            "character" => PgType::Char(single_arg(args)?),
            "bytea" => PgType::Bytea,
            "timestamp without time zone" => PgType::Timestamp,
            "timestamp with time zone" => PgType::Timestamptz,
            "date" => PgType::Date,
            "time without time zone" => PgType::Time,
            "uuid" => PgType::Uuid,
            "json" => PgType::Json,
            "jsonb" => PgType::Jsonb,
            "text[]" => PgType::TextArray,
            "bigint[]" => PgType::BigIntArray,
            "integer[]" => PgType::IntegerArray,
            _ => return None,
        };

        // Only the parametric types accept arguments.
        match (ty, args) {
            (PgType::Numeric(_) | PgType::Varchar(_) | PgType::Char(_), _) | (_, None) => Some(ty),
            _ => None,
        }
    }

    /// The pseudo-type used to render an auto-incrementing column of this type.
    pub fn serial_name(&self) -> Option<&'static str> {
        match self {
            PgType::SmallInt => Some("SMALLSERIAL"),
            PgType::Integer => Some("SERIAL"),
            PgType::BigInt => Some("BIGSERIAL"),
            _ => None,
        }
    }
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgType::SmallInt => write!(f, "SMALLINT"),
            PgType::Integer => write!(f, "INTEGER"),
            PgType::BigInt => write!(f, "BIGINT"),
            PgType::Real => write!(f, "REAL"),
            PgType::DoublePrecision => write!(f, "DOUBLE PRECISION"),
            PgType::Numeric(None) => write!(f, "NUMERIC"),
            PgType::Numeric(Some((p, s))) => write!(f, "NUMERIC({}, {})", p, s),
            PgType::Boolean => write!(f, "BOOLEAN"),
            PgType::Text => write!(f, "TEXT"),
            PgType::Varchar(None) => write!(f, "VARCHAR"),
            PgType::Varchar(Some(n)) => write!(f, "VARCHAR({})", n),
            PgType::Char(None) => write!(f, "CHAR"),
            PgType::Char(Some(n)) => write!(f, "CHAR({})", n),
            PgType::Bytea => write!(f, "BYTEA"),
            PgType::Timestamp => write!(f, "TIMESTAMP"),
            PgType::Timestamptz => write!(f, "TIMESTAMPTZ"),
            PgType::Date => write!(f, "DATE"),
            PgType::Time => write!(f, "TIME"),
            PgType::Uuid => write!(f, "UUID"),
            PgType::Json => write!(f, "JSON"),
            PgType::Jsonb => write!(f, "JSONB"),
            PgType::TextArray => write!(f, "TEXT[]"),
            PgType::BigIntArray => write!(f, "BIGINT[]"),
            PgType::IntegerArray => write!(f, "INTEGER[]"),
        }
    }
}

/// How a column's values are generated when not supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoGenerated {
    /// Owned sequence with a `nextval()` default (SERIAL and friends).
    Serial,
    /// `GENERATED ALWAYS AS IDENTITY`
    IdentityAlways,
    /// `GENERATED BY DEFAULT AS IDENTITY`
    IdentityByDefault,
}

/// A database column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Postgres type
    pub pg_type: PgType,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Default value expression (if any, never a `nextval()` default)
    pub default: Option<String>,
    /// Whether this is a primary key
    pub primary_key: bool,
    /// Whether this has a single-column unique constraint
    pub unique: bool,
    /// Serial or identity generation
    pub auto: Option<AutoGenerated>,
}

impl Column {
    /// A nullable column with no constraints.
    pub fn new(name: impl Into<String>, pg_type: PgType) -> Self {
        Self {
            name: name.into(),
            pg_type,
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            auto: None,
        }
    }
}

/// Referential action for ON DELETE / ON UPDATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl FkAction {
    /// Map `pg_constraint.confdeltype` / `confupdtype`.
    pub fn from_code(code: &str) -> FkAction {
        match code {
            "r" => FkAction::Restrict,
            "c" => FkAction::Cascade,
            "n" => FkAction::SetNull,
            "d" => FkAction::SetDefault,
            _ => FkAction::NoAction,
        }
    }

    pub fn to_sql(&self) -> &'static str {
        match self {
            FkAction::NoAction => "NO ACTION",
            FkAction::Restrict => "RESTRICT",
            FkAction::Cascade => "CASCADE",
            FkAction::SetNull => "SET NULL",
            FkAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    /// Constraint name
    pub name: String,
    /// Column(s) in this table
    pub columns: Vec<String>,
    /// Schema of the referenced table, `None` when it lives in the same schema
    pub references_schema: Option<String>,
    /// Referenced table
    pub references_table: String,
    /// Referenced column(s)
    pub references_columns: Vec<String>,
    pub on_delete: FkAction,
    pub on_update: FkAction,
}

/// Sort order for index columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending order (default)
    #[default]
    Asc,
    /// Descending order
    Desc,
}

impl SortOrder {
    /// Returns the SQL keyword for this sort order, or empty string for ASC (default).
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "",
            SortOrder::Desc => " DESC",
        }
    }
}

/// Nulls ordering for index columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullsOrder {
    /// Use database default (NULLS LAST for ASC, NULLS FIRST for DESC)
    #[default]
    Default,
    /// Sort nulls before non-null values
    First,
    /// Sort nulls after non-null values
    Last,
}

impl NullsOrder {
    /// Returns the SQL clause for this nulls ordering, or empty string for default.
    pub fn to_sql(&self) -> &'static str {
        match self {
            NullsOrder::Default => "",
            NullsOrder::First => " NULLS FIRST",
            NullsOrder::Last => " NULLS LAST",
        }
    }
}

/// A column in an index with optional sort order and nulls ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    /// Column name (or expression, as rendered by `pg_get_indexdef`)
    pub name: String,
    /// Sort order (ASC or DESC)
    pub order: SortOrder,
    /// Nulls ordering (NULLS FIRST, NULLS LAST, or default)
    pub nulls: NullsOrder,
}

impl IndexColumn {
    /// Create a new index column with default (ASC) ordering and default nulls.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: SortOrder::Asc,
            nulls: NullsOrder::Default,
        }
    }

    /// Create a new index column with DESC ordering and default nulls.
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: SortOrder::Desc,
            nulls: NullsOrder::Default,
        }
    }

    /// Build an index column from a `pg_index.indoption` entry.
    ///
    /// Bit 0 is DESC, bit 1 is NULLS FIRST. Nulls ordering that matches the
    /// sort order's default is normalized to [`NullsOrder::Default`].
    pub fn from_indoption(name: impl Into<String>, option: i32) -> Self {
        let desc = option & 1 != 0;
        let nulls_first = option & 2 != 0;
        let (order, nulls) = match (desc, nulls_first) {
            (false, false) => (SortOrder::Asc, NullsOrder::Default),
            (false, true) => (SortOrder::Asc, NullsOrder::First),
            (true, true) => (SortOrder::Desc, NullsOrder::Default),
            (true, false) => (SortOrder::Desc, NullsOrder::Last),
        };
        Self {
            name: name.into(),
            order,
            nulls,
        }
    }
}

/// A database index that is not backing a primary key or single-column
/// unique constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    /// Index name
    pub name: String,
    /// Column(s) in the index with sort order
    pub columns: Vec<IndexColumn>,
    /// Whether this is a unique index
    pub unique: bool,
    /// Optional WHERE clause for partial indexes
    pub where_clause: Option<String>,
}

/// A table CHECK constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckConstraint {
    pub name: String,
    /// The boolean expression inside `CHECK (...)`
    pub expr: String,
}

/// A database table definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Columns, in attribute order
    pub columns: Vec<Column>,
    /// CHECK constraints
    pub check_constraints: Vec<CheckConstraint>,
    /// Foreign keys
    pub foreign_keys: Vec<ForeignKey>,
    /// Indices
    pub indices: Vec<Index>,
    /// Set when introspection met something this crate cannot model, such
    /// as a user-defined column type. Such a table can be compared but not
    /// rendered.
    pub unsupported: Option<String>,
}

impl Table {
    /// An empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            check_constraints: Vec::new(),
            foreign_keys: Vec::new(),
            indices: Vec::new(),
            unsupported: None,
        }
    }

    /// Builder-style helper to add a column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }
}

/// A complete database schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    /// Schema (namespace) name
    pub name: String,
    /// Tables in the schema, indexed by name
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: IndexMap::new(),
        }
    }

    /// Add a table, replacing any table of the same name.
    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Iterate over all tables.
    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

/// Quote a Postgres identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render the canonical definition of a table: its `CREATE TABLE`
/// statement followed by one `CREATE INDEX` per index, newline-terminated.
///
/// Names are never schema-qualified (except foreign keys into another
/// schema), so the text can be applied into any namespace.
pub fn table_definition_sql(table: &Table) -> String {
    let mut sql = create_table_sql(table);
    sql.push('\n');
    for idx in &table.indices {
        sql.push_str(&create_index_sql(table, idx));
        sql.push('\n');
    }
    sql
}

/// Generate CREATE TABLE SQL statement, foreign keys included.
pub fn create_table_sql(table: &Table) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", quote_ident(&table.name));

    let pk_columns: Vec<&str> = table
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();

    // If there's more than one PK column, we need a table constraint
    let use_table_pk_constraint = pk_columns.len() > 1;

    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|col| {
            let ty = match (col.auto, col.pg_type.serial_name()) {
                (Some(AutoGenerated::Serial), Some(serial)) => serial.to_string(),
                _ => col.pg_type.to_string(),
            };
            let mut def = format!("    {} {}", quote_ident(&col.name), ty);

            match col.auto {
                Some(AutoGenerated::IdentityAlways) => {
                    def.push_str(" GENERATED ALWAYS AS IDENTITY")
                }
                Some(AutoGenerated::IdentityByDefault) => {
                    def.push_str(" GENERATED BY DEFAULT AS IDENTITY")
                }
                _ => {}
            }

            // Only add inline PRIMARY KEY for single-column PKs
            if col.primary_key && !use_table_pk_constraint {
                def.push_str(" PRIMARY KEY");
            }

            // PK columns are implicitly NOT NULL
            if !col.nullable && (!col.primary_key || use_table_pk_constraint) {
                def.push_str(" NOT NULL");
            }

            if col.unique && !col.primary_key {
                def.push_str(" UNIQUE");
            }

            if let Some(default) = &col.default {
                def.push_str(&format!(" DEFAULT {}", default));
            }

            def
        })
        .collect();

    if use_table_pk_constraint {
        let quoted_pk_cols: Vec<_> = pk_columns.iter().map(|c| quote_ident(c)).collect();
        parts.push(format!("    PRIMARY KEY ({})", quoted_pk_cols.join(", ")));
    }

    for check in &table.check_constraints {
        parts.push(format!(
            "    CONSTRAINT {} CHECK ({})",
            quote_ident(&check.name),
            check.expr
        ));
    }

    for fk in &table.foreign_keys {
        parts.push(format!("    {}", foreign_key_sql(fk)));
    }

    sql.push_str(&parts.join(",\n"));
    sql.push_str("\n);");

    sql
}

/// Generate the table-constraint form of a foreign key.
pub fn foreign_key_sql(fk: &ForeignKey) -> String {
    let quoted_cols: Vec<_> = fk.columns.iter().map(|c| quote_ident(c)).collect();
    let quoted_ref_cols: Vec<_> = fk
        .references_columns
        .iter()
        .map(|c| quote_ident(c))
        .collect();
    let target = match &fk.references_schema {
        Some(schema) => format!(
            "{}.{}",
            quote_ident(schema),
            quote_ident(&fk.references_table)
        ),
        None => quote_ident(&fk.references_table),
    };
    let mut sql = format!(
        "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        quote_ident(&fk.name),
        quoted_cols.join(", "),
        target,
        quoted_ref_cols.join(", ")
    );
    if fk.on_delete != FkAction::NoAction {
        sql.push_str(&format!(" ON DELETE {}", fk.on_delete.to_sql()));
    }
    if fk.on_update != FkAction::NoAction {
        sql.push_str(&format!(" ON UPDATE {}", fk.on_update.to_sql()));
    }
    sql
}

/// Generate CREATE INDEX SQL statement for a given index.
pub fn create_index_sql(table: &Table, idx: &Index) -> String {
    let unique = if idx.unique { "UNIQUE " } else { "" };
    let cols: Vec<_> = idx.columns.iter().map(index_column_to_sql).collect();
    let where_clause = idx
        .where_clause
        .as_ref()
        .map(|w| format!(" WHERE {}", w))
        .unwrap_or_default();
    format!(
        "CREATE {}INDEX {} ON {} ({}){};",
        unique,
        quote_ident(&idx.name),
        quote_ident(&table.name),
        cols.join(", "),
        where_clause
    )
}

/// Returns the SQL fragment for an index column (name + order + nulls).
///
/// Plain identifiers are quoted; expressions (anything containing a
/// parenthesis or already quoted) are emitted verbatim.
pub fn index_column_to_sql(col: &IndexColumn) -> String {
    let name = if col.name.contains('(') || col.name.starts_with('"') {
        col.name.clone()
    } else {
        quote_ident(&col.name)
    };
    format!("{}{}{}", name, col.order.to_sql(), col.nulls.to_sql())
}
