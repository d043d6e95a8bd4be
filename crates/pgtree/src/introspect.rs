//! Read schema snapshots out of the Postgres catalog.
//!
//! The same queries serve the live schema and the temporary schema the
//! on-disk definitions were staged into, so both snapshots come out shaped
//! identically and can be diffed column by column.

use crate::traced::ConnectionExt;
use crate::{Error, Result};
use pgtree_db_schema::{
    AutoGenerated, CheckConstraint, Column, FkAction, ForeignKey, Index, IndexColumn, PgType,
    Schema, Table,
};
use tokio_postgres::Client;

const SCHEMA_NAMES_SQL: &str = r#"
    SELECT nspname::text
    FROM pg_catalog.pg_namespace
    WHERE nspname NOT IN ('pg_catalog', 'information_schema', 'pg_toast')
      AND nspname NOT LIKE 'pg\_temp\_%'
      AND nspname NOT LIKE 'pg\_toast\_temp\_%'
    ORDER BY nspname
"#;

const SCHEMA_EXISTS_SQL: &str = r#"
    SELECT 1 FROM pg_catalog.pg_namespace WHERE nspname = $1
"#;

const TABLE_NAMES_SQL: &str = r#"
    SELECT c.relname::text
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1 AND c.relkind IN ('r', 'p') AND NOT c.relispartition
    ORDER BY c.relname
"#;

const COLUMNS_SQL: &str = r#"
    SELECT
        a.attname::text,
        pg_catalog.format_type(a.atttypid, a.atttypmod),
        NOT a.attnotnull,
        pg_catalog.pg_get_expr(d.adbin, d.adrelid),
        a.attidentity::text,
        a.attgenerated::text
    FROM pg_catalog.pg_attribute a
    JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = a.attrelid AND d.adnum = a.attnum
    WHERE n.nspname = $1 AND c.relname = $2 AND a.attnum > 0 AND NOT a.attisdropped
    ORDER BY a.attnum
"#;

const CONSTRAINTS_SQL: &str = r#"
    SELECT
        con.conname::text,
        con.contype::text,
        ARRAY(
            SELECT att.attname::text
            FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
            JOIN pg_catalog.pg_attribute att
              ON att.attrelid = con.conrelid AND att.attnum = k.attnum
            ORDER BY k.ord
        ),
        fn.nspname::text,
        fc.relname::text,
        ARRAY(
            SELECT att.attname::text
            FROM unnest(con.confkey) WITH ORDINALITY AS k(attnum, ord)
            JOIN pg_catalog.pg_attribute att
              ON att.attrelid = con.confrelid AND att.attnum = k.attnum
            ORDER BY k.ord
        ),
        con.confdeltype::text,
        con.confupdtype::text,
        pg_catalog.pg_get_constraintdef(con.oid, true)
    FROM pg_catalog.pg_constraint con
    JOIN pg_catalog.pg_class c ON c.oid = con.conrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    LEFT JOIN pg_catalog.pg_class fc ON fc.oid = con.confrelid
    LEFT JOIN pg_catalog.pg_namespace fn ON fn.oid = fc.relnamespace
    WHERE n.nspname = $1 AND c.relname = $2
    ORDER BY con.conname
"#;

// Indexes backing the primary key or a single-column unique constraint are
// already described by the column flags.
const INDEXES_SQL: &str = r#"
    SELECT
        i.relname::text,
        ix.indisunique,
        am.amname::text,
        pg_catalog.pg_get_expr(ix.indpred, ix.indrelid),
        ARRAY(
            SELECT pg_catalog.pg_get_indexdef(ix.indexrelid, k + 1, true)
            FROM generate_subscripts(ix.indkey, 1) AS k
            WHERE k < ix.indnkeyatts
            ORDER BY k
        ),
        ARRAY(
            SELECT ix.indoption[k]::int4
            FROM generate_subscripts(ix.indkey, 1) AS k
            WHERE k < ix.indnkeyatts
            ORDER BY k
        )
    FROM pg_catalog.pg_index ix
    JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
    JOIN pg_catalog.pg_am am ON am.oid = i.relam
    JOIN pg_catalog.pg_class c ON c.oid = ix.indrelid
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1 AND c.relname = $2
      AND NOT ix.indisprimary
      AND NOT EXISTS (
          SELECT 1 FROM pg_catalog.pg_constraint con
          WHERE con.conindid = ix.indexrelid
            AND con.contype = 'u'
            AND array_length(con.conkey, 1) = 1
      )
    ORDER BY i.relname
"#;

/// Names of all non-system schemas, sorted.
pub async fn schema_names(client: &Client) -> Result<Vec<String>> {
    let rows = client.traced().query(SCHEMA_NAMES_SQL, &[]).await?;
    rows.iter()
        .map(|row| row.try_get::<_, String>(0).map_err(Error::from))
        .collect()
}

/// Snapshot of one schema, or `None` if it does not exist.
pub async fn load_schema(client: &Client, name: &str) -> Result<Option<Schema>> {
    let conn = client.traced();
    if conn.query_opt(SCHEMA_EXISTS_SQL, &[&name]).await?.is_none() {
        return Ok(None);
    }

    let mut schema = Schema::new(name);
    for row in conn.query(TABLE_NAMES_SQL, &[&name]).await? {
        let table_name: String = row.try_get(0)?;
        if let Some(table) = load_table(client, name, &table_name).await? {
            schema.insert(table);
        }
    }
    Ok(Some(schema))
}

/// Snapshot of one table, or `None` if it has no columns (it does not exist).
pub async fn load_table(client: &Client, schema: &str, name: &str) -> Result<Option<Table>> {
    let conn = client.traced();
    let mut table = Table::new(name);

    for row in conn.query(COLUMNS_SQL, &[&schema, &name]).await? {
        let col_name: String = row.try_get(0)?;
        let type_name: String = row.try_get(1)?;
        let nullable: bool = row.try_get(2)?;
        let default: Option<String> = row.try_get(3)?;
        let identity: String = row.try_get(4)?;
        let generated: String = row.try_get(5)?;

        let Some(pg_type) = PgType::from_sql_name(&type_name) else {
            mark_unsupported(
                &mut table,
                format!("column {} has unsupported type {}", col_name, type_name),
            );
            continue;
        };
        if !generated.trim().is_empty() {
            mark_unsupported(&mut table, format!("column {} is a generated column", col_name));
        }

        let mut column = Column::new(col_name, pg_type);
        column.nullable = nullable;
        column.auto = match identity.as_str() {
            "a" => Some(AutoGenerated::IdentityAlways),
            "d" => Some(AutoGenerated::IdentityByDefault),
            _ => None,
        };
        match default {
            Some(expr) if expr.starts_with("nextval(") && pg_type.serial_name().is_some() => {
                column.auto = Some(AutoGenerated::Serial);
            }
            other => column.default = other,
        }
        table.columns.push(column);
    }

    if table.columns.is_empty() && table.unsupported.is_none() {
        return Ok(None);
    }

    for row in conn.query(CONSTRAINTS_SQL, &[&schema, &name]).await? {
        let con_name: String = row.try_get(0)?;
        let kind: String = row.try_get(1)?;
        let columns: Vec<String> = row.try_get(2)?;

        match kind.as_str() {
            "p" => {
                for col in &columns {
                    if let Some(column) = column_mut(&mut table, col)? {
                        column.primary_key = true;
                    }
                }
            }
            "u" => {
                // Multi-column unique constraints surface through their index
                if let [col] = columns.as_slice()
                    && let Some(column) = column_mut(&mut table, col)?
                {
                    column.unique = true;
                }
            }
            "f" => {
                let ref_schema: Option<String> = row.try_get(3)?;
                let ref_table: Option<String> = row.try_get(4)?;
                let ref_columns: Vec<String> = row.try_get(5)?;
                let on_delete: String = row.try_get(6)?;
                let on_update: String = row.try_get(7)?;
                let ref_table = ref_table.ok_or_else(|| {
                    Error::Introspection(format!(
                        "foreign key {} on {}.{} has no referenced table",
                        con_name, schema, name
                    ))
                })?;
                table.foreign_keys.push(ForeignKey {
                    name: con_name,
                    columns,
                    references_schema: ref_schema.filter(|s| s != schema),
                    references_table: ref_table,
                    references_columns: ref_columns,
                    on_delete: FkAction::from_code(&on_delete),
                    on_update: FkAction::from_code(&on_update),
                });
            }
            "c" => {
                let definition: String = row.try_get(8)?;
                table.check_constraints.push(CheckConstraint {
                    name: con_name,
                    expr: check_expression(&definition).to_string(),
                });
            }
            // NOT NULL constraints are already captured by attnotnull
            "n" => {}
            other => mark_unsupported(
                &mut table,
                format!("constraint {} has unsupported kind '{}'", con_name, other),
            ),
        }
    }

    for row in conn.query(INDEXES_SQL, &[&schema, &name]).await? {
        let idx_name: String = row.try_get(0)?;
        let unique: bool = row.try_get(1)?;
        let method: String = row.try_get(2)?;
        let where_clause: Option<String> = row.try_get(3)?;
        let columns: Vec<String> = row.try_get(4)?;
        let options: Vec<i32> = row.try_get(5)?;

        if method != "btree" {
            mark_unsupported(
                &mut table,
                format!("index {} uses access method {}", idx_name, method),
            );
            continue;
        }

        table.indices.push(Index {
            name: idx_name,
            columns: columns
                .into_iter()
                .zip(options.into_iter().chain(std::iter::repeat(0)))
                .map(|(col, opt)| IndexColumn::from_indoption(col, opt))
                .collect(),
            unique,
            where_clause,
        });
    }

    Ok(Some(table))
}

/// Find a column a constraint refers to.
///
/// Columns of unsupported types are never loaded, so on a table already
/// marked unsupported a missing column is expected.
fn column_mut<'a>(table: &'a mut Table, name: &str) -> Result<Option<&'a mut Column>> {
    let unsupported = table.unsupported.is_some();
    let table_name = table.name.clone();
    match table.columns.iter_mut().find(|c| c.name == name) {
        Some(column) => Ok(Some(column)),
        None if unsupported => Ok(None),
        None => Err(Error::Introspection(format!(
            "constraint on {} references unknown column {}",
            table_name, name
        ))),
    }
}

// Keeps the first reason.
fn mark_unsupported(table: &mut Table, reason: String) {
    if table.unsupported.is_none() {
        table.unsupported = Some(reason);
    }
}

/// Strip `CHECK (` ... `)` from a `pg_get_constraintdef` result.
fn check_expression(definition: &str) -> &str {
    let def = definition.trim();
    let def = def.strip_suffix(" NOT VALID").unwrap_or(def);
    def.strip_prefix("CHECK (")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(def)
}
