#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use pgtree::pgtree_db_schema::{Column, FkAction, ForeignKey, PgType};
use pgtree::{
    ConnectParams, Connector, DirConfig, Error, Instance, Result, Schema, Table,
    table_definition_sql,
};
use std::collections::BTreeMap;
use std::fs;
use std::sync::{Arc, Mutex};

/// An in-memory database.
///
/// Executing SQL only understands definitions this instance rendered (or
/// was told about with [`FakeInstance::definition`]): the text is looked up
/// and the matching table is created.
#[derive(Default)]
pub struct FakeInstance {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    schemas: BTreeMap<String, Schema>,
    known: Vec<Table>,
    fail_drop: Option<String>,
    calls: Vec<String>,
}

impl FakeInstance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a live schema.
    pub fn set_schema(&self, name: &str, tables: Vec<Table>) {
        let mut schema = Schema::new(name);
        for table in tables {
            schema.insert(table);
        }
        self.state.lock().unwrap().schemas.insert(name.to_string(), schema);
    }

    pub fn remove_schema(&self, name: &str) {
        self.state.lock().unwrap().schemas.remove(name);
    }

    pub fn has_schema(&self, name: &str) -> bool {
        self.state.lock().unwrap().schemas.contains_key(name)
    }

    /// Canonical text of `table`, remembered so it can be executed later.
    pub fn definition(&self, table: &Table) -> String {
        let mut state = self.state.lock().unwrap();
        state.known.push(table.clone());
        table_definition_sql(table)
    }

    /// Make dropping `schema` fail while it exists.
    pub fn fail_drop_of(&self, schema: &str) {
        self.state.lock().unwrap().fail_drop = Some(schema.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

impl Instance for FakeInstance {
    fn name(&self) -> &str {
        "fake"
    }

    async fn schema_names(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("schema_names".to_string());
        Ok(state.schemas.keys().cloned().collect())
    }

    async fn schema(&self, name: &str) -> Result<Option<Schema>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("schema {}", name));
        Ok(state.schemas.get(name).cloned())
    }

    async fn show_create_table(&self, schema: &str, table: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .schemas
            .get(schema)
            .and_then(|s| s.get_table(table))
            .cloned()
            .ok_or_else(|| Error::Introspection(format!("no table {}.{}", schema, table)))?;
        state.known.push(found.clone());
        Ok(table_definition_sql(&found))
    }

    async fn create_schema(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create_schema {}", name));
        if state.schemas.contains_key(name) {
            return Err(Error::Introspection(format!("schema {} already exists", name)));
        }
        state.schemas.insert(name.to_string(), Schema::new(name));
        Ok(())
    }

    async fn drop_schema(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("drop_schema {}", name));
        if state.fail_drop.as_deref() == Some(name) && state.schemas.contains_key(name) {
            return Err(Error::Introspection(format!(
                "permission denied to drop schema {}",
                name
            )));
        }
        state.schemas.remove(name);
        Ok(())
    }

    async fn execute_in_schema(&self, schema: &str, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("execute_in_schema {}", schema));
        let table = state
            .known
            .iter()
            .find(|t| table_definition_sql(t) == sql)
            .cloned()
            .ok_or_else(|| Error::Introspection("syntax error".to_string()))?;

        let target = state
            .schemas
            .get_mut(schema)
            .ok_or_else(|| Error::Introspection(format!("schema {} does not exist", schema)))?;
        for fk in &table.foreign_keys {
            if fk.references_schema.is_none()
                && fk.references_table != table.name
                && target.get_table(&fk.references_table).is_none()
            {
                return Err(Error::Introspection(format!(
                    "relation \"{}\" does not exist",
                    fk.references_table
                )));
            }
        }
        if target.get_table(&table.name).is_some() {
            return Err(Error::Introspection(format!(
                "relation \"{}\" already exists",
                table.name
            )));
        }
        target.insert(table);
        Ok(())
    }
}

/// Hands out the same [`FakeInstance`] for every connection.
pub struct FakeConnector {
    pub instance: Arc<FakeInstance>,
    pub connects: Mutex<Vec<ConnectParams>>,
}

impl FakeConnector {
    pub fn new(instance: Arc<FakeInstance>) -> Self {
        Self {
            instance,
            connects: Mutex::new(Vec::new()),
        }
    }
}

impl Connector for FakeConnector {
    type Instance = FakeInstance;

    async fn connect(&self, params: &ConnectParams) -> Result<Arc<FakeInstance>> {
        self.connects.lock().unwrap().push(params.clone());
        Ok(self.instance.clone())
    }
}

pub fn tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    (tmp, path)
}

pub fn instance_config() -> DirConfig {
    DirConfig {
        host: Some("db.test".to_string()),
        database: Some("shop".to_string()),
        ..Default::default()
    }
}

pub fn write_config(dir: &Utf8Path, config: &DirConfig) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(pgtree::pgtree_config::FILE_NAME), config.to_styx()).unwrap();
}

/// Names of the `.sql` files in `dir`, sorted.
pub fn sql_file_names(dir: &Utf8Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|n| n.ends_with(".sql"))
        .collect();
    names.sort();
    names
}

pub fn table(name: &str, columns: &[(&str, PgType)]) -> Table {
    let mut table = Table::new(name);
    for (i, (col, ty)) in columns.iter().enumerate() {
        let mut column = Column::new(*col, *ty);
        if i == 0 {
            column.nullable = false;
            column.primary_key = true;
        }
        table.columns.push(column);
    }
    table
}

pub fn orders() -> Table {
    let mut orders = table(
        "orders",
        &[
            ("id", PgType::BigInt),
            ("customer_id", PgType::BigInt),
            ("total", PgType::Numeric(Some((10, 2)))),
        ],
    );
    orders.foreign_keys.push(ForeignKey {
        name: "orders_customer_id_fkey".to_string(),
        columns: vec!["customer_id".to_string()],
        references_schema: None,
        references_table: "customers".to_string(),
        references_columns: vec!["id".to_string()],
        on_delete: FkAction::Cascade,
        on_update: FkAction::NoAction,
    });
    orders
}

pub fn customers() -> Table {
    table("customers", &[("id", PgType::BigInt), ("email", PgType::Text)])
}
