//! SQLite implementation of the library store.
//!
//! Four flat TEXT tables, one per item-type, rebuilt wholesale by the
//! indexer. Column metadata is always introspected from the live schema
//! (PRAGMA table_info), never hardcoded.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;

use super::item_type::{ItemType, CONTENT_COLUMN};
use super::trait_def::LibraryStore;

/// One mirrored row, values in declared column order, content blob last.
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryRow {
    values: Vec<String>,
}

impl LibraryRow {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// First column of every item-type.
    pub fn title(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or_default()
    }

    /// The serialized remote record, stored as the trailing column.
    pub fn content(&self) -> &str {
        self.values.last().map(String::as_str).unwrap_or_default()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

pub struct SqliteLibraryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteLibraryStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create library directory {}", parent.display())
            })?;
        }
        let connection = Connection::open(path)
            .with_context(|| format!("Failed to open library database {}", path.display()))?;
        debug!(path = %path.display(), "opened music library database");
        Ok(Self::from_connection(connection))
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("Failed to open in-memory library database")?;
        Ok(Self::from_connection(connection))
    }

    fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn insert_row(
        conn: &Connection,
        item_type: ItemType,
        columns: &[String],
        values: &[String],
    ) -> Result<()> {
        if values.len() != columns.len() {
            bail!(
                "Expected {} values for table {}, got {}",
                columns.len(),
                item_type.table_name(),
                values.len()
            );
        }
        let mut stmt = conn.prepare_cached(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            item_type.table_name(),
            columns.join(", "),
            placeholders(columns.len())
        ))?;
        stmt.execute(params_from_iter(values.iter()))?;
        Ok(())
    }
}

impl LibraryStore for SqliteLibraryStore {
    fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.connection.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map(params![], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn create_schema(&self) -> Result<()> {
        let existing = self.table_names()?;
        if !existing.is_empty() {
            bail!(
                "Cannot create library tables, database already contains: {}",
                existing.join(", ")
            );
        }
        let conn = self.connection.lock().unwrap();
        for item_type in ItemType::ALL {
            conn.execute(&create_table_sql(item_type), params![])?;
        }
        debug!("created library schema");
        Ok(())
    }

    fn drop_schema(&self) -> Result<()> {
        let conn = self.connection.lock().unwrap();
        for item_type in ItemType::ALL {
            conn.execute(&format!("DROP TABLE {}", item_type.table_name()), params![])
                .with_context(|| format!("Failed to drop table {}", item_type.table_name()))?;
        }
        debug!("dropped library schema");
        Ok(())
    }

    fn columns_of(&self, item_type: ItemType) -> Result<Vec<String>> {
        let conn = self.connection.lock().unwrap();
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", item_type.table_name()))?;
        let columns = stmt
            .query_map(params![], |row| row.get(1))?
            .collect::<Result<Vec<String>, _>>()?;
        if columns.is_empty() {
            bail!("No such table '{}'", item_type.table_name());
        }
        Ok(columns)
    }

    fn insert(&self, item_type: ItemType, values: &[String]) -> Result<()> {
        let columns = self.columns_of(item_type)?;
        let conn = self.connection.lock().unwrap();
        Self::insert_row(&conn, item_type, &columns, values)
    }

    fn insert_page(&self, item_type: ItemType, rows: &[Vec<String>]) -> Result<()> {
        let columns = self.columns_of(item_type)?;
        let mut conn = self.connection.lock().unwrap();
        let tx = conn.transaction()?;
        for values in rows {
            Self::insert_row(&tx, item_type, &columns, values)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn search_by_field(
        &self,
        item_type: ItemType,
        field: &str,
        pattern: &str,
    ) -> Result<Vec<LibraryRow>> {
        let columns = self.columns_of(item_type)?;
        if field == CONTENT_COLUMN || !columns.iter().any(|column| column == field) {
            bail!(
                "'{}' is not a searchable column of {}",
                field,
                item_type.table_name()
            );
        }
        let conn = self.connection.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM {} WHERE {} LIKE ?1 ORDER BY rowid",
            columns.join(", "),
            item_type.table_name(),
            field
        ))?;
        let rows = stmt
            .query_map(params![pattern], |row| {
                let mut values = Vec::with_capacity(columns.len());
                for index in 0..columns.len() {
                    values.push(row.get::<_, String>(index)?);
                }
                Ok(LibraryRow::new(values))
            })?
            .collect::<Result<Vec<LibraryRow>, _>>()?;
        Ok(rows)
    }

    fn count(&self, item_type: ItemType) -> Result<i64> {
        let conn = self.connection.lock().unwrap();
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", item_type.table_name()),
            params![],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn create_table_sql(item_type: ItemType) -> String {
    let columns = item_type
        .columns()
        .iter()
        .map(|column| format!("{column} TEXT"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE TABLE {} ({})", item_type.table_name(), columns)
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ")
}
