//! SQLite storage backend

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::traits::{NewResource, OpenStore, ResourceFilter, StorageError, StorageResult, TagStore};
use crate::query::ResourceQuery;
use crate::tag::{Relation, RelationKey, Resource, ResourceId};

/// Table names used by a [`SqliteStore`].
///
/// Identifiers are restricted to word characters because they are spliced
/// into SQL; everything else goes through bound parameters.
#[derive(Debug, Clone)]
pub struct Tables {
    resources: String,
    relations: String,
}

impl Tables {
    /// Table names for resources and relations.
    pub fn new(resources: impl Into<String>, relations: impl Into<String>) -> StorageResult<Self> {
        let resources = resources.into();
        let relations = relations.into();
        for name in [&resources, &relations] {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(StorageError::InvalidIdentifier(name.clone()));
            }
        }
        Ok(Self {
            resources,
            relations,
        })
    }

    /// The resource table name.
    pub fn resources(&self) -> &str {
        &self.resources
    }

    /// The relation table name.
    pub fn relations(&self) -> &str {
        &self.relations
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            resources: "res".to_string(),
            relations: "rel".to_string(),
        }
    }
}

/// SQLite-backed tag store
///
/// A single database file with a resource table and a relation table.
/// Thread-safe via internal mutex on the connection. Opening a store
/// creates the schema idempotently and inserts the reserved resource rows
/// (empty, root, class meta-resource).
pub struct SqliteStore {
    conn: Mutex<Connection>,
    tables: Tables,
}

impl SqliteStore {
    /// Open or create a store at the given path with custom table names.
    pub fn open_with_tables(path: impl AsRef<Path>, tables: Tables) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn, &tables)?;

        Ok(Self {
            conn: Mutex::new(conn),
            tables,
        })
    }

    /// Create an in-memory store with custom table names.
    pub fn in_memory_with_tables(tables: Tables) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn, &tables)?;

        Ok(Self {
            conn: Mutex::new(conn),
            tables,
        })
    }

    /// Initialize the database schema and the reserved resource rows.
    fn init_schema(conn: &Connection, tables: &Tables) -> StorageResult<()> {
        let res = tables.resources();
        let rel = tables.relations();

        conn.execute_batch(&format!(
            r#"
            -- Resource table: one row per taggable thing
            CREATE TABLE IF NOT EXISTS {res} (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                uri     TEXT UNIQUE,
                class   INTEGER,
                value   TEXT,
                content TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_{res}_class ON {res}(class);
            CREATE INDEX IF NOT EXISTS idx_{res}_value ON {res}(value);

            -- Relation table: the 4-tuple is the full primary key, an
            -- unset role is stored as the empty resource id
            CREATE TABLE IF NOT EXISTS {rel} (
                subject   INTEGER NOT NULL DEFAULT 0,
                predicate INTEGER NOT NULL DEFAULT 0,
                object    INTEGER NOT NULL DEFAULT 0,
                creator   INTEGER NOT NULL DEFAULT 0,
                created   TEXT NOT NULL,
                PRIMARY KEY (subject, predicate, object, creator)
            );

            CREATE INDEX IF NOT EXISTS idx_{rel}_created ON {rel}(created);

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        ))?;

        // Reserved rows: empty (0), root (1) and the class meta-resource
        // (2), all classed under the root.
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {res} (id, class, value)
                 VALUES (0, 1, 'empty'), (1, 1, 'taggg'), (2, 1, 'class')"
            ),
            [],
        )?;

        Ok(())
    }

    /// Drop both tables and all data.
    pub fn destroy(&self) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {res}; DROP TABLE IF EXISTS {rel};",
            res = self.tables.resources(),
            rel = self.tables.relations()
        ))?;
        Ok(())
    }

    /// Deserialize a resource row (id, uri, class, value, content).
    fn row_to_resource(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resource> {
        Ok(Resource {
            id: ResourceId::new(row.get(0)?),
            uri: row.get(1)?,
            class: row.get::<_, Option<i64>>(2)?.map(ResourceId::new),
            value: row.get(3)?,
            content: row.get(4)?,
        })
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_tables(path, Tables::default())
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::in_memory_with_tables(Tables::default())
    }
}

impl TagStore for SqliteStore {
    // === Resource operations ===

    fn find_resource(&self, filter: &ResourceFilter) -> StorageResult<Option<Resource>> {
        if filter.is_unset() {
            return Ok(None);
        }

        let conn = self.conn.lock().unwrap();
        let (where_sql, params_vec) = filter_clauses(filter);
        let sql = format!(
            "SELECT id, uri, class, value, content FROM {res} WHERE {where_sql} LIMIT 1",
            res = self.tables.resources()
        );
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

        Ok(conn
            .query_row(&sql, params_refs.as_slice(), Self::row_to_resource)
            .optional()?)
    }

    fn insert_resource(&self, attrs: &NewResource) -> StorageResult<Option<ResourceId>> {
        if attrs.is_unset() {
            return Ok(None);
        }

        let conn = self.conn.lock().unwrap();
        let mut columns: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref uri) = attrs.uri {
            columns.push("uri");
            params_vec.push(Box::new(uri.clone()));
        }
        if let Some(class) = attrs.class {
            columns.push("class");
            params_vec.push(Box::new(class.raw()));
        }
        if let Some(ref value) = attrs.value {
            columns.push("value");
            params_vec.push(Box::new(value.clone()));
        }
        if let Some(ref content) = attrs.content {
            columns.push("content");
            params_vec.push(Box::new(content.clone()));
        }

        let placeholders: Vec<String> = (1..=params_vec.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT OR IGNORE INTO {res} ({cols}) VALUES ({vals})",
            res = self.tables.resources(),
            cols = columns.join(", "),
            vals = placeholders.join(", ")
        );
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

        let rows = conn.execute(&sql, params_refs.as_slice())?;
        if rows == 0 {
            // Duplicate uri: the insert was ignored
            return Ok(None);
        }

        Ok(Some(ResourceId::new(conn.last_insert_rowid())))
    }

    fn update_resource(&self, id: ResourceId, attrs: &NewResource) -> StorageResult<usize> {
        if attrs.is_unset() {
            return Ok(0);
        }

        let conn = self.conn.lock().unwrap();
        let mut sets: Vec<String> = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref uri) = attrs.uri {
            sets.push(format!("uri = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(uri.clone()));
        }
        if let Some(class) = attrs.class {
            sets.push(format!("class = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(class.raw()));
        }
        if let Some(ref value) = attrs.value {
            sets.push(format!("value = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(value.clone()));
        }
        if let Some(ref content) = attrs.content {
            sets.push(format!("content = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(content.clone()));
        }

        let sql = format!(
            "UPDATE {res} SET {sets} WHERE id = ?{n}",
            res = self.tables.resources(),
            sets = sets.join(", "),
            n = params_vec.len() + 1
        );
        params_vec.push(Box::new(id.raw()));
        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();

        Ok(conn.execute(&sql, params_refs.as_slice())?)
    }

    fn delete_resource(&self, id: ResourceId) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        Ok(conn.execute(
            &format!("DELETE FROM {res} WHERE id = ?1", res = self.tables.resources()),
            params![id.raw()],
        )?)
    }

    fn find_resources(&self, query: &ResourceQuery) -> StorageResult<Vec<Resource>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!(
            "SELECT id, uri, class, value, content FROM {res}",
            res = self.tables.resources()
        );
        let (where_sql, params_vec) = filter_clauses(&query.filter);
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        if !query.orders.is_empty() {
            let keys: Vec<String> = query
                .orders
                .iter()
                .map(|key| format!("{} {}", key.field.as_str(), key.order.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        } else if query.offset.is_some() {
            // SQLite requires a LIMIT clause before OFFSET
            sql.push_str(" LIMIT -1");
        }
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_refs.as_slice(), Self::row_to_resource)?;

        let mut resources = Vec::new();
        for row in rows {
            resources.push(row?);
        }
        Ok(resources)
    }

    // === Relation operations ===

    fn fetch_relation(&self, key: &RelationKey) -> StorageResult<Option<Relation>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(i64, i64, i64, i64, String)> = conn
            .query_row(
                &format!(
                    "SELECT subject, predicate, object, creator, created FROM {rel}
                     WHERE subject = ?1 AND predicate = ?2 AND object = ?3 AND creator = ?4",
                    rel = self.tables.relations()
                ),
                params![
                    key.subject().raw(),
                    key.predicate().raw(),
                    key.object().raw(),
                    key.creator().raw()
                ],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((subject, predicate, object, creator, created)) => Ok(Some(Relation {
                subject: ResourceId::new(subject),
                predicate: ResourceId::new(predicate),
                object: ResourceId::new(object),
                creator: ResourceId::new(creator),
                created: parse_timestamp(&created)?,
            })),
            None => Ok(None),
        }
    }

    fn create_relation(&self, key: &RelationKey) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {rel} (subject, predicate, object, creator, created)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rel = self.tables.relations()
            ),
            params![
                key.subject().raw(),
                key.predicate().raw(),
                key.object().raw(),
                key.creator().raw(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(rows)
    }

    fn delete_relation(&self, key: &RelationKey) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            &format!(
                "DELETE FROM {rel}
                 WHERE subject = ?1 AND predicate = ?2 AND object = ?3 AND creator = ?4",
                rel = self.tables.relations()
            ),
            params![
                key.subject().raw(),
                key.predicate().raw(),
                key.object().raw(),
                key.creator().raw()
            ],
        )?;
        Ok(rows)
    }
}

/// WHERE clauses and bound parameters for the set fields of a filter.
fn filter_clauses(filter: &ResourceFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(id) = filter.id {
        clauses.push(format!("id = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(id.raw()));
    }
    if let Some(ref uri) = filter.uri {
        clauses.push(format!("uri = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(uri.clone()));
    }
    if let Some(class) = filter.class {
        clauses.push(format!("class = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(class.raw()));
    }
    if let Some(ref value) = filter.value {
        clauses.push(format!("value = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(value.clone()));
    }
    if let Some(ref content) = filter.content {
        clauses.push(format!("content = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(content.clone()));
    }

    (clauses.join(" AND "), params_vec)
}

/// Parse a store-assigned RFC 3339 timestamp.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::TimestampParse(e.to_string()))
}
