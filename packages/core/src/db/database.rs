//! Database Connection Management
//!
//! This module provides the database connection, schema initialization and the
//! raw SQL behind every `NodeStore` operation, using libsql (embedded,
//! SQLite-compatible).
//!
//! # Architecture
//!
//! - **Path-agnostic**: Accepts any valid PathBuf; missing parent directories are created
//! - **Flat table**: One `nodes` row per node, `parent_id` is a plain column
//! - **No foreign key on parent_id**: Dangling parents are accepted and become orphans
//! - **WAL mode**: Write-Ahead Logging for better concurrency
//!
//! # Database Connection Patterns
//!
//! **ALWAYS use `connect_with_timeout()` in async functions.** The 5-second busy
//! timeout lets concurrent writers wait instead of failing with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use nodetree_core::db::DatabaseService;
//! # use std::path::PathBuf;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::new(PathBuf::from("./data/nodetree.db")).await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use crate::models::{BulkWriteReport, Node, NodePatch, RecordFailure};
use libsql::params::Params;
use libsql::{Builder, Database, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Upper bound on ids bound into a single `DELETE ... IN (...)` statement
const DELETE_CHUNK_SIZE: usize = 500;

/// Column list shared by every SELECT that is converted back into a `Node`
const NODE_COLUMNS: &str = "id, name, parent_id, data";

/// Database service for managing libsql connection and schema
///
/// # Examples
///
/// ```no_run
/// use nodetree_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_service = DatabaseService::new(PathBuf::from("/path/to/nodetree.db")).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl DatabaseService {
    /// Create a new DatabaseService with the specified database path
    ///
    /// This will:
    /// 1. Ensure the parent directory exists (create if needed)
    /// 2. Open/create the database file
    /// 3. Initialize the schema (CREATE TABLE IF NOT EXISTS)
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - The path is empty
    /// - Parent directory cannot be created
    /// - Database connection fails
    /// - Schema initialization fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if db_path.as_os_str().is_empty() {
            return Err(DatabaseError::invalid_path(db_path));
        }

        let is_new_database = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };

        service.initialize_schema(is_new_database).await?;

        tracing::info!("Opened node database at {}", service.db_path.display());

        Ok(service)
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Initialize database schema and configuration
    ///
    /// Idempotent: safe to call on an existing database.
    ///
    /// # Schema
    ///
    /// - `nodes` table: `id` primary key, `name`, nullable `parent_id` and `data`
    /// - `idx_nodes_parent`: parent lookups for cascade discovery
    async fn initialize_schema(&self, is_new_database: bool) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                parent_id TEXT,
                data TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                modified_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!("Failed to create nodes table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id)",
            (),
        )
        .await
        .map_err(|e| {
            DatabaseError::initialization_failed(format!(
                "Failed to create index 'idx_nodes_parent': {}",
                e
            ))
        })?;

        // Flush the fresh schema so a second handle on the same file sees it
        if is_new_database {
            self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
                .await?;
        }

        Ok(())
    }

    /// Get a synchronous connection to the database
    ///
    /// Only use this in synchronous contexts where the connection never crosses
    /// an `.await`. Async code should call `connect_with_timeout()`.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::Libsql)
    }

    /// Get an async connection with busy timeout configured
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        Ok(conn)
    }

    //
    // NODE STORE OPERATIONS
    // Raw SQL wrapped by the NodeStore trait implementation (TursoStore).
    //

    /// Insert a single node
    ///
    /// Fails on duplicate id (primary key constraint).
    pub async fn db_create_node(&self, node: &Node) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        conn.execute(
            "INSERT INTO nodes (id, name, parent_id, data) VALUES (?, ?, ?, ?)",
            (
                node.id.as_str(),
                node.name.as_str(),
                node.parent_id.as_deref(),
                node.data.as_deref(),
            ),
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to insert node {}: {}", node.id, e))
        })?;

        Ok(())
    }

    /// Retrieve a single node row by ID
    ///
    /// Columns are [`NODE_COLUMNS`]; the caller converts the row.
    pub async fn db_get_node(&self, id: &str) -> Result<Option<libsql::Row>, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM nodes WHERE id = ?", NODE_COLUMNS))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare get_node query: {}", e))
            })?;

        let mut rows = stmt.query([id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute get_node query: {}", e))
        })?;

        rows.next()
            .await
            .map_err(|e| DatabaseError::sql_execution(e.to_string()))
    }

    /// Insert many nodes, unordered and best-effort
    ///
    /// Each record is a separate statement outside any transaction: a rejected
    /// record (duplicate id, constraint violation) is reported in the returned
    /// failures and the remaining records are still inserted.
    ///
    /// # Errors
    ///
    /// Only an outright failure of the write path (no connection) is an error.
    pub async fn db_insert_many(&self, nodes: &[Node]) -> Result<BulkWriteReport, DatabaseError> {
        let mut report = BulkWriteReport::default();
        if nodes.is_empty() {
            return Ok(report);
        }

        let conn = self.connect_with_timeout().await?;

        for node in nodes {
            let result = conn
                .execute(
                    "INSERT INTO nodes (id, name, parent_id, data) VALUES (?, ?, ?, ?)",
                    (
                        node.id.as_str(),
                        node.name.as_str(),
                        node.parent_id.as_deref(),
                        node.data.as_deref(),
                    ),
                )
                .await;

            match result {
                Ok(_) => report.affected += 1,
                Err(e) => {
                    tracing::warn!("Skipping node {} in bulk insert: {}", node.id, e);
                    report
                        .failures
                        .push(RecordFailure::new(node.id.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Apply many sparse patches, unordered and best-effort
    ///
    /// `affected` counts rows whose stored values actually changed. Patches for
    /// unknown ids and patches that restate current values count zero.
    pub async fn db_patch_many(
        &self,
        patches: &[NodePatch],
    ) -> Result<BulkWriteReport, DatabaseError> {
        let mut report = BulkWriteReport::default();

        let statements: Vec<(&str, PatchStatement)> = patches
            .iter()
            .filter_map(|patch| {
                PatchStatement::build(patch).map(|stmt| (patch.id.as_str(), stmt))
            })
            .collect();

        if statements.is_empty() {
            return Ok(report);
        }

        let conn = self.connect_with_timeout().await?;

        for (id, stmt) in statements {
            match conn
                .execute(&stmt.sql, Params::Positional(stmt.values))
                .await
            {
                Ok(rows) => report.affected += rows,
                Err(e) => {
                    tracing::warn!("Skipping patch for node {}: {}", id, e);
                    report.failures.push(RecordFailure::new(id, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Delete nodes by exact id
    ///
    /// Returns the number of rows removed; ids that match nothing are ignored.
    pub async fn db_delete_many(&self, ids: &[String]) -> Result<u64, DatabaseError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.connect_with_timeout().await?;
        let mut deleted = 0;

        for chunk in ids.chunks(DELETE_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let values = chunk.iter().cloned().map(Value::Text).collect();

            deleted += conn
                .execute(
                    &format!("DELETE FROM nodes WHERE id IN ({})", placeholders),
                    Params::Positional(values),
                )
                .await
                .map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to delete nodes: {}", e))
                })?;
        }

        Ok(deleted)
    }

    /// Fetch every node row in insertion order
    pub async fn db_scan_all(&self) -> Result<libsql::Rows, DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM nodes ORDER BY rowid ASC",
                NODE_COLUMNS
            ))
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to prepare scan query: {}", e))
            })?;

        stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute scan query: {}", e))
        })
    }

    /// Flush the WAL before shutdown
    pub async fn db_close(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;
        self.execute_pragma(&conn, "PRAGMA wal_checkpoint(TRUNCATE)")
            .await?;
        Ok(())
    }
}

/// Compiled UPDATE for one `NodePatch`
///
/// Uses numbered parameters so each new value is bound once and reused by the
/// null-safe `IS NOT` guard, which keeps no-op patches out of the modified count.
#[derive(Debug)]
struct PatchStatement {
    sql: String,
    values: Vec<Value>,
}

impl PatchStatement {
    /// Returns `None` for an empty patch
    fn build(patch: &NodePatch) -> Option<Self> {
        let update = &patch.update;
        let mut columns: Vec<(&str, Value)> = Vec::new();

        if let Some(name) = &update.name {
            columns.push(("name", Value::Text(name.clone())));
        }
        if let Some(parent_id) = &update.parent_id {
            columns.push(("parent_id", optional_text(parent_id)));
        }
        if let Some(data) = &update.data {
            columns.push(("data", optional_text(data)));
        }

        if columns.is_empty() {
            return None;
        }

        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect();
        let guards: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} IS NOT ?{}", column, i + 1))
            .collect();
        let id_param = columns.len() + 1;

        let sql = format!(
            "UPDATE nodes SET {}, modified_at = CURRENT_TIMESTAMP WHERE id = ?{} AND ({})",
            assignments.join(", "),
            id_param,
            guards.join(" OR ")
        );

        let mut values: Vec<Value> = columns.into_iter().map(|(_, value)| value).collect();
        values.push(Value::Text(patch.id.clone()));

        Some(Self { sql, values })
    }
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}
