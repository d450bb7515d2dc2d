//! TursoStore - NodeStore Implementation for Turso/libsql Backend
//!
//! TursoStore wraps `DatabaseService` and delegates every operation to its
//! `db_*` methods, converting `libsql::Row` values into `Node` models.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nodetree_core::db::{DatabaseService, NodeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/test.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!
//!     let nodes = store.scan_all().await?;
//!     println!("{} nodes stored", nodes.len());
//!
//!     Ok(())
//! }
//! ```

use crate::db::node_store::NodeStore;
use crate::db::DatabaseService;
use crate::models::{BulkWriteReport, Node, NodePatch};
use anyhow::{Context, Result};
use async_trait::async_trait;
use libsql::Row;
use std::sync::Arc;

/// TursoStore implements NodeStore trait for the libsql backend
pub struct TursoStore {
    /// Underlying database service (raw SQL operations)
    db: Arc<DatabaseService>,
}

impl TursoStore {
    /// Create a new TursoStore wrapper
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Convert libsql::Row to Node model
    ///
    /// # Row Format
    ///
    /// Expected columns (in order):
    /// - id (TEXT)
    /// - name (TEXT)
    /// - parent_id (TEXT, nullable)
    /// - data (TEXT, nullable)
    fn row_to_node(row: &Row) -> Result<Node> {
        let id: String = row.get(0).context("Failed to get id")?;
        let name: String = row.get(1).context("Failed to get name")?;
        let parent_id: Option<String> = row.get(2).context("Failed to get parent_id")?;
        let data: Option<String> = row.get(3).context("Failed to get data")?;

        Ok(Node {
            id,
            name,
            parent_id,
            data,
        })
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn create_node(&self, node: Node) -> Result<Node> {
        self.db
            .db_create_node(&node)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create node: {}", e))?;

        Ok(node)
    }

    async fn get_node(&self, id: &str) -> Result<Option<Node>> {
        match self
            .db
            .db_get_node(id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get node: {}", e))?
        {
            Some(row) => Ok(Some(Self::row_to_node(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert_many(&self, nodes: Vec<Node>) -> Result<BulkWriteReport> {
        self.db
            .db_insert_many(&nodes)
            .await
            .map_err(|e| anyhow::anyhow!("Error during bulk insert: {}", e))
    }

    async fn patch_many(&self, patches: Vec<NodePatch>) -> Result<BulkWriteReport> {
        self.db
            .db_patch_many(&patches)
            .await
            .map_err(|e| anyhow::anyhow!("Error during bulk update: {}", e))
    }

    async fn delete_many(&self, ids: Vec<String>) -> Result<u64> {
        self.db
            .db_delete_many(&ids)
            .await
            .map_err(|e| anyhow::anyhow!("Error during bulk delete: {}", e))
    }

    async fn scan_all(&self) -> Result<Vec<Node>> {
        let mut rows = self
            .db
            .db_scan_all()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to scan nodes: {}", e))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to fetch row: {}", e))?
        {
            nodes.push(Self::row_to_node(&row)?);
        }

        Ok(nodes)
    }

    async fn close(&self) -> Result<()> {
        self.db
            .db_close()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to close database: {}", e))
    }
}
