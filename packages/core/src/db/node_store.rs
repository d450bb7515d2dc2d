//! NodeStore Trait - Database Abstraction Layer
//!
//! This module defines the `NodeStore` trait consumed by the bulk mutator and
//! tree materializer. It covers bulk write primitives plus a full scan, which
//! any keyed document or key-value store can provide.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so embedded and network backends fit
//! 2. **Ownership Semantics**: Bulk methods take ownership of their batches
//! 3. **Error Handling**: Uses `anyhow::Result` for flexible error context; only
//!    outright failures are errors, per-record rejections travel in reports
//! 4. **No Transactions**: Bulk writes are unordered and may partially succeed
//!
//! # Examples
//!
//! ```rust,no_run
//! use nodetree_core::db::{DatabaseService, NodeStore, TursoStore};
//! use nodetree_core::models::Node;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/nodetree.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
//!
//!     let report = store
//!         .insert_many(vec![Node::new("Root".to_string(), None, None)])
//!         .await?;
//!     assert_eq!(report.affected, 1);
//!
//!     Ok(())
//! }
//! ```

use crate::models::{BulkWriteReport, Node, NodePatch};
use anyhow::Result;
use async_trait::async_trait;

/// Abstraction layer for node persistence operations
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a single instance is shared behind an
/// `Arc` by every request handler.
///
/// # Consistency
///
/// No snapshot isolation is promised: a `scan_all` may observe part of a batch
/// that is being written concurrently. Writes to the same id are last-write-wins.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Insert a single node
    ///
    /// # Errors
    ///
    /// Returns error if the id already exists or the store is unreachable.
    async fn create_node(&self, node: Node) -> Result<Node>;

    /// Get node by ID
    ///
    /// - `Ok(Some(node))` if node exists
    /// - `Ok(None)` if node doesn't exist (not an error)
    async fn get_node(&self, id: &str) -> Result<Option<Node>>;

    /// Insert many nodes, unordered and best-effort
    ///
    /// A rejected record (duplicate id, ...) is listed in the report's `failures`
    /// and does not stop the rest of the batch. `affected` is the number inserted.
    ///
    /// # Errors
    ///
    /// Only when the write path failed outright.
    async fn insert_many(&self, nodes: Vec<Node>) -> Result<BulkWriteReport>;

    /// Apply sparse patches keyed by id
    ///
    /// `Some(None)` fields are removed from the stored record, `Some(Some(v))`
    /// fields are set. `affected` is the number of records actually modified;
    /// unknown ids modify nothing and are not failures.
    async fn patch_many(&self, patches: Vec<NodePatch>) -> Result<BulkWriteReport>;

    /// Delete exactly the given ids
    ///
    /// Returns the number of records removed (0 if none matched - not an error).
    /// Implementations do NOT discover descendants.
    async fn delete_many(&self, ids: Vec<String>) -> Result<u64>;

    /// Every stored node, in a stable order (insertion order for libsql)
    async fn scan_all(&self) -> Result<Vec<Node>>;

    /// Flush pending writes and release resources
    async fn close(&self) -> Result<()>;
}
