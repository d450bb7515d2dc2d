//! NodeTree Core
//!
//! Persistence and business logic for a forest of named nodes stored flat,
//! each record pointing at its parent.
//!
//! # Architecture
//!
//! - **Flat records**: `{id, name, parentId?, data?}`, one row per node
//! - **Bulk writes**: Unordered, best-effort batches with per-record failure reports
//! - **Tree on read**: The nested forest is rebuilt from a full scan on every read
//! - **libsql/Turso**: Embedded SQLite-compatible storage
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NodeUpdate, MaterializedNode, reports)
//! - [`services`] - BulkMutator and TreeMaterializer
//! - [`db`] - Database layer with libsql integration

pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use models::*;
pub use services::*;
