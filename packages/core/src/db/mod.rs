//! Database Layer
//!
//! This module handles all persistence for NodeTree:
//!
//! - `NodeStore` - the storage contract consumed by the services
//! - `DatabaseService` - libsql connection management, schema, raw SQL
//! - `TursoStore` - `NodeStore` implementation over `DatabaseService`
//!
//! # Architecture
//!
//! Nodes live in a single flat `nodes` table. The tree is implied by the
//! `parent_id` column and only reconstructed on read by
//! [`crate::services::TreeMaterializer`].

mod database;
mod error;
mod node_store;
mod turso_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use node_store::NodeStore;
pub use turso_store::TursoStore;
