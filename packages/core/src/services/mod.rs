//! Business Services
//!
//! This module contains the service layer that sits between the HTTP surface
//! and the [`crate::db::NodeStore`]:
//!
//! - `BulkMutator` - batch add/update/delete and root creation
//! - `TreeMaterializer` - full scan and flat-to-nested reconstruction
//!
//! Store errors never leak past this layer; they are re-signaled as
//! [`TreeServiceError`].

pub mod bulk_mutator;
pub mod error;
pub mod tree_materializer;


pub use bulk_mutator::{BulkMutator, DeletePolicy};
pub use error::TreeServiceError;
pub use tree_materializer::{materialize, TreeMaterializer, MAX_TREE_DEPTH};
