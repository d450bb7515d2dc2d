//! Data Models
//!
//! This module contains the data structures used throughout NodeTree:
//!
//! - `Node` - The stored flat record (`id`, `name`, `parentId?`, `data?`)
//! - `NodeUpdate` / `NodePatch` - Sparse updates where `null` removes a field
//! - `MaterializedNode` - The nested presentation form produced from the flat set
//! - Bulk reports - Aggregate counts plus per-record failures

mod node;
mod report;
mod tree;

pub use node::{CreateRootInput, Node, NodePatch, NodeUpdate, ValidationError};
pub use report::{
    BulkOperations, BulkOperationsReport, BulkWriteReport, DeleteReport, RecordFailure,
};
pub use tree::MaterializedNode;
