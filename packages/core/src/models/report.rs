//! Bulk operation inputs and outcome reports
//!
//! Bulk writes are unordered and best-effort: a batch may partially succeed.
//! Instead of failing the whole call, records that could not be written are
//! listed in [`BulkWriteReport::failures`] next to the aggregate count.

use crate::models::{Node, NodePatch};
use serde::{Deserialize, Serialize};

/// A single record rejected inside an otherwise successful batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    /// Node the failed operation was addressed to
    pub id: String,

    /// Human-readable cause (validation message or store error text)
    pub reason: String,
}

impl RecordFailure {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of an insert-many or patch-many call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkWriteReport {
    /// Records inserted (for adds) or actually modified (for updates)
    pub affected: u64,

    /// Records that were not written, with the reason
    #[serde(default)]
    pub failures: Vec<RecordFailure>,
}

impl BulkWriteReport {
    /// Whether every record in the batch was accepted
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: BulkWriteReport) {
        self.affected += other.affected;
        self.failures.extend(other.failures);
    }
}

/// Combined add+update request
///
/// Both lists default to empty so either may be omitted on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkOperations {
    #[serde(default)]
    pub add: Vec<Node>,

    #[serde(default)]
    pub update: Vec<NodePatch>,
}

impl BulkOperations {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty()
    }
}

/// Outcome of a combined add+update request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOperationsReport {
    pub added: BulkWriteReport,
    pub updated: BulkWriteReport,
}

/// Outcome of a bulk delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    /// Distinct ids the caller asked to delete
    pub requested: u64,

    /// Records actually removed, descendants included under cascade
    pub deleted_count: u64,
}
