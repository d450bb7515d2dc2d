//! Bulk Mutator
//!
//! Write side of the service. Applies batches of inserts, sparse updates and
//! deletes against a [`NodeStore`], and creates standalone roots.
//!
//! Batches are best-effort: records that fail validation or are rejected by the
//! store are reported per id while the rest of the batch is still written.
//! Only an outright store failure fails the call.
//!
//! # Delete policy
//!
//! - [`DeletePolicy::Cascade`] (default): deleting a node also removes every
//!   descendant, so nothing is left orphaned in storage
//! - [`DeletePolicy::ExactIds`]: only the listed ids are removed; descendants
//!   remain stored but disappear from the materialized tree

use crate::db::NodeStore;
use crate::models::{
    BulkOperations, BulkOperationsReport, BulkWriteReport, CreateRootInput, DeleteReport, Node,
    NodePatch, RecordFailure,
};
use crate::services::error::TreeServiceError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How `delete_nodes` treats descendants of the listed ids
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    #[default]
    Cascade,
    ExactIds,
}

impl FromStr for DeletePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(Self::Cascade),
            "exact" | "exact_ids" => Ok(Self::ExactIds),
            other => Err(anyhow::anyhow!(
                "Unknown delete policy '{}' (expected 'cascade' or 'exact')",
                other
            )),
        }
    }
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cascade => write!(f, "cascade"),
            Self::ExactIds => write!(f, "exact"),
        }
    }
}

pub struct BulkMutator {
    store: Arc<dyn NodeStore>,
    delete_policy: DeletePolicy,
}

impl BulkMutator {
    /// Create a mutator with the default (cascade) delete policy
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self {
            store,
            delete_policy: DeletePolicy::default(),
        }
    }

    pub fn with_delete_policy(mut self, delete_policy: DeletePolicy) -> Self {
        self.delete_policy = delete_policy;
        self
    }

    /// Insert a single parentless node
    ///
    /// Any `parent_id` is irrelevant here: [`CreateRootInput`] cannot carry one.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for an empty or blank id
    /// - `BulkWriteFailure` if the store rejects the record (e.g. duplicate id)
    pub async fn create_root(&self, input: CreateRootInput) -> Result<Node, TreeServiceError> {
        let node = input.into_node();
        node.validate()?;

        let created = self
            .store
            .create_node(node)
            .await
            .map_err(|e| TreeServiceError::bulk_write_failure(e.to_string()))?;

        tracing::info!("Created root node {}", created.id);
        Ok(created)
    }

    /// Insert many nodes, unordered
    ///
    /// Invalid records are listed in the report and never reach the store.
    /// `parent_id` is not checked for existence.
    pub async fn add_nodes(&self, nodes: Vec<Node>) -> Result<BulkWriteReport, TreeServiceError> {
        let mut report = BulkWriteReport::default();
        let mut accepted = Vec::with_capacity(nodes.len());

        for node in nodes {
            match node.validate() {
                Ok(()) => accepted.push(node),
                Err(e) => {
                    tracing::debug!("Rejected node {:?} before insert: {}", node.id, e);
                    report.failures.push(RecordFailure::new(node.id, e.to_string()));
                }
            }
        }

        if !accepted.is_empty() {
            let stored = self
                .store
                .insert_many(accepted)
                .await
                .map_err(|e| TreeServiceError::bulk_write_failure(e.to_string()))?;
            report.merge(stored);
        }

        tracing::debug!(
            "Bulk add inserted {} nodes ({} rejected)",
            report.affected,
            report.failures.len()
        );
        Ok(report)
    }

    /// Apply many sparse patches, unordered
    ///
    /// `affected` counts nodes whose stored values actually changed; unknown ids
    /// and empty patches count zero and are not failures.
    pub async fn update_nodes(
        &self,
        patches: Vec<NodePatch>,
    ) -> Result<BulkWriteReport, TreeServiceError> {
        let mut report = BulkWriteReport::default();
        let mut accepted = Vec::with_capacity(patches.len());

        for patch in patches {
            match patch.validate() {
                Ok(()) if patch.update.is_empty() => {}
                Ok(()) => accepted.push(patch),
                Err(e) => {
                    tracing::debug!("Rejected patch for {:?}: {}", patch.id, e);
                    report.failures.push(RecordFailure::new(patch.id, e.to_string()));
                }
            }
        }

        if !accepted.is_empty() {
            let stored = self
                .store
                .patch_many(accepted)
                .await
                .map_err(|e| TreeServiceError::bulk_write_failure(e.to_string()))?;
            report.merge(stored);
        }

        tracing::debug!(
            "Bulk update modified {} nodes ({} rejected)",
            report.affected,
            report.failures.len()
        );
        Ok(report)
    }

    /// Apply a combined request: all adds, then all updates
    ///
    /// Updates in the same request may therefore address nodes added by it.
    /// A failed add phase aborts the call before any update is attempted.
    pub async fn apply_operations(
        &self,
        operations: BulkOperations,
    ) -> Result<BulkOperationsReport, TreeServiceError> {
        if operations.is_empty() {
            return Ok(BulkOperationsReport::default());
        }

        let BulkOperations { add, update } = operations;
        let added = self.add_nodes(add).await?;
        let updated = self.update_nodes(update).await?;

        Ok(BulkOperationsReport { added, updated })
    }

    /// Delete nodes by id according to the configured [`DeletePolicy`]
    ///
    /// Duplicate and unknown ids are ignored, so repeating a delete is safe.
    pub async fn delete_nodes(&self, ids: Vec<String>) -> Result<DeleteReport, TreeServiceError> {
        let requested = dedup_preserving_order(ids);
        let requested_count = requested.len() as u64;

        if requested.is_empty() {
            return Ok(DeleteReport::default());
        }

        let targets = match self.delete_policy {
            DeletePolicy::ExactIds => requested,
            DeletePolicy::Cascade => {
                let nodes = self.store.scan_all().await.map_err(|e| {
                    TreeServiceError::bulk_write_failure(format!(
                        "Failed to resolve descendants: {}",
                        e
                    ))
                })?;
                collect_subtrees(&nodes, &requested)
            }
        };

        let deleted_count = if targets.is_empty() {
            0
        } else {
            self.store
                .delete_many(targets)
                .await
                .map_err(|e| TreeServiceError::bulk_write_failure(e.to_string()))?
        };

        tracing::info!(
            "Deleted {} nodes for {} requested ids ({} policy)",
            deleted_count,
            requested_count,
            self.delete_policy
        );

        Ok(DeleteReport {
            requested: requested_count,
            deleted_count,
        })
    }
}

fn dedup_preserving_order(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Every existing node in the subtrees rooted at `roots`, found breadth-first
///
/// Ids that are not stored contribute nothing. The visited set stops both
/// overlapping requests and parent cycles from being walked twice.
fn collect_subtrees(nodes: &[Node], roots: &[String]) -> Vec<String> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut existing: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        existing.insert(node.id.as_str());
        if let Some(parent_id) = node.parent_id.as_deref() {
            children.entry(parent_id).or_default().push(node.id.as_str());
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for root in roots {
        if existing.contains(root.as_str()) && visited.insert(root.as_str()) {
            queue.push_back(root.as_str());
        }
    }

    let mut targets = Vec::new();
    while let Some(id) = queue.pop_front() {
        targets.push(id.to_string());
        if let Some(kids) = children.get(id) {
            for &kid in kids {
                if visited.insert(kid) {
                    queue.push_back(kid);
                }
            }
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&str>) -> Node {
        Node::new_with_id(id.into(), id.into(), parent.map(str::to_string), None)
    }

    #[test]
    fn test_delete_policy_parsing() {
        assert_eq!("cascade".parse::<DeletePolicy>().unwrap(), DeletePolicy::Cascade);
        assert_eq!(" EXACT ".parse::<DeletePolicy>().unwrap(), DeletePolicy::ExactIds);
        assert!("sideways".parse::<DeletePolicy>().is_err());
        assert_eq!(DeletePolicy::default().to_string(), "cascade");
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let ids = vec!["b".into(), "a".into(), "b".into()];
        assert_eq!(dedup_preserving_order(ids), vec!["b", "a"]);
    }

    #[test]
    fn test_collect_subtrees_breadth_first() {
        let nodes = vec![
            node("r", None),
            node("c1", Some("r")),
            node("c2", Some("r")),
            node("g1", Some("c1")),
            node("other", None),
        ];

        let targets = collect_subtrees(&nodes, &["r".to_string()]);
        assert_eq!(targets, vec!["r", "c1", "c2", "g1"]);
    }

    #[test]
    fn test_collect_subtrees_skips_unknown_and_overlapping() {
        let nodes = vec![node("r", None), node("c", Some("r"))];

        let targets = collect_subtrees(&nodes, &["ghost".into(), "c".into(), "r".into()]);
        assert_eq!(targets.len(), 2);
        assert!(targets.contains(&"r".to_string()));
        assert!(targets.contains(&"c".to_string()));
    }

    #[test]
    fn test_collect_subtrees_terminates_on_cycles() {
        let nodes = vec![node("a", Some("b")), node("b", Some("a"))];

        let targets = collect_subtrees(&nodes, &["a".to_string()]);
        assert_eq!(targets, vec!["a", "b"]);
    }
}
