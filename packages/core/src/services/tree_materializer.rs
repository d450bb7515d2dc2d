//! Tree Materializer
//!
//! Reconstructs the nested forest from the flat, parent-pointer-addressed node
//! set. The store is scanned once; everything else happens in memory.
//!
//! # Algorithm
//!
//! 1. Bucket every node under its `parent_id` (scan order is kept inside a bucket)
//! 2. Seed an explicit stack with the roots (`parent_id` absent)
//! 3. Pop nodes, pushing their bucket, to get a pre-order of every reachable node
//! 4. Walk that pre-order backwards so each child is built before its parent
//!
//! Nodes whose parent does not exist are never reached from a root, so they
//! (and their whole subtree) are dropped. The same holds for parent cycles.
//!
//! Building and dropping the forest are iterative at any depth. Encoding it
//! (serde) recurses once per level, so [`TreeMaterializer::read_tree`] refuses
//! forests deeper than [`MAX_TREE_DEPTH`].

use crate::db::NodeStore;
use crate::models::{MaterializedNode, Node};
use crate::services::error::TreeServiceError;
use std::collections::HashMap;
use std::sync::Arc;

/// Deepest forest `read_tree` returns; encoding stays well inside a 2 MiB stack
pub const MAX_TREE_DEPTH: usize = 256;

/// Read side of the service: full scan + materialization
pub struct TreeMaterializer {
    store: Arc<dyn NodeStore>,
}

impl TreeMaterializer {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Load every node and return the forest, roots in scan order
    ///
    /// # Errors
    ///
    /// `ScanFailure` if the store cannot be read, or if the forest is deeper than
    /// [`MAX_TREE_DEPTH`]. No partial tree is returned.
    pub async fn read_tree(&self) -> Result<Vec<MaterializedNode>, TreeServiceError> {
        let nodes = self
            .store
            .scan_all()
            .await
            .map_err(|e| TreeServiceError::scan_failure(e.to_string()))?;

        let forest = materialize(nodes);

        let depth = forest.iter().map(MaterializedNode::depth).max().unwrap_or(0);
        if depth > MAX_TREE_DEPTH {
            tracing::warn!("Refusing to return tree of depth {}", depth);
            return Err(TreeServiceError::scan_failure(format!(
                "Tree depth {} exceeds the limit of {}",
                depth, MAX_TREE_DEPTH
            )));
        }

        Ok(forest)
    }
}

/// Convert a flat node set into the nested forest
///
/// Leaves (nodes with `data`) are emitted without `children` unless something is
/// actually attached to them; branches always carry `children`, possibly empty.
/// Output roots and every `children` list follow input order.
pub fn materialize(nodes: Vec<Node>) -> Vec<MaterializedNode> {
    let total = nodes.len();

    let mut roots: Vec<usize> = Vec::new();
    let mut buckets: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        match node.parent_id.as_deref() {
            None => roots.push(index),
            Some(parent_id) => buckets.entry(parent_id).or_default().push(index),
        }
    }

    // Pre-order of everything reachable from a root. Every node sits in exactly
    // one bucket, so nothing is pushed twice.
    let mut order: Vec<usize> = Vec::with_capacity(total);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(index) = stack.pop() {
        order.push(index);
        if let Some(children) = buckets.get(nodes[index].id.as_str()) {
            stack.extend(children.iter().rev().copied());
        }
    }

    let dropped = total - order.len();
    if dropped > 0 {
        tracing::debug!("Dropped {} unreachable nodes while materializing", dropped);
    }

    let child_lists: Vec<Option<Vec<usize>>> = nodes
        .iter()
        .map(|node| buckets.get(node.id.as_str()).cloned())
        .collect();
    drop(buckets);

    let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
    let mut built: Vec<Option<MaterializedNode>> =
        std::iter::repeat_with(|| None).take(total).collect();

    for &index in order.iter().rev() {
        let Some(node) = slots[index].take() else {
            continue;
        };

        let attached: Vec<MaterializedNode> = child_lists[index]
            .iter()
            .flatten()
            .filter_map(|&child| built[child].take())
            .collect();

        built[index] = Some(present(node, attached));
    }

    roots
        .into_iter()
        .filter_map(|index| built[index].take())
        .collect()
}

/// Presentation form of one node: drops `parent_id`, decides `children`
fn present(node: Node, attached: Vec<MaterializedNode>) -> MaterializedNode {
    let children = if node.is_leaf() && attached.is_empty() {
        None
    } else {
        Some(attached)
    };

    MaterializedNode {
        id: node.id,
        name: node.name,
        data: node.data,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseService, TursoStore};
    use serde_json::json;
    use tempfile::TempDir;

    fn node(id: &str, parent: Option<&str>, data: Option<&str>) -> Node {
        Node::new_with_id(
            id.to_string(),
            id.to_uppercase(),
            parent.map(str::to_string),
            data.map(str::to_string),
        )
    }

    fn ids(nodes: &[MaterializedNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_empty_store_is_empty_forest() {
        assert!(materialize(Vec::new()).is_empty());
    }

    #[test]
    fn test_single_branch_root_has_empty_children() {
        let forest = materialize(vec![node("r1", None, None)]);
        assert_eq!(
            serde_json::to_value(&forest).unwrap(),
            json!([{"id": "r1", "name": "R1", "children": []}])
        );
    }

    #[test]
    fn test_single_leaf_root_has_no_children_key() {
        let forest = materialize(vec![node("r1", None, Some("payload"))]);
        assert_eq!(
            serde_json::to_value(&forest).unwrap(),
            json!([{"id": "r1", "name": "R1", "data": "payload"}])
        );
    }

    #[test]
    fn test_nested_shape() {
        let forest = materialize(vec![
            node("r1", None, None),
            node("c1", Some("r1"), Some("x")),
            node("c2", Some("r1"), None),
            node("g1", Some("c2"), Some("y")),
        ]);

        assert_eq!(
            serde_json::to_value(&forest).unwrap(),
            json!([{
                "id": "r1",
                "name": "R1",
                "children": [
                    {"id": "c1", "name": "C1", "data": "x"},
                    {"id": "c2", "name": "C2", "children": [
                        {"id": "g1", "name": "G1", "data": "y"}
                    ]}
                ]
            }])
        );
    }

    #[test]
    fn test_children_before_parent_in_scan_order() {
        let forest = materialize(vec![
            node("g1", Some("c1"), Some("leaf")),
            node("c1", Some("r1"), None),
            node("r1", None, None),
        ]);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtree_len(), 3);
        assert_eq!(forest[0].children()[0].children()[0].id, "g1");
    }

    #[test]
    fn test_roots_and_siblings_follow_scan_order() {
        let forest = materialize(vec![
            node("b", None, None),
            node("a", None, None),
            node("b2", Some("b"), None),
            node("b1", Some("b"), None),
        ]);

        assert_eq!(ids(&forest), vec!["b", "a"]);
        assert_eq!(ids(forest[0].children()), vec!["b2", "b1"]);
    }

    #[test]
    fn test_orphans_and_their_subtrees_are_dropped() {
        let forest = materialize(vec![
            node("r1", None, None),
            node("orphan", Some("missing"), None),
            node("under-orphan", Some("orphan"), Some("x")),
        ]);

        assert_eq!(forest.len(), 1);
        assert!(forest[0].find("orphan").is_none());
        assert!(forest[0].find("under-orphan").is_none());
        assert!(forest[0].children().is_empty());
    }

    #[test]
    fn test_parent_cycles_are_unreachable() {
        let forest = materialize(vec![
            node("a", Some("b"), None),
            node("b", Some("a"), None),
            node("self", Some("self"), None),
            node("r", None, None),
        ]);

        assert_eq!(ids(&forest), vec!["r"]);
        assert_eq!(forest[0].subtree_len(), 1);
    }

    #[test]
    fn test_leaf_with_children_keeps_them() {
        let forest = materialize(vec![
            node("r", None, Some("payload")),
            node("c", Some("r"), Some("x")),
        ]);

        assert_eq!(forest[0].data.as_deref(), Some("payload"));
        assert_eq!(ids(forest[0].children()), vec!["c"]);
    }

    #[test]
    fn test_every_child_appears_exactly_once() {
        let mut nodes = vec![node("r", None, None)];
        for i in 0..20 {
            let parent = if i == 0 {
                "r".to_string()
            } else {
                format!("n{}", (i - 1) / 2)
            };
            nodes.push(Node::new_with_id(
                format!("n{}", i),
                format!("N{}", i),
                Some(parent),
                None,
            ));
        }
        let expected: Vec<(String, String)> = nodes
            .iter()
            .filter_map(|n| n.parent_id.clone().map(|p| (p, n.id.clone())))
            .collect();

        let forest = materialize(nodes);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtree_len(), 21);

        for (parent, child) in expected {
            let parent_node = forest[0].find(&parent).unwrap();
            let hits = parent_node
                .children()
                .iter()
                .filter(|c| c.id == child)
                .count();
            assert_eq!(hits, 1, "{} must appear once under {}", child, parent);
        }
    }

    /// `n0 <- n1 <- ... <- n{len-1}`, all branches
    fn chain(len: usize) -> Vec<Node> {
        (0..len)
            .map(|i| {
                let parent = (i > 0).then(|| format!("n{}", i - 1));
                Node::new_with_id(format!("n{}", i), "N".to_string(), parent, None)
            })
            .collect()
    }

    fn on_small_stack<F: FnOnce() + Send + 'static>(f: F) {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap();
    }

    #[test]
    fn test_empty_string_data_is_a_leaf() {
        let forest = materialize(vec![node("r", None, Some(""))]);
        assert_eq!(
            serde_json::to_value(&forest).unwrap(),
            json!([{"id": "r", "name": "R", "data": ""}])
        );
    }

    #[test]
    fn test_deep_chain_builds_and_drops_on_small_stack() {
        on_small_stack(|| {
            let depth = 100_000;
            let forest = materialize(chain(depth));
            assert_eq!(forest.len(), 1);

            let mut level = &forest[0];
            let mut seen = 1;
            while let Some(next) = level.children().first() {
                level = next;
                seen += 1;
            }
            assert_eq!(seen, depth);

            drop(forest);
        });
    }

    async fn store_with(nodes: Vec<Node>) -> (Arc<dyn NodeStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            DatabaseService::new(temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );
        let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
        store.insert_many(nodes).await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_read_tree_at_depth_limit_encodes_on_small_stack() {
        let (store, _temp_dir) = store_with(chain(MAX_TREE_DEPTH)).await;

        let forest = TreeMaterializer::new(store).read_tree().await.unwrap();
        assert_eq!(forest[0].depth(), MAX_TREE_DEPTH);

        on_small_stack(move || {
            let encoded = serde_json::to_string(&forest).unwrap();
            assert!(encoded.contains(&format!("\"n{}\"", MAX_TREE_DEPTH - 1)));
            drop(forest);
        });
    }

    #[tokio::test]
    async fn test_read_tree_rejects_forest_beyond_depth_limit() {
        let (store, _temp_dir) = store_with(chain(MAX_TREE_DEPTH + 1)).await;

        let err = TreeMaterializer::new(store).read_tree().await.unwrap_err();
        assert!(matches!(err, TreeServiceError::ScanFailure { .. }));
        assert!(err.to_string().contains("exceeds the limit"));
    }
}
