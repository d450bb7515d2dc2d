//! Materialized tree presentation type

use serde::{Deserialize, Serialize};

/// A node as presented inside the materialized forest
///
/// Carries no `parentId`: once the tree is built the back-reference is structure,
/// not payload. `children` is omitted entirely for leaves (nodes with `data`)
/// that have nothing attached, and is always present (possibly empty) for branches.
///
/// Dropping is iterative, so chains of any length can be released. Serializing
/// still recurses once per level; callers bound depth before encoding (see
/// [`MaterializedNode::depth`]).
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedNode {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<MaterializedNode>>,
}

impl MaterializedNode {
    /// Children slice, empty for leaves
    pub fn children(&self) -> &[MaterializedNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Number of nodes in this subtree, including this node
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children());
        }
        count
    }

    /// Number of levels in this subtree, 1 for a node without children
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children().iter().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Depth-first search for a node by id within this subtree
    pub fn find(&self, id: &str) -> Option<&MaterializedNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children());
        }
        None
    }
}

impl Drop for MaterializedNode {
    fn drop(&mut self) {
        let Some(mut pending) = self.children.take() else {
            return;
        };
        // Detach grandchildren before each child is dropped
        while let Some(mut node) = pending.pop() {
            if let Some(children) = node.children.take() {
                pending.extend(children);
            }
        }
    }
}
