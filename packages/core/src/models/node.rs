//! Node Data Structures
//!
//! This module defines the core `Node` record and the sparse `NodeUpdate`
//! patch applied by bulk updates.
//!
//! # Architecture
//!
//! - **Flat storage**: Every node carries its own `id` and an optional `parent_id`
//!   back-reference; the tree is implied, never stored
//! - **Leaf vs branch**: A node with `data` is a leaf, a node without `data` is a
//!   branch (see [`crate::models::MaterializedNode`])
//! - **Null removes**: Patches distinguish "leave unchanged" from "remove field"
//!
//! # Examples
//!
//! ```rust
//! use nodetree_core::models::Node;
//!
//! // Root branch with a generated id
//! let root = Node::new("Projects".to_string(), None, None);
//!
//! // Leaf under the root with a client-chosen id
//! let leaf = Node::new_with_id(
//!     "readme".to_string(),
//!     "README".to_string(),
//!     Some(root.id.clone()),
//!     Some("hello".to_string()),
//! );
//! assert!(leaf.is_leaf());
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for node operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node ID format: {0}")]
    InvalidId(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),
}

/// Stored node record
///
/// This is the persisted shape `{id, name, parentId?, data?}` keyed by `id`.
/// Absent optional fields are omitted on the wire instead of being sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier, assigned by the creator and immutable afterwards
    pub id: String,

    /// Human-readable label
    pub name: String,

    /// Parent node ID (`None` marks a root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Optional payload; its presence makes the node a leaf
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Node {
    /// Create a new Node with an auto-generated UUID
    pub fn new(name: String, parent_id: Option<String>, data: Option<String>) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), name, parent_id, data)
    }

    /// Create a new Node with a caller-supplied ID
    pub fn new_with_id(
        id: String,
        name: String,
        parent_id: Option<String>,
        data: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            parent_id,
            data,
        }
    }

    /// Whether this node is a forest root (no parent reference)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether this node carries a payload and therefore materializes as a leaf
    ///
    /// An empty string still counts as a payload.
    pub fn is_leaf(&self) -> bool {
        self.data.is_some()
    }

    /// Validate structural integrity of the record
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` is empty or whitespace
    /// - the node names itself as its own parent
    ///
    /// A `parent_id` that points at a nonexistent node is NOT a validation error;
    /// such nodes are stored and later dropped from the materialized tree.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.id.trim().is_empty() {
            return Err(ValidationError::InvalidId(
                "id must not be blank".to_string(),
            ));
        }

        if self.parent_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::InvalidParent(
                "Node cannot be its own parent".to_string(),
            ));
        }

        Ok(())
    }
}

/// Custom deserializer for optional fields that accepts both plain values and nulls
///
/// Maps three input formats to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (remove the field)
/// - "value" → Some(Some("value")) (set to value)
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Missing field is handled by #[serde(default)] on the struct field
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial node update
///
/// Only provided fields change. The node `id` is never part of the body; it is
/// the key the patch is addressed to (see [`NodePatch`]).
///
/// # Double-Option Pattern for Removable Fields
///
/// `parent_id` and `data` distinguish three states:
///
/// - `None`: Don't change this field
/// - `Some(None)`: Remove the field from the stored record
/// - `Some(Some(value))`: Set the field to the specified value
///
/// `name` is required on every node, so it can only be set: a `null` name on the
/// wire is read as "not provided".
///
/// # Examples
///
/// ```rust
/// # use nodetree_core::models::NodeUpdate;
/// // Rename only
/// let rename = NodeUpdate::new().with_name("Renamed".to_string());
///
/// // Drop the payload, turning a leaf into a branch
/// let to_branch = NodeUpdate {
///     data: Some(None),
///     ..Default::default()
/// };
/// assert!(!to_branch.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    /// Update the label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Update or remove the parent reference (removal turns the node into a root)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<String>>,

    /// Update or remove the payload
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub data: Option<Option<String>>,
}

impl NodeUpdate {
    /// Create a new empty NodeUpdate
    pub fn new() -> Self {
        Self::default()
    }

    /// Set name update
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// Set a new parent
    pub fn with_parent(mut self, parent_id: String) -> Self {
        self.parent_id = Some(Some(parent_id));
        self
    }

    /// Set a new payload
    pub fn with_data(mut self, data: String) -> Self {
        self.data = Some(Some(data));
        self
    }

    /// Remove the payload
    pub fn without_data(mut self) -> Self {
        self.data = Some(None);
        self
    }

    /// Check if update contains any changes
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.parent_id.is_none() && self.data.is_none()
    }
}

/// A `NodeUpdate` addressed to a node by id
///
/// Deserializes from the flat wire shape `{"id": ..., "name": ..., "data": null}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePatch {
    /// Target node (the key, never changed by the patch)
    pub id: String,

    /// Fields to set or remove
    #[serde(flatten)]
    pub update: NodeUpdate,
}

impl NodePatch {
    pub fn new(id: impl Into<String>, update: NodeUpdate) -> Self {
        Self {
            id: id.into(),
            update,
        }
    }

    /// Whether applying this patch would make the node its own parent
    pub fn is_self_parenting(&self) -> bool {
        matches!(&self.update.parent_id, Some(Some(parent)) if parent == &self.id)
    }

    /// Same id and parent checks as [`Node::validate`], applied to the patch target
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.id.trim().is_empty() {
            return Err(ValidationError::InvalidId(
                "id must not be blank".to_string(),
            ));
        }

        if self.is_self_parenting() {
            return Err(ValidationError::InvalidParent(
                "Node cannot be its own parent".to_string(),
            ));
        }

        Ok(())
    }
}

/// Input for creating a root node
///
/// `id` may be omitted, in which case a UUID is generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRootInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub data: Option<String>,
}

impl CreateRootInput {
    /// Build the root node this input describes
    pub fn into_node(self) -> Node {
        match self.id {
            Some(id) => Node::new_with_id(id, self.name, None, self.data),
            None => Node::new(self.name, None, self.data),
        }
    }
}
