//! Integration tests for the write-then-read cycle
//!
//! Tests cover:
//! - Root creation and the leaf/branch presentation rule
//! - Bulk add, sparse update and delete as seen through a tree read
//! - Orphan handling under both delete policies

use anyhow::Result;
use nodetree_core::{
    db::{DatabaseService, NodeStore, TursoStore},
    BulkMutator, BulkOperations, CreateRootInput, DeletePolicy, Node, NodePatch, NodeUpdate,
    TreeMaterializer,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

/// Test helper: Create a test environment
async fn create_test_env() -> Result<(BulkMutator, TreeMaterializer, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Arc::new(DatabaseService::new(db_path).await?);
    let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));

    Ok((
        BulkMutator::new(store.clone()),
        TreeMaterializer::new(store),
        temp_dir,
    ))
}

fn root_input(id: &str, name: &str, data: Option<&str>) -> CreateRootInput {
    CreateRootInput {
        id: Some(id.to_string()),
        name: name.to_string(),
        data: data.map(str::to_string),
    }
}

fn child(id: &str, parent: &str, data: Option<&str>) -> Node {
    Node::new_with_id(
        id.to_string(),
        format!("Node {}", id),
        Some(parent.to_string()),
        data.map(str::to_string),
    )
}

// =========================================================================
// Round-trip
// =========================================================================

#[tokio::test]
async fn test_branch_root_round_trip() -> Result<()> {
    let (mutator, materializer, _temp_dir) = create_test_env().await?;

    mutator.create_root(root_input("r1", "Root", None)).await?;

    let tree = serde_json::to_value(materializer.read_tree().await?)?;
    assert_eq!(tree, json!([{"id": "r1", "name": "Root", "children": []}]));
    Ok(())
}

#[tokio::test]
async fn test_leaf_root_round_trip() -> Result<()> {
    let (mutator, materializer, _temp_dir) = create_test_env().await?;

    mutator
        .create_root(root_input("r1", "Root", Some("payload")))
        .await?;

    let tree = serde_json::to_value(materializer.read_tree().await?)?;
    assert_eq!(tree, json!([{"id": "r1", "name": "Root", "data": "payload"}]));
    Ok(())
}

// =========================================================================
// End-to-end scenario
// =========================================================================

#[tokio::test]
async fn test_add_then_delete_child() -> Result<()> {
    let (mutator, materializer, _temp_dir) = create_test_env().await?;

    mutator.create_root(root_input("r1", "R", None)).await?;
    let report = mutator
        .apply_operations(BulkOperations {
            add: vec![Node::new_with_id(
                "c1".into(),
                "C".into(),
                Some("r1".into()),
                Some("x".into()),
            )],
            update: vec![],
        })
        .await?;
    assert_eq!(report.added.affected, 1);

    let tree = serde_json::to_value(materializer.read_tree().await?)?;
    assert_eq!(
        tree,
        json!([{
            "id": "r1",
            "name": "R",
            "children": [{"id": "c1", "name": "C", "data": "x"}]
        }])
    );

    let deleted = mutator.delete_nodes(vec!["c1".into()]).await?;
    assert_eq!(deleted.deleted_count, 1);

    let tree = serde_json::to_value(materializer.read_tree().await?)?;
    assert_eq!(tree, json!([{"id": "r1", "name": "R", "children": []}]));
    Ok(())
}

// =========================================================================
// Updates
// =========================================================================

#[tokio::test]
async fn test_null_data_turns_leaf_into_branch() -> Result<()> {
    let (mutator, materializer, _temp_dir) = create_test_env().await?;

    mutator.create_root(root_input("r1", "Root", None)).await?;
    mutator.add_nodes(vec![child("c1", "r1", Some("x"))]).await?;

    let patch: NodePatch = serde_json::from_value(json!({"id": "c1", "data": null}))?;
    let report = mutator.update_nodes(vec![patch]).await?;
    assert_eq!(report.affected, 1);

    let tree = materializer.read_tree().await?;
    let c1 = tree[0].find("c1").expect("c1 is attached");
    assert!(c1.data.is_none());
    assert_eq!(c1.children, Some(vec![]));
    Ok(())
}

#[tokio::test]
async fn test_identical_update_reports_zero() -> Result<()> {
    let (mutator, _materializer, _temp_dir) = create_test_env().await?;

    mutator.create_root(root_input("r1", "Root", None)).await?;
    let patch = NodePatch::new("r1", NodeUpdate::new().with_name("Renamed".into()));

    assert_eq!(mutator.update_nodes(vec![patch.clone()]).await?.affected, 1);
    assert_eq!(mutator.update_nodes(vec![patch]).await?.affected, 0);
    Ok(())
}

#[tokio::test]
async fn test_reparent_moves_subtree() -> Result<()> {
    let (mutator, materializer, _temp_dir) = create_test_env().await?;

    mutator.create_root(root_input("a", "A", None)).await?;
    mutator.create_root(root_input("b", "B", None)).await?;
    mutator
        .add_nodes(vec![child("c", "a", None), child("g", "c", Some("x"))])
        .await?;

    mutator
        .update_nodes(vec![NodePatch::new("c", NodeUpdate::new().with_parent("b".into()))])
        .await?;

    let tree = materializer.read_tree().await?;
    assert!(tree[0].children().is_empty());
    assert_eq!(tree[1].subtree_len(), 3);
    assert!(tree[1].find("g").is_some());
    Ok(())
}

// =========================================================================
// Partial batches
// =========================================================================

#[tokio::test]
async fn test_duplicate_in_batch_reports_one_failure() -> Result<()> {
    let (mutator, materializer, _temp_dir) = create_test_env().await?;

    mutator.create_root(root_input("r1", "Root", None)).await?;
    let report = mutator
        .add_nodes(vec![
            child("c1", "r1", None),
            child("c2", "r1", None),
            child("c1", "r1", Some("again")),
            child("c3", "r1", None),
        ])
        .await?;

    assert_eq!(report.affected, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "c1");

    let tree = materializer.read_tree().await?;
    assert_eq!(tree[0].children().len(), 3);
    Ok(())
}

// =========================================================================
// Deletes and orphans
// =========================================================================

#[tokio::test]
async fn test_delete_is_idempotent() -> Result<()> {
    let (mutator, _materializer, _temp_dir) = create_test_env().await?;

    mutator.create_root(root_input("r1", "Root", None)).await?;

    assert_eq!(mutator.delete_nodes(vec!["r1".into()]).await?.deleted_count, 1);
    assert_eq!(mutator.delete_nodes(vec!["r1".into()]).await?.deleted_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_cascade_reports_subtree_size() -> Result<()> {
    let (mutator, materializer, _temp_dir) = create_test_env().await?;

    mutator.create_root(root_input("r1", "Root", None)).await?;
    mutator.create_root(root_input("r2", "Other", None)).await?;
    mutator
        .add_nodes(vec![
            child("c1", "r1", None),
            child("c2", "r1", Some("x")),
            child("g1", "c1", Some("y")),
        ])
        .await?;

    let report = mutator.delete_nodes(vec!["r1".into()]).await?;
    assert_eq!(report.deleted_count, 4);

    let tree = serde_json::to_value(materializer.read_tree().await?)?;
    assert_eq!(tree, json!([{"id": "r2", "name": "Other", "children": []}]));
    Ok(())
}

#[tokio::test]
async fn test_orphans_are_stored_but_not_presented() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = Arc::new(DatabaseService::new(temp_dir.path().join("test.db")).await?);
    let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db));
    let mutator = BulkMutator::new(store.clone()).with_delete_policy(DeletePolicy::ExactIds);
    let materializer = TreeMaterializer::new(store.clone());

    mutator.create_root(root_input("r1", "Root", None)).await?;
    mutator
        .add_nodes(vec![
            child("c1", "r1", None),
            child("g1", "c1", Some("x")),
            child("stray", "missing", None),
        ])
        .await?;

    mutator.delete_nodes(vec!["c1".into()]).await?;

    assert_eq!(store.scan_all().await?.len(), 3);
    let tree = materializer.read_tree().await?;
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].subtree_len(), 1);
    Ok(())
}
