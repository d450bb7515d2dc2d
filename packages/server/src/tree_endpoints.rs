//! Tree Endpoints
//!
//! # Endpoints
//!
//! - `GET /api` - Liveness message
//! - `GET /api/health` - Health check with version
//! - `GET /api/getTreeData` - Full materialized forest
//! - `POST /api/add_root` - Create a parentless node
//! - `PUT /api/add_update_operations` - Bulk add, then bulk update
//! - `POST /api/delete_nodes` - Bulk delete by id

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{AppState, HttpError};
use nodetree_core::{BulkOperations, BulkWriteReport, CreateRootInput, MaterializedNode, Node};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct TreeDataResponse {
    pub message: String,
    pub tree_data: Vec<MaterializedNode>,
}

#[derive(Debug, Serialize)]
pub struct RootCreatedResponse {
    pub message: String,
    pub node: Node,
}

#[derive(Debug, Serialize)]
pub struct OperationsResponse {
    pub message: String,
    pub added: BulkWriteReport,
    pub updated: BulkWriteReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub deleted_count: u64,
    pub requested: u64,
}

/// One entry of the delete payload; any other fields are ignored
#[derive(Debug, Deserialize)]
pub struct DeleteTarget {
    pub id: String,
}

/// Unwrap a JSON body, answering malformed input with `INVALID_INPUT`
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        HttpError::with_details(
            "Invalid request body",
            "INVALID_INPUT",
            rejection.body_text(),
        )
    })
}

async fn api_root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "API is working".to_string(),
    })
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Read the whole forest
///
/// ```bash
/// curl http://localhost:3001/api/getTreeData
/// ```
#[instrument(skip(state))]
async fn get_tree_data(
    State(state): State<AppState>,
) -> Result<Json<TreeDataResponse>, HttpError> {
    let tree_data = state.materializer.read_tree().await?;

    Ok(Json(TreeDataResponse {
        message: "tree_data successfully".to_string(),
        tree_data,
    }))
}

/// Create a root node
///
/// ```bash
/// curl -X POST http://localhost:3001/api/add_root \
///   -H "Content-Type: application/json" \
///   -d '{"id": "r1", "name": "Root"}'
/// ```
#[instrument(skip(state, payload))]
async fn add_root(
    State(state): State<AppState>,
    payload: Result<Json<CreateRootInput>, JsonRejection>,
) -> Result<Json<RootCreatedResponse>, HttpError> {
    let input = json_body(payload)?;
    let node = state.mutator.create_root(input).await?;

    Ok(Json(RootCreatedResponse {
        message: "Root node created successfully".to_string(),
        node,
    }))
}

/// Bulk add then bulk update
///
/// ```bash
/// curl -X PUT http://localhost:3001/api/add_update_operations \
///   -H "Content-Type: application/json" \
///   -d '{
///     "add": [{"id": "c1", "parentId": "r1", "name": "Child", "data": "x"}],
///     "update": [{"id": "c1", "data": null}]
///   }'
/// ```
#[instrument(skip(state, payload))]
async fn add_update_operations(
    State(state): State<AppState>,
    payload: Result<Json<BulkOperations>, JsonRejection>,
) -> Result<Json<OperationsResponse>, HttpError> {
    let operations = json_body(payload)?;
    tracing::debug!(
        "Processing {} adds and {} updates",
        operations.add.len(),
        operations.update.len()
    );

    let report = state.mutator.apply_operations(operations).await?;

    Ok(Json(OperationsResponse {
        message: "Add and update operations processed successfully".to_string(),
        added: report.added,
        updated: report.updated,
    }))
}

/// Bulk delete
///
/// ```bash
/// curl -X POST http://localhost:3001/api/delete_nodes \
///   -H "Content-Type: application/json" \
///   -d '[{"id": "c1"}]'
/// ```
#[instrument(skip(state, payload))]
async fn delete_nodes(
    State(state): State<AppState>,
    payload: Result<Json<Vec<DeleteTarget>>, JsonRejection>,
) -> Result<Json<DeleteResponse>, HttpError> {
    let ids = json_body(payload)?.into_iter().map(|t| t.id).collect();
    let report = state.mutator.delete_nodes(ids).await?;

    Ok(Json(DeleteResponse {
        message: format!("Deleted {} nodes successfully.", report.deleted_count),
        deleted_count: report.deleted_count,
        requested: report.requested,
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api", get(api_root))
        .route("/api/health", get(health_check))
        .route("/api/getTreeData", get(get_tree_data))
        .route("/api/add_root", post(add_root))
        .route("/api/add_update_operations", put(add_update_operations))
        .route("/api/delete_nodes", post(delete_nodes))
        .with_state(state)
}
