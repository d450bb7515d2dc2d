//! NodeTree HTTP Server
//!
//! REST API over the node forest. Handlers are thin: they decode JSON, call
//! [`BulkMutator`] or [`TreeMaterializer`], and map [`TreeServiceError`]s to
//! [`HttpError`] responses.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin nodetree-server
//!
//! NODETREE_PORT=3002 RUST_LOG=debug cargo run --bin nodetree-server
//! ```
//!
//! [`TreeServiceError`]: nodetree_core::TreeServiceError

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use nodetree_core::{BulkMutator, TreeMaterializer};

pub mod config;
mod http_error;
mod tree_endpoints;

pub use config::ServerConfig;
pub use http_error::HttpError;

/// Application state shared across all endpoints
///
/// Both services wrap the same `Arc<dyn NodeStore>`; handlers hold no other
/// shared state.
#[derive(Clone)]
pub struct AppState {
    pub mutator: Arc<BulkMutator>,
    pub materializer: Arc<TreeMaterializer>,
}

impl AppState {
    pub fn new(mutator: BulkMutator, materializer: TreeMaterializer) -> Self {
        Self {
            mutator: Arc::new(mutator),
            materializer: Arc::new(materializer),
        }
    }
}

/// Create the application router
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(tree_endpoints::routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Create the CORS layer
///
/// Allows the usual local frontend dev origins, or exactly `custom_origin`
/// when one is configured.
///
/// # Errors
///
/// Fails if `custom_origin` is not a valid header value.
pub fn cors_layer(custom_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let default_origins = [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = match custom_origin {
        Some(origin) => vec![origin
            .parse::<HeaderValue>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS_ALLOW_ORIGIN '{}': {}", origin, e))?],
        None => default_origins
            .into_iter()
            .map(HeaderValue::from_static)
            .collect(),
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers(Any)
        .allow_credentials(false))
}

/// Serve the API until ctrl-c
///
/// # Errors
///
/// Returns error if the CORS origin is invalid or the listener fails to bind.
pub async fn start_server(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state, cors_layer(config.cors_origin.as_deref())?);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("NodeTree server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
