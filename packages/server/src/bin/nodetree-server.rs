//! NodeTree HTTP Server Binary
//!
//! # Usage
//!
//! ```bash
//! # Default settings (127.0.0.1:3001, ~/.nodetree/database/nodetree.db)
//! cargo run --bin nodetree-server
//!
//! # Custom port and database
//! NODETREE_PORT=3002 NODETREE_DB_PATH=/tmp/tree.db cargo run --bin nodetree-server
//! ```
//!
//! # Environment Variables
//!
//! - `NODETREE_DB_PATH`, `NODETREE_HOST`, `NODETREE_PORT`, `NODETREE_DELETE_POLICY`,
//!   `CORS_ALLOW_ORIGIN`: see [`nodetree_server::config`]
//! - `RUST_LOG`: Logging level (e.g., "info", "debug", "trace")
//!
//! A store that cannot be opened aborts startup.

use std::sync::Arc;

use nodetree_core::db::{DatabaseService, NodeStore, TursoStore};
use nodetree_core::{BulkMutator, TreeMaterializer, TreeServiceError};
use nodetree_server::{AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    tracing::info!("NodeTree server");
    tracing::info!("Database: {}", config.db_path.display());
    tracing::info!("Delete policy: {}", config.delete_policy);

    let db = DatabaseService::new(config.db_path.clone())
        .await
        .map_err(TreeServiceError::from)?;
    let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(Arc::new(db)));

    let mutator = BulkMutator::new(store.clone()).with_delete_policy(config.delete_policy);
    let materializer = TreeMaterializer::new(store.clone());

    let served = nodetree_server::start_server(&config, AppState::new(mutator, materializer)).await;

    if let Err(e) = store.close().await {
        tracing::warn!("Failed to close database cleanly: {}", e);
    }

    served
}
