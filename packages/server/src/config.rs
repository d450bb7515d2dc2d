//! Server configuration from environment variables
//!
//! - `NODETREE_DB_PATH`: database file (default `~/.nodetree/database/nodetree.db`)
//! - `NODETREE_HOST`: bind address (default `127.0.0.1`)
//! - `NODETREE_PORT`: port (default `3001`)
//! - `NODETREE_DELETE_POLICY`: `cascade` (default) or `exact`
//! - `CORS_ALLOW_ORIGIN`: single allowed origin, replacing the localhost defaults

use anyhow::Result;
use nodetree_core::DeletePolicy;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_HOST: &str = "127.0.0.1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub delete_policy: DeletePolicy,
    pub cors_origin: Option<String>,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build configuration from an explicit variable map
    ///
    /// # Errors
    ///
    /// Fails when no database path is given and the home directory cannot be
    /// resolved, or when the delete policy is not recognized. An unparsable port
    /// falls back to the default.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let db_path = match vars.get("NODETREE_DB_PATH").filter(|p| !p.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let host = vars
            .get("NODETREE_HOST")
            .filter(|h| !h.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match vars.get("NODETREE_PORT") {
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid NODETREE_PORT '{}', using default {}",
                    raw,
                    DEFAULT_PORT
                );
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let delete_policy = match vars.get("NODETREE_DELETE_POLICY") {
            Some(raw) => raw.parse::<DeletePolicy>()?,
            None => DeletePolicy::default(),
        };

        let cors_origin = vars
            .get("CORS_ALLOW_ORIGIN")
            .filter(|o| !o.is_empty())
            .cloned();

        Ok(Self {
            db_path,
            host,
            port,
            delete_policy,
            cors_origin,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_db_path() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Failed to get home directory"))?;

    Ok(home_dir
        .join(".nodetree")
        .join("database")
        .join("nodetree.db"))
}
