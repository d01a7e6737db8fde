use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::DocumentStore;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or is already a handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: portal_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Where uploaded client documents are written.
    pub documents: Arc<DocumentStore>,
    /// Outbound HTTP client for integration connection probes.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(pool: portal_db::DbPool, config: ServerConfig, http: reqwest::Client) -> Self {
        let documents = Arc::new(DocumentStore::new(config.storage_root.clone()));
        Self {
            pool,
            config: Arc::new(config),
            documents,
            http,
        }
    }
}
