use std::sync::Arc;

use folio_worker::engine::JobManager;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; the job manager shares its registry across clones.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Single-slot optimization job manager.
    pub jobs: JobManager,
}
