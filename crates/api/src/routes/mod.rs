pub mod health;
pub mod optimizations;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /optimizations                 submit (POST)
/// /tasks/{id}                    poll task state (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/optimizations", optimizations::router())
        .nest("/tasks", optimizations::task_router())
}
