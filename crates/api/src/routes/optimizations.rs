//! Route definitions for optimization submission and task polling.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::optimizations;
use crate::state::AppState;

/// Routes mounted at `/optimizations`.
///
/// ```text
/// POST   /                -> submit_optimization
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(optimizations::submit_optimization))
}

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /{id}            -> get_task
/// ```
pub fn task_router() -> Router<AppState> {
    Router::new().route("/{id}", get(optimizations::get_task))
}
