use axum::routing::{get, post};
use axum::Router;

use crate::handlers::portal;
use crate::state::AppState;

/// Public client portal mounted at `/portal`, addressed by portal token.
///
/// ```text
/// GET  /{token}                      -> overview
/// POST /{token}/tasks/{id}/complete  -> complete_task
/// GET  /{token}/messages             -> list_messages
/// POST /{token}/messages             -> post_message
/// POST /{token}/messages/{id}/read   -> mark_read
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{token}", get(portal::overview))
        .route("/{token}/tasks/{id}/complete", post(portal::complete_task))
        .route(
            "/{token}/messages",
            get(portal::list_messages).post(portal::post_message),
        )
        .route("/{token}/messages/{id}/read", post(portal::mark_read))
}
