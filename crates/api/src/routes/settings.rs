use axum::routing::{get, post};
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/settings`.
///
/// ```text
/// GET  /                          -> get_settings (keys redacted for non-admins)
/// PUT  /                          -> update_settings (admin)
/// GET  /integrations              -> list_integrations
/// POST /integrations/{key}/test   -> test_connection
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route("/integrations", get(settings::list_integrations))
        .route("/integrations/{key}/test", post(settings::test_connection))
}
