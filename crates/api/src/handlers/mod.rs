//! Request handlers, one module per resource.

pub mod auth;
pub mod billing;
pub mod clients;
pub mod messages;
pub mod onboarding;
pub mod portal;
pub mod settings;
pub mod setup;
pub mod tasks;

use portal_core::error::CoreError;
use portal_core::types::DbId;
use portal_db::models::client::Client;
use portal_db::repositories::ClientRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Load a client the caller may see. Foreign and missing clients are both
/// reported as 404.
pub(crate) async fn visible_client(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<Client> {
    ClientRepo::find_visible(&state.pool, user.user_id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Client",
            id,
        }))
}

/// Load a client for billing review. Admins sign off on fee schedules for
/// every client, so they are not owner-scoped here.
pub(crate) async fn reviewable_client(
    state: &AppState,
    user: &AuthUser,
    id: DbId,
) -> AppResult<Client> {
    if !user.is_admin() {
        return visible_client(state, user, id).await;
    }
    ClientRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Client",
            id,
        }))
}
