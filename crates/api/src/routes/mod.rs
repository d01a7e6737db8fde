pub mod auth;
pub mod clients;
pub mod health;
pub mod onboarding;
pub mod portal;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/signup | login | refresh                     public
/// /auth/logout, /auth/me                             requires auth
///
/// /onboarding                                        start wizard (public)
/// /onboarding/catalog/{client_type}                  documents + services
/// /onboarding/{token}                                get, save answers
/// /onboarding/{token}/client-type | advance | back
/// /onboarding/{token}/intake/next | intake/back
/// /onboarding/{token}/documents/{doc_id}             multipart upload
/// /onboarding/{token}/poa | services | engagement/sign | payment
/// /onboarding/{token}/complete | abandon
///
/// /portal/{token}                                    client portal (public)
/// /portal/{token}/tasks/{id}/complete
/// /portal/{token}/messages[/{id}/read]
///
/// /clients                                           list, create (auth)
/// /clients/{id}                                      get, update, delete (admin)
/// /clients/{id}/onboarding | documents[/{document_id}/file]
/// /clients/{id}/setup[/{step_id}/toggle | /{step_id}/fields/{field_id}]
/// /clients/{id}/billing[/approval (admin) | /proposal | /invoice]
/// /clients/{id}/tasks[/{task_id}]
/// /clients/{id}/messages
///
/// /settings                                          get, update (admin)
/// /settings/integrations[/{key}/test]
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/onboarding", onboarding::router())
        .nest("/portal", portal::router())
        .nest("/clients", clients::router())
        .nest("/settings", settings::router())
}
