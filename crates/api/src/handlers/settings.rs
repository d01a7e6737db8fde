//! Handlers for the `/settings` resource: integration credentials and the
//! automation workflow flags.
//!
//! The whole document is stored as one JSON row under
//! [`SETTINGS_KEY`]. Non-admin callers only ever see redacted API keys.

use axum::extract::{Path, State};
use axum::Json;
use portal_core::settings::{
    find_integration, integrations_by_category, Integration, WorkflowSettings, SETTINGS_KEY,
};
use portal_db::repositories::SettingsRepo;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireAuth};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IntegrationGroup {
    pub category: &'static str,
    pub integrations: Vec<&'static Integration>,
}

/// Outcome of a connection probe. `reachable` means the server answered at
/// all; `status_code` is what it answered with.
#[derive(Debug, Serialize)]
pub struct ConnectionTest {
    pub key: String,
    pub url: String,
    pub reachable: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

/// Stored settings, or defaults when nothing has been saved yet.
pub(crate) async fn load_settings(state: &AppState) -> AppResult<WorkflowSettings> {
    let stored = match SettingsRepo::get(&state.pool, SETTINGS_KEY).await? {
        Some(row) => serde_json::from_value::<WorkflowSettings>(row.value)
            .map_err(|e| AppError::InternalError(format!("Corrupt settings document: {e}")))?,
        None => WorkflowSettings::default(),
    };
    Ok(stored.normalize())
}

/// GET /api/v1/settings
pub async fn get_settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WorkflowSettings>>> {
    let settings = load_settings(&state).await?;
    let data = if auth.is_admin() {
        settings
    } else {
        settings.redacted()
    };
    Ok(Json(DataResponse { data }))
}

/// PUT /api/v1/settings
///
/// Admin only. Replaces the whole document; masked API keys keep their
/// stored value.
pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<WorkflowSettings>,
) -> AppResult<Json<DataResponse<WorkflowSettings>>> {
    input.validate()?;
    let stored = load_settings(&state).await?;

    let mut settings = input.normalize();
    settings.merge_redacted_secrets(&stored);

    let value = serde_json::to_value(&settings)
        .map_err(|e| AppError::InternalError(format!("Failed to encode settings: {e}")))?;
    SettingsRepo::upsert(&state.pool, SETTINGS_KEY, &value, admin.user_id).await?;

    let enabled = settings.integrations.values().filter(|c| c.enabled).count();
    tracing::info!(user_id = admin.user_id, enabled_integrations = enabled, "Settings updated");
    Ok(Json(DataResponse { data: settings }))
}

/// GET /api/v1/settings/integrations
///
/// The integration catalogue grouped by category.
pub async fn list_integrations(
    _auth: RequireAuth,
) -> AppResult<Json<DataResponse<Vec<IntegrationGroup>>>> {
    let groups = integrations_by_category()
        .into_iter()
        .map(|(category, integrations)| IntegrationGroup {
            category: category.label(),
            integrations,
        })
        .collect();
    Ok(Json(DataResponse { data: groups }))
}

/// POST /api/v1/settings/integrations/{key}/test
///
/// GET the configured API URL and report whether it answered.
pub async fn test_connection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<ConnectionTest>>> {
    if find_integration(&key).is_none() {
        return Err(AppError::NotFound(format!("Integration '{key}' not found")));
    }
    let settings = load_settings(&state).await?;
    let url = settings.connection_target(&key)?.to_string();

    let result = match state.http.get(&url).send().await {
        Ok(resp) => ConnectionTest {
            key: key.clone(),
            url,
            reachable: true,
            status_code: Some(resp.status().as_u16()),
            error: None,
        },
        Err(e) => ConnectionTest {
            key: key.clone(),
            url,
            reachable: false,
            status_code: e.status().map(|s| s.as_u16()),
            error: Some(e.to_string()),
        },
    };

    tracing::info!(
        user_id = auth.user_id,
        integration = %key,
        reachable = result.reachable,
        status_code = ?result.status_code,
        "Integration connection tested"
    );
    Ok(Json(DataResponse { data: result }))
}

