//! Handlers for `/clients/{id}/setup`: the per-client integration setup
//! checklist.
//!
//! A checklist is seeded from the client record and intake answers the first
//! time it is viewed and stored on the first change. Toggling a step
//! recomputes the client's `setup_progress` and derived status.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{Datelike, Utc};
use portal_core::client::status_for_progress;
use portal_core::documents::find_request;
use portal_core::setup_checklist::{ChecklistSeed, FieldValue, SetupChecklist};
use portal_core::types::DbId;
use portal_db::models::client::Client;
use portal_db::repositories::{
    ClientRepo, DocumentRepo, OnboardingResponseRepo, SetupChecklistRepo,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::visible_client;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SetupView {
    pub client_id: DbId,
    pub checklist: SetupChecklist,
    pub completed_count: usize,
    pub progress_percent: i32,
    pub is_complete: bool,
    /// Client status after any progress change.
    pub client_status: String,
}

impl SetupView {
    fn new(client: &Client, checklist: SetupChecklist) -> Self {
        Self {
            client_id: client.id,
            completed_count: checklist.completed_count(),
            progress_percent: checklist.progress_percent(),
            is_complete: checklist.is_complete(),
            client_status: client.status.clone(),
            checklist,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub value: FieldValue,
}

/// Stored checklist, or a fresh one pre-filled from intake.
async fn load_or_seed(state: &AppState, client: &Client) -> AppResult<SetupChecklist> {
    if let Some(row) = SetupChecklistRepo::find_by_client(&state.pool, client.id).await? {
        return Ok(row.checklist()?);
    }

    let client_type = client.client_type()?;
    let answers = OnboardingResponseRepo::find_by_client(&state.pool, client.id).await?;
    let documents = DocumentRepo::list_by_client(&state.pool, client.id).await?;

    let mut document_names: Vec<String> = Vec::new();
    for doc in &documents {
        let name = find_request(client_type, &doc.document_type)
            .map(|r| r.name.to_string())
            .unwrap_or_else(|_| doc.file_name.clone());
        if !document_names.contains(&name) {
            document_names.push(name);
        }
    }

    let (address, services) = match &answers {
        Some(a) => (
            Some(a.address.as_str()).filter(|s| !s.trim().is_empty()),
            a.selected_services.clone(),
        ),
        None => (None, Vec::new()),
    };

    Ok(SetupChecklist::for_client(&ChecklistSeed {
        client_name: &client.name,
        client_type,
        address,
        selected_services: &services,
        document_names: &document_names,
        tax_year: Utc::now().year() - 1,
    }))
}

async fn store(
    state: &AppState,
    client_id: DbId,
    checklist: &SetupChecklist,
    user: &AuthUser,
) -> AppResult<()> {
    let steps = serde_json::to_value(checklist)
        .map_err(|e| AppError::InternalError(format!("Failed to encode checklist: {e}")))?;
    SetupChecklistRepo::upsert(&state.pool, client_id, &steps, Some(user.user_id)).await?;
    Ok(())
}

/// GET /api/v1/clients/{id}/setup
pub async fn get_checklist(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SetupView>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    let checklist = load_or_seed(&state, &client).await?;
    Ok(Json(DataResponse {
        data: SetupView::new(&client, checklist),
    }))
}

/// PUT /api/v1/clients/{id}/setup/{step_id}/fields/{field_id}
pub async fn update_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((client_id, step_id, field_id)): Path<(DbId, String, String)>,
    Json(input): Json<UpdateFieldRequest>,
) -> AppResult<Json<DataResponse<SetupView>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    let mut checklist = load_or_seed(&state, &client).await?;
    checklist.update_field(&step_id, &field_id, input.value)?;
    store(&state, client.id, &checklist, &auth).await?;

    tracing::info!(
        client_id,
        step_id = %step_id,
        field_id = %field_id,
        user_id = auth.user_id,
        "Setup field updated"
    );
    Ok(Json(DataResponse {
        data: SetupView::new(&client, checklist),
    }))
}

/// POST /api/v1/clients/{id}/setup/{step_id}/toggle
pub async fn toggle_step(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((client_id, step_id)): Path<(DbId, String)>,
) -> AppResult<Json<DataResponse<SetupView>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    let mut checklist = load_or_seed(&state, &client).await?;
    let completed = checklist.toggle_step(&step_id)?;
    store(&state, client.id, &checklist, &auth).await?;

    let progress = checklist.progress_percent();
    let status = status_for_progress(client.status()?, progress);
    let client = ClientRepo::set_progress_and_status(&state.pool, client.id, progress, status.as_str())
        .await?
        .unwrap_or(client);

    tracing::info!(
        client_id,
        step_id = %step_id,
        completed,
        progress,
        status = status.as_str(),
        "Setup step toggled"
    );
    Ok(Json(DataResponse {
        data: SetupView::new(&client, checklist),
    }))
}
