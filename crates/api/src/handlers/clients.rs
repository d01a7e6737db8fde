//! Handlers for the `/clients` resource (staff dashboard).
//!
//! Every query is scoped to the caller: their own clients plus intake-created
//! clients without an owner.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use portal_core::client::{
    validate_assignee, validate_client_name, validate_setup_progress, ClientStatus, ClientType,
    DashboardStats, StatusFilter,
};
use portal_core::documents::content_type;
use portal_core::error::CoreError;
use portal_core::search::{clamp_limit, clamp_offset};
use portal_core::types::DbId;
use portal_db::models::client::{Client, CreateClient, UpdateClient};
use portal_db::models::document::Document;
use portal_db::models::onboarding::OnboardingResponse;
use portal_db::repositories::client_repo::ClientListFilter;
use portal_db::repositories::{ClientRepo, DocumentRepo, OnboardingResponseRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::visible_client;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::ClientListParams;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Serialize)]
pub struct ClientList {
    pub clients: Vec<Client>,
    /// Counts over every visible client, independent of the filters.
    pub stats: DashboardStats,
}

/// GET /api/v1/clients?search=&status=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ClientListParams>,
) -> AppResult<Json<DataResponse<ClientList>>> {
    let status = match StatusFilter::parse(params.status.as_deref())? {
        StatusFilter::All => None,
        StatusFilter::Only(s) => Some(s.as_str().to_string()),
    };
    let search = params
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let filter = ClientListFilter {
        status,
        search,
        limit: clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT),
        offset: clamp_offset(params.offset),
    };
    let clients = ClientRepo::list_visible(&state.pool, auth.user_id, &filter).await?;

    let counts = ClientRepo::status_counts_visible(&state.pool, auth.user_id).await?;
    let mut pairs = Vec::with_capacity(counts.len());
    for row in counts {
        let status = ClientStatus::from_str_db(&row.status)?;
        pairs.push((status, usize::try_from(row.count).unwrap_or(0)));
    }
    let stats = DashboardStats::from_counts(pairs);

    tracing::debug!(user_id = auth.user_id, count = clients.len(), "Listed clients");
    Ok(Json(DataResponse {
        data: ClientList { clients, stats },
    }))
}

/// POST /api/v1/clients
///
/// Manual add from the dashboard. Starts at status `new` and 0 % progress.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<CreateClient>,
) -> AppResult<(StatusCode, Json<DataResponse<Client>>)> {
    input.name = input.name.trim().to_string();
    validate_client_name(&input.name)?;
    ClientType::from_str_db(&input.client_type)?;
    if let Some(assignee) = &input.assigned_to {
        validate_assignee(assignee)?;
    }
    input.created_by = Some(auth.user_id);

    let client = ClientRepo::create(&state.pool, &input).await?;
    tracing::info!(client_id = client.id, user_id = auth.user_id, "Client created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: client })))
}

/// GET /api/v1/clients/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Client>>> {
    let client = visible_client(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: client }))
}

/// PUT /api/v1/clients/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateClient>,
) -> AppResult<Json<DataResponse<Client>>> {
    if let Some(name) = input.name.as_mut() {
        *name = name.trim().to_string();
        validate_client_name(name)?;
    }
    if let Some(t) = &input.client_type {
        ClientType::from_str_db(t)?;
    }
    if let Some(s) = &input.status {
        ClientStatus::from_str_db(s)?;
    }
    if let Some(p) = input.setup_progress {
        validate_setup_progress(p)?;
    }
    if let Some(a) = &input.assigned_to {
        validate_assignee(a)?;
    }

    let client = ClientRepo::update_visible(&state.pool, auth.user_id, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Client",
            id,
        }))?;
    tracing::info!(client_id = id, user_id = auth.user_id, "Client updated");
    Ok(Json(DataResponse { data: client }))
}

/// DELETE /api/v1/clients/{id}
///
/// Admin only. Cascades to onboarding, documents, tasks and messages.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = ClientRepo::delete_visible(&state.pool, admin.user_id, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Client",
            id,
        }));
    }
    tracing::info!(client_id = id, user_id = admin.user_id, "Client deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/clients/{id}/onboarding
///
/// The aggregated intake answers, or `null` when the client never went
/// through the wizard.
pub async fn onboarding_answers(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Option<OnboardingResponse>>>> {
    let client = visible_client(&state, &auth, id).await?;
    let response = OnboardingResponseRepo::find_by_client(&state.pool, client.id).await?;
    Ok(Json(DataResponse { data: response }))
}

/// GET /api/v1/clients/{id}/documents
pub async fn documents(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Document>>>> {
    let client = visible_client(&state, &auth, id).await?;
    let documents = DocumentRepo::list_by_client(&state.pool, client.id).await?;
    tracing::debug!(client_id = id, count = documents.len(), "Listed documents");
    Ok(Json(DataResponse { data: documents }))
}

/// GET /api/v1/clients/{id}/documents/{document_id}/file
///
/// Download the stored file of one upload.
pub async fn download_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, document_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let client = visible_client(&state, &auth, id).await?;
    let document = DocumentRepo::find_for_client(&state.pool, client.id, document_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Document",
            id: document_id,
        }))?;

    let key = state
        .documents
        .key_of(std::path::Path::new(&document.file_path))
        .map_err(|e| AppError::InternalError(format!("Invalid document path: {e}")))?;
    let bytes = state.documents.get(&key).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read document {document_id}: {e}"))
    })?;

    let file_name: String = document
        .file_name
        .chars()
        .map(|c| if c.is_control() || c == '"' || c == '\\' { '_' } else { c })
        .collect();
    let disposition = format!("attachment; filename=\"{file_name}\"");
    tracing::debug!(client_id = id, document_id, size = bytes.len(), "Document downloaded");
    Ok((
        [
            (CONTENT_TYPE, content_type(&document.file_type).to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
