//! Staff-side handlers for `/clients/{id}/tasks`: requests shown to the
//! client in their portal.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portal_core::error::CoreError;
use portal_core::portal::{validate_task_title, TaskPriority, TaskStatus};
use portal_core::types::DbId;
use portal_db::models::task::{CreateTask, Task, UpdateTask};
use portal_db::repositories::{TaskRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::visible_client;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Display name stamped on tasks and messages written by `user`.
pub(crate) async fn staff_name(state: &AppState, user: &AuthUser) -> AppResult<String> {
    let user = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;
    Ok(user.display_name)
}

/// GET /api/v1/clients/{id}/tasks
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    let tasks = TaskRepo::list_by_client(&state.pool, client.id).await?;
    tracing::debug!(client_id, count = tasks.len(), "Listed tasks");
    Ok(Json(DataResponse { data: tasks }))
}

/// POST /api/v1/clients/{id}/tasks
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
    Json(mut input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<DataResponse<Task>>)> {
    let client = visible_client(&state, &auth, client_id).await?;
    input.title = input.title.trim().to_string();
    validate_task_title(&input.title)?;
    if let Some(p) = &input.priority {
        TaskPriority::from_str_db(p)?;
    }
    input.requested_by = staff_name(&state, &auth).await?;

    let task = TaskRepo::create(&state.pool, client.id, &input).await?;
    tracing::info!(client_id, task_id = task.id, user_id = auth.user_id, "Task created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// PUT /api/v1/clients/{id}/tasks/{task_id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((client_id, task_id)): Path<(DbId, DbId)>,
    Json(mut input): Json<UpdateTask>,
) -> AppResult<Json<DataResponse<Task>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    if let Some(title) = input.title.as_mut() {
        *title = title.trim().to_string();
        validate_task_title(title)?;
    }
    if let Some(s) = &input.status {
        TaskStatus::from_str_db(s)?;
    }
    if let Some(p) = &input.priority {
        TaskPriority::from_str_db(p)?;
    }

    let task = TaskRepo::update(&state.pool, client.id, task_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Task",
            id: task_id,
        }))?;
    tracing::info!(client_id, task_id, user_id = auth.user_id, "Task updated");
    Ok(Json(DataResponse { data: task }))
}
