//! Handlers for the public client portal, addressed by the client's portal
//! token.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portal_core::error::CoreError;
use portal_core::portal::{
    partition_tasks, unread_count, validate_message_body, MessageSender,
};
use portal_core::types::DbId;
use portal_db::models::client::Client;
use portal_db::models::message::{CreateMessage, Message};
use portal_db::models::task::Task;
use portal_db::repositories::{ClientRepo, MessageRepo, TaskRepo};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// The slice of the client record the client itself may see.
#[derive(Debug, Serialize)]
pub struct PortalClient {
    pub id: DbId,
    pub name: String,
    pub client_type: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct PortalOverview {
    pub client: PortalClient,
    pub open_tasks: Vec<Task>,
    pub completed_tasks: Vec<Task>,
    pub messages: Vec<Message>,
    /// Staff messages the client has not opened.
    pub unread_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
}

async fn portal_client(state: &AppState, token: Uuid) -> AppResult<Client> {
    ClientRepo::find_by_portal_token(&state.pool, token)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Portal {token} not found")))
}

fn staff_unread(messages: &[Message]) -> AppResult<usize> {
    let mut flags = Vec::with_capacity(messages.len());
    for m in messages {
        flags.push((MessageSender::from_str_db(&m.sender)?, m.read_at.is_some()));
    }
    Ok(unread_count(flags))
}

/// GET /api/v1/portal/{token}
pub async fn overview(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<Json<DataResponse<PortalOverview>>> {
    let client = portal_client(&state, token).await?;
    let tasks = TaskRepo::list_by_client(&state.pool, client.id).await?;
    let (open_tasks, completed_tasks) = partition_tasks(tasks, Task::task_status);
    let messages = MessageRepo::list_by_client(&state.pool, client.id).await?;
    let unread_count = staff_unread(&messages)?;

    Ok(Json(DataResponse {
        data: PortalOverview {
            client: PortalClient {
                id: client.id,
                name: client.name,
                client_type: client.client_type,
                status: client.status,
            },
            open_tasks,
            completed_tasks,
            messages,
            unread_count,
        },
    }))
}

/// POST /api/v1/portal/{token}/tasks/{id}/complete
pub async fn complete_task(
    State(state): State<AppState>,
    Path((token, id)): Path<(Uuid, DbId)>,
) -> AppResult<Json<DataResponse<Task>>> {
    let client = portal_client(&state, token).await?;
    let task = TaskRepo::complete(&state.pool, client.id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;
    tracing::info!(client_id = client.id, task_id = id, "Task completed by client");
    Ok(Json(DataResponse { data: task }))
}

/// GET /api/v1/portal/{token}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let client = portal_client(&state, token).await?;
    let messages = MessageRepo::list_by_client(&state.pool, client.id).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/portal/{token}/messages
///
/// A message from the client. Signed with the client's name.
pub async fn post_message(
    State(state): State<AppState>,
    Path(token): Path<Uuid>,
    Json(input): Json<PostMessageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Message>>)> {
    let client = portal_client(&state, token).await?;
    let body = input.body.trim();
    validate_message_body(body)?;

    let message = MessageRepo::create(
        &state.pool,
        &CreateMessage {
            client_id: client.id,
            sender: MessageSender::Client.as_str().to_string(),
            sender_name: client.name.clone(),
            body: body.to_string(),
        },
    )
    .await?;
    tracing::info!(client_id = client.id, message_id = message.id, "Client posted message");
    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}

/// POST /api/v1/portal/{token}/messages/{id}/read
///
/// Only staff messages can be marked read from the portal.
pub async fn mark_read(
    State(state): State<AppState>,
    Path((token, id)): Path<(Uuid, DbId)>,
) -> AppResult<Json<DataResponse<Message>>> {
    let client = portal_client(&state, token).await?;
    let messages = MessageRepo::list_by_client(&state.pool, client.id).await?;
    let message = messages
        .iter()
        .find(|m| m.id == id)
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Message", id }))?;
    if MessageSender::from_str_db(&message.sender)? != MessageSender::Staff {
        return Err(AppError::Core(CoreError::Validation(
            "Only messages from staff can be marked read".into(),
        )));
    }

    let message = MessageRepo::mark_read(&state.pool, client.id, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Message", id }))?;
    tracing::info!(client_id = client.id, message_id = id, "Message read");
    Ok(Json(DataResponse { data: message }))
}
