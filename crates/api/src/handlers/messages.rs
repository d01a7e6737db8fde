//! Staff-side handlers for `/clients/{id}/messages`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portal_core::portal::{validate_message_body, MessageSender};
use portal_core::types::DbId;
use portal_db::models::message::{CreateMessage, Message};
use portal_db::repositories::MessageRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::tasks::staff_name;
use crate::handlers::visible_client;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub body: String,
}

/// GET /api/v1/clients/{id}/messages
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Message>>>> {
    let client = visible_client(&state, &auth, client_id).await?;
    let messages = MessageRepo::list_by_client(&state.pool, client.id).await?;
    tracing::debug!(client_id, count = messages.len(), "Listed messages");
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/clients/{id}/messages
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(client_id): Path<DbId>,
    Json(input): Json<PostMessageRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Message>>)> {
    let client = visible_client(&state, &auth, client_id).await?;
    let body = input.body.trim();
    validate_message_body(body)?;

    let message = MessageRepo::create(
        &state.pool,
        &CreateMessage {
            client_id: client.id,
            sender: MessageSender::Staff.as_str().to_string(),
            sender_name: staff_name(&state, &auth).await?,
            body: body.to_string(),
        },
    )
    .await?;
    tracing::info!(client_id, message_id = message.id, user_id = auth.user_id, "Staff posted message");
    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}
