//! Client portal message model and DTO.

use portal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub client_id: DbId,
    pub sender: String,
    pub sender_name: String,
    pub body: String,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

pub struct CreateMessage {
    pub client_id: DbId,
    pub sender: String,
    pub sender_name: String,
    pub body: String,
}
