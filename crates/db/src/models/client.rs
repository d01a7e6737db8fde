//! Client entity model and DTOs.

use portal_core::client::{ClientStatus, ClientType};
use portal_core::error::CoreError;
use portal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `clients` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: DbId,
    pub name: String,
    pub client_type: String,
    pub status: String,
    pub setup_progress: i32,
    pub assigned_to: Option<String>,
    /// `None` for clients that arrived through the public intake wizard.
    pub created_by: Option<DbId>,
    pub portal_token: Uuid,
    pub onboarded_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Client {
    pub fn client_type(&self) -> Result<ClientType, CoreError> {
        ClientType::from_str_db(&self.client_type)
    }

    pub fn status(&self) -> Result<ClientStatus, CoreError> {
        ClientStatus::from_str_db(&self.status)
    }
}

/// DTO for creating a client, from the admin dashboard or the intake wizard.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub client_type: String,
    pub assigned_to: Option<String>,
    /// Filled in by the server, never taken from request bodies.
    #[serde(skip)]
    pub created_by: Option<DbId>,
}

/// DTO for updating a client. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateClient {
    pub name: Option<String>,
    pub client_type: Option<String>,
    pub status: Option<String>,
    pub setup_progress: Option<i32>,
    pub assigned_to: Option<String>,
}

/// Per-status row count for the dashboard summary.
#[derive(Debug, Clone, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}
