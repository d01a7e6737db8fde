//! Client portal task model and DTOs.

use chrono::NaiveDate;
use portal_core::portal::TaskStatus;
use portal_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub client_id: DbId,
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub priority: String,
    pub requested_by: String,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    /// Status as the domain enum; unknown strings count as pending.
    pub fn task_status(&self) -> TaskStatus {
        TaskStatus::from_str_db(&self.status).unwrap_or_default()
    }
}

/// DTO for creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    /// Filled in by the server from the caller.
    #[serde(skip)]
    pub requested_by: String,
}

/// DTO for updating a task. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub priority: Option<String>,
}
