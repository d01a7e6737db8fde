//! Key/value application settings.

use portal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `app_settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AppSetting {
    pub id: DbId,
    pub setting_key: String,
    pub value: serde_json::Value,
    pub updated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
