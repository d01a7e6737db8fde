//! Per-client setup checklist row.

use portal_core::error::CoreError;
use portal_core::setup_checklist::SetupChecklist;
use portal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `client_setup_checklists` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClientSetupChecklist {
    pub id: DbId,
    pub client_id: DbId,
    pub steps: serde_json::Value,
    pub updated_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ClientSetupChecklist {
    pub fn checklist(&self) -> Result<SetupChecklist, CoreError> {
        serde_json::from_value(self.steps.clone()).map_err(|e| {
            CoreError::Internal(format!(
                "Corrupt setup checklist for client {}: {e}",
                self.client_id
            ))
        })
    }
}
