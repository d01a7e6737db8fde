//! Repository for the `client_setup_checklists` table.

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::setup_checklist::ClientSetupChecklist;

const COLUMNS: &str = "id, client_id, steps, updated_by, created_at, updated_at";

pub struct SetupChecklistRepo;

impl SetupChecklistRepo {
    pub async fn find_by_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Option<ClientSetupChecklist>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM client_setup_checklists WHERE client_id = $1");
        sqlx::query_as::<_, ClientSetupChecklist>(&query)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the checklist for a client.
    pub async fn upsert(
        pool: &PgPool,
        client_id: DbId,
        steps: &serde_json::Value,
        updated_by: Option<DbId>,
    ) -> Result<ClientSetupChecklist, sqlx::Error> {
        let query = format!(
            "INSERT INTO client_setup_checklists (client_id, steps, updated_by)
             VALUES ($1, $2, $3)
             ON CONFLICT (client_id) DO UPDATE SET
                steps = EXCLUDED.steps,
                updated_by = EXCLUDED.updated_by
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClientSetupChecklist>(&query)
            .bind(client_id)
            .bind(steps)
            .bind(updated_by)
            .fetch_one(pool)
            .await
    }
}
