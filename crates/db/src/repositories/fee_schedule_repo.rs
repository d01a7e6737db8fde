//! Repository for the `client_fee_schedules` table.

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::fee_schedule::{FeeSchedule, SaveFeeSchedule};

const COLUMNS: &str = "id, client_id, line_items, adjustments, prior_year_fee_cents, \
                        partner_approved, approved_by, proposal_sent_at, invoice_generated_at, \
                        created_at, updated_at";

pub struct FeeScheduleRepo;

impl FeeScheduleRepo {
    pub async fn find_by_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Option<FeeSchedule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM client_fee_schedules WHERE client_id = $1");
        sqlx::query_as::<_, FeeSchedule>(&query)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the worksheet columns for a client.
    ///
    /// Send timestamps are left untouched on update. Partner approval is
    /// withdrawn whenever the line items or adjustments change, since it was
    /// given for the old figures.
    pub async fn upsert(
        pool: &PgPool,
        client_id: DbId,
        input: &SaveFeeSchedule,
    ) -> Result<FeeSchedule, sqlx::Error> {
        let query = format!(
            "INSERT INTO client_fee_schedules (client_id, line_items, adjustments, prior_year_fee_cents)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (client_id) DO UPDATE SET
                line_items = EXCLUDED.line_items,
                adjustments = EXCLUDED.adjustments,
                prior_year_fee_cents = EXCLUDED.prior_year_fee_cents,
                partner_approved = CASE
                    WHEN client_fee_schedules.line_items IS DISTINCT FROM EXCLUDED.line_items
                      OR client_fee_schedules.adjustments IS DISTINCT FROM EXCLUDED.adjustments
                    THEN FALSE
                    ELSE client_fee_schedules.partner_approved
                END,
                approved_by = CASE
                    WHEN client_fee_schedules.line_items IS DISTINCT FROM EXCLUDED.line_items
                      OR client_fee_schedules.adjustments IS DISTINCT FROM EXCLUDED.adjustments
                    THEN NULL
                    ELSE client_fee_schedules.approved_by
                END
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeeSchedule>(&query)
            .bind(client_id)
            .bind(&input.line_items)
            .bind(&input.adjustments)
            .bind(input.prior_year_fee_cents)
            .fetch_one(pool)
            .await
    }

    /// Insert a schedule only when the client has none yet.
    ///
    /// Returns `None` when a schedule already existed.
    pub async fn create_if_absent(
        pool: &PgPool,
        client_id: DbId,
        input: &SaveFeeSchedule,
    ) -> Result<Option<FeeSchedule>, sqlx::Error> {
        let query = format!(
            "INSERT INTO client_fee_schedules (client_id, line_items, adjustments, prior_year_fee_cents)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (client_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeeSchedule>(&query)
            .bind(client_id)
            .bind(&input.line_items)
            .bind(&input.adjustments)
            .bind(input.prior_year_fee_cents)
            .fetch_optional(pool)
            .await
    }

    /// Record or withdraw partner approval.
    pub async fn set_approval(
        pool: &PgPool,
        client_id: DbId,
        approved: bool,
        approved_by: Option<DbId>,
    ) -> Result<Option<FeeSchedule>, sqlx::Error> {
        let query = format!(
            "UPDATE client_fee_schedules SET partner_approved = $2, approved_by = $3
             WHERE client_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeeSchedule>(&query)
            .bind(client_id)
            .bind(approved)
            .bind(approved_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_proposal_sent(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Option<FeeSchedule>, sqlx::Error> {
        let query = format!(
            "UPDATE client_fee_schedules SET proposal_sent_at = NOW()
             WHERE client_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeeSchedule>(&query)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn mark_invoice_generated(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Option<FeeSchedule>, sqlx::Error> {
        let query = format!(
            "UPDATE client_fee_schedules SET invoice_generated_at = NOW()
             WHERE client_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FeeSchedule>(&query)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }
}
