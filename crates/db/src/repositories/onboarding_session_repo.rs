//! Repository for the `onboarding_sessions` table.

use portal_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::client::CreateClient;
use crate::models::onboarding::{OnboardingSession, SaveOnboardingSession};

const COLUMNS: &str = "id, token, client_id, current_step, intake_section, data, status, \
                        completed_at, created_at, updated_at";

/// Wizard sessions, addressed by their public resume token.
pub struct OnboardingSessionRepo;

impl OnboardingSessionRepo {
    /// Start a fresh session on step 1 with empty answers.
    pub async fn create(pool: &PgPool, token: Uuid) -> Result<OnboardingSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO onboarding_sessions (token)
             VALUES ($1)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OnboardingSession>(&query)
            .bind(token)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_token(
        pool: &PgPool,
        token: Uuid,
    ) -> Result<Option<OnboardingSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM onboarding_sessions WHERE token = $1");
        sqlx::query_as::<_, OnboardingSession>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Link a session to a newly created client, unless it already has one.
    ///
    /// The session row is locked while the client is inserted, so concurrent
    /// first saves of one session create a single client. Returns the linked
    /// client id and whether this call created it.
    pub async fn link_new_client(
        pool: &PgPool,
        id: DbId,
        input: &CreateClient,
    ) -> Result<Option<(DbId, bool)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let linked: Option<(Option<DbId>,)> =
            sqlx::query_as("SELECT client_id FROM onboarding_sessions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let existing = match linked {
            None => return Ok(None),
            Some((existing,)) => existing,
        };
        if let Some(client_id) = existing {
            tx.commit().await?;
            return Ok(Some((client_id, false)));
        }

        let (client_id,): (DbId,) = sqlx::query_as(
            "INSERT INTO clients (name, client_type, assigned_to, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.client_type)
        .bind(&input.assigned_to)
        .bind(input.created_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE onboarding_sessions SET client_id = $2 WHERE id = $1")
            .bind(id)
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some((client_id, true)))
    }

    /// Overwrite the mutable columns of a session.
    ///
    /// `completed_at` is stamped the first time the status becomes `completed`.
    /// An existing client link is never replaced.
    pub async fn save(
        pool: &PgPool,
        id: DbId,
        input: &SaveOnboardingSession,
    ) -> Result<Option<OnboardingSession>, sqlx::Error> {
        let query = format!(
            "UPDATE onboarding_sessions SET
                client_id = COALESCE(client_id, $2),
                current_step = $3,
                intake_section = $4,
                data = $5,
                status = $6,
                completed_at = CASE
                    WHEN $6 = 'completed' THEN COALESCE(completed_at, NOW())
                    ELSE completed_at
                END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OnboardingSession>(&query)
            .bind(id)
            .bind(input.client_id)
            .bind(input.current_step)
            .bind(&input.intake_section)
            .bind(&input.data)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }
}
