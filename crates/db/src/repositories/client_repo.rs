//! Repository for the `clients` table.
//!
//! Staff-facing queries are owner-scoped: a caller sees the clients they
//! created plus intake-created clients that have no owner. Scoped methods take
//! the caller's user id as `$1` and report a foreign client as absent.

use portal_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::client::{Client, CreateClient, StatusCount, UpdateClient};

const COLUMNS: &str = "id, name, client_type, status, setup_progress, assigned_to, \
                        created_by, portal_token, onboarded_at, created_at, updated_at";

/// Row filter shared by every owner-scoped query.
const VISIBLE: &str = "(created_by = $1 OR created_by IS NULL)";

/// Filters for the dashboard list. `None` means "no filter".
#[derive(Debug, Clone, Default)]
pub struct ClientListFilter {
    pub status: Option<String>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

pub struct ClientRepo;

impl ClientRepo {
    /// Insert a new client with status `new` and 0 % setup progress.
    pub async fn create(pool: &PgPool, input: &CreateClient) -> Result<Client, sqlx::Error> {
        let query = format!(
            "INSERT INTO clients (name, client_type, assigned_to, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(&input.name)
            .bind(&input.client_type)
            .bind(&input.assigned_to)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a client by id without owner scoping. Used by token-addressed
    /// flows (onboarding, portal) that have already resolved the client.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_portal_token(
        pool: &PgPool,
        token: Uuid,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE portal_token = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(token)
            .fetch_optional(pool)
            .await
    }

    /// Find a client the caller may see.
    pub async fn find_visible(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE {VISIBLE} AND id = $2");
        sqlx::query_as::<_, Client>(&query)
            .bind(owner_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List visible clients, newest first.
    ///
    /// Search is a case-insensitive substring match on the name.
    pub async fn list_visible(
        pool: &PgPool,
        owner_id: DbId,
        filter: &ClientListFilter,
    ) -> Result<Vec<Client>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM clients
             WHERE {VISIBLE}
               AND ($2::text IS NULL OR status = $2)
               AND ($3::text IS NULL OR strpos(lower(name), lower($3)) > 0)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(owner_id)
            .bind(&filter.status)
            .bind(&filter.search)
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(pool)
            .await
    }

    /// Per-status counts over every visible client, ignoring list filters.
    pub async fn status_counts_visible(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<StatusCount>, sqlx::Error> {
        let query = format!(
            "SELECT status, COUNT(*) AS count FROM clients
             WHERE {VISIBLE}
             GROUP BY status"
        );
        sqlx::query_as::<_, StatusCount>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Update a visible client. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the client does not exist or is not visible.
    pub async fn update_visible(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
        input: &UpdateClient,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET
                name = COALESCE($3, name),
                client_type = COALESCE($4, client_type),
                status = COALESCE($5, status),
                setup_progress = COALESCE($6, setup_progress),
                assigned_to = COALESCE($7, assigned_to)
             WHERE {VISIBLE} AND id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(owner_id)
            .bind(id)
            .bind(&input.name)
            .bind(&input.client_type)
            .bind(&input.status)
            .bind(input.setup_progress)
            .bind(&input.assigned_to)
            .fetch_optional(pool)
            .await
    }

    /// Delete a visible client. Dependent rows cascade.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete_visible(
        pool: &PgPool,
        owner_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("DELETE FROM clients WHERE {VISIBLE} AND id = $2");
        let result = sqlx::query(&query)
            .bind(owner_id)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Write a recomputed setup percentage together with its derived status.
    pub async fn set_progress_and_status(
        pool: &PgPool,
        id: DbId,
        setup_progress: i32,
        status: &str,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET setup_progress = $2, status = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(setup_progress)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("UPDATE clients SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Keep the client's display name and type in step with wizard answers.
    pub async fn sync_from_onboarding(
        pool: &PgPool,
        id: DbId,
        name: &str,
        client_type: &str,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET name = $2, client_type = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(name)
            .bind(client_type)
            .fetch_optional(pool)
            .await
    }

    /// Finished intake: status `in_progress`, `onboarded_at` stamped.
    pub async fn mark_onboarded(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET status = 'in_progress', onboarded_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
