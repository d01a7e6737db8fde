//! Repository for the `tasks` table.

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::task::{CreateTask, Task, UpdateTask};

const COLUMNS: &str = "id, client_id, title, description, due_date, status, priority, \
                        requested_by, completed_at, created_at, updated_at";

/// Portal tasks. Every lookup is keyed by client so a task id alone never
/// reaches another client's row.
pub struct TaskRepo;

impl TaskRepo {
    pub async fn create(
        pool: &PgPool,
        client_id: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (client_id, title, description, due_date, priority, requested_by)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'medium'), $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(client_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.due_date)
            .bind(&input.priority)
            .bind(&input.requested_by)
            .fetch_one(pool)
            .await
    }

    /// Tasks for a client ordered by due date (undated last), then creation.
    pub async fn list_by_client(pool: &PgPool, client_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tasks
             WHERE client_id = $1
             ORDER BY due_date ASC NULLS LAST, created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Update a task. Only non-`None` fields are applied; `completed_at`
    /// follows the status.
    pub async fn update(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                due_date = COALESCE($5, due_date),
                status = COALESCE($6, status),
                priority = COALESCE($7, priority),
                completed_at = CASE
                    WHEN COALESCE($6, status) = 'complete' THEN COALESCE(completed_at, NOW())
                    ELSE NULL
                END
             WHERE client_id = $1 AND id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(client_id)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.due_date)
            .bind(&input.status)
            .bind(&input.priority)
            .fetch_optional(pool)
            .await
    }

    /// Mark a task complete. Completing an already complete task is a no-op
    /// that returns the row unchanged.
    pub async fn complete(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                status = 'complete',
                completed_at = COALESCE(completed_at, NOW())
             WHERE client_id = $1 AND id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(client_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
