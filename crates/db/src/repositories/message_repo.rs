//! Repository for the `messages` table.

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::message::{CreateMessage, Message};

const COLUMNS: &str = "id, client_id, sender, sender_name, body, read_at, created_at, updated_at";

pub struct MessageRepo;

impl MessageRepo {
    pub async fn create(pool: &PgPool, input: &CreateMessage) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (client_id, sender, sender_name, body)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(input.client_id)
            .bind(&input.sender)
            .bind(&input.sender_name)
            .bind(&input.body)
            .fetch_one(pool)
            .await
    }

    /// The thread for a client, oldest first.
    pub async fn list_by_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages WHERE client_id = $1 ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Stamp `read_at` on a message once. Returns `None` if the message does
    /// not belong to the client.
    pub async fn mark_read(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Message>, sqlx::Error> {
        let query = format!(
            "UPDATE messages SET read_at = COALESCE(read_at, NOW())
             WHERE client_id = $1 AND id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(client_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
