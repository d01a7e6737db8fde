//! Repository for the `documents` table.

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::document::{CreateDocument, Document};

const COLUMNS: &str = "id, client_id, document_type, document_category, file_name, file_path, \
                        file_size, file_type, is_required, created_at, updated_at";

pub struct DocumentRepo;

impl DocumentRepo {
    pub async fn create(pool: &PgPool, input: &CreateDocument) -> Result<Document, sqlx::Error> {
        let query = format!(
            "INSERT INTO documents (client_id, document_type, document_category, file_name,
                                    file_path, file_size, file_type, is_required)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(input.client_id)
            .bind(&input.document_type)
            .bind(&input.document_category)
            .bind(&input.file_name)
            .bind(&input.file_path)
            .bind(input.file_size)
            .bind(&input.file_type)
            .bind(input.is_required)
            .fetch_one(pool)
            .await
    }

    /// One upload, only if it belongs to the given client.
    pub async fn find_for_client(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE client_id = $1 AND id = $2");
        sqlx::query_as::<_, Document>(&query)
            .bind(client_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All uploads for a client, oldest first.
    pub async fn list_by_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents WHERE client_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }
}
