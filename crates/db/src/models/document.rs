//! Uploaded document model and DTO.

use portal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `documents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DbId,
    pub client_id: DbId,
    pub document_type: String,
    pub document_category: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub is_required: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a stored upload.
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub client_id: DbId,
    pub document_type: String,
    pub document_category: String,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub is_required: bool,
}
