//! Repository for the seeded `roles` table (`admin` and `staff`).

use portal_core::types::DbId;
use sqlx::PgPool;

use crate::models::role::Role;

const COLUMNS: &str = "id, name, description, created_at, updated_at";

pub struct RoleRepo;

impl RoleRepo {
    /// Role assigned at signup. Names are matched exactly.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM roles WHERE name = $1");
        sqlx::query_as::<_, Role>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Name carried in a user's access token.
    ///
    /// A dangling role id yields `"unknown"`, which grants no admin rights.
    pub async fn resolve_name(pool: &PgPool, role_id: DbId) -> Result<String, sqlx::Error> {
        let name: Option<String> = sqlx::query_scalar("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_optional(pool)
            .await?;
        Ok(name.unwrap_or_else(|| "unknown".to_string()))
    }
}
