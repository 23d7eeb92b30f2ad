use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                    // system-assigned, monotonic
    pub username: String,           // unique, non-empty
    #[serde(skip_serializing)]
    pub password_hash: String,      // argon2 PHC string, never exposed in JSON
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
}
