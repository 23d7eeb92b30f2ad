use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Mutex;
use time::OffsetDateTime;

use crate::users::error::UserError;
use crate::users::record::User;

/// Durable user-record store consumed by the credential manager.
///
/// The manager only needs insert, point lookups and delete-by-id; anything
/// beyond that belongs to the storage layer, not here.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, UserError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError>;
    /// Returns true if a row was deleted.
    async fn delete(&self, id: i64) -> Result<bool, UserError>;
}

/// Postgres-backed store.
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_sqlx(e: sqlx::Error) -> UserError {
    // Unique violation on the username column surfaces as the domain error so
    // a lost pre-check race still reports DuplicateUsername.
    if let sqlx::Error::Database(ref db) = e {
        if db.code().as_deref() == Some("23505") {
            return UserError::DuplicateUsername;
        }
    }
    UserError::Storage(e.into())
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, is_admin)
            VALUES ($1, $2, $3)
            RETURNING id, username, password_hash, is_admin, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, is_admin, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, is_admin, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)?;
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<bool, UserError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(map_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-memory store used by unit tests and `AppState::fake()`.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    rows: Vec<User>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> Result<User, UserError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.rows.iter().any(|u| u.username == username) {
            return Err(UserError::DuplicateUsername);
        }
        inner.next_id += 1;
        let user = User {
            id: inner.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.rows.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.rows.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn delete(&self, id: i64) -> Result<bool, UserError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = inner.rows.len();
        inner.rows.retain(|u| u.id != id);
        Ok(inner.rows.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_assigns_monotonic_ids() {
        let store = MemoryUserStore::default();
        let a = store.insert("alice", "hash-a", false).await.unwrap();
        let b = store.insert("bob", "hash-b", false).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_username() {
        let store = MemoryUserStore::default();
        store.insert("alice", "hash", false).await.unwrap();
        let err = store.insert("alice", "other", false).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateUsername));
    }

    #[tokio::test]
    async fn memory_store_delete_reports_missing_rows() {
        let store = MemoryUserStore::default();
        let user = store.insert("alice", "hash", false).await.unwrap();
        assert!(store.delete(user.id).await.unwrap());
        assert!(!store.delete(user.id).await.unwrap());
    }
}
