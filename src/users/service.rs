use std::sync::Arc;

use tracing::{info, warn};

use crate::users::error::UserError;
use crate::users::password::{hash_password, verify_dummy, verify_password};
use crate::users::record::User;
use crate::users::store::UserStore;

/// Credential manager: create/verify/remove operations over the user store.
///
/// Session handling lives in the transport layer; this type only answers
/// yes/no and hands back records.
#[derive(Clone)]
pub struct CredentialManager {
    store: Arc<dyn UserStore>,
}

impl CredentialManager {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Create a new user with a freshly salted hash.
    ///
    /// Fails with `DuplicateUsername` if the username is taken, whether the
    /// pre-check or the store's unique constraint catches it.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User, UserError> {
        if self.store.find_by_username(username).await?.is_some() {
            return Err(UserError::DuplicateUsername);
        }
        let hash = hash_password(password)?;
        let user = self.store.insert(username, &hash, is_admin).await?;
        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, username: &str) -> Result<User, UserError> {
        self.store
            .find_by_username(username)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User, UserError> {
        self.store.find_by_id(id).await?.ok_or(UserError::NotFound)
    }

    /// Check a username/password pair.
    ///
    /// Returns the record on success and `None` on any mismatch. An unknown
    /// username still burns a hash verification so the two failure modes are
    /// not distinguishable by timing, and the caller sees one generic outcome.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, UserError> {
        let user = match self.store.find_by_username(username).await? {
            Some(u) => u,
            None => {
                verify_dummy(password);
                return Ok(None);
            }
        };
        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            warn!(user_id = user.id, "password mismatch");
            Ok(None)
        }
    }

    /// Delete a user by id. Fails with `NotFound` if no such record exists.
    pub async fn remove_user(&self, id: i64) -> Result<(), UserError> {
        if self.store.delete(id).await? {
            info!(user_id = id, "user removed");
            Ok(())
        } else {
            Err(UserError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::store::MemoryUserStore;

    fn manager() -> CredentialManager {
        CredentialManager::new(Arc::new(MemoryUserStore::default()))
    }

    #[tokio::test]
    async fn created_user_verifies_against_its_password_only() {
        let mgr = manager();
        mgr.create_user("alice", "s3cret-pass", false).await.unwrap();

        let user = mgr.get_user("alice").await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(verify_password("s3cret-pass", &user.password_hash).unwrap());
        assert!(!verify_password("other-pass", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_fails_and_keeps_one_record() {
        let mgr = manager();
        let first = mgr.create_user("alice", "pass-one", false).await.unwrap();
        let err = mgr.create_user("alice", "pass-two", false).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateUsername));

        // The surviving record is the first one.
        let user = mgr.get_user("alice").await.unwrap();
        assert_eq!(user.id, first.id);
        assert!(verify_password("pass-one", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let mgr = manager();
        mgr.create_user("alice", "right-pass", false).await.unwrap();

        let wrong_password = mgr.verify_credentials("alice", "wrong").await.unwrap();
        let unknown_user = mgr.verify_credentials("nobody", "wrong").await.unwrap();
        assert!(wrong_password.is_none());
        assert!(unknown_user.is_none());
    }

    #[tokio::test]
    async fn verify_returns_record_on_match() {
        let mgr = manager();
        let created = mgr.create_user("alice", "right-pass", true).await.unwrap();
        let verified = mgr
            .verify_credentials("alice", "right-pass")
            .await
            .unwrap()
            .expect("credentials should match");
        assert_eq!(verified.id, created.id);
        assert!(verified.is_admin);
    }

    #[tokio::test]
    async fn remove_unknown_id_fails_and_leaves_store_unchanged() {
        let mgr = manager();
        mgr.create_user("alice", "pass", false).await.unwrap();

        let err = mgr.remove_user(9999).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));
        assert!(mgr.get_user("alice").await.is_ok());
    }

    #[tokio::test]
    async fn remove_then_lookup_reports_not_found() {
        let mgr = manager();
        let user = mgr.create_user("alice", "pass", false).await.unwrap();
        mgr.remove_user(user.id).await.unwrap();
        assert!(matches!(
            mgr.get_user("alice").await.unwrap_err(),
            UserError::NotFound
        ));
    }
}
