use thiserror::Error;

/// Failures of the credential manager.
///
/// `DuplicateUsername` and `NotFound` are domain outcomes the transport layer
/// turns into user-facing responses; `Storage` wraps whatever the backing
/// store reported.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("username already exists")]
    DuplicateUsername,
    #[error("user not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
