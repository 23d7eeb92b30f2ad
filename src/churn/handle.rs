use std::sync::{Arc, RwLock};

use crate::churn::error::ChurnError;
use crate::churn::model::ChurnArtifact;

/// Shared handle to the current artifact.
///
/// Readers clone the inner `Arc` and drop the lock immediately, so request
/// handlers work against an immutable snapshot; a retrain swaps the whole
/// artifact in one write. `None` is the untrained state.
#[derive(Clone, Default)]
pub struct ModelHandle {
    inner: Arc<RwLock<Option<Arc<ChurnArtifact>>>>,
}

impl ModelHandle {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot of the current artifact, if trained.
    pub fn current(&self) -> Option<Arc<ChurnArtifact>> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Like `current`, but the untrained state is an error.
    pub fn require(&self) -> Result<Arc<ChurnArtifact>, ChurnError> {
        self.current().ok_or(ChurnError::NotTrained)
    }

    /// Replace the artifact wholesale after a retrain.
    pub fn replace(&self, artifact: ChurnArtifact) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(artifact));
    }
}
