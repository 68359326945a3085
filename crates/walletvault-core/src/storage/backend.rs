use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by backend adapters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    /// Nothing is stored at the requested path.
    #[error("entry not found at path: {path}")]
    NotFound { path: String },
    /// Underlying storage failure.
    #[error("storage failure: {reason}")]
    Storage { reason: String },
}

impl BackendError {
    pub fn storage(reason: impl ToString) -> Self {
        Self::Storage {
            reason: reason.to_string(),
        }
    }
}

/// Uniform key/value contract every storage backend is adapted to.
///
/// Implementations hold no state between calls beyond their client handle, so a single
/// backend can be shared by any number of concurrent store operations.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Short backend name used in logs.
    fn kind(&self) -> &'static str;

    /// Persist a value under a path, overwriting any existing entry.
    async fn put(&self, path: &str, value: &[u8]) -> Result<(), BackendError>;

    /// Retrieve the full value stored at a path.
    async fn get(&self, path: &str) -> Result<Vec<u8>, BackendError>;

    /// List the keys that start with `prefix`, in backend-defined order.
    ///
    /// Returned keys are complete paths that can be handed back to [`Backend::get`].
    /// Listings may include directory markers (keys ending in `/`) and keys nested more
    /// than one level below the prefix; callers filter what they need.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackendError>;
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    async fn put(&self, path: &str, value: &[u8]) -> Result<(), BackendError> {
        (**self).put(path, value).await
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        (**self).get(path).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        (**self).list(prefix).await
    }
}
