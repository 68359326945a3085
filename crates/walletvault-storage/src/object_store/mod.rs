//! Bucket-oriented object storage.
//!
//! Object stores keep a flat key space: listing a prefix returns every key below it,
//! including "directory" marker objects some tools create, and each listed key can be
//! downloaded directly.

mod fs;

use async_trait::async_trait;
use tracing::instrument;
use walletvault_core::storage::{Backend, BackendError};

pub use fs::FsObjectStore;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    /// Continuation token for the next page; `None` when the listing is complete.
    pub next: Option<String>,
}

/// Protocol spoken by an object storage service.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Upload an object, replacing any existing object with the same key.
    async fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), BackendError>;

    /// Download an object; `None` when the key does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// List keys with the given prefix, one page at a time.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ObjectPage, BackendError>;
}

/// Adapts an [`ObjectStoreClient`] bound to one bucket to the uniform [`Backend`] contract.
pub struct ObjectStoreBackend<C: ObjectStoreClient> {
    client: C,
    bucket: String,
}

impl<C: ObjectStoreClient> ObjectStoreBackend<C> {
    pub fn new(client: C, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C: ObjectStoreClient> Backend for ObjectStoreBackend<C> {
    fn kind(&self) -> &'static str {
        "object-store"
    }

    #[instrument(skip_all, fields(bucket = %self.bucket, path = %path))]
    async fn put(&self, path: &str, value: &[u8]) -> Result<(), BackendError> {
        self.client.put_object(&self.bucket, path, value).await
    }

    #[instrument(skip_all, fields(bucket = %self.bucket, path = %path))]
    async fn get(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        self.client
            .get_object(&self.bucket, path)
            .await?
            .ok_or_else(|| BackendError::NotFound {
                path: path.to_string(),
            })
    }

    #[instrument(skip_all, fields(bucket = %self.bucket, prefix = %prefix))]
    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        let mut keys = Vec::new();
        let mut continuation = None;
        loop {
            let page = self
                .client
                .list_objects(&self.bucket, prefix, continuation.clone())
                .await?;
            keys.extend(page.keys);
            match page.next {
                Some(next) if continuation.as_ref() != Some(&next) => continuation = Some(next),
                Some(next) => {
                    return Err(BackendError::storage(format!(
                        "listing did not advance past continuation token {next}"
                    )))
                }
                None => break,
            }
        }
        tracing::debug!(count = keys.len(), "listed objects");
        Ok(keys)
    }
}
