use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use walletvault_core::storage::BackendError;

use super::{SecretClient, SecretData};

/// Hierarchical in-memory secret service for tests and offline runs.
#[derive(Debug, Default, Clone)]
pub struct InMemorySecretClient {
    inner: Arc<Mutex<BTreeMap<String, SecretData>>>,
}

impl InMemorySecretClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn secrets(&self) -> Result<MutexGuard<'_, BTreeMap<String, SecretData>>, BackendError> {
        self.inner
            .lock()
            .map_err(|err| BackendError::storage(format!("lock poisoned: {err}")))
    }
}

#[async_trait]
impl SecretClient for InMemorySecretClient {
    async fn write(&self, path: &str, data: SecretData) -> Result<(), BackendError> {
        self.secrets()?
            .insert(path.trim_matches('/').to_string(), data);
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Option<SecretData>, BackendError> {
        Ok(self.secrets()?.get(path.trim_matches('/')).cloned())
    }

    async fn list(&self, path: &str) -> Result<Option<Vec<String>>, BackendError> {
        let dir = match path.trim_matches('/') {
            "" => String::new(),
            trimmed => format!("{trimmed}/"),
        };

        let children: BTreeSet<String> = self
            .secrets()?
            .keys()
            .filter_map(|key| key.strip_prefix(dir.as_str()))
            .map(|rest| match rest.find('/') {
                Some(idx) => rest[..=idx].to_string(),
                None => rest.to_string(),
            })
            .collect();

        Ok((!children.is_empty()).then(|| children.into_iter().collect()))
    }
}
