use std::{
    collections::{BTreeMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;

use super::backend::{Backend, BackendError};

/// Flat in-memory backend for tests and smoke runs.
///
/// Behaves like a bucket: `list` returns every key under the prefix, however deeply
/// nested. Reads and listings can be made to fail to exercise degraded paths.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    inner: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, Vec<u8>>,
    failing_reads: HashSet<String>,
    failing_listing: bool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes directly, bypassing any store-level checks or encryption.
    pub fn insert_raw(&self, path: impl Into<String>, value: impl Into<Vec<u8>>) {
        if let Ok(mut state) = self.inner.lock() {
            state.entries.insert(path.into(), value.into());
        }
    }

    /// Bytes exactly as stored at `path`.
    pub fn raw(&self, path: &str) -> Option<Vec<u8>> {
        self.inner.lock().ok()?.entries.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent `get` of `path` fail with a storage error.
    pub fn fail_reads_for(&self, path: impl Into<String>) {
        if let Ok(mut state) = self.inner.lock() {
            state.failing_reads.insert(path.into());
        }
    }

    /// Make every subsequent `list` fail with a storage error.
    pub fn fail_listing(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.failing_listing = true;
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        self.inner
            .lock()
            .map_err(|err| BackendError::storage(format!("lock poisoned: {err}")))
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, path: &str, value: &[u8]) -> Result<(), BackendError> {
        self.state()?
            .entries
            .insert(path.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let state = self.state()?;
        if state.failing_reads.contains(path) {
            return Err(BackendError::storage(format!("injected read failure: {path}")));
        }
        state
            .entries
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                path: path.to_string(),
            })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        let state = self.state()?;
        if state.failing_listing {
            return Err(BackendError::storage("injected listing failure"));
        }
        Ok(state
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}
