use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-wallet write locks.
///
/// Serializes check-then-write sequences that touch the same wallet inside this process.
/// Writers in other processes are not covered.
#[derive(Debug, Default)]
pub(crate) struct WalletLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
    names: Arc<AsyncMutex<()>>,
}

impl WalletLocks {
    /// Lock over the wallet name space as a whole. Independent of every per-wallet lock.
    pub(crate) async fn acquire_names(&self) -> OwnedMutexGuard<()> {
        self.names.clone().lock_owned().await
    }

    pub(crate) async fn acquire(&self, wallet_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop locks nobody holds or waits on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(wallet_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}
