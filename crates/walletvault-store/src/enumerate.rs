use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};
use uuid::Uuid;
use walletvault_core::{
    crypto::EncryptionGate,
    paths::{direct_child, is_directory_marker},
    storage::Backend,
    VaultError,
};

/// Records buffered ahead of the consumer before the producer waits.
pub const BUFFER_CAPACITY: usize = 1024;

/// Which part of the namespace an enumeration walks.
#[derive(Debug, Clone)]
pub(crate) enum Scope {
    /// Wallet headers directly below the root.
    Wallets { root: String },
    /// Accounts directly below one wallet's namespace.
    Accounts { namespace: String, wallet_id: Uuid },
}

impl Scope {
    fn prefix(&self) -> &str {
        match self {
            Scope::Wallets { root } => root,
            Scope::Accounts { namespace, .. } => namespace,
        }
    }

    /// Whether a listed key holds a record of this scope.
    fn admits(&self, key: &str) -> bool {
        if is_directory_marker(key) {
            return false;
        }
        match self {
            Scope::Wallets { root } => direct_child(root, key).is_some(),
            // Older object-store layouts keep a header copy named after the wallet inside
            // its own namespace.
            Scope::Accounts {
                namespace,
                wallet_id,
            } => direct_child(namespace, key)
                .is_some_and(|name| name != wallet_id.hyphenated().to_string()),
        }
    }
}

/// Lazy, single-pass sequence of decrypted records.
///
/// Records arrive in backend listing order. Items that fail to fetch or decrypt are left
/// out, and a failed listing ends the sequence with nothing in it. Dropping the sequence
/// (or calling [`Records::cancel`]) stops the producer.
pub struct Records {
    rx: mpsc::Receiver<Vec<u8>>,
    token: CancellationToken,
    _guard: DropGuard,
}

impl Records {
    /// Next record, or `None` once the producer has finished.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Drain the remaining records.
    pub async fn collect(mut self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(record) = self.next().await {
            out.push(record);
        }
        out
    }

    /// Stop the producer; records already buffered can still be read.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Start a producer task for `scope`. Must be called from within a Tokio runtime.
pub(crate) fn spawn<B: Backend + 'static>(
    backend: Arc<B>,
    gate: EncryptionGate,
    scope: Scope,
) -> Records {
    let (tx, rx) = mpsc::channel(BUFFER_CAPACITY);
    let token = CancellationToken::new();
    let producer_token = token.clone();

    tokio::spawn(async move {
        let keys = match backend.list(scope.prefix()).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(backend = backend.kind(), prefix = scope.prefix(), %err, "listing failed");
                return;
            }
        };

        for key in keys.into_iter().filter(|key| scope.admits(key)) {
            let fetched = tokio::select! {
                biased;
                _ = producer_token.cancelled() => break,
                fetched = fetch(backend.as_ref(), &gate, &key) => fetched,
            };
            let record = match fetched {
                Ok(record) => record,
                Err(err) => {
                    debug!(%key, %err, "skipping record");
                    continue;
                }
            };
            tokio::select! {
                biased;
                _ = producer_token.cancelled() => break,
                sent = tx.send(record) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(prefix = scope.prefix(), "enumeration finished");
    });

    Records {
        rx,
        _guard: token.clone().drop_guard(),
        token,
    }
}

async fn fetch<B: Backend + ?Sized>(
    backend: &B,
    gate: &EncryptionGate,
    key: &str,
) -> Result<Vec<u8>, VaultError> {
    let stored = backend
        .get(key)
        .await
        .map_err(|err| VaultError::from_backend("fetch record", err))?;
    gate.decrypt_if_required(&stored)
}
